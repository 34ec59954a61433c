//! WebSocket connection lifecycle management.
//!
//! [`ConnectionManager`] owns one logical connection to the event
//! source: it establishes the transport, tracks the subscription set,
//! decodes inbound frames into ordered event batches, and reconnects
//! automatically with exponential backoff up to a capped attempt count.
//! Subscriptions are replayed after every successful reconnect.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::registry::{ListenerHandle, ListenerRegistry, ListenerResult};
use super::{FrameStream, Transport, send_subscribe};
use crate::Result;
use crate::config::StreamConfig;
use crate::models::event::{MarketEvent, decode_frame};

/// Current transport status, observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
    Error,
}

/// Exponential backoff schedule for reconnection.
///
/// Attempt `n` (1-based) waits `base_delay * 2^(n-1)`; once
/// `max_attempts` tries have failed no further attempt is scheduled and
/// the connection stays down until an explicit `connect()`.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_attempts: u32,
}

impl ReconnectPolicy {
    /// The delay before the given 1-based attempt.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// What the manager yields to the task driving it.
#[derive(Debug)]
pub enum ManagerEvent {
    /// The connection state changed (reconnects included).
    State(ConnectionState),
    /// One decoded frame: an ordered batch of market events.
    Batch(Vec<MarketEvent>),
}

/// Manages the connection lifecycle, subscription bookkeeping, and
/// reconnection with exponential backoff.
pub struct ConnectionManager<T: Transport> {
    transport: T,
    url: String,
    policy: ReconnectPolicy,
    state: ConnectionState,
    attempts: u32,
    /// Set once retries are exhausted or `disconnect()` was called;
    /// [`Self::next_event`] pends forever until an explicit reconnect.
    idle: bool,
    subscriptions: Vec<String>,
    writer: Option<T::Sink>,
    reader: Option<T::Stream>,
    message_listeners: ListenerRegistry<Vec<MarketEvent>>,
    connection_listeners: ListenerRegistry<ConnectionState>,
}

impl<T: Transport> ConnectionManager<T> {
    /// Creates a manager over `transport` using the configured endpoint
    /// and reconnect policy. No connection is made until [`Self::connect`].
    #[must_use]
    pub fn new(transport: T, config: &StreamConfig) -> Self {
        Self {
            transport,
            url: config.websocket_url.clone(),
            policy: ReconnectPolicy {
                base_delay: config.reconnect_base_delay,
                max_attempts: config.max_reconnect_attempts,
            },
            state: ConnectionState::Disconnected,
            attempts: 0,
            idle: false,
            subscriptions: Vec::new(),
            writer: None,
            reader: None,
            message_listeners: ListenerRegistry::new(),
            connection_listeners: ListenerRegistry::new(),
        }
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns `true` while the transport is open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// How many reconnection attempts have been made since the last
    /// successful connect.
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.attempts
    }

    /// The currently tracked symbols, in subscription order.
    #[must_use]
    pub fn subscribed_tickers(&self) -> &[String] {
        &self.subscriptions
    }

    /// Registers a listener invoked with every decoded event batch.
    pub fn on_message<F>(&mut self, listener: F) -> ListenerHandle
    where
        F: FnMut(&Vec<MarketEvent>) -> ListenerResult + Send + 'static,
    {
        self.message_listeners.register(listener)
    }

    /// Registers a listener invoked on every connection-state change.
    pub fn on_connection<F>(&mut self, listener: F) -> ListenerHandle
    where
        F: FnMut(&ConnectionState) -> ListenerResult + Send + 'static,
    {
        self.connection_listeners.register(listener)
    }

    /// Deregisters a message listener; returns whether it existed.
    pub fn remove_message_listener(&mut self, handle: ListenerHandle) -> bool {
        self.message_listeners.remove(handle)
    }

    /// Deregisters a connection listener; returns whether it existed.
    pub fn remove_connection_listener(&mut self, handle: ListenerHandle) -> bool {
        self.connection_listeners.remove(handle)
    }

    /// Connects to the event source.
    ///
    /// Idempotent: if a connection is already open or being established
    /// this returns immediately. On success the attempt counter resets
    /// and every tracked symbol is re-subscribed. A failure is returned
    /// once to the caller; the manager is left disconnected so the
    /// retry policy in [`Self::next_event`] takes over from there.
    ///
    /// # Errors
    ///
    /// Returns a [`TapeError`](crate::TapeError) if the transport
    /// cannot be established.
    pub async fn connect(&mut self) -> Result<()> {
        if matches!(
            self.state,
            ConnectionState::Connecting | ConnectionState::Connected
        ) {
            return Ok(());
        }

        self.idle = false;
        self.attempts = 0;
        self.establish().await
    }

    /// Adds `symbol` to the subscription set and, while connected,
    /// sends the subscribe directive immediately. Duplicates collapse
    /// to a single tracked entry; while disconnected the symbol is sent
    /// on the next successful connect.
    ///
    /// # Errors
    ///
    /// Returns a [`TapeError`](crate::TapeError) if sending the
    /// directive fails.
    pub async fn subscribe(&mut self, symbol: &str) -> Result<()> {
        if !self.subscriptions.iter().any(|s| s == symbol) {
            self.subscriptions.push(symbol.to_string());
        }

        if let Some(writer) = self.writer.as_mut() {
            send_subscribe(writer, symbol).await?;
        }

        Ok(())
    }

    /// Removes `symbol` from the subscription set.
    ///
    /// The protocol has no unsubscribe directive, so nothing is sent;
    /// suppression of further data for the symbol is the store's
    /// responsibility. Unknown symbols are a no-op.
    pub fn unsubscribe(&mut self, symbol: &str) {
        self.subscriptions.retain(|s| s != symbol);
    }

    /// Tears down the transport and suppresses any further
    /// auto-reconnect until an explicit [`Self::connect`].
    pub fn disconnect(&mut self) {
        self.attempts = self.policy.max_attempts;
        self.idle = true;
        self.writer = None;
        self.reader = None;
        self.set_state(ConnectionState::Disconnected);
        info!("Stream disconnected; auto-reconnect suppressed");
    }

    /// Drives the connection and yields the next observable event.
    ///
    /// While connected this reads frames, decodes each into an ordered
    /// batch, notifies message listeners, and yields the batch.
    /// Undecodable frames are dropped with a diagnostic. When the
    /// stream ends the manager yields `Disconnected` once and on
    /// subsequent calls applies the backoff policy; after the attempt
    /// cap (or an explicit [`Self::disconnect`]) this future never
    /// resolves.
    pub async fn next_event(&mut self) -> ManagerEvent {
        loop {
            if self.idle {
                std::future::pending::<()>().await;
            }

            if let Some(reader) = self.reader.as_mut() {
                match reader.next_frame().await {
                    Some(Ok(text)) => match decode_frame(&text) {
                        Ok(events) if events.is_empty() => {}
                        Ok(events) => {
                            debug!(count = events.len(), "Decoded event batch");
                            self.message_listeners.notify(&events);
                            return ManagerEvent::Batch(events);
                        }
                        Err(e) => warn!(error = %e, "Dropping undecodable frame"),
                    },
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket read error");
                        self.teardown();
                        return ManagerEvent::State(ConnectionState::Disconnected);
                    }
                    None => {
                        info!("WebSocket stream ended");
                        self.teardown();
                        return ManagerEvent::State(ConnectionState::Disconnected);
                    }
                }
            } else {
                if self.attempts >= self.policy.max_attempts {
                    error!(
                        attempts = self.attempts,
                        "Max reconnection attempts reached; staying disconnected"
                    );
                    self.idle = true;
                    continue;
                }

                self.attempts += 1;
                let delay = self.policy.delay_for(self.attempts);
                info!(
                    attempt = self.attempts,
                    max_attempts = self.policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Backing off before reconnect"
                );
                tokio::time::sleep(delay).await;

                match self.establish().await {
                    Ok(()) => return ManagerEvent::State(ConnectionState::Connected),
                    Err(e) => warn!(error = %e, "Reconnect attempt failed"),
                }
            }
        }
    }

    /// One connection attempt: transport handshake plus subscription
    /// replay. Resets the attempt counter on success.
    async fn establish(&mut self) -> Result<()> {
        self.set_state(ConnectionState::Connecting);
        info!(url = %self.url, "Connecting to event stream");

        match self.transport.connect(&self.url).await {
            Ok((mut writer, reader)) => {
                self.attempts = 0;

                for symbol in &self.subscriptions {
                    if let Err(e) = send_subscribe(&mut writer, symbol).await {
                        warn!(symbol = %symbol, error = %e, "Failed to replay subscription");
                    }
                }

                self.writer = Some(writer);
                self.reader = Some(reader);
                self.set_state(ConnectionState::Connected);
                info!(
                    subscriptions = self.subscriptions.len(),
                    "Stream connected and subscriptions replayed"
                );

                Ok(())
            }
            Err(e) => {
                self.writer = None;
                self.reader = None;
                self.set_state(ConnectionState::Disconnected);

                Err(e)
            }
        }
    }

    /// Drops both transport halves after an unexpected close.
    fn teardown(&mut self) {
        self.writer = None;
        self.reader = None;
        self.set_state(ConnectionState::Disconnected);
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state != state {
            self.state = state;
            self.connection_listeners.notify(&state);
        }
    }
}
