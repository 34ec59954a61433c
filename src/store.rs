//! Presentation state store.
//!
//! [`RealtimeStore`] owns the reconciled mappings and the connection
//! manager, exposes synchronous point lookups, and manages the
//! transient flash flags: every update arms a fixed-delay timer, and
//! when it fires all set flags are cleared without touching any other
//! field. One task drives everything through [`RealtimeStore::run`], so
//! the mappings never need locking.

use std::time::{SystemTime, UNIX_EPOCH};

use tokio::time::{Duration, Instant};
use tracing::debug;

use crate::Result;
use crate::config::StreamConfig;
use crate::models::event::MarketEvent;
use crate::models::record::{IndexRecord, StockRecord};
use crate::reconcile::{self, IndexMap, PrevCloseMap, StockMap};
use crate::websocket::connection::{ConnectionManager, ConnectionState, ManagerEvent};
use crate::websocket::Transport;

/// Holds the latest reconciled snapshot and drives the stream engine.
pub struct RealtimeStore<T: Transport> {
    manager: ConnectionManager<T>,
    stocks: StockMap,
    indices: IndexMap,
    prev_closes: PrevCloseMap,
    flash_duration: Duration,
    flash_deadline: Option<Instant>,
    /// Set when the initial connect failed, surfaced as
    /// [`ConnectionState::Error`] until a connection succeeds.
    connect_failed: bool,
}

impl<T: Transport> RealtimeStore<T> {
    /// Creates a store around an owned connection manager.
    #[must_use]
    pub fn new(manager: ConnectionManager<T>, config: &StreamConfig) -> Self {
        Self {
            manager,
            stocks: StockMap::new(),
            indices: IndexMap::new(),
            prev_closes: PrevCloseMap::new(),
            flash_duration: config.flash_duration,
            flash_deadline: None,
            connect_failed: false,
        }
    }

    /// Connects the underlying manager.
    ///
    /// # Errors
    ///
    /// Returns a [`TapeError`](crate::TapeError) if the transport
    /// cannot be established; the status then reads
    /// [`ConnectionState::Error`] until a later connect succeeds.
    pub async fn connect(&mut self) -> Result<()> {
        match self.manager.connect().await {
            Ok(()) => {
                self.connect_failed = false;
                Ok(())
            }
            Err(e) => {
                self.connect_failed = true;
                Err(e)
            }
        }
    }

    /// Externally observable connection status.
    #[must_use]
    pub fn connection_status(&self) -> ConnectionState {
        if self.connect_failed {
            ConnectionState::Error
        } else {
            self.manager.state()
        }
    }

    /// Subscribes to live data for `ticker`.
    ///
    /// # Errors
    ///
    /// Returns a [`TapeError`](crate::TapeError) if sending the
    /// subscribe directive fails.
    pub async fn subscribe_to_ticker(&mut self, ticker: &str) -> Result<()> {
        self.manager.subscribe(ticker).await
    }

    /// Stops tracking `ticker` and deletes its reconciled state so stale
    /// data cannot be observed. The server may keep sending events for
    /// it (the protocol has no unsubscribe); a later event simply
    /// recreates a fresh record.
    pub fn unsubscribe_from_ticker(&mut self, ticker: &str) {
        self.manager.unsubscribe(ticker);
        self.stocks.remove(ticker);
        self.indices.remove(ticker);
        self.prev_closes.remove(ticker);
    }

    /// The currently tracked symbols, in subscription order.
    #[must_use]
    pub fn subscribed_tickers(&self) -> &[String] {
        self.manager.subscribed_tickers()
    }

    /// Looks up the reconciled record for an equity symbol.
    #[must_use]
    pub fn get_stock_data(&self, symbol: &str) -> Option<&StockRecord> {
        self.stocks.get(symbol)
    }

    /// Looks up the reconciled record for an index ticker.
    #[must_use]
    pub fn get_index_data(&self, ticker: &str) -> Option<&IndexRecord> {
        self.indices.get(ticker)
    }

    /// All reconciled equity records.
    #[must_use]
    pub fn stocks(&self) -> &StockMap {
        &self.stocks
    }

    /// All reconciled index records.
    #[must_use]
    pub fn indices(&self) -> &IndexMap {
        &self.indices
    }

    /// Access to the owned connection manager, e.g. for listener
    /// registration or an explicit disconnect.
    pub fn manager_mut(&mut self) -> &mut ConnectionManager<T> {
        &mut self.manager
    }

    /// Supplies the previous-close baseline for `symbol`.
    ///
    /// The stream itself never carries a previous close; it arrives via
    /// a separate snapshot fetch. Trades reconciled after this call
    /// compute their change fields against it, and an existing record
    /// has its change fields recomputed immediately.
    pub fn set_previous_close(&mut self, symbol: &str, prev_close: f64) {
        self.prev_closes.insert(symbol.to_string(), prev_close);

        if let Some(record) = self.stocks.get_mut(symbol) {
            reconcile::refresh_change(record, prev_close);
        }
    }

    /// Folds one decoded batch into the reconciled mappings as a single
    /// state transition and arms the flash-clear timer if anything
    /// changed.
    pub fn apply_events(&mut self, events: &[MarketEvent]) {
        let (stocks, indices, outcome) = reconcile::apply_batch(
            &self.stocks,
            &self.indices,
            &self.prev_closes,
            events,
            now_ms(),
        );

        if outcome.stocks_changed {
            self.stocks = stocks;
        }
        if outcome.indices_changed {
            self.indices = indices;
        }
        if outcome.stocks_changed || outcome.indices_changed {
            self.flash_deadline = Some(Instant::now() + self.flash_duration);
        }
    }

    /// Clears every set flash flag in both mappings, touching no other
    /// field. Returns whether anything needed clearing.
    pub fn clear_flashes(&mut self) -> bool {
        let mut changed = false;

        for record in self.stocks.values_mut() {
            if record.flash {
                record.flash = false;
                changed = true;
            }
        }
        for record in self.indices.values_mut() {
            if record.flash {
                record.flash = false;
                changed = true;
            }
        }

        changed
    }

    /// Processes exactly one engine event: the next manager event or
    /// the flash-clear timer, whichever fires first.
    pub async fn tick(&mut self) {
        let deadline = self.flash_deadline;

        let event = tokio::select! {
            ev = self.manager.next_event() => Some(ev),
            () = flash_wait(deadline) => None,
        };

        match event {
            Some(ManagerEvent::Batch(events)) => self.apply_events(&events),
            Some(ManagerEvent::State(state)) => {
                if state == ConnectionState::Connected {
                    self.connect_failed = false;
                }
                debug!(?state, "Connection state changed");
            }
            None => {
                self.flash_deadline = None;
                self.clear_flashes();
            }
        }
    }

    /// Drives the engine until the task is dropped.
    pub async fn run(&mut self) {
        loop {
            self.tick().await;
        }
    }
}

async fn flash_wait(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
