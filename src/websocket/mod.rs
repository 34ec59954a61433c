//! Async WebSocket client for the market event stream.
//!
//! This module is organized by domain:
//! - [`connection`] - Connection lifecycle, subscriptions, reconnection
//! - [`registry`] - Observer registries for batch and state listeners
//!
//! The [`Transport`] trait abstracts the socket so the connection
//! manager can be driven by a scripted in-memory transport in tests;
//! [`WsTransport`] is the production implementation.

pub mod connection;
pub mod registry;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};
use tungstenite::Message;

use crate::Result;
use crate::models::SubscribeDirective;

pub use connection::{ConnectionManager, ConnectionState, ManagerEvent, ReconnectPolicy};
pub use registry::{ListenerHandle, ListenerRegistry, ListenerResult};

/// Write half of a stream connection.
pub type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Read half of a stream connection.
pub type WsReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Write half able to send text frames.
pub trait FrameSink {
    /// Sends one text frame.
    ///
    /// # Errors
    ///
    /// Returns a [`TapeError`](crate::TapeError) if the send fails.
    fn send_text(&mut self, text: String) -> impl Future<Output = Result<()>>;
}

/// Read half yielding raw text frames.
///
/// `None` means the connection has closed; an `Err` item is a fatal
/// read error (the caller treats both as a disconnect).
pub trait FrameStream {
    fn next_frame(&mut self) -> impl Future<Output = Option<Result<String>>>;
}

/// A connectable transport producing a sink/stream pair per connection.
pub trait Transport {
    type Sink: FrameSink;
    type Stream: FrameStream;

    /// Establishes one connection to `url`.
    ///
    /// # Errors
    ///
    /// Returns a [`TapeError`](crate::TapeError) if the connection
    /// cannot be established.
    fn connect(&mut self, url: &str) -> impl Future<Output = Result<(Self::Sink, Self::Stream)>>;
}

/// Production transport backed by `tokio-tungstenite`.
pub struct WsTransport;

impl Transport for WsTransport {
    type Sink = WsWriter;
    type Stream = WsReader;

    async fn connect(&mut self, url: &str) -> Result<(WsWriter, WsReader)> {
        let (ws_stream, _) = connect_async(url).await?;
        info!("WebSocket handshake completed");

        Ok(ws_stream.split())
    }
}

impl FrameSink for WsWriter {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.send(Message::Text(text.into())).await?;

        Ok(())
    }
}

impl FrameStream for WsReader {
    async fn next_frame(&mut self) -> Option<Result<String>> {
        loop {
            match self.next().await {
                Some(Ok(Message::Text(text))) => return Some(Ok(text.to_string())),
                Some(Ok(Message::Close(_))) => return None,
                // Binary/Ping/Pong/raw frames carry no market data.
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Some(Err(e.into())),
                None => return None,
            }
        }
    }
}

/// Sends the subscribe directive for one ticker.
///
/// The feed protocol has no unsubscribe counterpart; dropping a ticker
/// is handled entirely client-side.
///
/// # Errors
///
/// Returns a [`TapeError`](crate::TapeError) if sending the directive fails.
pub async fn send_subscribe<S: FrameSink>(write: &mut S, ticker: &str) -> Result<()> {
    let json = serde_json::to_string(&SubscribeDirective::new(ticker))?;
    write.send_text(json).await?;
    debug!(ticker, "Sent subscribe directive");

    Ok(())
}
