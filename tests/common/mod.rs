//! Shared test utilities: a scripted in-memory transport.
//!
//! [`FakeTransport`] stands in for the WebSocket so connection-manager
//! and store behavior can be driven deterministically: the test scripts
//! connect outcomes, feeds inbound frames, and inspects every frame the
//! engine sent.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use tickertape::config::StreamConfig;
use tickertape::websocket::{FrameSink, FrameStream, Transport};
use tickertape::{Result, TapeError};

/// A config with short, round timings for paused-clock tests.
pub fn test_config() -> StreamConfig {
    StreamConfig {
        websocket_url: "ws://fake.test/ws".to_string(),
        reconnect_base_delay: Duration::from_millis(100),
        max_reconnect_attempts: 3,
        flash_duration: Duration::from_millis(500),
    }
}

/// Sink that records every frame written to it.
pub struct FakeSink {
    sent: Arc<Mutex<Vec<String>>>,
}

impl FrameSink for FakeSink {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.sent.lock().unwrap().push(text);
        Ok(())
    }
}

/// Stream fed by the test through a [`FakeLink`].
pub struct FakeStream {
    rx: mpsc::UnboundedReceiver<Result<String>>,
}

impl FrameStream for FakeStream {
    async fn next_frame(&mut self) -> Option<Result<String>> {
        self.rx.recv().await
    }
}

/// Test-side handle to one established fake connection.
///
/// Dropping the link (or calling [`FakeLink::close`]) ends the stream,
/// which the engine observes as an unexpected close.
pub struct FakeLink {
    frames: mpsc::UnboundedSender<Result<String>>,
    sent: Arc<Mutex<Vec<String>>>,
}

impl FakeLink {
    /// Delivers one inbound text frame.
    pub fn push_frame(&self, text: &str) {
        let _ = self.frames.send(Ok(text.to_string()));
    }

    /// Delivers a read error, which the engine treats as a disconnect.
    pub fn fail_read(&self) {
        let _ = self
            .frames
            .send(Err(TapeError::MalformedFrame("simulated read error".to_string())));
    }

    /// Closes the connection from the server side.
    pub fn close(self) {}

    /// Every frame the engine has sent over this connection so far.
    pub fn sent_frames(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[derive(Default)]
struct Shared {
    /// Scripted outcomes for upcoming connects; empty means succeed.
    failures: VecDeque<bool>,
    links: Vec<FakeLink>,
    connect_count: u32,
}

/// Scriptable transport; hand the [`FakeTransport`] to the engine and
/// keep the [`FakeHandle`] in the test.
pub struct FakeTransport {
    shared: Arc<Mutex<Shared>>,
}

/// Test-side control over a [`FakeTransport`].
pub struct FakeHandle {
    shared: Arc<Mutex<Shared>>,
}

impl FakeTransport {
    pub fn new() -> (Self, FakeHandle) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        (
            Self {
                shared: Arc::clone(&shared),
            },
            FakeHandle { shared },
        )
    }
}

impl FakeHandle {
    /// Scripts the next `n` connect attempts to fail.
    pub fn fail_next_connects(&self, n: usize) {
        let mut shared = self.shared.lock().unwrap();
        for _ in 0..n {
            shared.failures.push_back(true);
        }
    }

    /// How many connect attempts the engine has made.
    pub fn connect_count(&self) -> u32 {
        self.shared.lock().unwrap().connect_count
    }

    /// Takes ownership of the oldest established connection not yet
    /// claimed by the test.
    pub fn take_link(&self) -> FakeLink {
        let mut shared = self.shared.lock().unwrap();
        assert!(!shared.links.is_empty(), "no established fake connection");
        shared.links.remove(0)
    }
}

impl Transport for FakeTransport {
    type Sink = FakeSink;
    type Stream = FakeStream;

    async fn connect(&mut self, _url: &str) -> Result<(FakeSink, FakeStream)> {
        let mut shared = self.shared.lock().unwrap();
        shared.connect_count += 1;

        if shared.failures.pop_front().unwrap_or(false) {
            return Err(TapeError::Config("scripted connect failure".to_string()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let sent = Arc::new(Mutex::new(Vec::new()));
        shared.links.push(FakeLink {
            frames: tx,
            sent: Arc::clone(&sent),
        });

        Ok((FakeSink { sent }, FakeStream { rx }))
    }
}
