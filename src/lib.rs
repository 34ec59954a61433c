//! Real-time market event stream engine.
//!
//! Ingests a multiplexed WebSocket stream of trade ticks, OHLC
//! aggregate bars, and index values, and reconciles them into a
//! consistent per-symbol view for driving a live display. The
//! [`websocket::ConnectionManager`] owns the transport lifecycle and
//! subscription replay, [`reconcile`] merges events under disjoint
//! field-ownership rules, and [`store::RealtimeStore`] holds the latest
//! snapshot and the flash-flag lifecycle.

pub mod config;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod store;
pub mod websocket;

pub use error::{Result, TapeError};
