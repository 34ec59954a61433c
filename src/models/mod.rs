//! Wire-format models for the market event stream.
//!
//! Contains the inbound event union ([`event::MarketEvent`]), the
//! reconciled per-entity records ([`record::StockRecord`],
//! [`record::IndexRecord`]), and the outbound subscribe directive.

pub mod event;
pub mod record;

use serde::Serialize;

/// The outbound subscribe message: `{"ticker": "<symbol>"}`.
///
/// This is the only message the feed accepts; the protocol has no
/// unsubscribe directive, so dropping a symbol is purely client-side.
#[derive(Debug, Serialize)]
pub struct SubscribeDirective {
    pub ticker: String,
}

impl SubscribeDirective {
    #[must_use]
    pub fn new(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
        }
    }
}
