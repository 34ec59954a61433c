//! Inbound event types and frame decoding.
//!
//! The feed multiplexes three kinds of events over one socket, each
//! tagged by an `"ev"` discriminator: `"T"` trades, `"AM"`/`"A"`
//! aggregate bars, and `"V"` index values. A frame carries either a
//! single event object or an array of them.

use serde::Deserialize;
use tracing::warn;

use crate::error::TapeError;
use crate::Result;

/// A single executed trade.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TradeEvent {
    #[serde(rename = "sym")]
    pub symbol: String,
    /// Trade price; the number to show live.
    #[serde(rename = "p")]
    pub price: f64,
    /// Size of this specific trade.
    #[serde(rename = "s")]
    pub size: u64,
    /// Exchange identifier.
    #[serde(rename = "x")]
    pub exchange: u32,
    /// Unix timestamp in milliseconds.
    #[serde(rename = "t")]
    pub timestamp: u64,
}

/// A periodic OHLC bar for one symbol.
///
/// Carries both bar-level volume (`v`) and the session-accumulated
/// total (`av`); the two must never be conflated.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AggregateEvent {
    #[serde(rename = "sym")]
    pub symbol: String,
    /// Open of this bar.
    #[serde(rename = "o")]
    pub open: f64,
    /// Close of this bar (current price of the bar).
    #[serde(rename = "c")]
    pub close: f64,
    #[serde(rename = "h")]
    pub high: f64,
    #[serde(rename = "l")]
    pub low: f64,
    /// Volume in this bar only.
    #[serde(rename = "v")]
    pub volume: u64,
    /// Accumulated volume for the whole session.
    #[serde(rename = "av")]
    pub accumulated_volume: u64,
    /// Official session-open price.
    #[serde(rename = "op")]
    pub official_open: f64,
}

/// A value update for a market index (e.g. `I:SPX`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IndexEvent {
    /// Index ticker; the wire field is a capital `T`.
    #[serde(rename = "T")]
    pub ticker: String,
    #[serde(rename = "val")]
    pub value: f64,
    /// Unix timestamp in milliseconds.
    #[serde(rename = "t")]
    pub timestamp: u64,
}

/// One decoded event from the multiplexed stream.
///
/// Unknown `"ev"` discriminators map to [`MarketEvent::Ignored`] so the
/// feed can add event kinds without breaking existing clients.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "ev")]
pub enum MarketEvent {
    #[serde(rename = "T")]
    Trade(TradeEvent),
    #[serde(rename = "AM", alias = "A")]
    Aggregate(AggregateEvent),
    #[serde(rename = "V")]
    Index(IndexEvent),
    #[serde(other)]
    Ignored,
}

/// Decodes one raw frame into an ordered batch of events.
///
/// The feed sends either a single event object or an array of events per
/// frame. Malformed elements inside an array are skipped with a logged
/// diagnostic so one bad event cannot poison the rest of the batch.
///
/// # Errors
///
/// Returns [`TapeError::MalformedFrame`] if the frame is not valid JSON
/// or is neither an object nor an array.
pub fn decode_frame(text: &str) -> Result<Vec<MarketEvent>> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| TapeError::MalformedFrame(e.to_string()))?;

    match value {
        serde_json::Value::Array(elements) => {
            let mut events = Vec::with_capacity(elements.len());
            for element in elements {
                match serde_json::from_value::<MarketEvent>(element) {
                    Ok(event) => events.push(event),
                    Err(e) => warn!(error = %e, "Skipping malformed event in frame"),
                }
            }
            Ok(events)
        }
        serde_json::Value::Object(_) => {
            let event: MarketEvent =
                serde_json::from_value(value).map_err(|e| TapeError::MalformedFrame(e.to_string()))?;
            Ok(vec![event])
        }
        other => Err(TapeError::MalformedFrame(format!(
            "expected object or array, got {other}"
        ))),
    }
}
