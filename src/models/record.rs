//! Reconciled per-entity records.
//!
//! A [`StockRecord`] merges trade and aggregate events for one equity
//! symbol; an [`IndexRecord`] tracks one market index. Field ownership
//! is split by event kind: trades own the live price, timestamp,
//! direction, and change fields, aggregates own the OHLC and volume
//! fields. Merging is additive across kinds, never destructive.

/// Which way the last observed move went, relative to the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Up,
    Down,
    #[default]
    Neutral,
}

/// The reconciled live view of one equity symbol.
///
/// Created on the first event for the symbol; OHLC/volume fields stay
/// `None` until an aggregate bar arrives, and the change fields stay
/// `None` until a previous close is supplied externally.
#[derive(Debug, Clone, PartialEq)]
pub struct StockRecord {
    pub symbol: String,
    pub current_price: f64,
    /// Unix ms of the last trade (or of record creation when seeded
    /// from an aggregate before any trade has arrived).
    pub last_trade_time: u64,

    // Owned by aggregate events.
    pub open: Option<f64>,
    pub close: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    /// Volume of the most recent bar only.
    pub volume: Option<u64>,
    /// Total volume traded this session.
    pub accumulated_volume: Option<u64>,
    pub official_open: Option<f64>,

    /// Prior session close, supplied externally; baseline for the
    /// change fields below.
    pub prev_close: Option<f64>,

    // Derived from trades against prev_close.
    pub price_change: Option<f64>,
    pub price_change_percent: Option<f64>,

    // Transient display state.
    pub direction: Direction,
    pub flash: bool,
}

impl StockRecord {
    /// A fresh record for `symbol` with the given starting price and time.
    #[must_use]
    pub fn new(symbol: &str, current_price: f64, last_trade_time: u64) -> Self {
        Self {
            symbol: symbol.to_string(),
            current_price,
            last_trade_time,
            open: None,
            close: None,
            high: None,
            low: None,
            volume: None,
            accumulated_volume: None,
            official_open: None,
            prev_close: None,
            price_change: None,
            price_change_percent: None,
            direction: Direction::Neutral,
            flash: false,
        }
    }
}

/// The reconciled live view of one market index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexRecord {
    pub ticker: String,
    pub value: f64,
    /// Unix ms of the last value update.
    pub last_update_time: u64,

    // Transient display state.
    pub direction: Direction,
    pub flash: bool,
}
