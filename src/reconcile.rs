//! Pure merge of typed events into the reconciled per-entity mappings.
//!
//! Each event kind owns a disjoint set of record fields: trades own the
//! live price, trade time, direction, change, and flash fields;
//! aggregates own the OHLC and volume fields; index events own the
//! index value and its direction. Merging one kind never clobbers
//! fields owned by another, so the two feeds can interleave in any
//! order without losing data.
//!
//! The functions here take read-only access to the current mappings and
//! return new ones; the store swaps them in atomically, which keeps
//! change detection a simple pair of booleans.

use std::collections::HashMap;

use crate::models::event::{AggregateEvent, IndexEvent, MarketEvent, TradeEvent};
use crate::models::record::{Direction, IndexRecord, StockRecord};

/// Reconciled equity records keyed by symbol.
pub type StockMap = HashMap<String, StockRecord>;

/// Reconciled index records keyed by index ticker.
pub type IndexMap = HashMap<String, IndexRecord>;

/// Previous-close baselines keyed by symbol, supplied externally.
pub type PrevCloseMap = HashMap<String, f64>;

/// Which mappings a batch actually touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub stocks_changed: bool,
    pub indices_changed: bool,
}

/// Folds a batch of events, in arrival order, into new mappings.
///
/// `now_ms` stamps the last-trade time of records seeded from an
/// aggregate bar before any trade has arrived. Unrecognized events are
/// ignored. The returned [`BatchOutcome`] lets the caller commit both
/// mappings in a single state transition.
#[must_use]
pub fn apply_batch(
    stocks: &StockMap,
    indices: &IndexMap,
    prev_closes: &PrevCloseMap,
    events: &[MarketEvent],
    now_ms: u64,
) -> (StockMap, IndexMap, BatchOutcome) {
    let mut next_stocks = stocks.clone();
    let mut next_indices = indices.clone();
    let mut outcome = BatchOutcome::default();

    for event in events {
        match event {
            MarketEvent::Trade(trade) => {
                apply_trade(&mut next_stocks, prev_closes, trade);
                outcome.stocks_changed = true;
            }
            MarketEvent::Aggregate(agg) => {
                apply_aggregate(&mut next_stocks, agg, now_ms);
                outcome.stocks_changed = true;
            }
            MarketEvent::Index(index) => {
                apply_index(&mut next_indices, index);
                outcome.indices_changed = true;
            }
            MarketEvent::Ignored => {}
        }
    }

    (next_stocks, next_indices, outcome)
}

/// Merges one trade: live price, trade time, and flash update, plus the
/// change fields when a previous-close baseline is known. Never touches
/// aggregate-owned fields.
fn apply_trade(stocks: &mut StockMap, prev_closes: &PrevCloseMap, trade: &TradeEvent) {
    let record = stocks
        .entry(trade.symbol.clone())
        .or_insert_with(|| StockRecord::new(&trade.symbol, trade.price, trade.timestamp));

    record.current_price = trade.price;
    record.last_trade_time = trade.timestamp;
    record.flash = true;

    // Change fields stay undefined until a baseline is supplied; a stale
    // or absent baseline must never produce a change figure.
    if let Some(prev) = prev_closes.get(&trade.symbol).copied() {
        refresh_change(record, prev);
    }
}

/// Merges one aggregate bar: OHLC, both volume figures, and the
/// official open. Seeds the live price from the bar close only when no
/// trade has created the record yet; never touches trade-owned fields
/// otherwise.
fn apply_aggregate(stocks: &mut StockMap, agg: &AggregateEvent, now_ms: u64) {
    let record = stocks
        .entry(agg.symbol.clone())
        .or_insert_with(|| StockRecord::new(&agg.symbol, agg.close, now_ms));

    record.open = Some(agg.open);
    record.close = Some(agg.close);
    record.high = Some(agg.high);
    record.low = Some(agg.low);
    record.volume = Some(agg.volume);
    record.accumulated_volume = Some(agg.accumulated_volume);
    record.official_open = Some(agg.official_open);
}

/// Merges one index value, deriving direction from the prior value.
fn apply_index(indices: &mut IndexMap, index: &IndexEvent) {
    match indices.get_mut(&index.ticker) {
        Some(record) => {
            record.direction = if index.value > record.value {
                Direction::Up
            } else if index.value < record.value {
                Direction::Down
            } else {
                Direction::Neutral
            };
            record.value = index.value;
            record.last_update_time = index.timestamp;
            record.flash = true;
        }
        None => {
            indices.insert(
                index.ticker.clone(),
                IndexRecord {
                    ticker: index.ticker.clone(),
                    value: index.value,
                    last_update_time: index.timestamp,
                    direction: Direction::Neutral,
                    flash: true,
                },
            );
        }
    }
}

/// Recomputes the change fields and direction of `record` against a
/// previous-close baseline.
pub fn refresh_change(record: &mut StockRecord, prev_close: f64) {
    record.prev_close = Some(prev_close);
    record.price_change = Some(record.current_price - prev_close);
    record.price_change_percent = Some((record.current_price - prev_close) / prev_close * 100.0);
    record.direction = if record.current_price > prev_close {
        Direction::Up
    } else if record.current_price < prev_close {
        Direction::Down
    } else {
        Direction::Neutral
    };
}
