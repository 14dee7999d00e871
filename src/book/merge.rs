//! Incremental merge engine
//!
//! Turns raw snapshots into an `OrderBookState` and folds diffs into an
//! existing state. Each call returns a fresh state; the input is never
//! touched, so readers holding an `Arc` to the previous value are unaffected.

use std::sync::Arc;

use log::debug;

use crate::domain::enums::BookSide;
use crate::domain::model::depth::{DiffRecord, SnapshotRecord};
use crate::domain::model::order_book::{side_order, OrderBookState};
use crate::domain::model::price_level::{
    parse_diff_level, parse_snapshot_level, LevelDirective, PriceLevel, RawLevel,
};

use super::history::BookHistory;

/// Parse and validate a snapshot into a sorted state
pub fn apply_snapshot(raw: &SnapshotRecord) -> OrderBookState {
    let bids: Vec<PriceLevel> = raw
        .bids
        .iter()
        .filter_map(|level| parse_snapshot_level(level, raw.timestamp))
        .collect();
    let asks: Vec<PriceLevel> = raw
        .asks
        .iter()
        .filter_map(|level| parse_snapshot_level(level, raw.timestamp))
        .collect();

    let dropped = raw.bids.len() + raw.asks.len() - bids.len() - asks.len();
    if dropped > 0 {
        debug!("Snapshot for {}: dropped {} invalid levels", raw.symbol, dropped);
    }

    OrderBookState::from_levels(bids, asks, raw.timestamp)
}

/// Apply one diff's level directives to `state` and return the new state
pub fn apply_diff(
    state: &OrderBookState,
    bids: &[RawLevel],
    asks: &[RawLevel],
    event_time: i64,
) -> OrderBookState {
    let new_bids = merge_side(state.bids(), bids, BookSide::Bid, event_time);
    let new_asks = merge_side(state.asks(), asks, BookSide::Ask, event_time);
    OrderBookState::from_sorted(new_bids, new_asks, event_time)
}

/// Merge diff levels into one side, preserving its ordering
pub fn merge_side(
    current: &[PriceLevel],
    changes: &[RawLevel],
    side: BookSide,
    event_time: i64,
) -> Vec<PriceLevel> {
    let mut levels = current.to_vec();

    for raw in changes {
        let Some(directive) = parse_diff_level(raw, event_time) else {
            debug!("Skipping malformed {} level [{}, {}]", side, raw.0, raw.1);
            continue;
        };

        match directive {
            LevelDirective::Delete(price) => {
                if let Ok(idx) = find(&levels, side, price) {
                    levels.remove(idx);
                }
            }
            LevelDirective::Upsert(level) => match find(&levels, side, level.price) {
                Ok(idx) => levels[idx] = level,
                Err(idx) => levels.insert(idx, level),
            },
        }
    }

    levels
}

// Exact match on the parsed price; Err carries the insertion point
fn find(levels: &[PriceLevel], side: BookSide, price: f64) -> Result<usize, usize> {
    levels.binary_search_by(|l| side_order(side, l.price, price))
}

/// Merge engine bound to its history buffer.
///
/// Every state it produces is recorded under the timestamp of the snapshot
/// or diff that produced it.
#[derive(Debug)]
pub struct BookEngine {
    history: BookHistory,
    /// Levels kept per side; `None` keeps everything
    max_depth: Option<usize>,
}

impl BookEngine {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            history: BookHistory::new(history_capacity),
            max_depth: None,
        }
    }

    /// Cut every produced state to the best `depth` levels per side.
    ///
    /// Levels dropped this way are forgotten: a later delete nearer the
    /// touch does not bring them back.
    pub fn set_max_depth(&mut self, depth: Option<usize>) {
        self.max_depth = depth.map(|d| d.max(1));
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    pub fn apply_snapshot(&mut self, raw: &SnapshotRecord) -> Arc<OrderBookState> {
        let state = Arc::new(self.limit(apply_snapshot(raw)));
        self.history.record(raw.timestamp, state.clone());
        state
    }

    pub fn apply_diff(&mut self, state: &OrderBookState, diff: &DiffRecord) -> Arc<OrderBookState> {
        let next = apply_diff(state, &diff.bids, &diff.asks, diff.event_time);
        let next = Arc::new(self.limit(next));
        self.history.record(diff.event_time, next.clone());
        next
    }

    fn limit(&self, state: OrderBookState) -> OrderBookState {
        match self.max_depth {
            Some(depth) if state.bids().len() > depth || state.asks().len() > depth => {
                state.truncated(depth)
            }
            _ => state,
        }
    }

    pub fn history(&self) -> &BookHistory {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}
