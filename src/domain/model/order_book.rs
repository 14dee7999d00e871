// Domain model for the processed order book consumed by renderers and analytics
use std::cmp::Ordering;

use serde::Serialize;

use crate::domain::constants::{EMPTY_MAX_QUANTITY, EMPTY_PRICE_MAX, EMPTY_PRICE_MIN};
use crate::domain::enums::BookSide;

use super::price_level::PriceLevel;

/// Lowest and highest price over both sides
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    pub fn empty() -> Self {
        Self { min: EMPTY_PRICE_MIN, max: EMPTY_PRICE_MAX }
    }
}

/// Immutable view of the book.
///
/// Bids are strictly descending by price, asks strictly ascending, with no
/// duplicate prices on either side. `max_quantity` and `price_range` always
/// describe the levels actually held. Every mutation produces a new value.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBookState {
    bids: Vec<PriceLevel>,
    asks: Vec<PriceLevel>,
    max_quantity: f64,
    price_range: PriceRange,
    timestamp: i64,
}

impl Default for OrderBookState {
    fn default() -> Self {
        Self::from_sorted(Vec::new(), Vec::new(), 0)
    }
}

/// Ordering that places the best level first on the given side
pub(crate) fn side_order(side: BookSide, a: f64, b: f64) -> Ordering {
    match side {
        BookSide::Bid => b.total_cmp(&a),
        BookSide::Ask => a.total_cmp(&b),
    }
}

impl OrderBookState {
    /// Build a state from unordered levels.
    ///
    /// Levels are sorted best-first; when a price appears more than once the
    /// last occurrence wins.
    pub fn from_levels(bids: Vec<PriceLevel>, asks: Vec<PriceLevel>, timestamp: i64) -> Self {
        Self::from_sorted(
            sort_side(bids, BookSide::Bid),
            sort_side(asks, BookSide::Ask),
            timestamp,
        )
    }

    /// Build a state from sides that already satisfy the ordering invariant
    pub(crate) fn from_sorted(bids: Vec<PriceLevel>, asks: Vec<PriceLevel>, timestamp: i64) -> Self {
        let (max_quantity, price_range) = aggregates(&bids, &asks);
        Self {
            bids,
            asks,
            max_quantity,
            price_range,
            timestamp,
        }
    }

    pub fn bids(&self) -> &[PriceLevel] {
        &self.bids
    }

    pub fn asks(&self) -> &[PriceLevel] {
        &self.asks
    }

    pub fn side(&self, side: BookSide) -> &[PriceLevel] {
        match side {
            BookSide::Bid => &self.bids,
            BookSide::Ask => &self.asks,
        }
    }

    pub fn max_quantity(&self) -> f64 {
        self.max_quantity
    }

    pub fn price_range(&self) -> PriceRange {
        self.price_range
    }

    /// Milliseconds since epoch of the update that produced this state
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    pub fn level_count(&self) -> usize {
        self.bids.len() + self.asks.len()
    }

    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.asks.first()
    }

    pub fn spread(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.price - bid.price),
            _ => None,
        }
    }

    pub fn mid_price(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid.price + ask.price) / 2.0),
            _ => None,
        }
    }

    pub fn total_volume(&self, side: BookSide) -> f64 {
        self.side(side).iter().map(|l| l.quantity).sum()
    }

    /// Bid volume minus ask volume over their sum, in [-1, 1]
    pub fn imbalance(&self) -> Option<f64> {
        let bid = self.total_volume(BookSide::Bid);
        let ask = self.total_volume(BookSide::Ask);
        let total = bid + ask;
        if total > 0.0 {
            Some((bid - ask) / total)
        } else {
            None
        }
    }

    /// Level at exactly this price, if held
    pub fn level_at(&self, side: BookSide, price: f64) -> Option<&PriceLevel> {
        let levels = self.side(side);
        levels
            .binary_search_by(|l| side_order(side, l.price, price))
            .ok()
            .map(|idx| &levels[idx])
    }

    /// Copy limited to the best `max_levels` per side
    pub fn truncated(&self, max_levels: usize) -> OrderBookState {
        let bids = self.bids.iter().take(max_levels).copied().collect();
        let asks = self.asks.iter().take(max_levels).copied().collect();
        Self::from_sorted(bids, asks, self.timestamp)
    }
}

fn sort_side(mut levels: Vec<PriceLevel>, side: BookSide) -> Vec<PriceLevel> {
    // stable sort keeps arrival order among equal prices, so the last one is kept below
    levels.sort_by(|a, b| side_order(side, a.price, b.price));
    let mut out: Vec<PriceLevel> = Vec::with_capacity(levels.len());
    for level in levels {
        match out.last_mut() {
            Some(prev) if prev.price == level.price => *prev = level,
            _ => out.push(level),
        }
    }
    out
}

fn aggregates(bids: &[PriceLevel], asks: &[PriceLevel]) -> (f64, PriceRange) {
    let mut levels = bids.iter().chain(asks.iter()).peekable();
    if levels.peek().is_none() {
        return (EMPTY_MAX_QUANTITY, PriceRange::empty());
    }

    let mut max_quantity = f64::MIN;
    let mut min = f64::MAX;
    let mut max = f64::MIN;
    for level in levels {
        max_quantity = max_quantity.max(level.quantity);
        min = min.min(level.price);
        max = max.max(level.price);
    }
    (max_quantity, PriceRange { min, max })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lvl(price: f64, quantity: f64) -> PriceLevel {
        PriceLevel::new(price, quantity, 1)
    }

    #[test]
    fn test_empty_book_aggregates() {
        let book = OrderBookState::default();
        assert!(book.is_empty());
        assert_eq!(book.max_quantity(), 1.0);
        assert_eq!(book.price_range(), PriceRange { min: 0.0, max: 1.0 });
        assert!(book.mid_price().is_none());
        assert!(book.spread().is_none());
        assert!(book.imbalance().is_none());
    }

    #[test]
    fn test_from_levels_sorts_each_side() {
        let book = OrderBookState::from_levels(
            vec![lvl(99.0, 1.0), lvl(100.0, 2.0), lvl(98.0, 3.0)],
            vec![lvl(103.0, 1.0), lvl(101.0, 4.0), lvl(102.0, 1.0)],
            5,
        );
        let bid_prices: Vec<f64> = book.bids().iter().map(|l| l.price).collect();
        let ask_prices: Vec<f64> = book.asks().iter().map(|l| l.price).collect();
        assert_eq!(bid_prices, vec![100.0, 99.0, 98.0]);
        assert_eq!(ask_prices, vec![101.0, 102.0, 103.0]);
        assert_eq!(book.max_quantity(), 4.0);
        assert_eq!(book.price_range(), PriceRange { min: 98.0, max: 103.0 });
        assert_eq!(book.spread(), Some(1.0));
        assert_eq!(book.mid_price(), Some(100.5));
    }

    #[test]
    fn test_duplicate_prices_keep_last() {
        let book = OrderBookState::from_levels(
            vec![lvl(100.0, 1.0), lvl(99.0, 1.0), lvl(100.0, 7.0)],
            vec![],
            1,
        );
        assert_eq!(book.bids().len(), 2);
        assert_eq!(book.bids()[0].quantity, 7.0);
    }

    #[test]
    fn test_level_lookup_and_truncation() {
        let book = OrderBookState::from_levels(
            vec![lvl(100.0, 1.0), lvl(99.0, 2.0), lvl(98.0, 3.0)],
            vec![lvl(101.0, 1.0), lvl(102.0, 2.0)],
            1,
        );
        assert_eq!(book.level_at(BookSide::Bid, 99.0).map(|l| l.quantity), Some(2.0));
        assert!(book.level_at(BookSide::Ask, 99.0).is_none());

        let top = book.truncated(1);
        assert_eq!(top.bids().len(), 1);
        assert_eq!(top.asks().len(), 1);
        assert_eq!(top.price_range(), PriceRange { min: 100.0, max: 101.0 });
    }

    #[test]
    fn test_imbalance() {
        let book = OrderBookState::from_levels(vec![lvl(100.0, 3.0)], vec![lvl(101.0, 1.0)], 1);
        assert_eq!(book.imbalance(), Some(0.5));
    }
}
