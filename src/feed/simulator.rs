//! Synthetic depth source used when the live feed is unavailable.
//!
//! The generator is deterministic for a given symbol: the same sequence of
//! calls yields the same snapshots and diffs. Diffs are built against the
//! book they will be applied to, so updates hit existing levels exactly and
//! inserts never cross the spread.

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::book::merge::merge_side;
use crate::domain::constants::DEFAULT_DEPTH;
use crate::domain::enums::BookSide;
use crate::domain::model::depth::{DiffRecord, SnapshotRecord};
use crate::domain::model::order_book::OrderBookState;
use crate::domain::model::price_level::{PriceLevel, RawLevel};

// Probabilities per generated change
const UPDATE_SHARE: f64 = 0.55;
const DELETE_SHARE: f64 = 0.2;
const WALL_CHANCE: f64 = 0.05;
const SPIKE_CHANCE: f64 = 0.04;
const SPIKE_FACTOR: f64 = 15.0;

/// Price shape of a symbol family
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymbolProfile {
    pub base_price: f64,
    pub tick: f64,
    /// Distance between adjacent generated levels, in ticks
    pub step_ticks: u32,
    /// Typical level size
    pub unit_quantity: f64,
}

impl SymbolProfile {
    pub fn for_symbol(symbol: &str) -> Self {
        let symbol = symbol.to_ascii_uppercase();
        let (base_price, step_ticks, unit_quantity) = if symbol.starts_with("BTC") {
            (43_250.0, 50, 0.5)
        } else if symbol.starts_with("ETH") {
            (2_280.0, 10, 5.0)
        } else if symbol.starts_with("SOL") {
            (100.0, 1, 50.0)
        } else if symbol.starts_with("BNB") {
            (310.0, 2, 20.0)
        } else {
            (100.0, 1, 10.0)
        };
        Self {
            base_price,
            tick: 0.01,
            step_ticks,
            unit_quantity,
        }
    }

    pub fn step(&self) -> f64 {
        self.tick * self.step_ticks as f64
    }
}

/// Stateful generator of snapshots and diffs for one symbol
#[derive(Debug, Clone)]
pub struct MarketSimulator {
    symbol: String,
    profile: SymbolProfile,
    depth: usize,
    rng: StdRng,
    update_id: u64,
}

impl MarketSimulator {
    pub fn new(symbol: &str, depth: usize) -> Self {
        let symbol = symbol.to_ascii_uppercase();
        Self {
            profile: SymbolProfile::for_symbol(&symbol),
            rng: StdRng::seed_from_u64(seed_for(&symbol)),
            symbol,
            depth: if depth == 0 { DEFAULT_DEPTH } else { depth },
            update_id: 0,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn profile(&self) -> &SymbolProfile {
        &self.profile
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Full book of `depth` levels per side around the base price
    pub fn snapshot(&mut self, timestamp: i64) -> SnapshotRecord {
        let step = self.profile.step();
        let mid = self.round(self.profile.base_price);

        let mut bids = Vec::with_capacity(self.depth);
        let mut asks = Vec::with_capacity(self.depth);
        for i in 0..self.depth {
            let offset = step * (i as f64 + 1.0);
            let bid_qty = self.level_quantity();
            let ask_qty = self.level_quantity();
            bids.push(RawLevel::new(self.format_price(mid - offset), format_quantity(bid_qty)));
            asks.push(RawLevel::new(self.format_price(mid + offset), format_quantity(ask_qty)));
        }

        self.update_id += 1;
        SnapshotRecord {
            bids,
            asks,
            last_update_id: self.update_id,
            symbol: self.symbol.clone(),
            timestamp,
        }
    }

    /// Re-center the generator on an existing book, e.g. the last live state
    pub fn anchor(&mut self, book: &OrderBookState) {
        let anchor = book
            .mid_price()
            .or_else(|| book.best_bid().map(|l| l.price))
            .or_else(|| book.best_ask().map(|l| l.price));
        if let Some(price) = anchor {
            debug!("Simulator for {} anchored at {}", self.symbol, price);
            self.profile.base_price = price;
        }
    }

    /// Next batch of level changes for `book`
    pub fn next_diff(&mut self, book: &OrderBookState, timestamp: i64) -> DiffRecord {
        let bids = self.side_changes(book, BookSide::Bid, timestamp);
        let asks = self.side_changes(book, BookSide::Ask, timestamp);

        let first_update_id = self.update_id + 1;
        self.update_id += 1;
        DiffRecord {
            first_update_id,
            final_update_id: self.update_id,
            ..DiffRecord::new(&self.symbol, timestamp, bids, asks)
        }
    }

    fn side_changes(&mut self, book: &OrderBookState, side: BookSide, timestamp: i64) -> Vec<RawLevel> {
        let levels = book.side(side);
        let changes = self.rng.gen_range(1..=3);
        let mut out = Vec::with_capacity(changes + 1);

        for _ in 0..changes {
            let roll: f64 = self.rng.gen();
            if !levels.is_empty() && roll < UPDATE_SHARE {
                let level = levels[self.rng.gen_range(0..levels.len())];
                out.push(self.update(level));
            } else if levels.len() > self.depth / 2 && roll < UPDATE_SHARE + DELETE_SHARE {
                let level = levels[self.rng.gen_range(0..levels.len())];
                out.push(RawLevel::new(level.price.to_string(), "0"));
            } else {
                let price = self.insert_price(book, side);
                let qty = self.level_quantity();
                out.push(RawLevel::new(self.format_price(price), format_quantity(qty)));
            }
        }

        // trim the tail so the side never grows past its depth
        let merged = merge_side(levels, &out, side, timestamp);
        if merged.len() > self.depth {
            for level in &merged[self.depth..] {
                out.push(RawLevel::new(level.price.to_string(), "0"));
            }
        }
        out
    }

    fn update(&mut self, level: PriceLevel) -> RawLevel {
        let mut qty = level.quantity * self.rng.gen_range(0.5..1.5);
        if self.rng.gen_bool(SPIKE_CHANCE) {
            qty *= SPIKE_FACTOR;
        }
        let qty = qty.max(self.profile.unit_quantity * 0.01);
        // the stored price text round-trips to the identical f64
        RawLevel::new(level.price.to_string(), format_quantity(qty))
    }

    // Improve the best price when the spread leaves room, else extend the tail
    fn insert_price(&mut self, book: &OrderBookState, side: BookSide) -> f64 {
        let step = self.profile.step();
        let best_bid = book.best_bid().map(|l| l.price);
        let best_ask = book.best_ask().map(|l| l.price);
        let has_room = match (best_bid, best_ask) {
            (Some(bid), Some(ask)) => ask - bid > 2.0 * step + self.profile.tick / 2.0,
            _ => false,
        };
        let improve = has_room && self.rng.gen_bool(0.5);

        match side {
            BookSide::Bid => match (best_bid, book.bids().last()) {
                (Some(best), _) if improve => best + step,
                (_, Some(worst)) => worst.price - step,
                _ => best_ask.unwrap_or(self.profile.base_price) - step,
            },
            BookSide::Ask => match (best_ask, book.asks().last()) {
                (Some(best), _) if improve => best - step,
                (_, Some(worst)) => worst.price + step,
                _ => best_bid.unwrap_or(self.profile.base_price) + step,
            },
        }
    }

    fn level_quantity(&mut self) -> f64 {
        let mut qty = self.profile.unit_quantity * self.rng.gen_range(0.2..2.0);
        if self.rng.gen_bool(WALL_CHANCE) {
            qty *= 10.0;
        }
        qty
    }

    fn round(&self, price: f64) -> f64 {
        (price / self.profile.tick).round() * self.profile.tick
    }

    fn format_price(&self, price: f64) -> String {
        let price = self.round(price).max(self.profile.tick);
        format!("{:.*}", tick_decimals(self.profile.tick), price)
    }
}

fn format_quantity(qty: f64) -> String {
    format!("{:.4}", qty)
}

fn tick_decimals(tick: f64) -> usize {
    let mut decimals = 0;
    let mut scaled = tick;
    while decimals < 8 && (scaled - scaled.round()).abs() > 1e-9 {
        scaled *= 10.0;
        decimals += 1;
    }
    decimals
}

// FNV-1a, stable across runs and platforms
fn seed_for(symbol: &str) -> u64 {
    symbol
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325, |hash, byte| (hash ^ byte as u64).wrapping_mul(0x0100_0000_01b3))
}
