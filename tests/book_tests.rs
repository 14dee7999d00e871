use std::collections::BTreeMap;

use anyhow::Result;
use proptest::prelude::*;

use depth_pressure::book::merge::{apply_diff, apply_snapshot};
use depth_pressure::book::BookEngine;
use depth_pressure::domain::model::depth::{DiffRecord, SnapshotRecord};
use depth_pressure::domain::model::order_book::{OrderBookState, PriceRange};
use depth_pressure::domain::model::price_level::RawLevel;

// Prices live on a cent grid so the text form parses to one exact f64
fn price_text(cents: u32) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

fn raw_levels(levels: &[(u32, u32)]) -> Vec<RawLevel> {
    levels
        .iter()
        .map(|(cents, qty)| RawLevel::new(price_text(*cents), qty.to_string()))
        .collect()
}

fn check_invariants(book: &OrderBookState) {
    assert!(book.bids().windows(2).all(|w| w[0].price > w[1].price), "bids not descending");
    assert!(book.asks().windows(2).all(|w| w[0].price < w[1].price), "asks not ascending");
    assert!(book.bids().iter().chain(book.asks()).all(|l| l.price > 0.0 && l.quantity > 0.0));

    if book.is_empty() {
        assert_eq!(book.max_quantity(), 1.0);
        assert_eq!(book.price_range(), PriceRange { min: 0.0, max: 1.0 });
        return;
    }
    let all: Vec<_> = book.bids().iter().chain(book.asks()).collect();
    let max_qty = all.iter().map(|l| l.quantity).fold(f64::MIN, f64::max);
    let min_price = all.iter().map(|l| l.price).fold(f64::MAX, f64::min);
    let max_price = all.iter().map(|l| l.price).fold(f64::MIN, f64::max);
    assert_eq!(book.max_quantity(), max_qty);
    assert_eq!(book.price_range(), PriceRange { min: min_price, max: max_price });
}

fn model_prices(model: &BTreeMap<u32, u32>, descending: bool) -> Vec<f64> {
    let mut prices: Vec<f64> = model.keys().map(|c| price_text(*c).parse().unwrap()).collect();
    if descending {
        prices.reverse();
    }
    prices
}

fn side_strategy(max_len: usize) -> impl Strategy<Value = Vec<(u32, u32)>> {
    prop::collection::vec((1u32..400, 0u32..20), 0..max_len)
}

proptest! {
    #[test]
    fn merged_book_matches_reference_model(
        snapshot_bids in side_strategy(30),
        snapshot_asks in side_strategy(30),
        diffs in prop::collection::vec((side_strategy(6), side_strategy(6)), 0..25),
    ) {
        let snapshot = SnapshotRecord {
            bids: raw_levels(&snapshot_bids),
            asks: raw_levels(&snapshot_asks),
            last_update_id: 1,
            symbol: "TESTUSDT".to_string(),
            timestamp: 1,
        };
        let mut book = apply_snapshot(&snapshot);
        check_invariants(&book);

        let mut bids: BTreeMap<u32, u32> = BTreeMap::new();
        let mut asks: BTreeMap<u32, u32> = BTreeMap::new();
        for (cents, qty) in &snapshot_bids {
            if *qty > 0 {
                bids.insert(*cents, *qty);
            }
        }
        for (cents, qty) in &snapshot_asks {
            if *qty > 0 {
                asks.insert(*cents, *qty);
            }
        }

        for (i, (diff_bids, diff_asks)) in diffs.iter().enumerate() {
            book = apply_diff(&book, &raw_levels(diff_bids), &raw_levels(diff_asks), 2 + i as i64);
            check_invariants(&book);

            for (model, changes) in [(&mut bids, diff_bids), (&mut asks, diff_asks)] {
                for (cents, qty) in changes {
                    if *qty == 0 {
                        model.remove(cents);
                    } else {
                        model.insert(*cents, *qty);
                    }
                }
            }
        }

        let book_bids: Vec<f64> = book.bids().iter().map(|l| l.price).collect();
        let book_asks: Vec<f64> = book.asks().iter().map(|l| l.price).collect();
        prop_assert_eq!(book_bids, model_prices(&bids, true));
        prop_assert_eq!(book_asks, model_prices(&asks, false));
    }

    #[test]
    fn replaying_a_diff_is_idempotent(
        levels in side_strategy(20),
        changes in side_strategy(8),
    ) {
        let snapshot = SnapshotRecord {
            bids: raw_levels(&levels),
            asks: vec![],
            last_update_id: 1,
            symbol: String::new(),
            timestamp: 1,
        };
        let book = apply_snapshot(&snapshot);
        let once = apply_diff(&book, &raw_levels(&changes), &[], 2);
        let twice = apply_diff(&once, &raw_levels(&changes), &[], 2);
        prop_assert_eq!(once, twice);
    }
}

#[test]
fn test_delete_only_removes_target() -> Result<()> {
    let snapshot = SnapshotRecord {
        bids: raw_levels(&[(10000, 1), (9950, 2), (9900, 3)]),
        asks: raw_levels(&[(10050, 1), (10100, 2)]),
        last_update_id: 1,
        symbol: "BTCUSDT".to_string(),
        timestamp: 1,
    };
    let book = apply_snapshot(&snapshot);
    let next = apply_diff(&book, &raw_levels(&[(9950, 0)]), &[], 2);

    assert_eq!(next.bids().len(), 2);
    assert_eq!(next.bids()[0], book.bids()[0]);
    assert_eq!(next.bids()[1], book.bids()[2]);
    assert_eq!(next.asks(), book.asks());
    Ok(())
}

#[test]
fn test_numeric_and_textual_levels_mix() -> Result<()> {
    let json = r#"{
        "bids": [["100.5", "2"], [100.0, 1.5], [null, "1"]],
        "asks": [[101.0, "3"]],
        "lastUpdateId": 7,
        "symbol": "BTCUSDT",
        "timestamp": 10
    }"#;
    let snapshot: SnapshotRecord = serde_json::from_str(json)?;
    let book = apply_snapshot(&snapshot);
    assert_eq!(book.bids().len(), 2);
    assert_eq!(book.bids()[1].quantity, 1.5);
    assert_eq!(book.max_quantity(), 3.0);
    Ok(())
}

#[test]
fn test_engine_history_is_bounded() -> Result<()> {
    let mut engine = BookEngine::new(3);
    let snapshot = SnapshotRecord {
        bids: raw_levels(&[(10000, 1)]),
        asks: raw_levels(&[(10100, 1)]),
        last_update_id: 1,
        symbol: "BTCUSDT".to_string(),
        timestamp: 100,
    };
    let mut state = engine.apply_snapshot(&snapshot);
    for t in 101..110 {
        let diff = DiffRecord::new("BTCUSDT", t, raw_levels(&[(9000 + t as u32, 1)]), vec![]);
        state = engine.apply_diff(&state, &diff);
    }

    let history = engine.history();
    assert_eq!(history.len(), 3);
    assert_eq!(history.oldest_timestamp(), Some(107));
    assert!(history.get(100).is_none());
    assert_eq!(history.latest().map(|s| s.timestamp()), Some(109));
    Ok(())
}
