use anyhow::Result;
use serde_json::json;

use depth_pressure::book::merge::{apply_diff, apply_snapshot};
use depth_pressure::domain::errors::FeedError;
use depth_pressure::infrastructure::exchange::binance::parsers::{BinanceMessage, BinanceParser};

#[test]
fn test_parse_depth_update() -> Result<()> {
    let text = json!({
        "e": "depthUpdate",
        "E": 1700000000123i64,
        "s": "BTCUSDT",
        "U": 157,
        "u": 160,
        "b": [["43250.10", "0.500"], ["43249.00", "0.000"]],
        "a": [["43251.00", "1.25"]]
    })
    .to_string();

    let diff = match BinanceParser::parse_message(&text)? {
        BinanceMessage::DepthUpdate(diff) => diff,
        other => panic!("Expected depth update, got {:?}", other),
    };

    assert_eq!(diff.event_type, "depthUpdate");
    assert_eq!(diff.event_time, 1700000000123);
    assert_eq!(diff.symbol, "BTCUSDT");
    assert_eq!(diff.first_update_id, 157);
    assert_eq!(diff.final_update_id, 160);
    assert_eq!(diff.bids.len(), 2);
    assert_eq!(diff.bids[0].price(), 43250.10);
    assert_eq!(diff.bids[1].quantity(), 0.0);
    assert_eq!(diff.asks[0].quantity(), 1.25);
    Ok(())
}

#[test]
fn test_parse_combined_stream_envelope() -> Result<()> {
    let text = json!({
        "stream": "btcusdt@depth@100ms",
        "data": {
            "e": "depthUpdate",
            "E": 5,
            "s": "BTCUSDT",
            "U": 1,
            "u": 2,
            "b": [],
            "a": [["101", "2"]]
        }
    })
    .to_string();

    match BinanceParser::parse_message(&text)? {
        BinanceMessage::DepthUpdate(diff) => {
            assert_eq!(diff.event_time, 5);
            assert!(diff.bids.is_empty());
            assert_eq!(diff.asks.len(), 1);
        }
        other => panic!("Expected depth update, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_parse_subscription_result() -> Result<()> {
    let msg = BinanceParser::parse_message(r#"{"result":null,"id":1}"#)?;
    assert_eq!(msg, BinanceMessage::SubscriptionResult { id: 1 });
    Ok(())
}

#[test]
fn test_unknown_message_is_not_an_error() -> Result<()> {
    let msg = BinanceParser::parse_message(r#"{"e":"trade","E":1,"s":"BTCUSDT"}"#)?;
    assert!(matches!(msg, BinanceMessage::Unknown(_)));
    Ok(())
}

#[test]
fn test_malformed_payloads_are_decode_errors() {
    let err = BinanceParser::parse_message("not json").unwrap_err();
    assert!(matches!(err, FeedError::Decode(_)));
    assert!(!err.is_transport());

    // depthUpdate missing its event time
    let err = BinanceParser::parse_message(r#"{"e":"depthUpdate","s":"BTCUSDT","U":1,"u":2}"#)
        .unwrap_err();
    assert!(matches!(err, FeedError::Decode(_)));
}

#[test]
fn test_parse_snapshot_truncates_to_depth() -> Result<()> {
    let body = json!({
        "lastUpdateId": 1027024,
        "bids": [["4.00000000", "431.00000000"], ["3.90000000", "12.00000000"], ["3.80000000", "1.00000000"]],
        "asks": [["4.00000200", "12.00000000"], ["4.10000000", "3.00000000"]]
    })
    .to_string();

    let snapshot = BinanceParser::parse_snapshot("BNBBTC", &body, 2, 1_700_000_000_000)?;
    assert_eq!(snapshot.last_update_id, 1027024);
    assert_eq!(snapshot.symbol, "BNBBTC");
    assert_eq!(snapshot.timestamp, 1_700_000_000_000);
    assert_eq!(snapshot.bids.len(), 2);
    assert_eq!(snapshot.asks.len(), 2);
    Ok(())
}

#[test]
fn test_snapshot_then_stream_diff() -> Result<()> {
    let body = json!({
        "lastUpdateId": 10,
        "bids": [["100.00", "1.0"], ["99.50", "2.0"]],
        "asks": [["100.50", "1.0"]]
    })
    .to_string();
    let book = apply_snapshot(&BinanceParser::parse_snapshot("BTCUSDT", &body, 50, 1)?);

    let text = json!({
        "e": "depthUpdate", "E": 2, "s": "BTCUSDT", "U": 11, "u": 12,
        "b": [["99.50", "0.0"], ["99.75", "3.0"]],
        "a": [["100.50", "4.0"]]
    })
    .to_string();
    let diff = match BinanceParser::parse_message(&text)? {
        BinanceMessage::DepthUpdate(diff) => diff,
        other => panic!("Expected depth update, got {:?}", other),
    };
    let next = apply_diff(&book, &diff.bids, &diff.asks, diff.event_time);

    let bid_prices: Vec<f64> = next.bids().iter().map(|l| l.price).collect();
    assert_eq!(bid_prices, vec![100.0, 99.75]);
    assert_eq!(next.asks()[0].quantity, 4.0);
    assert_eq!(next.max_quantity(), 4.0);
    Ok(())
}
