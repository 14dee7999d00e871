use log::debug;
use serde_json::Value;

use crate::domain::errors::FeedError;
use crate::domain::model::depth::{DiffRecord, SnapshotRecord};

use super::models::{DepthSnapshotResponse, DepthUpdateEvent, ErrorBody};

/// One classified message from the Binance stream socket
#[derive(Debug, Clone, PartialEq)]
pub enum BinanceMessage {
    DepthUpdate(DiffRecord),
    /// Reply to a SUBSCRIBE / UNSUBSCRIBE request
    SubscriptionResult { id: u64 },
    Error { code: i64, message: String },
    Unknown(Value),
}

/// Parses Binance payloads into domain records
pub struct BinanceParser;

impl BinanceParser {
    /// Classify a text frame from the stream socket
    pub fn parse_message(text: &str) -> Result<BinanceMessage, FeedError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| FeedError::Decode(format!("invalid JSON: {}", e)))?;
        Self::classify(value)
    }

    fn classify(value: Value) -> Result<BinanceMessage, FeedError> {
        // Combined streams wrap the event as {"stream": .., "data": ..}
        if value.get("stream").is_some() {
            if let Some(data) = value.get("data") {
                return Self::classify(data.clone());
            }
        }

        if value.get("e").and_then(Value::as_str) == Some("depthUpdate") {
            return Self::parse_depth_update(value).map(BinanceMessage::DepthUpdate);
        }

        if let Some(error) = value.get("error") {
            let body: ErrorBody = serde_json::from_value(error.clone())
                .map_err(|e| FeedError::Decode(format!("invalid error body: {}", e)))?;
            return Ok(BinanceMessage::Error {
                code: body.code,
                message: body.msg,
            });
        }

        if value.get("result").is_some() {
            if let Some(id) = value.get("id").and_then(Value::as_u64) {
                return Ok(BinanceMessage::SubscriptionResult { id });
            }
        }

        debug!("Unclassified stream message: {}", value);
        Ok(BinanceMessage::Unknown(value))
    }

    /// Depth update event into a diff record
    pub fn parse_depth_update(value: Value) -> Result<DiffRecord, FeedError> {
        let event: DepthUpdateEvent = serde_json::from_value(value)
            .map_err(|e| FeedError::Decode(format!("invalid depthUpdate: {}", e)))?;
        Ok(event.into())
    }

    /// REST depth body into a snapshot, keeping at most `depth` levels per side
    pub fn parse_snapshot(
        symbol: &str,
        body: &str,
        depth: usize,
        timestamp: i64,
    ) -> Result<SnapshotRecord, FeedError> {
        if let Ok(error) = serde_json::from_str::<ErrorBody>(body) {
            return Err(FeedError::Snapshot(format!("{} ({})", error.msg, error.code)));
        }
        let mut response: DepthSnapshotResponse = serde_json::from_str(body)
            .map_err(|e| FeedError::Snapshot(format!("invalid depth body: {}", e)))?;
        response.bids.truncate(depth);
        response.asks.truncate(depth);

        Ok(SnapshotRecord {
            bids: response.bids,
            asks: response.asks,
            last_update_id: response.last_update_id,
            symbol: symbol.to_string(),
            timestamp,
        })
    }
}
