// Raw snapshot and diff records handed to the merge engine by any feed
use serde::{Deserialize, Serialize};

use super::price_level::RawLevel;

/// Full replacement view of both sides at a point in time
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRecord {
    pub bids: Vec<RawLevel>,
    pub asks: Vec<RawLevel>,
    #[serde(default)]
    pub last_update_id: u64,
    #[serde(default)]
    pub symbol: String,
    /// Milliseconds since epoch
    #[serde(default)]
    pub timestamp: i64,
}

/// Incremental set of level changes since the previous update
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffRecord {
    #[serde(default = "default_event_type")]
    pub event_type: String,
    /// Milliseconds since epoch
    pub event_time: i64,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub first_update_id: u64,
    #[serde(default)]
    pub final_update_id: u64,
    #[serde(default)]
    pub bids: Vec<RawLevel>,
    #[serde(default)]
    pub asks: Vec<RawLevel>,
}

fn default_event_type() -> String {
    "depthUpdate".to_string()
}

impl DiffRecord {
    pub fn new(symbol: &str, event_time: i64, bids: Vec<RawLevel>, asks: Vec<RawLevel>) -> Self {
        Self {
            event_type: default_event_type(),
            event_time,
            symbol: symbol.to_string(),
            first_update_id: 0,
            final_update_id: 0,
            bids,
            asks,
        }
    }

    /// Number of level directives carried by this diff
    pub fn len(&self) -> usize {
        self.bids.len() + self.asks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}
