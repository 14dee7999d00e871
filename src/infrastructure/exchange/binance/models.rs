// Models for Binance REST and stream payloads
use serde::Deserialize;

use crate::domain::model::depth::DiffRecord;
use crate::domain::model::price_level::RawLevel;

/// `GET /api/v3/depth` response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepthSnapshotResponse {
    pub last_update_id: u64,
    pub bids: Vec<RawLevel>,
    pub asks: Vec<RawLevel>,
}

/// `<symbol>@depth` stream event
#[derive(Debug, Deserialize)]
pub struct DepthUpdateEvent {
    #[serde(rename = "e")]
    pub event_type: String,
    #[serde(rename = "E")]
    pub event_time: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "U")]
    pub first_update_id: u64,
    #[serde(rename = "u")]
    pub final_update_id: u64,
    #[serde(rename = "b", default)]
    pub bids: Vec<RawLevel>,
    #[serde(rename = "a", default)]
    pub asks: Vec<RawLevel>,
}

impl From<DepthUpdateEvent> for DiffRecord {
    fn from(event: DepthUpdateEvent) -> Self {
        DiffRecord {
            event_type: event.event_type,
            event_time: event.event_time,
            symbol: event.symbol,
            first_update_id: event.first_update_id,
            final_update_id: event.final_update_id,
            bids: event.bids,
            asks: event.asks,
        }
    }
}

/// Error body returned by REST and by stream requests
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub code: i64,
    pub msg: String,
}
