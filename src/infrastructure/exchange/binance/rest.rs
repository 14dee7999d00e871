use std::time::Duration;

use chrono::Utc;
use log::debug;

use crate::domain::constants::BINANCE_DEPTH_LIMITS;
use crate::domain::errors::FeedError;
use crate::domain::model::depth::SnapshotRecord;

use super::parsers::BinanceParser;

/// REST client for the depth snapshot endpoint
pub struct BinanceRestClient {
    http: reqwest::Client,
    base_url: String,
}

impl BinanceRestClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Transport(format!("HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Smallest accepted limit that covers `depth`
    pub fn depth_limit(depth: usize) -> usize {
        BINANCE_DEPTH_LIMITS
            .iter()
            .copied()
            .find(|limit| *limit >= depth)
            .unwrap_or(BINANCE_DEPTH_LIMITS[BINANCE_DEPTH_LIMITS.len() - 1])
    }

    pub fn depth_url(&self) -> String {
        format!("{}/api/v3/depth", self.base_url)
    }

    /// Fetch a snapshot, stamped with the local wall clock
    pub async fn fetch_depth(&self, symbol: &str, depth: usize) -> Result<SnapshotRecord, FeedError> {
        let limit = Self::depth_limit(depth);
        debug!("GET {} symbol={} limit={}", self.depth_url(), symbol, limit);

        let response = self
            .http
            .get(self.depth_url())
            .query(&[("symbol", symbol.to_string()), ("limit", limit.to_string())])
            .send()
            .await
            .map_err(|e| FeedError::Snapshot(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FeedError::Snapshot(e.to_string()))?;

        if !status.is_success() {
            return match BinanceParser::parse_snapshot(symbol, &body, depth, 0) {
                Err(e) => Err(e),
                Ok(_) => Err(FeedError::Snapshot(format!("HTTP {}", status))),
            };
        }

        BinanceParser::parse_snapshot(symbol, &body, depth, Utc::now().timestamp_millis())
    }
}
