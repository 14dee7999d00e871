use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::domain::errors::FeedError;
use crate::domain::model::depth::{DiffRecord, SnapshotRecord};

/// Live diff stream. Dropping it releases the underlying subscription.
pub type DiffStream = BoxStream<'static, Result<DiffRecord, FeedError>>;

/// Narrow interface to a live market-data source
#[async_trait]
pub trait MarketFeed: Send + Sync {
    /// One-shot depth snapshot for `symbol`, at most `depth` levels per side
    async fn fetch_snapshot(&self, symbol: &str, depth: usize) -> Result<SnapshotRecord, FeedError>;

    /// Open a diff subscription for `symbol`
    async fn subscribe(&self, symbol: &str) -> Result<DiffStream, FeedError>;

    /// Short name used in logs
    fn name(&self) -> &str;
}
