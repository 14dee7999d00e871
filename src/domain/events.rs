use std::sync::Arc;

use crate::domain::enums::ConnectionState;
use crate::domain::model::order_book::OrderBookState;
use crate::domain::model::zone::ZoneReport;

/// Notifications broadcast by the feed to its subscribers
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// A new book state was published
    Data(Arc<OrderBookState>),
    /// Zones recomputed for the latest book
    Zones(Arc<ZoneReport>),
    /// Informational status, e.g. entering demo mode
    Status(String),
    /// A processing failure the caller should see
    Error(String),
    StateChanged(ConnectionState),
}
