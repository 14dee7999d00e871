use thiserror::Error;

/// Errors raised by a market feed or while driving it.
///
/// Transport-class errors never surface as fatal: the orchestrator answers
/// them by falling back to the simulator. `Decode` is a processing failure
/// and counts toward the `Error` state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("snapshot fetch failed: {0}")]
    Snapshot(String),

    #[error("subscription failed: {0}")]
    Subscription(String),

    #[error("timed out after {0} ms")]
    Timeout(u64),

    #[error("live stream closed")]
    StreamClosed,

    #[error("malformed payload: {0}")]
    Decode(String),

    #[error("invalid symbol: {0:?}")]
    InvalidSymbol(String),
}

impl FeedError {
    /// Whether the error belongs to the network path rather than to the data
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FeedError::Transport(_)
                | FeedError::Snapshot(_)
                | FeedError::Subscription(_)
                | FeedError::Timeout(_)
                | FeedError::StreamClosed
        )
    }
}

/// Errors raised when a diff cannot be merged into the held book
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookError {
    #[error("no snapshot loaded; diff at {event_time} dropped")]
    MissingSnapshot { event_time: i64 },

    #[error("diff for {got} does not match book symbol {expected}")]
    SymbolMismatch { expected: String, got: String },
}
