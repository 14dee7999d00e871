use std::fmt;

use serde::{Deserialize, Serialize};

/// Side of the book a level or zone belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookSide {
    Bid,
    Ask,
}

impl BookSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookSide::Bid => "bid",
            BookSide::Ask => "ask",
        }
    }
}

impl fmt::Display for BookSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a pressure zone represents.
///
/// Clusters are `Support` (bid) or `Resistance` (ask); single-level volume
/// spikes are `Accumulation` (bid) or `Distribution` (ask).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    Support,
    Resistance,
    Accumulation,
    Distribution,
}

impl ZoneKind {
    pub fn cluster_for(side: BookSide) -> Self {
        match side {
            BookSide::Bid => ZoneKind::Support,
            BookSide::Ask => ZoneKind::Resistance,
        }
    }

    pub fn spike_for(side: BookSide) -> Self {
        match side {
            BookSide::Bid => ZoneKind::Accumulation,
            BookSide::Ask => ZoneKind::Distribution,
        }
    }

    pub fn is_cluster(&self) -> bool {
        matches!(self, ZoneKind::Support | ZoneKind::Resistance)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneKind::Support => "support",
            ZoneKind::Resistance => "resistance",
            ZoneKind::Accumulation => "accumulation",
            ZoneKind::Distribution => "distribution",
        }
    }
}

impl fmt::Display for ZoneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Lifecycle of the feed; only the orchestrator moves it
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    LiveConnected,
    SimulatedFallback,
    Error,
}

impl ConnectionState {
    /// True while some source (live or simulated) is feeding diffs
    pub fn is_streaming(&self) -> bool {
        matches!(self, ConnectionState::LiveConnected | ConnectionState::SimulatedFallback)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::LiveConnected => "live_connected",
            ConnectionState::SimulatedFallback => "simulated_fallback",
            ConnectionState::Error => "error",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
