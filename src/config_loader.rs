use anyhow::{anyhow, Result};
use log::{debug, info};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::domain::constants::*;

/// Top-level configuration structure containing all config sections
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub app: AppInfo,
}

/// Market-data source and connection policy
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_symbol")]
    pub symbol: String,

    #[serde(default = "default_depth")]
    pub depth: usize,

    #[serde(default = "default_rest_base_url")]
    pub rest_base_url: String,

    #[serde(default = "default_ws_base_url")]
    pub ws_base_url: String,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_snapshot_timeout_ms")]
    pub snapshot_timeout_ms: u64,

    #[serde(default = "default_simulator_interval_ms")]
    pub simulator_interval_ms: u64,

    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
}

fn default_symbol() -> String {
    "BTCUSDT".to_string()
}

fn default_depth() -> usize {
    DEFAULT_DEPTH
}

fn default_rest_base_url() -> String {
    "https://api.binance.com".to_string()
}

fn default_ws_base_url() -> String {
    "wss://stream.binance.com:9443/ws".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    CONNECT_TIMEOUT_MS
}

fn default_snapshot_timeout_ms() -> u64 {
    SNAPSHOT_TIMEOUT_MS
}

fn default_simulator_interval_ms() -> u64 {
    SIMULATOR_INTERVAL_MS
}

fn default_max_consecutive_failures() -> u32 {
    MAX_CONSECUTIVE_FAILURES
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            depth: default_depth(),
            rest_base_url: default_rest_base_url(),
            ws_base_url: default_ws_base_url(),
            connect_timeout_ms: default_connect_timeout_ms(),
            snapshot_timeout_ms: default_snapshot_timeout_ms(),
            simulator_interval_ms: default_simulator_interval_ms(),
            max_consecutive_failures: default_max_consecutive_failures(),
        }
    }
}

impl FeedConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn snapshot_timeout(&self) -> Duration {
        Duration::from_millis(self.snapshot_timeout_ms)
    }

    pub fn simulator_interval(&self) -> Duration {
        Duration::from_millis(self.simulator_interval_ms)
    }
}

/// Pressure-zone analysis settings
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_cluster_distance")]
    pub cluster_distance: f64,

    #[serde(default = "default_min_cluster_strength")]
    pub min_cluster_strength: f64,

    #[serde(default = "default_cluster_band")]
    pub cluster_band: f64,

    #[serde(default = "default_spike_multiplier")]
    pub spike_multiplier: f64,

    #[serde(default = "default_spike_band")]
    pub spike_band: f64,
}

fn default_enabled() -> bool {
    true
}

fn default_cluster_distance() -> f64 {
    CLUSTER_DISTANCE
}

fn default_min_cluster_strength() -> f64 {
    MIN_CLUSTER_STRENGTH
}

fn default_cluster_band() -> f64 {
    CLUSTER_BAND
}

fn default_spike_multiplier() -> f64 {
    SPIKE_MULTIPLIER
}

fn default_spike_band() -> f64 {
    SPIKE_BAND
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            cluster_distance: default_cluster_distance(),
            min_cluster_strength: default_min_cluster_strength(),
            cluster_band: default_cluster_band(),
            spike_multiplier: default_spike_multiplier(),
            spike_band: default_spike_band(),
        }
    }
}

/// Bounded history of processed states
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_history_capacity(),
        }
    }
}

/// Application information
#[derive(Debug, Clone, Deserialize)]
pub struct AppInfo {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppInfo {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Read the file
        let config_str = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file '{}': {}", path.display(), e))?;

        let config = Self::from_toml(&config_str)
            .map_err(|e| anyhow!("Failed to load config file '{}': {}", path.display(), e))?;

        info!("Loaded configuration from {}", path.display());
        debug!(
            "Feed: symbol={} depth={} connect_timeout_ms={}",
            config.feed.symbol, config.feed.depth, config.feed.connect_timeout_ms
        );

        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the feed cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.feed.symbol.trim().is_empty() {
            return Err(anyhow!("feed.symbol must not be empty"));
        }
        if self.feed.depth == 0 {
            return Err(anyhow!("feed.depth must be positive"));
        }
        if self.feed.connect_timeout_ms == 0 || self.feed.snapshot_timeout_ms == 0 {
            return Err(anyhow!("feed timeouts must be positive"));
        }
        if self.feed.simulator_interval_ms == 0 {
            return Err(anyhow!("feed.simulator_interval_ms must be positive"));
        }
        if self.feed.max_consecutive_failures == 0 {
            return Err(anyhow!("feed.max_consecutive_failures must be positive"));
        }
        if self.history.capacity == 0 {
            return Err(anyhow!("history.capacity must be positive"));
        }
        let factors = [
            ("analysis.cluster_distance", self.analysis.cluster_distance),
            ("analysis.cluster_band", self.analysis.cluster_band),
            ("analysis.spike_multiplier", self.analysis.spike_multiplier),
            ("analysis.spike_band", self.analysis.spike_band),
        ];
        for (name, value) in factors {
            if !(value.is_finite() && value > 0.0) {
                return Err(anyhow!("{} must be a positive number, got {}", name, value));
            }
        }
        if !(self.analysis.min_cluster_strength.is_finite() && self.analysis.min_cluster_strength >= 0.0) {
            return Err(anyhow!("analysis.min_cluster_strength must be non-negative"));
        }
        Ok(())
    }
}
