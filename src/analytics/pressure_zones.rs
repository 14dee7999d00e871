//! Pressure-zone analysis
//!
//! Two passes over one book state:
//! - clustering per side: nearby levels are grouped into support (bid) and
//!   resistance (ask) zones, weak clusters are discarded
//! - volume spikes across both sides: single levels well above the average
//!   size become accumulation (bid) or distribution (ask) zones
//!
//! The result is ranked by strength. Nothing is remembered between calls.

use log::debug;

use crate::config_loader::AnalysisConfig;
use crate::domain::constants::*;
use crate::domain::enums::{BookSide, ZoneKind};
use crate::domain::model::order_book::OrderBookState;
use crate::domain::model::price_level::PriceLevel;
use crate::domain::model::zone::{PressureZone, ZoneReport};

/// Tunables for the analyzer
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneConfig {
    /// Relative distance under which a level joins a cluster
    pub cluster_distance: f64,
    /// Clusters at or below this strength are dropped
    pub min_cluster_strength: f64,
    /// Half-width of a cluster zone, relative to its center
    pub cluster_band: f64,
    /// A level is a spike when it exceeds average size times this
    pub spike_multiplier: f64,
    /// Half-width of a spike zone, relative to its price
    pub spike_band: f64,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            cluster_distance: CLUSTER_DISTANCE,
            min_cluster_strength: MIN_CLUSTER_STRENGTH,
            cluster_band: CLUSTER_BAND,
            spike_multiplier: SPIKE_MULTIPLIER,
            spike_band: SPIKE_BAND,
        }
    }
}

impl From<&AnalysisConfig> for ZoneConfig {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            cluster_distance: config.cluster_distance,
            min_cluster_strength: config.min_cluster_strength,
            cluster_band: config.cluster_band,
            spike_multiplier: config.spike_multiplier,
            spike_band: config.spike_band,
        }
    }
}

#[derive(Debug, Clone)]
struct Cluster {
    center_price: f64,
    volume: f64,
    order_count: usize,
    strength: f64,
}

/// Stateless analyzer; `analyze` is a pure read of the given book
#[derive(Debug, Clone, Default)]
pub struct PressureZoneAnalyzer {
    config: ZoneConfig,
}

impl PressureZoneAnalyzer {
    pub fn new(config: ZoneConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ZoneConfig {
        &self.config
    }

    /// All zones for `book`, strongest first, stamped with `timestamp`
    pub fn analyze(&self, book: &OrderBookState, timestamp: i64) -> Vec<PressureZone> {
        let mut zones = self.cluster_zones(book.bids(), BookSide::Bid, timestamp);
        zones.extend(self.cluster_zones(book.asks(), BookSide::Ask, timestamp));
        zones.extend(self.spike_zones(book, timestamp));

        // stable: clusters stay ahead of spikes of equal strength
        zones.sort_by(|a, b| b.strength.total_cmp(&a.strength));

        debug!(
            "Analyzed {} bid / {} ask levels into {} zones",
            book.bids().len(),
            book.asks().len(),
            zones.len()
        );
        zones
    }

    /// Zones plus their summary
    pub fn report(&self, book: &OrderBookState, timestamp: i64) -> ZoneReport {
        ZoneReport::new(self.analyze(book, timestamp))
    }

    /// Group one side's levels into clusters and keep the strong ones
    pub fn cluster_zones(
        &self,
        levels: &[PriceLevel],
        side: BookSide,
        timestamp: i64,
    ) -> Vec<PressureZone> {
        if levels.is_empty() {
            return Vec::new();
        }
        let total_orders = levels.len() as f64;
        let mut clusters: Vec<Cluster> = Vec::new();

        for level in levels {
            let price = level.price;
            let existing = clusters
                .iter_mut()
                .find(|c| (c.center_price - price).abs() / price < self.config.cluster_distance);

            match existing {
                Some(cluster) => {
                    cluster.volume += level.quantity;
                    cluster.order_count += 1;
                    cluster.strength = cluster.volume / total_orders;
                    // running midpoint, not a volume-weighted mean
                    cluster.center_price = (cluster.center_price + price) / 2.0;
                }
                None => clusters.push(Cluster {
                    center_price: price,
                    volume: level.quantity,
                    order_count: 1,
                    strength: level.quantity / total_orders,
                }),
            }
        }

        let kind = ZoneKind::cluster_for(side);
        clusters
            .into_iter()
            .filter(|c| c.strength > self.config.min_cluster_strength)
            .enumerate()
            .map(|(idx, c)| PressureZone {
                id: format!("{}-{}-{}", kind, idx, timestamp),
                side,
                kind,
                center_price: c.center_price,
                min_price: c.center_price * (1.0 - self.config.cluster_band),
                max_price: c.center_price * (1.0 + self.config.cluster_band),
                strength: c.strength,
                intensity: c.strength.min(1.0),
                volume: c.volume,
                order_count: c.order_count,
                timestamp,
                is_active: true,
            })
            .collect()
    }

    /// Single levels whose size exceeds the spike threshold, both sides
    pub fn spike_zones(&self, book: &OrderBookState, timestamp: i64) -> Vec<PressureZone> {
        let Some(threshold) = self.spike_threshold(book) else {
            return Vec::new();
        };

        let mut zones = Vec::new();
        for side in [BookSide::Bid, BookSide::Ask] {
            let kind = ZoneKind::spike_for(side);
            for level in book.side(side) {
                if level.quantity <= threshold {
                    continue;
                }
                zones.push(PressureZone {
                    id: format!("{}-{}-{}", kind, zones.len(), timestamp),
                    side,
                    kind,
                    center_price: level.price,
                    min_price: level.price * (1.0 - self.config.spike_band),
                    max_price: level.price * (1.0 + self.config.spike_band),
                    strength: (level.quantity / threshold).min(1.0),
                    intensity: (level.quantity / (threshold * 2.0)).min(1.0),
                    volume: level.quantity,
                    order_count: 1,
                    timestamp,
                    is_active: true,
                });
            }
        }
        zones
    }

    /// Average level size times the multiplier; `None` for an empty book
    pub fn spike_threshold(&self, book: &OrderBookState) -> Option<f64> {
        let count = book.level_count();
        if count == 0 {
            return None;
        }
        let total: f64 = book.bids().iter().chain(book.asks()).map(|l| l.quantity).sum();
        let average = total / count as f64;
        Some(average * self.config.spike_multiplier)
    }
}
