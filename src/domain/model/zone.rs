// Domain model for pressure zones derived from the book
use serde::Serialize;

use crate::domain::enums::{BookSide, ZoneKind};

/// A band of resting liquidity worth highlighting.
///
/// Zones are recomputed from scratch on every analysis and carry no identity
/// across calls; `id` is only unique within one result set.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PressureZone {
    pub id: String,
    pub side: BookSide,
    pub kind: ZoneKind,
    pub center_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    /// Unbounded for clusters, capped at 1 for spikes
    pub strength: f64,
    /// Strength mapped into [0, 1] for display
    pub intensity: f64,
    pub volume: f64,
    pub order_count: usize,
    pub timestamp: i64,
    pub is_active: bool,
}

impl PressureZone {
    pub fn contains(&self, price: f64) -> bool {
        price >= self.min_price && price <= self.max_price
    }
}

/// Aggregate counts over one zone set
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneSummary {
    pub total_zones: usize,
    pub average_intensity: f64,
    pub cluster_zones: usize,
    pub spike_zones: usize,
    pub support_zones: usize,
    pub resistance_zones: usize,
    pub accumulation_zones: usize,
    pub distribution_zones: usize,
    pub total_volume: f64,
}

impl ZoneSummary {
    pub fn from_zones(zones: &[PressureZone]) -> Self {
        let mut summary = ZoneSummary {
            total_zones: zones.len(),
            ..Default::default()
        };
        let mut intensity = 0.0;
        for zone in zones {
            intensity += zone.intensity;
            summary.total_volume += zone.volume;
            match zone.kind {
                ZoneKind::Support => summary.support_zones += 1,
                ZoneKind::Resistance => summary.resistance_zones += 1,
                ZoneKind::Accumulation => summary.accumulation_zones += 1,
                ZoneKind::Distribution => summary.distribution_zones += 1,
            }
        }
        summary.cluster_zones = summary.support_zones + summary.resistance_zones;
        summary.spike_zones = summary.accumulation_zones + summary.distribution_zones;
        if !zones.is_empty() {
            summary.average_intensity = intensity / zones.len() as f64;
        }
        summary
    }
}

/// Zones ranked by strength together with their summary
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ZoneReport {
    pub zones: Vec<PressureZone>,
    pub summary: ZoneSummary,
}

impl ZoneReport {
    pub fn new(zones: Vec<PressureZone>) -> Self {
        let summary = ZoneSummary::from_zones(&zones);
        Self { zones, summary }
    }

    pub fn strongest(&self) -> Option<&PressureZone> {
        self.zones.first()
    }
}
