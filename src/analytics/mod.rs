//! Analytics derived from the order book

pub mod pressure_zones;

pub use pressure_zones::{PressureZoneAnalyzer, ZoneConfig};
