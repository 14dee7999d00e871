use anyhow::Result;

use depth_pressure::analytics::{PressureZoneAnalyzer, ZoneConfig};
use depth_pressure::config_loader::AppConfig;
use depth_pressure::domain::enums::{BookSide, ZoneKind};
use depth_pressure::domain::model::order_book::OrderBookState;
use depth_pressure::domain::model::price_level::PriceLevel;

fn book(bids: &[(f64, f64)], asks: &[(f64, f64)]) -> OrderBookState {
    let side = |levels: &[(f64, f64)]| {
        levels
            .iter()
            .map(|(p, q)| PriceLevel::new(*p, *q, 1))
            .collect::<Vec<_>>()
    };
    OrderBookState::from_levels(side(bids), side(asks), 1)
}

#[test]
fn test_single_accumulation_zone_for_large_bid() -> Result<()> {
    let analyzer = PressureZoneAnalyzer::default();
    let book = book(&[(100.0, 1.0), (99.0, 1.0), (98.0, 50.0)], &[(101.0, 1.0), (102.0, 1.0)]);

    let zones = analyzer.analyze(&book, 42);
    let spikes: Vec<_> = zones.iter().filter(|z| !z.kind.is_cluster()).collect();
    assert_eq!(spikes.len(), 1);
    assert_eq!(spikes[0].kind, ZoneKind::Accumulation);
    assert_eq!(spikes[0].side, BookSide::Bid);
    assert_eq!(spikes[0].center_price, 98.0);
    assert_eq!(spikes[0].volume, 50.0);
    assert!(spikes[0].contains(98.0));
    assert!(zones.iter().all(|z| z.timestamp == 42));
    Ok(())
}

#[test]
fn test_ask_spike_is_distribution() -> Result<()> {
    let analyzer = PressureZoneAnalyzer::default();
    let book = book(&[(100.0, 1.0), (99.0, 1.0)], &[(101.0, 1.0), (102.0, 40.0)]);

    let spikes = analyzer.spike_zones(&book, 0);
    assert_eq!(spikes.len(), 1);
    assert_eq!(spikes[0].kind, ZoneKind::Distribution);
    assert_eq!(spikes[0].center_price, 102.0);
    Ok(())
}

#[test]
fn test_uniform_book_has_no_spikes() -> Result<()> {
    let analyzer = PressureZoneAnalyzer::default();
    let book = book(&[(100.0, 2.0), (99.0, 2.0)], &[(101.0, 2.0), (102.0, 2.0)]);
    assert!(analyzer.spike_zones(&book, 0).is_empty());
    Ok(())
}

#[test]
fn test_nearby_levels_form_support_and_resistance() -> Result<()> {
    let analyzer = PressureZoneAnalyzer::default();
    // all bids within 1% of each other, same for asks
    let book = book(
        &[(100.0, 1.0), (99.9, 1.0), (99.8, 1.0)],
        &[(100.1, 1.0), (100.2, 1.0), (100.3, 1.0)],
    );
    let zones = analyzer.analyze(&book, 0);

    let support: Vec<_> = zones.iter().filter(|z| z.kind == ZoneKind::Support).collect();
    let resistance: Vec<_> = zones.iter().filter(|z| z.kind == ZoneKind::Resistance).collect();
    assert_eq!(support.len(), 1);
    assert_eq!(resistance.len(), 1);
    assert_eq!(support[0].order_count, 3);
    assert_eq!(resistance[0].volume, 3.0);
    assert!(support[0].min_price < support[0].center_price);
    assert!(support[0].max_price > support[0].center_price);
    Ok(())
}

#[test]
fn test_config_overrides_thresholds() -> Result<()> {
    let config = AppConfig::from_toml(
        r#"
        [analysis]
        spike_multiplier = 100.0
        min_cluster_strength = 1000.0
        "#,
    )?;
    let analyzer = PressureZoneAnalyzer::new(ZoneConfig::from(&config.analysis));
    let book = book(&[(100.0, 1.0), (99.0, 1.0), (98.0, 50.0)], &[(101.0, 1.0), (102.0, 1.0)]);

    assert!(analyzer.analyze(&book, 0).is_empty());
    assert_eq!(analyzer.config().spike_multiplier, 100.0);
    Ok(())
}

#[test]
fn test_analysis_is_repeatable() -> Result<()> {
    let analyzer = PressureZoneAnalyzer::default();
    let book = book(&[(100.0, 3.0), (99.5, 1.0), (90.0, 20.0)], &[(101.0, 2.0), (110.0, 1.0)]);
    assert_eq!(analyzer.analyze(&book, 5), analyzer.analyze(&book, 5));

    let report = analyzer.report(&book, 5);
    assert_eq!(report.summary.total_zones, report.zones.len());
    assert_eq!(
        report.summary.cluster_zones + report.summary.spike_zones,
        report.summary.total_zones
    );
    Ok(())
}
