// Standard library imports
use std::path::Path;
use std::sync::Arc;

// External crate imports
use anyhow::Result;
use dotenv::dotenv;
use log::{debug, error, info, warn};
use tokio::select;
use tokio::sync::broadcast::error::RecvError;

// Internal crate imports
use depth_pressure::config_loader::AppConfig;
use depth_pressure::domain::events::FeedEvent;
use depth_pressure::feed::FeedOrchestrator;
use depth_pressure::infrastructure::exchange::binance::BinanceFeed;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Load configuration from TOML file (first try relative path, then the working directory)
    let config_path = Path::new("../config.toml");
    let config = match AppConfig::from_file(config_path) {
        Ok(config) => config,
        Err(primary) => {
            let alt_path = Path::new("./config.toml");
            match AppConfig::from_file(alt_path) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("{}; {}", primary, e);
                    return Err(e);
                }
            }
        }
    };

    // Config level first, RUST_LOG overrides it
    env_logger::Builder::new()
        .parse_filters(&config.app.log_level)
        .parse_default_env()
        .init();
    info!("Logger initialized");

    let mut config = config;
    if let Some(symbol) = std::env::args().nth(1) {
        info!("Symbol override from command line: {}", symbol);
        config.feed.symbol = symbol;
    }

    run(Arc::new(config)).await
}

async fn run(config: Arc<AppConfig>) -> Result<()> {
    let feed = Arc::new(BinanceFeed::new(&config.feed)?);
    let orchestrator = FeedOrchestrator::new(feed, &config);
    let mut events = orchestrator.subscribe();

    let state = orchestrator.connect(&config.feed.symbol, config.feed.depth).await?;
    info!("{} started in state {}", config.feed.symbol, state);

    let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())?;

    loop {
        select! {
            event = events.recv() => {
                match event {
                    Ok(event) => report(&event),
                    Err(RecvError::Lagged(skipped)) => warn!("Event consumer lagged, skipped {} events", skipped),
                    Err(RecvError::Closed) => {
                        error!("Event channel closed");
                        break;
                    }
                }
            }
            _ = sigint.recv() => {
                warn!("SIGINT (Ctrl+C) received. Shutting down...");
                break;
            }
        }
    }

    orchestrator.disconnect();
    if let Some(book) = orchestrator.book() {
        info!(
            "Final book: {} levels, {} states in history",
            book.level_count(),
            orchestrator.history_len()
        );
    }
    Ok(())
}

fn report(event: &FeedEvent) {
    match event {
        FeedEvent::Data(book) => debug!(
            "Book: bid {:?} ask {:?} spread {:?} imbalance {:?}",
            book.best_bid().map(|l| l.price),
            book.best_ask().map(|l| l.price),
            book.spread(),
            book.imbalance()
        ),
        FeedEvent::Zones(report) => {
            let summary = &report.summary;
            debug!(
                "Zones: {} total ({} support, {} resistance, {} accumulation, {} distribution), avg intensity {:.2}",
                summary.total_zones,
                summary.support_zones,
                summary.resistance_zones,
                summary.accumulation_zones,
                summary.distribution_zones,
                summary.average_intensity
            );
            if let Some(zone) = report.strongest() {
                debug!(
                    "Strongest: {} {:.2}..{:.2} strength {:.3}",
                    zone.kind, zone.min_price, zone.max_price, zone.strength
                );
            }
        }
        FeedEvent::Status(status) => info!("Status: {}", status),
        FeedEvent::Error(message) => error!("Feed error: {}", message),
        FeedEvent::StateChanged(state) => info!("Connection state changed to {}", state),
    }
}
