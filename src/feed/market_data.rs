use log::debug;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::sync::{broadcast, watch};

use crate::analytics::{PressureZoneAnalyzer, ZoneConfig};
use crate::book::BookEngine;
use crate::config_loader::AppConfig;
use crate::domain::errors::BookError;
use crate::domain::events::FeedEvent;
use crate::domain::model::depth::{DiffRecord, SnapshotRecord};
use crate::domain::model::order_book::OrderBookState;
use crate::domain::model::zone::ZoneReport;

/// Holds the current book, its zones and the bounded history.
///
/// Writers are serialized by the orchestrator's session lock; readers only
/// ever see whole `Arc` values swapped in through the watch channels.
pub struct MarketDataManager {
    /// Merge engine and its history buffer
    engine: Mutex<BookEngine>,

    /// Latest processed book
    book_tx: watch::Sender<Option<Arc<OrderBookState>>>,

    /// Zones computed for the latest book
    zones_tx: watch::Sender<Option<Arc<ZoneReport>>>,

    /// Symbol the held book belongs to
    symbol: RwLock<Option<String>>,

    analyzer: PressureZoneAnalyzer,
    analyze_on_update: bool,

    /// Data and zone notifications for subscribers
    events: broadcast::Sender<FeedEvent>,
}

impl MarketDataManager {
    pub fn new(config: &AppConfig, events: broadcast::Sender<FeedEvent>) -> Self {
        let (book_tx, _) = watch::channel(None);
        let (zones_tx, _) = watch::channel(None);
        Self {
            engine: Mutex::new(BookEngine::new(config.history.capacity)),
            book_tx,
            zones_tx,
            symbol: RwLock::new(None),
            analyzer: PressureZoneAnalyzer::new(ZoneConfig::from(&config.analysis)),
            analyze_on_update: config.analysis.enabled,
            events,
        }
    }

    pub fn set_symbol(&self, symbol: &str) {
        let mut guard = self.symbol.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(symbol.to_string());
    }

    /// Levels per side kept in every published book
    pub fn set_depth(&self, depth: usize) {
        self.engine().set_max_depth(Some(depth));
    }

    pub fn symbol(&self) -> Option<String> {
        self.symbol.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replace the book with a parsed snapshot
    pub fn apply_snapshot(&self, raw: &SnapshotRecord) -> Arc<OrderBookState> {
        let state = self.engine().apply_snapshot(raw);
        debug!(
            "Snapshot applied: {} bids, {} asks, lastUpdateId={}",
            state.bids().len(),
            state.asks().len(),
            raw.last_update_id
        );
        self.publish(state.clone());
        state
    }

    /// Merge a diff into the held book.
    ///
    /// Fails without touching the book when no snapshot has been applied or
    /// the diff belongs to another symbol.
    pub fn apply_diff(&self, diff: &DiffRecord) -> Result<Arc<OrderBookState>, BookError> {
        let current = self.book().ok_or(BookError::MissingSnapshot {
            event_time: diff.event_time,
        })?;

        if let Some(expected) = self.symbol() {
            if !diff.symbol.is_empty() && !diff.symbol.eq_ignore_ascii_case(&expected) {
                return Err(BookError::SymbolMismatch {
                    expected,
                    got: diff.symbol.clone(),
                });
            }
        }

        let state = self.engine().apply_diff(&current, diff);
        debug!(
            "Diff {}..{} applied: {} changes, best bid {:?}, best ask {:?}",
            diff.first_update_id,
            diff.final_update_id,
            diff.len(),
            state.best_bid().map(|l| l.price),
            state.best_ask().map(|l| l.price)
        );
        self.publish(state.clone());
        Ok(state)
    }

    /// Forget the book, its zones, the history and the symbol
    pub fn clear(&self) {
        self.engine().clear_history();
        self.book_tx.send_replace(None);
        self.zones_tx.send_replace(None);
        *self.symbol.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn book(&self) -> Option<Arc<OrderBookState>> {
        self.book_tx.borrow().clone()
    }

    pub fn zones(&self) -> Option<Arc<ZoneReport>> {
        self.zones_tx.borrow().clone()
    }

    pub fn watch_book(&self) -> watch::Receiver<Option<Arc<OrderBookState>>> {
        self.book_tx.subscribe()
    }

    pub fn history_len(&self) -> usize {
        self.engine().history().len()
    }

    pub fn history_at(&self, timestamp: i64) -> Option<Arc<OrderBookState>> {
        self.engine().history().get(timestamp)
    }

    pub fn history_range(&self, from: i64, to: i64) -> Vec<(i64, Arc<OrderBookState>)> {
        self.engine().history().range(from, to)
    }

    fn engine(&self) -> std::sync::MutexGuard<'_, BookEngine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: Arc<OrderBookState>) {
        self.book_tx.send_replace(Some(state.clone()));
        // No subscribers is not an error
        let _ = self.events.send(FeedEvent::Data(state.clone()));

        if !self.analyze_on_update {
            return;
        }
        let report = Arc::new(self.analyzer.report(&state, state.timestamp()));
        if let Some(zone) = report.strongest() {
            debug!(
                "{} zones, strongest {} at {} (strength {:.3})",
                report.zones.len(),
                zone.kind,
                zone.center_price,
                zone.strength
            );
        }
        self.zones_tx.send_replace(Some(report.clone()));
        let _ = self.events.send(FeedEvent::Zones(report));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::price_level::RawLevel;

    fn manager() -> (MarketDataManager, broadcast::Receiver<FeedEvent>) {
        let (tx, rx) = broadcast::channel(64);
        (MarketDataManager::new(&AppConfig::default(), tx), rx)
    }

    fn snapshot(symbol: &str, timestamp: i64) -> SnapshotRecord {
        SnapshotRecord {
            bids: vec![RawLevel::new("100", "1"), RawLevel::new("99", "1"), RawLevel::new("98", "50")],
            asks: vec![RawLevel::new("101", "1"), RawLevel::new("102", "1")],
            last_update_id: 1,
            symbol: symbol.to_string(),
            timestamp,
        }
    }

    #[test]
    fn test_diff_before_snapshot_rejected() {
        let (md, _rx) = manager();
        let diff = DiffRecord::new("BTCUSDT", 5, vec![RawLevel::new("100", "1")], vec![]);
        assert_eq!(
            md.apply_diff(&diff),
            Err(BookError::MissingSnapshot { event_time: 5 })
        );
        assert!(md.book().is_none());
    }

    #[test]
    fn test_symbol_mismatch_leaves_book() {
        let (md, _rx) = manager();
        md.set_symbol("BTCUSDT");
        let before = md.apply_snapshot(&snapshot("BTCUSDT", 1));

        let diff = DiffRecord::new("ETHUSDT", 2, vec![RawLevel::new("100", "0")], vec![]);
        assert!(matches!(md.apply_diff(&diff), Err(BookError::SymbolMismatch { .. })));
        assert!(Arc::ptr_eq(&md.book().unwrap(), &before));

        // case-insensitive match is accepted
        let diff = DiffRecord::new("btcusdt", 3, vec![RawLevel::new("100", "0")], vec![]);
        assert_eq!(md.apply_diff(&diff).unwrap().bids().len(), 2);
    }

    #[test]
    fn test_publish_emits_data_and_zones() {
        let (md, mut rx) = manager();
        md.apply_snapshot(&snapshot("BTCUSDT", 7));

        assert!(matches!(rx.try_recv(), Ok(FeedEvent::Data(_))));
        match rx.try_recv() {
            Ok(FeedEvent::Zones(report)) => {
                assert_eq!(report.summary.accumulation_zones, 1);
                assert!(report.zones.iter().all(|z| z.timestamp == 7));
            }
            other => panic!("expected zones, got {:?}", other),
        }
        assert!(md.zones().is_some());
    }

    #[test]
    fn test_history_and_clear() {
        let (md, _rx) = manager();
        md.apply_snapshot(&snapshot("BTCUSDT", 1));
        md.apply_diff(&DiffRecord::new("BTCUSDT", 2, vec![RawLevel::new("97", "1")], vec![]))
            .unwrap();
        assert_eq!(md.history_len(), 2);
        assert_eq!(md.history_at(2).map(|s| s.bids().len()), Some(4));
        assert_eq!(md.history_range(0, 10).len(), 2);

        md.clear();
        assert!(md.book().is_none());
        assert!(md.zones().is_none());
        assert_eq!(md.history_len(), 0);
        assert!(md.symbol().is_none());
    }

    #[test]
    fn test_published_book_respects_depth() {
        let (md, _rx) = manager();
        md.set_depth(2);
        let state = md.apply_snapshot(&snapshot("BTCUSDT", 1));
        assert_eq!(state.bids().len(), 2);
        assert_eq!(state.asks().len(), 2);

        let diff = DiffRecord::new("BTCUSDT", 2, vec![RawLevel::new("99.5", "4")], vec![]);
        let state = md.apply_diff(&diff).unwrap();
        let prices: Vec<f64> = state.bids().iter().map(|l| l.price).collect();
        assert_eq!(prices, vec![100.0, 99.5]);
        assert_eq!(md.history_at(2).map(|s| s.bids().len()), Some(2));
    }
}
