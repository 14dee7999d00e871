//! Connection orchestrator
//!
//! Owns the lifecycle of the book source: snapshot, live diff stream, and the
//! simulated fallback. All mutations go through one session lock which also
//! carries a generation counter. Every spawned task captures the generation
//! it was started under and re-checks it under the lock before writing, so a
//! task that lost a race (timeout, disconnect, symbol change) is a no-op.

// Standard library imports
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// External crate imports
use chrono::Utc;
use futures_util::StreamExt;
use log::{debug, error, info, warn};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{timeout, MissedTickBehavior};

// Internal crate imports
use crate::config_loader::{AppConfig, FeedConfig};
use crate::domain::constants::*;
use crate::domain::enums::ConnectionState;
use crate::domain::errors::FeedError;
use crate::domain::events::FeedEvent;
use crate::domain::model::depth::DiffRecord;
use crate::domain::model::order_book::OrderBookState;
use crate::domain::model::zone::ZoneReport;
use crate::domain::traits::{DiffStream, MarketFeed};

use super::market_data::MarketDataManager;
use super::simulator::MarketSimulator;

#[derive(Default)]
struct Session {
    generation: u64,
    symbol: Option<String>,
    depth: usize,
    live_task: Option<JoinHandle<()>>,
    simulator_task: Option<JoinHandle<()>>,
    error: Option<String>,
    status: Option<String>,
    consecutive_failures: u32,
}

impl Session {
    /// Invalidate every running source and stop its task
    fn teardown(&mut self) {
        self.generation += 1;
        if let Some(handle) = self.live_task.take() {
            handle.abort();
        }
        if let Some(handle) = self.simulator_task.take() {
            handle.abort();
        }
    }
}

struct Inner {
    feed: Arc<dyn MarketFeed>,
    config: FeedConfig,
    market_data: Arc<MarketDataManager>,
    session: Mutex<Session>,
    state_tx: watch::Sender<ConnectionState>,
    events: broadcast::Sender<FeedEvent>,
}

/// Drives one symbol's book from a live feed, falling back to simulated data.
///
/// Cheap to clone; all clones share the same session.
#[derive(Clone)]
pub struct FeedOrchestrator {
    inner: Arc<Inner>,
}

impl FeedOrchestrator {
    pub fn new(feed: Arc<dyn MarketFeed>, config: &AppConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        let market_data = Arc::new(MarketDataManager::new(config, events.clone()));

        let session = Session {
            depth: config.feed.depth,
            ..Default::default()
        };

        Self {
            inner: Arc::new(Inner {
                feed,
                config: config.feed.clone(),
                market_data,
                session: Mutex::new(session),
                state_tx,
                events,
            }),
        }
    }

    /// Load a snapshot for `symbol` and start streaming diffs.
    ///
    /// Transport problems never fail the call: the orchestrator switches to
    /// simulated data and reports `SimulatedFallback`. Only an unusable
    /// symbol is returned as an error.
    pub async fn connect(&self, symbol: &str, depth: usize) -> Result<ConnectionState, FeedError> {
        let symbol = normalize_symbol(symbol)?;
        let depth = depth.max(1);
        let inner = &self.inner;

        let generation = {
            let mut session = inner.lock();
            session.teardown();
            if session.symbol.as_deref() != Some(symbol.as_str()) {
                inner.market_data.clear();
            }
            inner.market_data.set_symbol(&symbol);
            inner.market_data.set_depth(depth);
            session.symbol = Some(symbol.clone());
            session.depth = depth;
            session.error = None;
            session.status = None;
            session.consecutive_failures = 0;
            inner.set_state(ConnectionState::Connecting);
            session.generation
        };
        info!("Connecting {} via {} (depth {})", symbol, inner.feed.name(), depth);

        // Snapshot
        let fetched = timeout(
            inner.config.snapshot_timeout(),
            inner.feed.fetch_snapshot(&symbol, depth),
        )
        .await
        .unwrap_or(Err(FeedError::Timeout(inner.config.snapshot_timeout_ms)));

        let mut snapshot = match fetched {
            Ok(snapshot) => snapshot,
            Err(e) => {
                let mut session = inner.lock();
                return Ok(inner.enter_fallback(&mut session, generation, &e.to_string()));
            }
        };

        {
            let session = inner.lock();
            if session.generation != generation {
                debug!("Snapshot for {} arrived after teardown; dropped", symbol);
                return Ok(inner.state());
            }
            if snapshot.symbol.is_empty() {
                snapshot.symbol = symbol.clone();
            }
            inner.market_data.apply_snapshot(&snapshot);
        }

        // Live stream: opening it and its first message share one deadline
        let opened = timeout(inner.config.connect_timeout(), open_live(inner.feed.as_ref(), &symbol))
            .await
            .unwrap_or(Err(FeedError::Timeout(inner.config.connect_timeout_ms)));

        let mut session = inner.lock();
        let (stream, first) = match opened {
            Ok(pair) => pair,
            Err(e) => return Ok(inner.enter_fallback(&mut session, generation, &e.to_string())),
        };
        if session.generation != generation {
            debug!("Live stream for {} opened after teardown; dropped", symbol);
            return Ok(inner.state());
        }

        inner.handle_diff(&mut session, &first);
        if session.generation != generation {
            return Ok(inner.state());
        }
        inner.set_state(ConnectionState::LiveConnected);
        session.live_task = Some(tokio::spawn(inner.clone().run_live(generation, stream)));
        Ok(ConnectionState::LiveConnected)
    }

    /// Stop every source. Idempotent; the last book stays readable.
    pub fn disconnect(&self) {
        let mut session = self.inner.lock();
        session.teardown();
        session.error = None;
        session.status = None;
        session.consecutive_failures = 0;
        self.inner.set_state(ConnectionState::Disconnected);
    }

    /// Switch to another symbol, discarding the old symbol's book
    pub async fn set_symbol(&self, symbol: &str) -> Result<ConnectionState, FeedError> {
        let symbol = normalize_symbol(symbol)?;
        let depth = {
            let mut session = self.inner.lock();
            if session.symbol.as_deref() == Some(symbol.as_str()) {
                return Ok(self.inner.state());
            }
            if self.inner.state() == ConnectionState::Disconnected {
                info!("Symbol set to {} for the next connect", symbol);
                self.inner.market_data.clear();
                session.symbol = Some(symbol);
                return Ok(ConnectionState::Disconnected);
            }
            session.depth
        };
        self.connect(&symbol, depth).await
    }

    /// Run `connect` again for the current symbol and depth
    pub async fn reconnect(&self) -> Result<ConnectionState, FeedError> {
        let (symbol, depth) = {
            let session = self.inner.lock();
            (session.symbol.clone(), session.depth)
        };
        let symbol = symbol.ok_or_else(|| FeedError::InvalidSymbol(String::new()))?;
        self.connect(&symbol, depth).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.inner.events.subscribe()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.inner.state()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    pub fn book(&self) -> Option<Arc<OrderBookState>> {
        self.inner.market_data.book()
    }

    pub fn zones(&self) -> Option<Arc<ZoneReport>> {
        self.inner.market_data.zones()
    }

    pub fn symbol(&self) -> Option<String> {
        self.inner.lock().symbol.clone()
    }

    /// Last processing failure since the latest connect
    pub fn error_text(&self) -> Option<String> {
        self.inner.lock().error.clone()
    }

    /// Informational status, set while running on simulated data
    pub fn status_text(&self) -> Option<String> {
        self.inner.lock().status.clone()
    }

    pub fn history_len(&self) -> usize {
        self.inner.market_data.history_len()
    }

    pub fn history_at(&self, timestamp: i64) -> Option<Arc<OrderBookState>> {
        self.inner.market_data.history_at(timestamp)
    }

    pub fn market_data(&self) -> &Arc<MarketDataManager> {
        &self.inner.market_data
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    fn set_state(&self, state: ConnectionState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            info!("Connection state: {} -> {}", previous, state);
            let _ = self.events.send(FeedEvent::StateChanged(state));
        }
    }

    /// Merge one diff, counting processing failures
    fn handle_diff(&self, session: &mut Session, diff: &DiffRecord) {
        match self.market_data.apply_diff(diff) {
            Ok(_) => session.consecutive_failures = 0,
            Err(e) => self.record_failure(session, &e.to_string()),
        }
    }

    fn record_failure(&self, session: &mut Session, message: &str) {
        session.consecutive_failures += 1;
        error!(
            "Processing failure {}/{}: {}",
            session.consecutive_failures, self.config.max_consecutive_failures, message
        );
        session.error = Some(message.to_string());
        let _ = self.events.send(FeedEvent::Error(message.to_string()));

        if session.consecutive_failures >= self.config.max_consecutive_failures {
            session.teardown();
            self.set_state(ConnectionState::Error);
        }
    }

    /// Replace the live source with the simulator.
    ///
    /// A book already loaded is kept and the simulator continues from it;
    /// otherwise the simulator provides the initial snapshot.
    fn enter_fallback(
        self: &Arc<Self>,
        session: &mut Session,
        generation: u64,
        reason: &str,
    ) -> ConnectionState {
        if session.generation != generation {
            debug!("Stale fallback request ignored: {}", reason);
            return self.state();
        }
        session.teardown();

        let symbol = session.symbol.clone().unwrap_or_default();
        let mut simulator = MarketSimulator::new(&symbol, session.depth);
        match self.market_data.book() {
            Some(book) => simulator.anchor(&book),
            None => {
                self.market_data.apply_snapshot(&simulator.snapshot(now_ms()));
            }
        }

        warn!("Live feed for {} unavailable ({}); using simulated data", symbol, reason);
        let status = format!("{}: {}", DEMO_MODE_STATUS, reason);
        session.status = Some(status.clone());
        session.consecutive_failures = 0;
        self.set_state(ConnectionState::SimulatedFallback);
        let _ = self.events.send(FeedEvent::Status(status));

        let task = self.clone().run_simulator(session.generation, simulator);
        session.simulator_task = Some(tokio::spawn(task));
        ConnectionState::SimulatedFallback
    }

    async fn run_live(self: Arc<Self>, generation: u64, mut stream: DiffStream) {
        loop {
            let item = stream.next().await;
            let mut session = self.lock();
            if session.generation != generation {
                return;
            }
            match item {
                Some(Ok(diff)) => self.handle_diff(&mut session, &diff),
                Some(Err(e)) if e.is_transport() => {
                    self.enter_fallback(&mut session, generation, &e.to_string());
                    return;
                }
                Some(Err(e)) => self.record_failure(&mut session, &e.to_string()),
                None => {
                    self.enter_fallback(&mut session, generation, &FeedError::StreamClosed.to_string());
                    return;
                }
            }
            if session.generation != generation {
                return;
            }
        }
    }

    async fn run_simulator(self: Arc<Self>, generation: u64, mut simulator: MarketSimulator) {
        let mut ticker = tokio::time::interval(self.config.simulator_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let mut session = self.lock();
            if session.generation != generation {
                return;
            }
            match self.market_data.book() {
                Some(book) => {
                    let diff = simulator.next_diff(&book, now_ms());
                    self.handle_diff(&mut session, &diff);
                }
                None => {
                    self.market_data.apply_snapshot(&simulator.snapshot(now_ms()));
                }
            }
            if session.generation != generation {
                return;
            }
        }
    }
}

/// Subscribe and wait for the first diff
async fn open_live(feed: &dyn MarketFeed, symbol: &str) -> Result<(DiffStream, DiffRecord), FeedError> {
    let mut stream = feed.subscribe(symbol).await?;
    match stream.next().await {
        Some(Ok(first)) => Ok((stream, first)),
        Some(Err(e)) => Err(e),
        None => Err(FeedError::StreamClosed),
    }
}

fn normalize_symbol(symbol: &str) -> Result<String, FeedError> {
    let symbol = symbol.trim().to_ascii_uppercase();
    if symbol.is_empty() || !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(FeedError::InvalidSymbol(symbol));
    }
    Ok(symbol)
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
