// Call ids used to match Binance stream responses to the request that caused them.
// The numbers are arbitrary, but they need to be unique per CALL_ID.
pub const CALL_ID_SUBSCRIBE: u64 = 1;
pub const CALL_ID_UNSUBSCRIBE: u64 = 2;

// Book and history defaults
pub const DEFAULT_DEPTH: usize = 50;
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

// Returned by an empty book so renderers never divide by zero
pub const EMPTY_MAX_QUANTITY: f64 = 1.0;
pub const EMPTY_PRICE_MIN: f64 = 0.0;
pub const EMPTY_PRICE_MAX: f64 = 1.0;

// Connection policy
pub const CONNECT_TIMEOUT_MS: u64 = 5_000;
pub const SNAPSHOT_TIMEOUT_MS: u64 = 5_000;
pub const SIMULATOR_INTERVAL_MS: u64 = 1_000;
pub const MAX_CONSECUTIVE_FAILURES: u32 = 5;
pub const DEMO_MODE_STATUS: &str = "demo mode";

// Pressure-zone analysis
pub const CLUSTER_DISTANCE: f64 = 0.01;
pub const MIN_CLUSTER_STRENGTH: f64 = 0.1;
pub const CLUSTER_BAND: f64 = 0.001;
pub const SPIKE_MULTIPLIER: f64 = 2.5;
pub const SPIKE_BAND: f64 = 0.0005;

// Binance REST depth endpoint only accepts these limits
pub const BINANCE_DEPTH_LIMITS: &[usize] = &[5, 10, 20, 50, 100, 500, 1000, 5000];

// Broadcast buffer for feed events; slow subscribers see `Lagged`
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;
