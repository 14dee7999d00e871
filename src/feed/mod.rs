//! Book feed: market-data state, the simulator, and the orchestrator that
//! switches between live and simulated sources.

pub mod market_data;
pub mod orchestrator;
pub mod simulator;

pub use market_data::MarketDataManager;
pub use orchestrator::FeedOrchestrator;
pub use simulator::{MarketSimulator, SymbolProfile};
