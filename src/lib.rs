pub mod analytics;
pub mod book;
pub mod config_loader;
pub mod domain;
pub mod feed;
pub mod infrastructure;

pub use analytics::*;
pub use book::*;
pub use domain::constants::*;
pub use domain::enums::*;
pub use domain::errors::*;
pub use domain::events::*;
pub use domain::model::depth::*;
pub use domain::model::order_book::*;
pub use domain::model::price_level::*;
pub use domain::model::zone::*;
pub use domain::traits::*;
pub use feed::*;
pub use infrastructure::exchange::binance::{
    BinanceClient, BinanceFeed, BinanceMessage, BinanceParser, BinanceRestClient,
};
