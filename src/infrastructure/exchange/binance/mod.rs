pub mod client;
pub mod feed;
pub mod models;
pub mod parsers;
pub mod rest;

pub use client::BinanceClient;
pub use feed::BinanceFeed;
pub use parsers::{BinanceMessage, BinanceParser};
pub use rest::BinanceRestClient;
