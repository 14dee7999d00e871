// Domain model for price levels and the parser/validator that produces them
use std::fmt;

use serde::{Deserialize, Serialize};

/// A price or quantity as it arrives on the wire.
///
/// Exchanges send decimal strings; synthetic sources may send numbers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Number(f64),
    Text(String),
    Null,
}

impl From<&str> for RawNumber {
    fn from(value: &str) -> Self {
        RawNumber::Text(value.to_string())
    }
}

impl From<String> for RawNumber {
    fn from(value: String) -> Self {
        RawNumber::Text(value)
    }
}

impl From<f64> for RawNumber {
    fn from(value: f64) -> Self {
        RawNumber::Number(value)
    }
}

impl fmt::Display for RawNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawNumber::Number(n) => write!(f, "{}", n),
            RawNumber::Text(s) => f.write_str(s),
            RawNumber::Null => f.write_str("null"),
        }
    }
}

/// One `[price, quantity]` pair from a snapshot or diff
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawLevel(pub RawNumber, pub RawNumber);

impl RawLevel {
    pub fn new(price: impl Into<RawNumber>, quantity: impl Into<RawNumber>) -> Self {
        RawLevel(price.into(), quantity.into())
    }

    pub fn price(&self) -> f64 {
        parse_number(&self.0)
    }

    pub fn quantity(&self) -> f64 {
        parse_number(&self.1)
    }
}

/// A validated level held by the book
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: f64,
    pub quantity: f64,
    /// Milliseconds since epoch of the snapshot or diff that last wrote it
    pub timestamp: i64,
}

impl PriceLevel {
    pub fn new(price: f64, quantity: f64, timestamp: i64) -> Self {
        Self { price, quantity, timestamp }
    }
}

/// What a single diff level asks the merge engine to do
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LevelDirective {
    /// Insert the level, or replace the quantity at that exact price
    Upsert(PriceLevel),
    /// Remove the level at that exact price
    Delete(f64),
}

/// Parse a wire number.
///
/// Anything that is not a finite number (bad text, `NaN`, `±Infinity`,
/// `null`) becomes `0.0`. Downstream validation relies on this: a zero price
/// is always rejected and a zero quantity reads as a deletion.
pub fn parse_number(raw: &RawNumber) -> f64 {
    let value = match raw {
        RawNumber::Number(n) => *n,
        RawNumber::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        RawNumber::Null => 0.0,
    };
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Accept a snapshot level only if both price and quantity are positive
pub fn parse_snapshot_level(raw: &RawLevel, timestamp: i64) -> Option<PriceLevel> {
    let price = raw.price();
    let quantity = raw.quantity();
    if price > 0.0 && quantity > 0.0 {
        Some(PriceLevel::new(price, quantity, timestamp))
    } else {
        None
    }
}

/// Interpret a diff level; `None` means the level is malformed and skipped
pub fn parse_diff_level(raw: &RawLevel, event_time: i64) -> Option<LevelDirective> {
    let price = raw.price();
    let quantity = raw.quantity();
    if price <= 0.0 || quantity < 0.0 {
        return None;
    }
    if quantity == 0.0 {
        Some(LevelDirective::Delete(price))
    } else {
        Some(LevelDirective::Upsert(PriceLevel::new(price, quantity, event_time)))
    }
}
