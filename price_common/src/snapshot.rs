//! Instrument state and the message pushed to subscribers.
//!
//! Every message on the wire is a `MutationSnapshot` encoded as JSON:
//!
//! ```json
//! {"type": "update", "prices": {"AAPL": {"symbol": "AAPL", "price": 179.39, "change": 0.5}}}
//! ```
//!
//! The shape is identical for the `initial` message a client receives on
//! admission and for the periodic `update` messages.

use crate::error::FeedError;
use crate::tickers::Ticker;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current state of one instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    /// Unique key of the instrument.
    pub symbol: Ticker,
    /// Last price, always strictly positive and kept at two decimal places.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Relative change of the last mutation only, in percent.
    #[serde(rename = "change", with = "rust_decimal::serde::float")]
    pub change_percent: Decimal,
}

impl Instrument {
    /// Instrument at its seed price with no change yet.
    pub fn seeded(symbol: Ticker) -> Self {
        Self {
            symbol,
            price: symbol.seed_price(),
            change_percent: Decimal::ZERO,
        }
    }
}

/// Kind tag carried in the `type` field of every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Baseline sent once, directly, when a connection is admitted.
    Initial,
    /// Result of one simulation tick, broadcast to every subscriber.
    Update,
}

/// Immutable point-in-time copy of every instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationSnapshot {
    /// Message kind.
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// All instruments keyed by symbol.
    pub prices: BTreeMap<Ticker, Instrument>,
}

impl MutationSnapshot {
    /// Build a snapshot by deep-copying `prices`.
    pub fn new(kind: MessageKind, prices: &BTreeMap<Ticker, Instrument>) -> Self {
        Self {
            kind,
            prices: prices.clone(),
        }
    }

    /// Look up one instrument.
    pub fn get(&self, symbol: Ticker) -> Option<&Instrument> {
        self.prices.get(&symbol)
    }

    /// Encode the snapshot as a JSON text frame.
    pub fn to_json(&self) -> Result<String, FeedError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a snapshot from a JSON text frame.
    pub fn from_json(text: &str) -> Result<Self, FeedError> {
        Ok(serde_json::from_str(text)?)
    }
}
