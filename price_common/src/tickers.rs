//! Ticker symbols and the seed catalog shared between client and server.

use clap::ValueEnum;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Set of instruments quoted by the feed.
///
/// The catalog is fixed at startup; variants are ordered as they are listed,
/// which is also the order of every snapshot's `prices` map.
#[allow(missing_docs)]
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    ValueEnum,
    Display,
    EnumString,
    EnumIter,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
)]
#[value(rename_all = "lower")]
#[strum(ascii_case_insensitive)]
pub enum Ticker {
    AAPL,
    TSLA,
    AMZN,
    INFY,
    TCS,
}

impl Ticker {
    /// Opening price the store is seeded with.
    pub fn seed_price(&self) -> Decimal {
        match self {
            Ticker::AAPL => dec!(178.50),
            Ticker::TSLA => dec!(242.80),
            Ticker::AMZN => dec!(145.30),
            Ticker::INFY => dec!(1450.75),
            Ticker::TCS => dec!(3520.40),
        }
    }
}
