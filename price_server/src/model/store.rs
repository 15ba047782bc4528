//! Authoritative price state.
//!
//! `PriceStore` owns the instrument map and the `RwLock` guarding it. Readers
//! only ever get deep copies, and a mutation is computed in full before it
//! replaces the old map, so no reader can observe a tick half applied.

use price_common::{FeedError, Instrument, MessageKind, MutationSnapshot, Result, Ticker};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::RwLock;
use strum::IntoEnumIterator;

/// Instrument prices keyed by symbol. Keys never change after construction.
pub struct PriceStore {
    prices: RwLock<BTreeMap<Ticker, Instrument>>,
    len: usize,
}

impl PriceStore {
    /// Build a store from an explicit catalog.
    pub fn new<I>(catalog: I) -> Self
    where
        I: IntoIterator<Item = Instrument>,
    {
        let prices: BTreeMap<Ticker, Instrument> = catalog
            .into_iter()
            .map(|instrument| (instrument.symbol, instrument))
            .collect();
        let len = prices.len();
        Self {
            prices: RwLock::new(prices),
            len,
        }
    }

    /// Store seeded with every `Ticker` at its opening price.
    pub fn seeded() -> Self {
        Self::new(Ticker::iter().map(Instrument::seeded))
    }

    /// Number of instruments.
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Consistent copy of all instruments tagged with `kind`.
    pub fn snapshot(&self, kind: MessageKind) -> Result<MutationSnapshot> {
        let prices = self.prices.read()?;
        Ok(MutationSnapshot::new(kind, &prices))
    }

    /// Current prices in catalog order, for request/response callers.
    pub fn current_prices(&self) -> Result<Vec<Instrument>> {
        let prices = self.prices.read()?;
        Ok(prices.values().cloned().collect())
    }

    /// Apply `mutate` to every instrument as a single step and return the
    /// resulting `update` snapshot.
    ///
    /// The write lock is held while `mutate` runs. If it fails for any symbol,
    /// or returns an instrument with another symbol or a non-positive price,
    /// the store is left untouched and the error is returned.
    pub fn apply_mutation<F>(&self, mut mutate: F) -> Result<MutationSnapshot>
    where
        F: FnMut(&Instrument) -> Result<Instrument>,
    {
        let mut prices = self.prices.write()?;

        let mut next = BTreeMap::new();
        for (symbol, current) in prices.iter() {
            let updated = mutate(current)?;
            if updated.symbol != *symbol {
                return Err(FeedError::NumericFault(format!(
                    "mutation of {} produced symbol {}",
                    symbol, updated.symbol
                )));
            }
            if updated.price <= Decimal::ZERO {
                return Err(FeedError::NumericFault(format!(
                    "mutation of {} produced non-positive price {}",
                    symbol, updated.price
                )));
            }
            next.insert(*symbol, updated);
        }

        *prices = next;
        Ok(MutationSnapshot::new(MessageKind::Update, &prices))
    }
}
