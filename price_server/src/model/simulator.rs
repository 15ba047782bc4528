//! Periodic price mutation.
//!
//! The `PriceSimulator` runs a background thread that wakes on a fixed interval,
//! moves every instrument in the `PriceStore` by a small random step and pushes
//! the resulting `update` snapshot onto the broadcaster queue.
//!
//! Price model:
//! - Each tick draws an independent relative change per symbol, uniform in
//!   `[-1%, +1%]`.
//! - The new price is rounded half away from zero to two decimal places and
//!   then clamped so the rounded move never exceeds 1%.
//! - `change` is the percentage of the current tick only, not cumulative.
//!
//! A tick that hits a numeric fault is skipped as a whole; the thread keeps
//! running.

use crate::model::store::PriceStore;
use crate::shutdown::ShutdownSignal;
use crossbeam_channel::{Sender, select, tick};
use log::{debug, info, warn};
use price_common::{FeedError, Instrument, MutationSnapshot, Result};
use rand::Rng;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Largest relative move of a single tick.
pub const MAX_CHANGE: Decimal = dec!(0.01);

/// Decimal places kept on prices.
const PRICE_SCALE: u32 = 2;

/// Resolution of a random draw, in decimal places.
const DRAW_SCALE: u32 = 6;

/// `MAX_CHANGE` expressed in units of `DRAW_SCALE`.
const DRAW_BOUND: i64 = 10_000;

/// Source of per-symbol relative changes.
pub trait ChangeSource: Send {
    /// Next relative change, expected in `[-MAX_CHANGE, MAX_CHANGE]`.
    fn next_change(&mut self) -> Decimal;
}

/// Uniform draws from the thread-local RNG.
pub struct UniformChange;

impl ChangeSource for UniformChange {
    fn next_change(&mut self) -> Decimal {
        let mut rng = rand::rng();
        Decimal::new(rng.random_range(-DRAW_BOUND..=DRAW_BOUND), DRAW_SCALE)
    }
}

fn scaled(price: Decimal, factor: Decimal, strategy: RoundingStrategy) -> Result<Decimal> {
    price
        .checked_mul(factor)
        .map(|p| p.round_dp_with_strategy(PRICE_SCALE, strategy))
        .ok_or_else(|| FeedError::NumericFault(format!("{} * {} overflows", price, factor)))
}

/// Price after applying `change` to `current`.
///
/// The result is rounded to two decimal places and stays within 1% of
/// `current` after rounding.
pub fn next_price(current: Decimal, change: Decimal) -> Result<Decimal> {
    if change.abs() > MAX_CHANGE {
        return Err(FeedError::NumericFault(format!(
            "relative change {} is outside +/-{}",
            change, MAX_CHANGE
        )));
    }

    let lower = scaled(current, Decimal::ONE - MAX_CHANGE, RoundingStrategy::ToPositiveInfinity)?;
    let upper = scaled(current, Decimal::ONE + MAX_CHANGE, RoundingStrategy::ToNegativeInfinity)?;
    if lower > upper {
        return Err(FeedError::NumericFault(format!(
            "price {} is too small to move at two decimal places",
            current
        )));
    }

    let next = scaled(current, Decimal::ONE + change, RoundingStrategy::MidpointAwayFromZero)?
        .clamp(lower, upper);
    if next <= Decimal::ZERO {
        return Err(FeedError::NumericFault(format!(
            "price {} moved to non-positive {}",
            current, next
        )));
    }
    Ok(next)
}

/// Instrument after one tick with relative `change`.
pub fn mutate(instrument: &Instrument, change: Decimal) -> Result<Instrument> {
    Ok(Instrument {
        symbol: instrument.symbol,
        price: next_price(instrument.price, change)?,
        change_percent: (change * dec!(100)).normalize(),
    })
}

/// Hand `snapshot` to the broadcast queue.
fn publish(updates: &Sender<MutationSnapshot>, snapshot: MutationSnapshot) -> Result<()> {
    updates
        .send(snapshot)
        .map_err(|_| FeedError::ChannelSend("broadcast queue closed".to_string()))
}

/// Background task that perturbs the store on a fixed cadence.
pub struct PriceSimulator<S = UniformChange> {
    store: Arc<PriceStore>,
    source: S,
    interval: Duration,
    ticks: u64,
}

impl<S: ChangeSource + 'static> PriceSimulator<S> {
    /// Create a simulator mutating `store` every `interval`.
    pub fn new(store: Arc<PriceStore>, source: S, interval: Duration) -> Self {
        Self {
            store,
            source,
            interval,
            ticks: 0,
        }
    }

    /// Run one mutation step now and return its `update` snapshot.
    pub fn tick(&mut self) -> Result<MutationSnapshot> {
        let source = &mut self.source;
        let snapshot = self
            .store
            .apply_mutation(|instrument| mutate(instrument, source.next_change()))?;
        self.ticks += 1;
        Ok(snapshot)
    }

    /// Start the simulator thread.
    ///
    /// Every snapshot is sent to `updates` after the store lock is released.
    /// The thread stops when `shutdown` fires or the receiving side of
    /// `updates` is gone.
    pub fn start(
        mut self,
        updates: Sender<MutationSnapshot>,
        shutdown: ShutdownSignal,
    ) -> JoinHandle<()> {
        thread::spawn(move || {
            let ticker = tick(self.interval);
            info!(
                "Price simulator started: {} instruments every {:?}",
                self.store.len(),
                self.interval
            );

            loop {
                select! {
                    recv(shutdown.receiver()) -> _ => break,
                    recv(ticker) -> _ => match self.tick() {
                        Ok(snapshot) => {
                            debug!("Tick {} computed", self.ticks);
                            if let Err(e) = publish(&updates, snapshot) {
                                warn!("{}, stopping simulator", e);
                                break;
                            }
                        }
                        Err(e) => warn!("Skipping tick: {}", e),
                    },
                }
            }
            info!("Price simulator stopped after {} ticks", self.ticks);
        })
    }
}
