//! Domain state of the price feed.
//!
//! - `store`: authoritative instrument prices behind a single lock.
//! - `simulator`: periodic random walk that mutates the store.
//! - `registry`: the set of subscribers the broadcaster fans out to.

pub mod registry;
pub mod simulator;
pub mod store;
