//! Set of live subscribers.
//!
//! Membership is a `Vec<Subscriber>` behind an `RwLock`. Iteration works on a
//! copy taken under the read lock, so a callback may add or remove members
//! (including the one it is visiting) without deadlocking and without ever
//! seeing a half-updated set.

use crate::connection::Connection;
use log::debug;
use price_common::Result;
use std::fmt;
use std::ptr;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Handle to one outbound delivery path.
///
/// Two handles are equal when they wrap the same connection object.
#[derive(Clone)]
pub struct Subscriber {
    connection: Arc<dyn Connection>,
}

impl Subscriber {
    /// Wrap a connection.
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self { connection }
    }

    /// Peer identity for logs.
    pub fn peer(&self) -> String {
        self.connection.peer()
    }

    /// Write one message, bounded by `timeout`.
    pub fn deliver(&self, payload: &str, timeout: Duration) -> Result<()> {
        self.connection.send(payload, timeout)
    }

    /// Close the underlying connection. Safe to call repeatedly.
    pub fn close(&self) {
        self.connection.close()
    }

    /// Connection backing this subscriber.
    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }
}

impl PartialEq for Subscriber {
    fn eq(&self, other: &Self) -> bool {
        ptr::addr_eq(Arc::as_ptr(&self.connection), Arc::as_ptr(&other.connection))
    }
}

impl Eq for Subscriber {}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Subscriber").field(&self.peer()).finish()
    }
}

/// Concurrency-safe subscriber membership.
#[derive(Default)]
pub struct SubscriberRegistry {
    members: RwLock<Vec<Subscriber>>,
}

impl SubscriberRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `subscriber`; returns `false` if it was already registered.
    pub fn add(&self, subscriber: Subscriber) -> Result<bool> {
        let mut members = self.members.write()?;
        if members.contains(&subscriber) {
            return Ok(false);
        }
        debug!("Registering subscriber {}", subscriber.peer());
        members.push(subscriber);
        Ok(true)
    }

    /// Remove `subscriber`; returns `false` if it was not registered.
    pub fn remove(&self, subscriber: &Subscriber) -> Result<bool> {
        let mut members = self.members.write()?;
        let before = members.len();
        members.retain(|member| member != subscriber);
        Ok(members.len() != before)
    }

    /// Point-in-time copy of the membership.
    pub fn members(&self) -> Result<Vec<Subscriber>> {
        Ok(self.members.read()?.clone())
    }

    /// Call `f` for every subscriber registered at the moment of the call.
    ///
    /// No lock is held while `f` runs.
    pub fn for_each<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(&Subscriber),
    {
        for subscriber in self.members()?.iter() {
            f(subscriber);
        }
        Ok(())
    }

    /// `true` if `subscriber` is registered.
    pub fn contains(&self, subscriber: &Subscriber) -> Result<bool> {
        Ok(self.members.read()?.contains(subscriber))
    }

    /// Number of registered subscribers.
    pub fn len(&self) -> Result<usize> {
        Ok(self.members.read()?.len())
    }

    /// `true` if nobody is registered.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
