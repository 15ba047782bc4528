//! Per-connection lifecycle.
//!
//! Each admitted connection gets its own thread running
//! `ConnectionLifecycle::run`:
//!
//! 1. `Admitted`: the transport hands over an upgraded connection.
//! 2. The current prices are written directly as an `initial` message.
//! 3. `Registered`: the subscriber joins the registry and receives updates.
//! 4. `Active`: the thread reads inbound traffic only to notice closure.
//! 5. `Closed` / `Failed`: the subscriber is removed and the connection released.
//!
//! The broadcaster may drop the same subscriber after a failed write. Removal is
//! idempotent and closing a connection twice is harmless, so both paths can run
//! in any order.

use crate::connection::{Connection, Inbound};
use crate::model::registry::{Subscriber, SubscriberRegistry};
use crate::model::store::PriceStore;
use crate::shutdown::ShutdownSignal;
use log::{debug, error, info, warn};
use price_common::{MessageKind, Result};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Lifecycle states of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Handed over by the transport, nothing sent yet.
    Admitted,
    /// Initial snapshot delivered and subscriber registered.
    Registered,
    /// Watching inbound traffic.
    Active,
    /// Closed by the client or by shutdown.
    Closed,
    /// Ended by an I/O error.
    Failed,
}

/// Binds connections to the registry.
pub struct ConnectionLifecycle {
    store: Arc<PriceStore>,
    registry: Arc<SubscriberRegistry>,
    write_timeout: Duration,
}

impl ConnectionLifecycle {
    /// Create a lifecycle manager over shared state.
    pub fn new(
        store: Arc<PriceStore>,
        registry: Arc<SubscriberRegistry>,
        write_timeout: Duration,
    ) -> Self {
        Self {
            store,
            registry,
            write_timeout,
        }
    }

    /// Send the `initial` snapshot to `connection`, then register it.
    ///
    /// Nothing is registered if the initial write fails.
    pub fn admit(&self, connection: Arc<dyn Connection>) -> Result<Subscriber> {
        let subscriber = Subscriber::new(connection);
        let initial = self.store.snapshot(MessageKind::Initial)?;
        subscriber.deliver(&initial.to_json()?, self.write_timeout)?;
        self.registry.add(subscriber.clone())?;
        Ok(subscriber)
    }

    /// Drive one connection from admission to release and return its final state.
    pub fn run(
        &self,
        connection: Arc<dyn Connection>,
        shutdown: &ShutdownSignal,
    ) -> ConnectionState {
        let peer = connection.peer();
        let mut state = ConnectionState::Admitted;
        debug!("{}: {:?}", peer, state);

        let subscriber = match self.admit(Arc::clone(&connection)) {
            Ok(subscriber) => subscriber,
            Err(e) => {
                warn!("Initial snapshot to {} failed: {}", peer, e);
                connection.close();
                return ConnectionState::Failed;
            }
        };
        state = transition(&peer, state, ConnectionState::Registered);
        info!("Client {} subscribed", peer);

        state = transition(&peer, state, ConnectionState::Active);
        let outcome = watch(&subscriber, shutdown);
        transition(&peer, state, outcome);

        self.release(&subscriber);
        outcome
    }

    /// Remove `subscriber` from the registry and close its connection.
    pub fn release(&self, subscriber: &Subscriber) {
        match self.registry.remove(subscriber) {
            Ok(true) => info!("Client {} unsubscribed", subscriber.peer()),
            Ok(false) => debug!("Client {} was already removed", subscriber.peer()),
            Err(e) => error!("Failed to remove client {}: {}", subscriber.peer(), e),
        }
        subscriber.close();
    }

    /// Run `connection` on a dedicated thread.
    pub fn spawn(
        self: &Arc<Self>,
        connection: Arc<dyn Connection>,
        shutdown: ShutdownSignal,
    ) -> JoinHandle<ConnectionState> {
        let lifecycle = Arc::clone(self);
        thread::spawn(move || lifecycle.run(connection, &shutdown))
    }
}

fn transition(peer: &str, from: ConnectionState, to: ConnectionState) -> ConnectionState {
    debug!("{}: {:?} -> {:?}", peer, from, to);
    to
}

/// Block on inbound traffic until the peer goes away or shutdown fires.
fn watch(subscriber: &Subscriber, shutdown: &ShutdownSignal) -> ConnectionState {
    loop {
        if shutdown.is_triggered() {
            return ConnectionState::Closed;
        }
        match subscriber.connection().recv() {
            Ok(Inbound::Frame) | Ok(Inbound::Idle) => continue,
            Ok(Inbound::Closed) => return ConnectionState::Closed,
            Err(e) => {
                debug!("Read from {} failed: {}", subscriber.peer(), e);
                return ConnectionState::Failed;
            }
        }
    }
}
