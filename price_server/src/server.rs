//! Wiring of the core components into a running feed.

use crate::broadcaster::Broadcaster;
use crate::config::ServerConfig;
use crate::lifecycle::ConnectionLifecycle;
use crate::listener::FeedListener;
use crate::model::registry::SubscriberRegistry;
use crate::model::simulator::{PriceSimulator, UniformChange};
use crate::model::store::PriceStore;
use crate::shutdown::{self, ShutdownHandle, ShutdownSignal};
use crossbeam_channel::unbounded;
use log::{error, info};
use price_common::{MutationSnapshot, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::JoinHandle;

/// A bound, not yet running, price feed.
pub struct FeedServer {
    config: ServerConfig,
    store: Arc<PriceStore>,
    registry: Arc<SubscriberRegistry>,
    listener: FeedListener,
}

impl FeedServer {
    /// Seed the store and bind the listener.
    pub fn bind(config: ServerConfig) -> Result<Self> {
        let listener = FeedListener::bind(&config.bind_addr, config.read_poll_interval)?;
        Ok(Self {
            config,
            store: Arc::new(PriceStore::seeded()),
            registry: Arc::new(SubscriberRegistry::new()),
            listener,
        })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Shared price store, e.g. for a request/response prices endpoint.
    pub fn store(&self) -> Arc<PriceStore> {
        Arc::clone(&self.store)
    }

    /// Shared subscriber registry.
    pub fn registry(&self) -> Arc<SubscriberRegistry> {
        Arc::clone(&self.registry)
    }

    /// Start the simulator and broadcaster, then accept connections on the
    /// current thread until `shutdown` fires.
    ///
    /// The background workers are stopped and joined however the accept loop
    /// ends.
    pub fn run(self, shutdown: ShutdownSignal) -> Result<()> {
        let workers = self.start_workers();
        let lifecycle = Arc::new(ConnectionLifecycle::new(
            Arc::clone(&self.store),
            Arc::clone(&self.registry),
            self.config.write_timeout,
        ));

        let result = self.listener.accept_loop(lifecycle, shutdown);
        if let Err(e) = &result {
            error!("Accept loop failed: {}", e);
        }
        workers.stop();
        info!("Price feed stopped");
        result
    }

    fn start_workers(&self) -> Workers {
        let (stop, signal) = shutdown::channel();
        let (update_tx, update_rx) = unbounded::<MutationSnapshot>();

        let simulator = PriceSimulator::new(
            Arc::clone(&self.store),
            UniformChange,
            self.config.tick_interval,
        )
        .start(update_tx, signal.clone());
        let broadcaster = Broadcaster::new(Arc::clone(&self.registry), self.config.write_timeout)
            .start(update_rx, signal);

        Workers {
            stop,
            simulator,
            broadcaster,
        }
    }
}

/// Simulator and broadcaster threads of a running feed.
struct Workers {
    stop: ShutdownHandle,
    simulator: JoinHandle<()>,
    broadcaster: JoinHandle<()>,
}

impl Workers {
    fn stop(self) {
        self.stop.trigger();
        join("simulator", self.simulator);
        join("broadcaster", self.broadcaster);
    }
}

fn join(name: &str, handle: JoinHandle<()>) {
    if handle.join().is_err() {
        error!("The {} thread panicked", name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use price_common::MessageKind;
    use std::time::{Duration, Instant};

    fn config() -> ServerConfig {
        ServerConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            tick_interval: Duration::from_millis(10),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn workers_stop_without_the_process_signal() {
        let server = FeedServer::bind(config()).unwrap();
        let seeded = server.store.snapshot(MessageKind::Initial).unwrap().prices;
        let workers = server.start_workers();

        let deadline = Instant::now() + Duration::from_secs(2);
        while server.store.snapshot(MessageKind::Initial).unwrap().prices == seeded {
            assert!(Instant::now() < deadline, "simulator never ticked");
            std::thread::sleep(Duration::from_millis(5));
        }

        // Returns only once both threads have been joined.
        workers.stop();
    }
}
