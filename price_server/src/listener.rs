//! WebSocket accept loop in front of the core.
//!
//! The listener is the transport collaborator: it completes the upgrade and
//! hands a ready `WsConnection` to `ConnectionLifecycle`.

use crate::connection::WsConnection;
use crate::lifecycle::ConnectionLifecycle;
use crate::shutdown::ShutdownSignal;
use log::{debug, error, info, warn};
use price_common::Result;
use price_common::net::FEED_PATH;
use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// How long the accept loop sleeps when no connection is pending.
const ACCEPT_POLL: Duration = Duration::from_millis(50);

/// TCP listener that upgrades incoming connections to WebSocket subscribers.
///
/// Accepting happens on the caller's thread; the upgrade and the rest of each
/// connection's life run on a thread of their own, so a slow handshake never
/// holds up other clients.
pub struct FeedListener {
    socket: TcpListener,
    read_poll_interval: Duration,
}

impl FeedListener {
    /// Bind a new listener to `bind_addr` (e.g., `0.0.0.0:8080`).
    pub fn bind(bind_addr: &str, read_poll_interval: Duration) -> Result<Self> {
        let socket = TcpListener::bind(bind_addr)?;
        Ok(Self {
            socket,
            read_poll_interval,
        })
    }

    /// Address actually bound, useful when binding to port 0.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Accept connections until `shutdown` fires, handing each one to `lifecycle`.
    pub fn accept_loop(
        self,
        lifecycle: Arc<ConnectionLifecycle>,
        shutdown: ShutdownSignal,
    ) -> Result<()> {
        self.socket.set_nonblocking(true)?;
        info!(
            "Price feed listening on ws://{}{}",
            self.socket.local_addr()?,
            FEED_PATH
        );

        while !shutdown.is_triggered() {
            match self.socket.accept() {
                Ok((stream, client_addr)) => {
                    debug!("TCP connection from {}", client_addr);
                    let lifecycle = Arc::clone(&lifecycle);
                    let shutdown = shutdown.clone();
                    let read_poll_interval = self.read_poll_interval;
                    thread::spawn(move || match WsConnection::accept(stream, read_poll_interval) {
                        Ok(connection) => {
                            let state = lifecycle.run(Arc::new(connection), &shutdown);
                            debug!("Connection {} finished as {:?}", client_addr, state);
                        }
                        Err(e) => warn!("Rejected {}: {}", client_addr, e),
                    });
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    shutdown.wait(ACCEPT_POLL);
                }
                Err(e) => {
                    error!("TCP connection error: {}", e);
                    shutdown.wait(ACCEPT_POLL);
                }
            }
        }
        info!("Listener stopped");
        Ok(())
    }
}
