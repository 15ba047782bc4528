//! Boundary between the core and the transport.
//!
//! The core only needs a duplex channel it can write price messages to and
//! read from to detect closure. `WsConnection` provides that over a
//! `tungstenite` server socket; tests substitute an in-memory connection.

use log::debug;
use price_common::{FeedError, Result};
use std::io;
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tungstenite::{Message, WebSocket};

/// Upper bound for a client to complete the WebSocket upgrade.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of one inbound poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    /// The peer sent something. Its content is ignored.
    Frame,
    /// Nothing arrived within the poll interval.
    Idle,
    /// The peer closed the connection.
    Closed,
}

/// Duplex connection handed to the core by the transport layer.
///
/// Implementations must tolerate `send` and `recv` being called from
/// different threads, and `close` being called more than once.
pub trait Connection: Send + Sync {
    /// Human-readable peer identity for logs.
    fn peer(&self) -> String;

    /// Write one text message, giving up after `timeout`.
    fn send(&self, payload: &str, timeout: Duration) -> Result<()>;

    /// Wait a bounded time for inbound traffic.
    fn recv(&self) -> Result<Inbound>;

    /// Release the underlying resource.
    fn close(&self);
}

/// WebSocket server connection over a blocking `TcpStream`.
///
/// The socket sits behind a mutex shared by the writer and the reader. `recv`
/// waits for inbound bytes on a cloned handle without holding the lock, then
/// drains whatever arrived in non-blocking mode. A writer therefore only ever
/// waits for that drain, never for the poll interval.
pub struct WsConnection {
    socket: Mutex<WebSocket<TcpStream>>,
    control: TcpStream,
    peer: SocketAddr,
    closed: AtomicBool,
}

impl WsConnection {
    /// Perform the server side of the WebSocket upgrade on an accepted stream.
    pub fn accept(stream: TcpStream, read_poll_interval: Duration) -> Result<Self> {
        let peer = stream.peer_addr()?;
        stream.set_nonblocking(false)?;
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT))?;
        let control = stream.try_clone()?;

        let socket = tungstenite::accept(stream).map_err(|e| {
            FeedError::Format(format!("WebSocket handshake with {} failed: {}", peer, e))
        })?;
        control.set_read_timeout(Some(read_poll_interval))?;
        debug!("WebSocket upgrade completed for {}", peer);

        Ok(Self {
            socket: Mutex::new(socket),
            control,
            peer,
            closed: AtomicBool::new(false),
        })
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

/// Read every complete frame already available without blocking.
fn drain(socket: &mut WebSocket<TcpStream>) -> Result<Inbound> {
    let mut inbound = Inbound::Idle;
    loop {
        match socket.read() {
            Ok(Message::Close(_)) => return Ok(Inbound::Closed),
            Ok(_) => inbound = Inbound::Frame,
            Err(tungstenite::Error::Io(e)) if is_timeout(&e) => return Ok(inbound),
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                return Ok(Inbound::Closed);
            }
            Err(e) => return Err(e.into()),
        }
    }
}

impl Connection for WsConnection {
    fn peer(&self) -> String {
        self.peer.to_string()
    }

    fn send(&self, payload: &str, timeout: Duration) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(FeedError::ConnectionClosed);
        }
        let mut socket = self.socket.lock()?;
        socket.get_ref().set_write_timeout(Some(timeout))?;
        match socket.send(Message::text(payload.to_owned())) {
            Ok(()) => Ok(()),
            Err(tungstenite::Error::Io(e)) if is_timeout(&e) => {
                Err(FeedError::WriteTimeout(timeout))
            }
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                Err(FeedError::ConnectionClosed)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn recv(&self) -> Result<Inbound> {
        if self.closed.load(Ordering::Acquire) {
            return Ok(Inbound::Closed);
        }
        // Blocks for at most the read timeout set in `accept`.
        match self.control.peek(&mut [0u8; 1]) {
            Ok(0) => return Ok(Inbound::Closed),
            Ok(_) => {}
            Err(e) if is_timeout(&e) => return Ok(Inbound::Idle),
            Err(e) => return Err(e.into()),
        }

        let mut socket = self.socket.lock()?;
        socket.get_ref().set_nonblocking(true)?;
        let drained = drain(&mut socket);
        socket.get_ref().set_nonblocking(false)?;
        drained
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Err(e) = self.control.shutdown(Shutdown::Both) {
            debug!("Shutdown of {} reported: {}", self.peer, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    const POLL: Duration = Duration::from_millis(100);
    const WRITE_TIMEOUT: Duration = Duration::from_millis(50);
    const MESSAGES: usize = 20;
    const PAYLOAD: &str = r#"{"type":"update","prices":{}}"#;

    #[test]
    fn polling_reader_does_not_delay_writes() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = thread::spawn(move || {
            let (mut socket, _) = tungstenite::connect(format!("ws://{}/ws", addr)).unwrap();
            let mut received = 0;
            while received < MESSAGES {
                if let Message::Text(_) = socket.read().unwrap() {
                    received += 1;
                }
            }
            received
        });

        let (stream, _) = listener.accept().unwrap();
        let connection = Arc::new(WsConnection::accept(stream, POLL).unwrap());
        let reader = {
            let connection = Arc::clone(&connection);
            thread::spawn(move || loop {
                match connection.recv() {
                    Ok(Inbound::Idle) | Ok(Inbound::Frame) => continue,
                    other => return other.unwrap(),
                }
            })
        };
        // Let the reader settle into its poll loop.
        thread::sleep(POLL / 2);

        let mut worst = Duration::ZERO;
        for _ in 0..MESSAGES {
            let started = Instant::now();
            connection.send(PAYLOAD, WRITE_TIMEOUT).unwrap();
            worst = worst.max(started.elapsed());
        }

        assert!(worst < WRITE_TIMEOUT, "slowest send took {:?}", worst);
        assert_eq!(client.join().unwrap(), MESSAGES);
        assert_eq!(reader.join().unwrap(), Inbound::Closed);
    }

    #[test]
    fn close_is_idempotent_and_ends_reads() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = thread::spawn(move || tungstenite::connect(format!("ws://{}/ws", addr)));

        let (stream, _) = listener.accept().unwrap();
        let connection = WsConnection::accept(stream, POLL).unwrap();
        let _client = client.join().unwrap().unwrap();

        connection.close();
        connection.close();

        assert_eq!(connection.recv().unwrap(), Inbound::Closed);
        assert!(matches!(
            connection.send("{}", WRITE_TIMEOUT),
            Err(FeedError::ConnectionClosed)
        ));
    }
}
