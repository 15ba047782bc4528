//! End-to-end test over a real WebSocket on localhost.

use price_common::net::FEED_PATH;
use price_common::{MessageKind, MutationSnapshot, Ticker};
use price_server::{FeedServer, ServerConfig, shutdown};
use std::net::TcpStream;
use std::thread;
use std::time::{Duration, Instant};
use strum::IntoEnumIterator;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

type Client = WebSocket<MaybeTlsStream<TcpStream>>;

fn test_config() -> ServerConfig {
    ServerConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        tick_interval: Duration::from_millis(50),
        write_timeout: Duration::from_millis(500),
        read_poll_interval: Duration::from_millis(20),
    }
}

fn connect(addr: std::net::SocketAddr) -> Client {
    let (mut client, _) = tungstenite::connect(format!("ws://{}{}", addr, FEED_PATH)).unwrap();
    if let MaybeTlsStream::Plain(stream) = client.get_mut() {
        stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    }
    client
}

fn next_snapshot(client: &mut Client) -> MutationSnapshot {
    loop {
        match client.read().unwrap() {
            Message::Text(text) => return MutationSnapshot::from_json(text.as_str()).unwrap(),
            _ => continue,
        }
    }
}

fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn clients_get_initial_then_updates_until_they_leave() {
    let server = FeedServer::bind(test_config()).unwrap();
    let addr = server.local_addr().unwrap();
    let registry = server.registry();
    let store = server.store();
    let (handle, signal) = shutdown::channel();
    let running = thread::spawn(move || server.run(signal));

    let mut a = connect(addr);
    let mut b = connect(addr);

    let initial = next_snapshot(&mut a);
    assert_eq!(initial.kind, MessageKind::Initial);
    assert_eq!(
        initial.prices.keys().copied().collect::<Vec<_>>(),
        Ticker::iter().collect::<Vec<_>>()
    );
    assert_eq!(next_snapshot(&mut b).kind, MessageKind::Initial);

    let update = next_snapshot(&mut a);
    assert_eq!(update.kind, MessageKind::Update);
    for instrument in update.prices.values() {
        assert!(instrument.price > rust_decimal::Decimal::ZERO);
    }
    assert_eq!(next_snapshot(&mut b).kind, MessageKind::Update);
    wait_until(|| registry.len().unwrap() == 2);

    a.close(None).unwrap();
    wait_until(|| registry.len().unwrap() == 1);
    assert_eq!(next_snapshot(&mut b).kind, MessageKind::Update);
    assert_eq!(store.current_prices().unwrap().len(), 5);

    handle.trigger();
    running.join().unwrap().unwrap();
}

#[test]
fn idle_clients_do_not_slow_the_fan_out() {
    const CLIENTS: usize = 10;
    let config = ServerConfig {
        tick_interval: Duration::from_millis(100),
        read_poll_interval: Duration::from_millis(100),
        ..test_config()
    };
    let server = FeedServer::bind(config).unwrap();
    let addr = server.local_addr().unwrap();
    let (handle, signal) = shutdown::channel();
    let running = thread::spawn(move || server.run(signal));

    let listening = Duration::from_secs(2);
    let clients: Vec<_> = (0..CLIENTS)
        .map(|_| {
            let mut client = connect(addr);
            thread::spawn(move || {
                let deadline = Instant::now() + listening;
                let mut updates = 0;
                while Instant::now() < deadline {
                    if next_snapshot(&mut client).kind == MessageKind::Update {
                        updates += 1;
                    }
                }
                updates
            })
        })
        .collect();

    for client in clients {
        let updates = client.join().unwrap();
        // About 20 ticks fit in the window; a stalled pass would deliver a handful.
        assert!(updates >= 10, "client received only {} updates", updates);
    }

    handle.trigger();
    running.join().unwrap().unwrap();
}
