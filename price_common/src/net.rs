//! Shared networking constants and helpers used by client and server.

/// Default port of the WebSocket price feed.
pub const FEED_PORT: u16 = 8080;

/// Path clients are expected to request during the WebSocket upgrade.
pub const FEED_PATH: &str = "/ws";

/// Helper to format an address with a port like "ip:port".
pub fn addr(ip: &str, port: u16) -> String {
    format!("{}:{}", ip, port)
}

/// Build the `ws://` URL for a feed server listening on `ip:port`.
pub fn feed_url(ip: &str, port: u16) -> String {
    format!("ws://{}{}", addr(ip, port), FEED_PATH)
}
