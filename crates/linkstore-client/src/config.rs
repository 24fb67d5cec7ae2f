//! Client configuration.

use linkstore_core::Format;
use std::time::Duration;

/// Delay between a socket closing and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Default capacity of the intent channel feeding a session.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket URL of the store, e.g. `ws://127.0.0.1:8080/websocket`.
    pub url: String,
    /// Fixed delay before every reconnect attempt. Never grows.
    pub reconnect_delay: Duration,
    /// Display format used for fetches.
    pub format: Format,
    /// Entry shown after the first connect.
    pub start_index: u32,
    pub channel_capacity: usize,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn with_start_index(mut self, index: u32) -> Self {
        self.start_index = index;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8080/websocket".to_string(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            format: Format::Text,
            start_index: 1,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}
