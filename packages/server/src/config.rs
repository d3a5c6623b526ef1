//! Server configuration.

/// Default TCP port
pub const DEFAULT_PORT: u16 = 9001;

/// Default number of messages kept for `READ`
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Default upper bound for a single frame's value (16 MiB)
pub const DEFAULT_MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Listening endpoint and resource limits of a [`Server`](crate::Server)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,
    /// Port to bind to; 0 picks an ephemeral port
    pub port: u16,
    /// Capacity of the message history buffer
    pub history_capacity: usize,
    /// Largest accepted frame value in bytes
    pub max_frame_len: usize,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}
