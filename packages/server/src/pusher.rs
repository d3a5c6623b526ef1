//! Frame delivery seam between connection handlers and the broadcast registry.
//!
//! Handlers never write to sockets directly: every outgoing frame, private or
//! broadcast, goes through a [`FramePusher`], so writes to one connection
//! never interleave.

use std::{fmt, io};

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWrite;

/// Output side of a connection
pub type Sink = Box<dyn AsyncWrite + Send + Unpin>;

/// Process-unique connection identifier, assigned in accept order from 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    /// Display name a connection carries until it sends `JOIN` or `NAME`
    pub fn placeholder_name(self) -> String {
        format!("user{}", self.0)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Client {}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum PushError {
    #[error("{0} is not registered")]
    NotRegistered(ConnectionId),

    #[error("write failed: {0}")]
    Io(#[from] io::Error),
}

/// Registry of connection sinks supporting private pushes and broadcast
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FramePusher: Send + Sync {
    /// Add a connection's sink
    async fn register(&self, id: ConnectionId, sink: Sink);

    /// Remove and shut down a connection's sink; `false` if it was already gone
    async fn unregister(&self, id: ConnectionId) -> bool;

    /// Write an encoded frame to one connection only
    async fn push_to(&self, id: ConnectionId, frame: &[u8]) -> Result<(), PushError>;

    /// Write an encoded frame to every registered connection, pruning sinks
    /// whose write fails; returns the number of successful deliveries
    async fn broadcast(&self, frame: &[u8]) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_name_uses_id() {
        // テスト項目: 仮の表示名は user<ID> になる
        // given (前提条件):
        let id = ConnectionId::new(7);

        // when (操作):
        let name = id.placeholder_name();

        // then (期待する結果):
        assert_eq!(name, "user7");
        assert_eq!(id.to_string(), "Client 7");
    }
}
