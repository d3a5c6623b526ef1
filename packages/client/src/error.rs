//! Error types for the chat client.

use std::io;

use klvchat_shared::StreamError;
use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server could not be reached
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Writing a frame to the server failed
    #[error("connection error: {0}")]
    Stream(#[from] StreamError),

    /// The connection was closed after an unreadable frame
    #[error("not connected")]
    Disconnected,
}
