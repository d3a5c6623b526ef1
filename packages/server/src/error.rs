//! Error types for the chat server.

use std::io;

use klvchat_shared::{FrameError, StreamError};
use thiserror::Error;

use crate::pusher::PushError;

/// Errors that stop the server as a whole
#[derive(Debug, Error)]
pub enum ServerError {
    /// Listening socket could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors that terminate a single connection
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Push(#[from] PushError),
}
