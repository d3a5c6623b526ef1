//! KLV chat room server.
//!
//! Accepts TCP connections, reads KLV frames from each one, executes the chat
//! commands they carry and fans results out to every connected client.

pub mod config;
pub mod error;
pub mod handler;
pub mod history;
pub mod pusher;
pub mod registry;
pub mod server;
pub mod session;
mod signal;

pub use config::ServerConfig;
pub use error::{HandlerError, ServerError};
pub use handler::ConnectionHandler;
pub use history::HistoryBuffer;
pub use pusher::{ConnectionId, FramePusher, PushError, Sink};
pub use registry::BroadcastRegistry;
pub use server::{Server, run_server};
pub use session::{Delivery, Outcome, Session};
