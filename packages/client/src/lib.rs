//! Client side of the KLV chat protocol.
//!
//! [`ChatClient`] is the interface a presentation layer builds on: connect,
//! send one frame per command, and receive every incoming frame through a
//! callback. [`run_client_session`] is the console front end built on it.

pub mod connection;
pub mod console;
pub mod error;
pub mod formatter;
pub mod session;
mod ui;

pub use connection::{ChatClient, ClientSender};
pub use error::ClientError;
pub use session::run_client_session;
