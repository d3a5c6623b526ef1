//! Shared building blocks for the KLV chat server and client.
//!
//! The wire unit is a KLV (Key-Length-Value) frame: a 4-byte zero-padded
//! ASCII key, a 4-byte big-endian length and exactly that many value bytes.

pub mod klv;
pub mod logger;
pub mod protocol;
pub mod stream;
pub mod time;

pub use klv::{Frame, FrameError, NestedFrame, NestedMode};
pub use stream::{StreamError, read_exact, read_frame, write_frame};
