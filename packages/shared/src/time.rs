//! Time-related utilities with clock abstraction for testability.

use chrono::{Local, NaiveDateTime};

use crate::protocol::TIME_FORMAT;

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Current wall-clock time in the server's local time zone
    fn now_local(&self) -> NaiveDateTime;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_local(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_time: NaiveDateTime,
}

impl FixedClock {
    /// Create a new fixed clock with the given local time
    pub fn new(fixed_time: NaiveDateTime) -> Self {
        Self { fixed_time }
    }
}

impl Clock for FixedClock {
    fn now_local(&self) -> NaiveDateTime {
        self.fixed_time
    }
}

/// Format a local time as `YYYY-MM-DD HH:MM:SS`
pub fn format_timestamp(time: NaiveDateTime) -> String {
    time.format(TIME_FORMAT).to_string()
}
