//! UI utilities for the console client.

use std::io::Write;

pub const PROMPT: &str = "> ";

/// Redisplay the prompt after printing an incoming frame
pub fn redisplay_prompt() {
    print!("{}", PROMPT);
    std::io::stdout().flush().ok();
}
