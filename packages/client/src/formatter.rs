//! Message formatting utilities for client display.

use klvchat_shared::{
    Frame,
    protocol::{Status, keys},
};

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format any frame received from the server
    ///
    /// # Arguments
    ///
    /// * `frame` - The received frame
    ///
    /// # Returns
    ///
    /// The text to print, starting on a fresh line
    pub fn format_frame(frame: &Frame) -> String {
        let text = frame.text();
        match frame.key.as_str() {
            keys::RESP => Self::format_status(&text),
            keys::READ => Self::format_history(&text),
            keys::ERR => format!("\n! {}\n", text),
            _ => format!("\n{}\n", text),
        }
    }

    /// Format the value of a `RESP` frame
    ///
    /// # Arguments
    ///
    /// * `code` - The ASCII status code as received
    pub fn format_status(code: &str) -> String {
        match Status::parse(code) {
            Some(Status::Ok) => "\n[Status] Success (200)\n".to_string(),
            Some(Status::BadRequest) => "\n[Status] Bad Request (400) - Request failed\n".to_string(),
            Some(Status::Forbidden) => {
                "\n[Status] Forbidden (403) - Operation not allowed\n".to_string()
            }
            Some(Status::Other(_)) | None => format!("\n[Status] Code: {}\n", code.trim()),
        }
    }

    /// Format a `READ` reply, one history entry per line
    pub fn format_history(text: &str) -> String {
        let mut output = String::new();
        output.push_str("\n------------------------------------------------------------\n");
        for line in text.split('\n').filter(|line| !line.trim().is_empty()) {
            output.push_str(line);
            output.push('\n');
        }
        output.push_str("------------------------------------------------------------\n");
        output
    }
}
