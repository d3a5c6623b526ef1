//! Console input parsing.

use klvchat_shared::protocol::keys;
use thiserror::Error;

/// Commands available at the console prompt
pub const AVAILABLE_COMMANDS: &str = "name, msg, time, read, quit";

/// One line of console input, translated into the frame it sends
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Name(String),
    Msg(String),
    Time,
    Read,
    Quit,
}

impl ConsoleCommand {
    /// Frame key sent for this command
    pub fn key(&self) -> &'static str {
        match self {
            Self::Name(_) => keys::NAME,
            Self::Msg(_) => keys::MSG,
            Self::Time => keys::TIME,
            Self::Read => keys::READ,
            Self::Quit => keys::QUIT,
        }
    }

    /// Frame value sent for this command
    pub fn value(&self) -> &str {
        match self {
            Self::Name(text) | Self::Msg(text) => text,
            Self::Time | Self::Read | Self::Quit => "",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Unknown command: {0}\nAvailable: name, msg, time, read, quit")]
    Unknown(String),
}

/// Parse one line typed at the prompt.
///
/// The command word is case-insensitive and separated from its argument by
/// whitespace. Blank input yields `Ok(None)`.
pub fn parse_input(line: &str) -> Result<Option<ConsoleCommand>, ConsoleError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (command, argument) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim_start()),
        None => (line, ""),
    };

    let parsed = match command.to_lowercase().as_str() {
        "name" if argument.is_empty() => return Err(ConsoleError::Usage("name <new name>")),
        "name" => ConsoleCommand::Name(argument.to_string()),
        "msg" if argument.is_empty() => return Err(ConsoleError::Usage("msg <text>")),
        "msg" => ConsoleCommand::Msg(argument.to_string()),
        "time" => ConsoleCommand::Time,
        "read" => ConsoleCommand::Read,
        "quit" => ConsoleCommand::Quit,
        other => return Err(ConsoleError::Unknown(other.to_string())),
    };
    Ok(Some(parsed))
}
