//! Chat protocol vocabulary carried in KLV frames.

use std::fmt;

use crate::klv::Frame;

/// Frame keys used by the chat protocol.
pub mod keys {
    pub const JOIN: &str = "JOIN";
    pub const NAME: &str = "NAME";
    pub const MSG: &str = "MSG";
    pub const TIME: &str = "TIME";
    pub const READ: &str = "READ";
    pub const QUIT: &str = "QUIT";
    pub const RESP: &str = "RESP";
    pub const ERR: &str = "ERR";
}

/// `READ` reply when the history is empty.
pub const NO_HISTORY: &str = "No message history available.";

/// Format of the `TIME` reply (`YYYY-MM-DD HH:MM:SS`).
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Commands a client can send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Join,
    Name,
    Msg,
    Time,
    Read,
    Quit,
    Unknown(String),
}

impl Command {
    pub fn from_key(key: &str) -> Self {
        match key {
            keys::JOIN => Self::Join,
            keys::NAME => Self::Name,
            keys::MSG => Self::Msg,
            keys::TIME => Self::Time,
            keys::READ => Self::Read,
            keys::QUIT => Self::Quit,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Join => keys::JOIN,
            Self::Name => keys::NAME,
            Self::Msg => keys::MSG,
            Self::Time => keys::TIME,
            Self::Read => keys::READ,
            Self::Quit => keys::QUIT,
            Self::Unknown(key) => key,
        }
    }
}

/// Request status carried as ASCII decimal text in a `RESP` frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    BadRequest,
    Forbidden,
    Other(u16),
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::BadRequest => 400,
            Self::Forbidden => 403,
            Self::Other(code) => code,
        }
    }

    /// Parse the value of a `RESP` frame. Surrounding whitespace is ignored.
    pub fn parse(text: &str) -> Option<Self> {
        let code = text.trim().parse::<u16>().ok()?;
        Some(match code {
            200 => Self::Ok,
            400 => Self::BadRequest,
            403 => Self::Forbidden,
            other => Self::Other(other),
        })
    }

    pub fn is_success(self) -> bool {
        self == Self::Ok
    }

    /// The `RESP` frame announcing this status.
    pub fn to_frame(self) -> Frame {
        Frame::new(keys::RESP, self.to_string())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
