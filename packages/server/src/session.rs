//! Per-connection command dispatch.
//!
//! A [`Session`] owns the display name of one connection and turns each
//! incoming frame into an [`Outcome`]: the status to report, the reply frame
//! and where that reply goes. It never touches the network, which keeps the
//! command table testable without sockets.

use klvchat_shared::{
    Frame,
    protocol::{Command, NO_HISTORY, Status, keys},
    time::{Clock, format_timestamp},
};

use crate::{history::HistoryBuffer, pusher::ConnectionId};

/// Where a reply frame is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// To every registered connection, including the requester
    Broadcast,
    /// To the requesting connection only
    Private,
}

/// Result of executing one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub status: Status,
    pub reply: Frame,
    pub delivery: Delivery,
    /// Text to append to the history once the request succeeds
    pub history_entry: Option<String>,
    /// Whether the connection closes after responding
    pub closes: bool,
}

impl Outcome {
    fn broadcast(key: &str, text: String) -> Self {
        Self {
            status: Status::Ok,
            reply: Frame::new(key, text),
            delivery: Delivery::Broadcast,
            history_entry: None,
            closes: false,
        }
    }

    fn private(key: &str, text: String) -> Self {
        Self {
            delivery: Delivery::Private,
            ..Self::broadcast(key, text)
        }
    }

    fn rejected(text: String) -> Self {
        Self {
            status: Status::BadRequest,
            ..Self::private(keys::ERR, text)
        }
    }
}

/// State owned by one connection's worker
#[derive(Debug, Clone)]
pub struct Session {
    id: ConnectionId,
    name: String,
}

impl Session {
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            name: id.placeholder_name(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execute the command carried by `frame`.
    ///
    /// `MSG` only reports its history entry; the caller appends it after the
    /// status has been sent.
    pub async fn dispatch(
        &mut self,
        frame: &Frame,
        history: &HistoryBuffer,
        clock: &dyn Clock,
    ) -> Outcome {
        let value = frame.text();

        match Command::from_key(&frame.key) {
            Command::Join => {
                if !value.is_empty() {
                    self.name = value.into_owned();
                }
                Outcome::broadcast(keys::JOIN, format!("{} joined", self.name))
            }
            Command::Name => {
                let new_name = value.into_owned();
                let text = format!("{} has changed their name to {}", self.name, new_name);
                self.name = new_name;
                Outcome::broadcast(keys::NAME, text)
            }
            Command::Msg => {
                if value.trim().is_empty() {
                    return Outcome::rejected("Empty message rejected".to_string());
                }
                let text = format!("{}:\t{}", self.name, value);
                Outcome {
                    history_entry: Some(text.clone()),
                    ..Outcome::broadcast(keys::MSG, text)
                }
            }
            Command::Time => {
                Outcome::broadcast(keys::TIME, format_timestamp(clock.now_local()))
            }
            Command::Read => {
                let entries = history.snapshot().await;
                let text = if entries.is_empty() {
                    NO_HISTORY.to_string()
                } else {
                    entries.join("\n")
                };
                Outcome::private(keys::READ, text)
            }
            Command::Quit => Outcome {
                closes: true,
                ..Outcome::broadcast(keys::QUIT, format!("{} has left :(", self.name))
            },
            Command::Unknown(key) => Outcome::rejected(format!("Unknown command: {}", key)),
        }
    }
}
