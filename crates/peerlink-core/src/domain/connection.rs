//! Connection lifecycle state machine.
//!
//! Every connection, on either side, moves through the same small set of
//! states:
//!
//! ```text
//!             open                close
//! Pending ───────────► Open ───────────────► Closed
//!    │                  │ ▲
//!    │ error            │ └── data
//!    ▼                  │ error
//! Errored ◄─────────────┘
//! ```
//!
//! `Closed` and `Errored` are terminal.  An event that has no arrow out of
//! the current state (a second `open`, data after `close`, a `close` after an
//! `error`) is rejected by [`ConnectionStatus::on_event`]; the caller drops
//! it.  That is what gives each connection at-most-once delivery of its
//! terminal event.

use std::borrow::Cow;
use std::fmt;

use serde::Serialize;

use crate::error::TransportFault;

/// Lifecycle status of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// Dialled or offered, channel not yet open.
    Pending,
    /// Channel open; data may flow.
    Open,
    /// Closed by either side.
    Closed,
    /// The transport reported an error.
    Errored,
}

impl ConnectionStatus {
    /// Whether no further events are accepted.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Errored)
    }

    /// Returns the next status if `event` is allowed in this state.
    pub fn on_event(self, event: &ConnectionEvent) -> Option<Self> {
        use ConnectionEvent as E;

        match (self, event) {
            (Self::Pending, E::Open) => Some(Self::Open),
            (Self::Pending, E::Error(_)) => Some(Self::Errored),
            (Self::Open, E::Data(_)) => Some(Self::Open),
            (Self::Open, E::Close) => Some(Self::Closed),
            (Self::Open, E::Error(_)) => Some(Self::Errored),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// A message carried over a data channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

impl Payload {
    /// Renders the payload as the string stored in a message log.
    ///
    /// Binary payloads are decoded as UTF-8, replacing invalid sequences.
    pub fn to_message_text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text),
            Self::Binary(bytes) => String::from_utf8_lossy(bytes),
        }
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}

/// A lifecycle event raised by the transport for one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Open,
    Data(Payload),
    Error(TransportFault),
    Close,
}

impl ConnectionEvent {
    /// Short name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Data(_) => "data",
            Self::Error(_) => "error",
            Self::Close => "close",
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
