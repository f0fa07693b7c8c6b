//! Role selection from a page path.
//!
//! A path of the form `/join/<host-id>` makes the session a client of
//! `<host-id>`.  Every other path makes it a host.

use std::fmt;

use peerlink_core::PeerId;
use thiserror::Error;

/// Path prefix of join links.
pub const JOIN_PREFIX: &str = "/join/";

/// Which role a session plays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Accept clients and record their messages.
    Host,
    /// Connect to the given host.
    Client { host: PeerId },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// `/join` or `/join/` without a host id.
    #[error("join path `{path}` does not name a host")]
    MissingHostId { path: String },
}

impl Route {
    /// Parses a page path into a route.
    ///
    /// # Errors
    ///
    /// [`RouteError::MissingHostId`] for a join path with an empty host id.
    pub fn parse(path: &str) -> Result<Self, RouteError> {
        if path == "/join" {
            return Err(RouteError::MissingHostId {
                path: path.to_string(),
            });
        }

        match path.strip_prefix(JOIN_PREFIX) {
            Some("") => Err(RouteError::MissingHostId {
                path: path.to_string(),
            }),
            Some(id) => Ok(Self::Client {
                host: PeerId::from(id),
            }),
            None => Ok(Self::Host),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => f.write_str("host"),
            Self::Client { host } => write!(f, "client of {host}"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
