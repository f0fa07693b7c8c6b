//! Error taxonomy for session establishment.
//!
//! Every failure a session can hit ends up as a [`SessionError`].  There is
//! no structured recovery: callers log it and show its `Display` text to the
//! user, who restarts the session.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Boxed error used where the concrete source type lives in another crate.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// An error reported by the underlying transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportFault {
    message: String,
}

impl TransportFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failure to obtain a [`TransportConfig`](crate::TransportConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required source parameter is absent; no request was made.
    #[error("missing required parameter `{name}` for setting up peer config")]
    MissingParameter { name: &'static str },

    /// The HTTP client could not be set up.
    #[error("failed to build HTTP client: {source}")]
    HttpClient {
        #[source]
        source: BoxError,
    },

    /// The credential request could not be sent or completed.
    #[error("credential request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: BoxError,
    },

    /// The credential service answered with a non-success status.
    #[error("credential service at {endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    /// The response body is not a valid ICE server configuration.
    #[error("credential response is not a valid ICE configuration: {source}")]
    Malformed {
        #[source]
        source: BoxError,
    },
}

/// The step of session establishment a timeout belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Identity,
    Connection,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => f.write_str("identity"),
            Self::Connection => f.write_str("connection"),
        }
    }
}

/// Any failure of a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The transport rejected identity creation.
    #[error("creating peer identity failed: {0}")]
    Identity(#[source] TransportFault),

    /// No open signal arrived within the bound.
    #[error("initializing {stage} timed out after {}ms", .timeout.as_millis())]
    Timeout { stage: Stage, timeout: Duration },

    /// The transport reported an error on a connection.
    #[error("connection error: {0}")]
    Connection(#[source] TransportFault),

    /// The attempt was abandoned because its owner was disposed.
    #[error("session was disposed before {0} completed")]
    Disposed(Stage),
}

impl SessionError {
    /// The stage this error belongs to, if it is stage-specific.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Config(_) => None,
            Self::Identity(_) => Some(Stage::Identity),
            Self::Connection(_) => Some(Stage::Connection),
            Self::Timeout { stage, .. } | Self::Disposed(stage) => Some(*stage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_stage_and_millis() {
        let err = SessionError::Timeout {
            stage: Stage::Identity,
            timeout: Duration::from_millis(2000),
        };
        assert_eq!(err.to_string(), "initializing identity timed out after 2000ms");
        assert_eq!(err.stage(), Some(Stage::Identity));
    }

    #[test]
    fn test_config_error_is_transparent() {
        let err = SessionError::from(ConfigError::MissingParameter { name: "project" });
        assert_eq!(
            err.to_string(),
            "missing required parameter `project` for setting up peer config"
        );
        assert_eq!(err.stage(), None);
    }

    #[test]
    fn test_connection_error_wraps_fault_message() {
        let err = SessionError::Connection(TransportFault::new("peer-unavailable"));
        assert_eq!(err.to_string(), "connection error: peer-unavailable");
    }
}
