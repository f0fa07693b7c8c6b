//! Settings for resolving a transport configuration.
//!
//! [`ResolverSettings`] is built in layers, lowest precedence first:
//!
//! 1. [`ResolverSettings::default`]
//! 2. An optional TOML file ([`ResolverSettings::load`])
//! 3. Environment variables and CLI flags, applied by `main.rs`
//!
//! # TOML layout
//!
//! ```toml
//! project = "my-project"
//! api_key = "secret"
//! request_timeout_secs = 10
//!
//! [signaling]
//! host = "peer.example.com"
//! port = 443
//! path = "/peerjs"
//! ```
//!
//! Every field is optional.  Project and API key are only checked when the
//! configuration is actually resolved, so a settings file without them is
//! still valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use peerlink_core::SignalingEndpoint;
use serde::Deserialize;
use thiserror::Error;

/// Timeout for the credential request when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Error type for reading a settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The file could not be read.
    #[error("I/O error reading settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Inputs of the config resolver.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    /// Metered project name, the subdomain of the credential service.
    pub project: Option<String>,

    /// Metered API key.
    pub api_key: Option<String>,

    /// Signaling server the identity registers with.
    pub signaling: SignalingEndpoint,

    /// Replaces `https://{project}.metered.live` as the credential service
    /// base URL.  Meant for self-hosted relays and tests.
    pub credential_base_url: Option<String>,

    /// Upper bound for the credential request.
    pub request_timeout_secs: u64,
}

impl Default for ResolverSettings {
    /// No credentials, signaling at `localhost:9000/`, 10 s request timeout.
    fn default() -> Self {
        Self {
            project: None,
            api_key: None,
            signaling: SignalingEndpoint::default(),
            credential_base_url: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ResolverSettings {
    /// Parses settings from TOML text.  Absent fields keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses the settings file at `path`.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_signaling_is_localhost_9000_root() {
        let settings = ResolverSettings::default();
        assert_eq!(settings.signaling.host, "localhost");
        assert_eq!(settings.signaling.port, 9000);
        assert_eq!(settings.signaling.path, "/");
    }

    #[test]
    fn test_default_has_no_credentials() {
        let settings = ResolverSettings::default();
        assert!(settings.project.is_none());
        assert!(settings.api_key.is_none());
        assert_eq!(settings.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let settings = ResolverSettings::from_toml_str("").unwrap();
        assert_eq!(settings, ResolverSettings::default());
    }

    #[test]
    fn test_full_toml_is_parsed() {
        // Arrange
        let text = r#"
            project = "demo"
            api_key = "k"
            credential_base_url = "http://127.0.0.1:8080"
            request_timeout_secs = 3

            [signaling]
            host = "peer.example.com"
            port = 443
            path = "/peerjs"
        "#;

        // Act
        let settings = ResolverSettings::from_toml_str(text).unwrap();

        // Assert
        assert_eq!(settings.project.as_deref(), Some("demo"));
        assert_eq!(settings.api_key.as_deref(), Some("k"));
        assert_eq!(settings.credential_base_url.as_deref(), Some("http://127.0.0.1:8080"));
        assert_eq!(settings.request_timeout(), Duration::from_secs(3));
        assert_eq!(settings.signaling.host, "peer.example.com");
        assert_eq!(settings.signaling.port, 443);
        assert_eq!(settings.signaling.path, "/peerjs");
    }

    #[test]
    fn test_partial_signaling_table_keeps_other_defaults() {
        let settings = ResolverSettings::from_toml_str("[signaling]\nport = 9443\n").unwrap();
        assert_eq!(settings.signaling.port, 9443);
        assert_eq!(settings.signaling.host, "localhost");
        assert_eq!(settings.signaling.path, "/");
    }

    #[test]
    fn test_wrong_type_is_parse_error() {
        let result = ResolverSettings::from_toml_str("request_timeout_secs = \"soon\"");
        assert!(matches!(result, Err(SettingsError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = ResolverSettings::load(Path::new("/nonexistent/peerlink/settings.toml"));
        match result {
            Err(SettingsError::Io { path, .. }) => {
                assert!(path.ends_with("settings.toml"));
            }
            other => panic!("expected I/O error, got {other:?}"),
        }
    }
}
