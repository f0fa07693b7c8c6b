//! Transport configuration types.
//!
//! A [`TransportConfig`] is fetched once per session and then only read.  The
//! fields are private so nothing can change a config after it has been handed
//! to the identity initializer; use the getters to inspect it.
//!
//! The ICE server list comes from the credential service as JSON, so
//! [`IceServer`] derives `Deserialize` and accepts the `urls` field either as
//! a single string or as an array of strings (both shapes are valid in the
//! WebRTC `RTCIceServer` dictionary).

use serde::{Deserialize, Deserializer, Serialize};

/// Default signaling host when none is configured.
pub const DEFAULT_SIGNALING_HOST: &str = "localhost";
/// Default signaling port when none is configured.
pub const DEFAULT_SIGNALING_PORT: u16 = 9000;
/// Default signaling path when none is configured.
pub const DEFAULT_SIGNALING_PATH: &str = "/";

/// A single STUN or TURN server entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServer {
    /// One or more `stun:` / `turn:` / `turns:` URLs.
    #[serde(deserialize_with = "one_or_many")]
    pub urls: Vec<String>,
    /// TURN username, absent for plain STUN servers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// TURN credential, absent for plain STUN servers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl IceServer {
    /// Creates a STUN entry without credentials.
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Urls {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Urls::deserialize(deserializer)? {
        Urls::One(url) => vec![url],
        Urls::Many(urls) => urls,
    })
}

/// Where the signaling server lives.
///
/// Missing fields deserialize to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalingEndpoint {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Default for SignalingEndpoint {
    /// `localhost:9000` at path `/`.
    fn default() -> Self {
        Self {
            host: DEFAULT_SIGNALING_HOST.to_string(),
            port: DEFAULT_SIGNALING_PORT,
            path: DEFAULT_SIGNALING_PATH.to_string(),
        }
    }
}

/// ICE servers plus signaling endpoint, resolved once per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransportConfig {
    ice_servers: Vec<IceServer>,
    signaling: SignalingEndpoint,
}

impl TransportConfig {
    pub fn new(ice_servers: Vec<IceServer>, signaling: SignalingEndpoint) -> Self {
        Self {
            ice_servers,
            signaling,
        }
    }

    /// ICE servers handed to the peer connection.
    pub fn ice_servers(&self) -> &[IceServer] {
        &self.ice_servers
    }

    /// Signaling endpoint the identity is registered against.
    pub fn signaling(&self) -> &SignalingEndpoint {
        &self.signaling
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_signaling_endpoint_is_localhost_9000_root() {
        // Arrange / Act
        let endpoint = SignalingEndpoint::default();

        // Assert
        assert_eq!(endpoint.host, "localhost");
        assert_eq!(endpoint.port, 9000);
        assert_eq!(endpoint.path, "/");
    }

    #[test]
    fn test_ice_server_accepts_single_url_string() {
        let json = r#"{"urls":"stun:stun.relay.metered.ca:80"}"#;

        let server: IceServer = serde_json::from_str(json).unwrap();

        assert_eq!(server.urls, vec!["stun:stun.relay.metered.ca:80"]);
        assert!(server.username.is_none());
    }

    #[test]
    fn test_ice_server_accepts_url_array_with_credentials() {
        let json = r#"{
            "urls": ["turn:a.relay.metered.ca:80", "turn:a.relay.metered.ca:443"],
            "username": "user",
            "credential": "secret"
        }"#;

        let server: IceServer = serde_json::from_str(json).unwrap();

        assert_eq!(server.urls.len(), 2);
        assert_eq!(server.username.as_deref(), Some("user"));
        assert_eq!(server.credential.as_deref(), Some("secret"));
    }

    #[test]
    fn test_transport_config_exposes_its_parts() {
        let config = TransportConfig::new(
            vec![IceServer::stun("stun:example.org:3478")],
            SignalingEndpoint::default(),
        );

        assert_eq!(config.ice_servers().len(), 1);
        assert_eq!(config.signaling().port, 9000);
    }

    #[test]
    fn test_transport_config_serializes_without_empty_credentials() {
        let config = TransportConfig::new(
            vec![IceServer::stun("stun:example.org:3478")],
            SignalingEndpoint::default(),
        );

        let json = serde_json::to_value(&config).unwrap();

        assert!(json["ice_servers"][0].get("username").is_none());
        assert_eq!(json["signaling"]["host"], "localhost");
    }
}
