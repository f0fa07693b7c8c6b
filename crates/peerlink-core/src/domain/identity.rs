//! Peer ids and the local identity.
//!
//! A [`PeerId`] is any participant's id as a string.  A [`PeerIdentity`] is
//! *our own* id, and only exists once the signaling endpoint has confirmed it
//! with an "open" signal.  Holding a `PeerIdentity` therefore means the
//! session has reached the usable state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque id of a participant as assigned by the signaling endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PeerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The local participant's confirmed identity.
///
/// There is no setter: an identity is created once by the transport when the
/// signaling endpoint reports it open, and it stays the same for the whole
/// session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerIdentity {
    id: PeerId,
}

impl PeerIdentity {
    /// Called by a transport when the signaling endpoint confirms `id`.
    pub fn confirmed(id: impl Into<PeerId>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &PeerId {
        &self.id
    }
}

impl fmt::Display for PeerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.id, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_id_displays_raw_string() {
        let id = PeerId::from("abc123");
        assert_eq!(id.to_string(), "abc123");
        assert_eq!(id.as_str(), "abc123");
    }

    #[test]
    fn test_confirmed_identity_keeps_its_id() {
        let identity = PeerIdentity::confirmed("host-1");
        assert_eq!(identity.id(), &PeerId::from("host-1"));
        assert_eq!(identity.to_string(), "host-1");
    }

    #[test]
    fn test_peer_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&PeerId::from("client1")).unwrap();
        assert_eq!(json, "\"client1\"");
    }
}
