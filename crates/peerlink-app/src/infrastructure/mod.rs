//! Infrastructure layer for peerlink-app.
//!
//! Everything that leaves the process: the HTTP request to the TURN
//! credential service.  The transport itself is injected as a
//! [`PeerTransport`](peerlink_core::PeerTransport) and lives in
//! peerlink-core.

pub mod config_resolver;

pub use config_resolver::{
    ConfigResolver, CredentialFetcher, HttpCredentialFetcher, StaticCredentialFetcher,
};
