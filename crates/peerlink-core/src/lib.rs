//! # peerlink-core
//!
//! Shared library for PeerLink containing the session domain model, the
//! per-connection lifecycle state machine, the bounded-wait primitive and the
//! transport capability surface.
//!
//! This crate is used by the host, the client and the application crate.
//! It performs no network I/O of its own: everything that talks to the
//! outside world goes through the [`transport::PeerTransport`] trait.
//!
//! # Architecture overview
//!
//! PeerLink lets a *host* and any number of *clients* find each other via a
//! signaling service and open a direct data channel.  A session goes through
//! these steps:
//!
//! ```text
//! resolve TransportConfig ──► create PeerIdentity ──┬─► host:   accept incoming connections
//!                                                   └─► client: dial the host's identity
//! ```
//!
//! - **`domain`** – Pure types: [`TransportConfig`], [`PeerIdentity`], the
//!   connection status machine and the host's [`SessionState`].
//!
//! - **`wait`** – [`bounded_wait`], the single race primitive used for both
//!   identity creation and connection establishment.
//!
//! - **`transport`** – The [`PeerTransport`] capability trait, the
//!   [`Connection`] type that drives the lifecycle state machine, and an
//!   in-memory transport used by tests and the demo.

pub mod domain;
pub mod error;
pub mod transport;
pub mod wait;

pub use domain::config::{IceServer, SignalingEndpoint, TransportConfig};
pub use domain::connection::{ConnectionEvent, ConnectionStatus, Payload};
pub use domain::identity::{PeerId, PeerIdentity};
pub use domain::session_state::SessionState;
pub use error::{ConfigError, SessionError, Stage, TransportFault};
pub use transport::{Connection, ConnectionHandle, DialOptions, IdentityEvent, PeerTransport};
pub use wait::{bounded_wait, DEFAULT_TIMEOUT};
