//! peerlink-host library entry point.
//!
//! # What does the host do?
//!
//! The *host* is the participant that everybody else connects to.  Once it
//! has a confirmed identity it:
//!
//! 1. Registers with the transport to receive inbound connection offers.
//! 2. Attaches lifecycle handlers to each accepted connection.
//! 3. Records connected clients and the messages they send in a
//!    [`SessionStore`](application::session_store::SessionStore) that a
//!    presentation layer reads.
//!
//! The host never dials anybody and never times out while waiting: it waits
//! for clients for as long as the session lives.

/// Application layer: session store and connection acceptor.
pub mod application;

pub use application::accept_clients::{accept_incoming, drive_client_connection, HostSession};
pub use application::session_store::SessionStore;
