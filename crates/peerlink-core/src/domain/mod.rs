//! Domain entities for PeerLink.
//!
//! Everything in here is plain data plus the rules that govern it.  There
//! are no sockets, timers or tasks in this module, so every rule can be unit
//! tested in isolation.

/// Transport configuration (ICE servers and signaling endpoint).
pub mod config;

/// Connection lifecycle: status machine, events and payloads.
pub mod connection;

/// Local identities and remote peer ids.
pub mod identity;

/// The host's view of connected clients and their messages.
pub mod session_state;
