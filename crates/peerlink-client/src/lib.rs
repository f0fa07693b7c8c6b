//! peerlink-client library entry point.
//!
//! # What does the client do?
//!
//! The *client* knows the host's identity (usually from a join link) and
//! opens exactly one connection to it:
//!
//! 1. Dials the host id over a reliable, ordered channel.
//! 2. Waits a bounded time for the channel to open.
//! 3. Sends messages to the host, fire-and-forget.
//! 4. Exposes the connection status and the last error so a UI can show them.
//!
//! There is no retry.  A failed or timed-out connection leaves the session
//! in an errored state with a human-readable error string.

/// Application layer: connecting to the host and observing the connection.
pub mod application;

pub use application::connect_host::{await_open, connect, ClientSession, ClientView};
