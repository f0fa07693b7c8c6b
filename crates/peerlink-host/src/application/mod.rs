//! Application layer use cases for the host.
//!
//! - **`session_store`** – The shared handle around
//!   [`SessionState`](peerlink_core::SessionState): three mutators, two read
//!   projections and a change notification.
//!
//! - **`accept_clients`** – Registers for inbound connections and turns each
//!   connection's lifecycle events into store mutations.

pub mod accept_clients;
pub mod session_store;
