//! Application layer use cases for the client.
//!
//! - **`connect_host`** – Dials the host with a bounded wait and then watches
//!   the open connection for errors and closure.

pub mod connect_host;
