//! Application layer for peerlink-app.
//!
//! - **`identity`** – Creates the local peer identity with a bounded wait.
//! - **`bootstrap`** – Runs resolve → identity → role and hands back the
//!   running session.

pub mod bootstrap;
pub mod identity;

pub use bootstrap::{RunningSession, SessionBootstrap};
pub use identity::create_identity;
