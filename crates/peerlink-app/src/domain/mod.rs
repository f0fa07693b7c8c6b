//! Domain layer for peerlink-app.
//!
//! The resolver settings and the route that decides which role a session
//! plays.  The only I/O here is [`ResolverSettings::load`] reading the
//! settings file; environment variables and flags are layered in `main.rs`.

pub mod route;
pub mod settings;

pub use route::{Route, RouteError};
pub use settings::{ResolverSettings, SettingsError};
