//! peerlink-app library crate.
//!
//! Wires the pieces of a PeerLink session together:
//!
//! ```text
//! ResolverSettings ──► ConfigResolver ──► TransportConfig
//!                                              │
//!                            create_identity ◄─┘
//!                                  │
//!                  Route::Host ────┼──── Route::Client { host }
//!                       │                        │
//!                  HostSession             ClientSession
//! ```
//!
//! # Layers
//!
//! - `domain` has no I/O: settings and routes.
//! - `application` runs the bootstrap pipeline against an injected transport.
//! - `infrastructure` talks HTTP to the credential service.

/// Domain layer: settings and route parsing.
pub mod domain;

/// Application layer: identity creation and session bootstrap.
pub mod application;

/// Infrastructure layer: credential service client.
pub mod infrastructure;
