//! The session pipeline: resolve config, create identity, take a role.
//!
//! [`SessionBootstrap::start`] runs the three steps in order and stops at the
//! first failure.  Each step that waits is bounded, so `start` always
//! finishes.  Dropping the returned future abandons whatever step is in
//! flight; a pending identity or connection is released with it.

use std::sync::Arc;
use std::time::Duration;

use peerlink_client::ClientSession;
use peerlink_core::{PeerTransport, SessionError, DEFAULT_TIMEOUT};
use peerlink_host::{HostSession, SessionStore};
use tracing::{error, info};

use crate::application::identity::create_identity;
use crate::domain::Route;
use crate::infrastructure::{ConfigResolver, CredentialFetcher, HttpCredentialFetcher};

/// A session that made it through the bootstrap.
#[derive(Debug)]
pub enum RunningSession {
    Host(HostSession),
    Client(ClientSession),
}

impl RunningSession {
    /// Role name for logs and CLI output.
    pub fn role(&self) -> &'static str {
        match self {
            Self::Host(_) => "host",
            Self::Client(_) => "client",
        }
    }
}

/// Runs sessions against one transport and one resolver.
pub struct SessionBootstrap<F = HttpCredentialFetcher> {
    resolver: ConfigResolver<F>,
    transport: Arc<dyn PeerTransport>,
    store: SessionStore,
    timeout: Duration,
}

impl<F: CredentialFetcher> SessionBootstrap<F> {
    pub fn new(resolver: ConfigResolver<F>, transport: Arc<dyn PeerTransport>) -> Self {
        Self {
            resolver,
            transport,
            store: SessionStore::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Store host sessions record into.  Defaults to a fresh store.
    pub fn with_store(mut self, store: SessionStore) -> Self {
        self.store = store;
        self
    }

    /// Bound for identity creation and connection establishment.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Starts a session in the role `route` selects.
    ///
    /// A client session is returned as soon as the dial is under way; the
    /// connection outcome is reported through
    /// [`ClientSession::view`](peerlink_client::ClientSession::view).
    ///
    /// # Errors
    ///
    /// The first failing step's error.  It is logged here as well, so callers
    /// only need to show its text.
    pub async fn start(&self, route: &Route) -> Result<RunningSession, SessionError> {
        self.run(route).await.map_err(|err| {
            error!("session setup failed: {err}");
            err
        })
    }

    async fn run(&self, route: &Route) -> Result<RunningSession, SessionError> {
        let config = self.resolver.resolve().await?;
        let identity = create_identity(self.transport.as_ref(), &config, self.timeout).await?;

        let session = match route {
            Route::Host => RunningSession::Host(HostSession::start(
                self.transport.as_ref(),
                identity,
                self.store.clone(),
            )),
            Route::Client { host } => RunningSession::Client(ClientSession::start(
                self.transport.as_ref(),
                &identity,
                host.clone(),
                self.timeout,
            )),
        };
        info!("{} session started", session.role());
        Ok(session)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
