//! Accepting client connections and recording what they do.
//!
//! # Lifecycle handling
//!
//! Each accepted [`Connection`] is driven by its own task running
//! [`drive_client_connection`], which maps the connection's events onto the
//! [`SessionStore`]:
//!
//! | Event          | Store operation                          |
//! |----------------|------------------------------------------|
//! | `open`         | `add_client(remote)`                     |
//! | `data(p)`      | `add_message(remote, p as text)`         |
//! | `error(e)`     | none, logged only                        |
//! | `close`        | `remove_client(remote)`                  |
//!
//! An error does **not** remove the client.  Only an explicit close does.
//! Because `Errored` is terminal in the connection state machine, a client
//! whose connection errored stays listed until the session is reset.
//!
//! # Task structure
//!
//! ```text
//! accept loop task (one per HostSession)
//!  └─ JoinSet
//!       ├─ drive_client_connection(client A)
//!       └─ drive_client_connection(client B)
//! ```
//!
//! Aborting the accept loop drops the `JoinSet`, which aborts every
//! lifecycle task; their connections are dropped and therefore closed.  A
//! lifecycle task torn down this way removes its client from the store, the
//! same as a close would.  Errored clients stay listed.

use std::future::Future;

use peerlink_core::{Connection, ConnectionEvent, PeerId, PeerIdentity, PeerTransport};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::application::session_store::SessionStore;

/// Registers one standing handler for inbound connections of `identity`.
///
/// `on_connection` is called once per offer and the future it returns is
/// spawned next to the others.  The registration lives until the returned
/// task is aborted or the transport stops offering connections.  There is
/// no timeout.
pub fn accept_incoming<T, F, Fut>(
    transport: &T,
    identity: &PeerIdentity,
    mut on_connection: F,
) -> JoinHandle<()>
where
    T: PeerTransport + ?Sized,
    F: FnMut(Connection) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut incoming = transport.accept_incoming(identity);
    let host = identity.clone();

    tokio::spawn(async move {
        let mut lifecycles = JoinSet::new();
        loop {
            tokio::select! {
                offer = incoming.recv() => match offer {
                    Some(connection) => {
                        debug!("host {host}: connection offered by {}", connection.remote());
                        lifecycles.spawn(on_connection(connection));
                    }
                    None => break,
                },
                Some(joined) = lifecycles.join_next() => {
                    if let Err(e) = joined {
                        warn!("host {host}: connection task ended abnormally: {e}");
                    }
                }
            }
        }

        info!("host {host}: transport stopped offering connections");
        while lifecycles.join_next().await.is_some() {}
    })
}

/// Removes a still-listed client if its lifecycle task is dropped mid-way.
struct Listing {
    remote: PeerId,
    store: SessionStore,
    listed: bool,
}

impl Drop for Listing {
    fn drop(&mut self) {
        if self.listed {
            info!("client disconnected: {} (host shutting down)", self.remote);
            self.store.remove_client(&self.remote);
        }
    }
}

/// Applies one client connection's lifecycle to `store` until it ends.
pub async fn drive_client_connection(mut connection: Connection, store: SessionStore) {
    let remote = connection.remote().clone();
    let mut listing = Listing {
        remote: remote.clone(),
        store: store.clone(),
        listed: false,
    };

    while let Some(event) = connection.next_event().await {
        match event {
            ConnectionEvent::Open => {
                info!("client connected: {remote}");
                store.add_client(remote.clone());
                listing.listed = true;
            }
            ConnectionEvent::Data(payload) => {
                debug!("client {remote} sent data");
                store.add_message(remote.clone(), payload.to_message_text());
            }
            ConnectionEvent::Error(fault) => {
                error!("client {remote}: {fault}");
            }
            ConnectionEvent::Close => {
                info!("client disconnected: {remote}");
                store.remove_client(&remote);
                listing.listed = false;
            }
        }
    }

    // The link ended on its own; the entry stays as the events left it.
    listing.listed = false;
    debug!("client {remote}: lifecycle finished ({})", connection.status());
}

/// A running host: its identity, its store and the accept loop.
///
/// Dropping the session (or calling [`shutdown`](Self::shutdown)) stops
/// accepting and closes every client connection.
pub struct HostSession {
    identity: PeerIdentity,
    store: SessionStore,
    accept_task: JoinHandle<()>,
}

impl HostSession {
    /// Starts accepting clients for `identity`, recording them in `store`.
    pub fn start<T>(transport: &T, identity: PeerIdentity, store: SessionStore) -> Self
    where
        T: PeerTransport + ?Sized,
    {
        let handler_store = store.clone();
        let accept_task = accept_incoming(transport, &identity, move |connection| {
            drive_client_connection(connection, handler_store.clone())
        });
        info!("host {identity}: waiting for clients");

        Self {
            identity,
            store,
            accept_task,
        }
    }

    pub fn identity(&self) -> &PeerIdentity {
        &self.identity
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Path a client opens to join this host.
    pub fn join_path(&self) -> String {
        format!("/join/{}", self.identity)
    }

    /// Whether the accept loop is still running.
    pub fn is_accepting(&self) -> bool {
        !self.accept_task.is_finished()
    }

    pub fn shutdown(&self) {
        if !self.accept_task.is_finished() {
            info!("host {}: shutting down", self.identity);
            self.accept_task.abort();
        }
    }
}

impl std::fmt::Debug for HostSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostSession")
            .field("identity", &self.identity)
            .field("accepting", &self.is_accepting())
            .finish()
    }
}

impl Drop for HostSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
