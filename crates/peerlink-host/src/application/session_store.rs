//! SessionStore: the host's shared, observable session state.
//!
//! The store is created by whoever owns the host session and passed
//! explicitly to the acceptor; there is no global instance.  Writers are the
//! per-connection lifecycle tasks, readers are the presentation layer.
//!
//! # Atomicity
//!
//! Each mutator takes the write lock once, applies one change to the inner
//! [`SessionState`] and releases it.  Readers take the read lock and copy
//! what they need, so nobody ever sees half a mutation.  The lock is never
//! held across an `.await`.
//!
//! # Change notification
//!
//! Every mutation that changes the state bumps a revision counter published
//! on a `watch` channel.  A reader that wants to redraw on change awaits
//! `changed()` on [`SessionStore::subscribe`] and then reads the
//! projections again.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use peerlink_core::{PeerId, SessionState};
use tokio::sync::watch;
use tracing::debug;

struct Inner {
    state: RwLock<SessionState>,
    revision: watch::Sender<u64>,
}

/// Cloneable handle to the host's session state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(SessionState::new()),
                revision,
            }),
        }
    }

    /// Records `id` as connected; a no-op if it already is.
    pub fn add_client(&self, id: PeerId) {
        let changed = self.inner.state.write().add_client(id);
        if changed {
            self.bump();
        }
    }

    /// Records `id` as gone.  Its message log is kept.
    pub fn remove_client(&self, id: &PeerId) {
        let changed = self.inner.state.write().remove_client(id);
        if changed {
            self.bump();
        }
    }

    /// Appends `text` to the message log of `id`.
    pub fn add_message(&self, id: PeerId, text: impl Into<String>) {
        self.inner.state.write().add_message(id, text);
        self.bump();
    }

    /// Forgets all clients and messages.
    pub fn reset(&self) {
        self.inner.state.write().reset();
        self.bump();
    }

    /// Connected client ids in the order their connections opened.
    pub fn select_clients(&self) -> Vec<PeerId> {
        self.inner.state.read().select_clients()
    }

    /// Message logs for every client seen in this session.
    pub fn select_messages(&self) -> BTreeMap<PeerId, Vec<String>> {
        self.inner.state.read().select_messages()
    }

    /// Consistent copy of the whole state.
    pub fn snapshot(&self) -> SessionState {
        self.inner.state.read().clone()
    }

    /// Revision counter that increases on every change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    fn bump(&self) {
        self.inner.revision.send_modify(|rev| *rev += 1);
        debug!("session store revision {}", *self.inner.revision.borrow());
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
