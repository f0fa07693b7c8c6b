//! Transport capability surface.
//!
//! PeerLink does not implement WebRTC or ICE itself.  It drives a
//! [`PeerTransport`], which can create a local identity, dial a remote peer
//! and hand over inbound connections.  Everything the transport wants to tell
//! us arrives as events on channels:
//!
//! ```text
//! create_identity ──► IdentityEvent::{Open, Error}
//! dial / accept   ──► Connection ──► ConnectionEvent::{Open, Data, Error, Close}
//! ```
//!
//! [`Connection`] owns the event stream of one channel and runs it through the
//! lifecycle state machine in [`crate::domain::connection`], so consumers only
//! ever see events that are legal for the current status.
//!
//! # Sub-modules
//!
//! - **`memory`** – An in-process transport with a shared signaling hub.  It
//!   is what the tests and the CLI demo run on.

pub mod memory;

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::domain::config::TransportConfig;
use crate::domain::connection::{ConnectionEvent, ConnectionStatus, Payload};
use crate::domain::identity::{PeerId, PeerIdentity};
use crate::error::TransportFault;

/// Options for [`PeerTransport::dial`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialOptions {
    /// Request a reliable, ordered channel.
    pub reliable: bool,
}

impl Default for DialOptions {
    fn default() -> Self {
        Self { reliable: true }
    }
}

/// Outcome signals of identity creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityEvent {
    Open(PeerIdentity),
    Error(TransportFault),
}

/// The sending half of one data channel, implemented by a transport.
pub trait ChannelLink: Send + Sync {
    /// Queues `payload` for the remote side.  Never blocks and never fails
    /// synchronously; problems surface later as [`ConnectionEvent::Error`].
    fn send(&self, payload: Payload);

    /// Closes the channel for both sides.  Closing twice is a no-op.
    fn close(&self);
}

/// Capabilities PeerLink needs from a peer-to-peer transport.
pub trait PeerTransport: Send + Sync {
    /// Starts creating a local identity against the signaling endpoint.
    fn create_identity(&self, config: &TransportConfig) -> mpsc::UnboundedReceiver<IdentityEvent>;

    /// Starts opening a channel from `identity` to `remote`.
    fn dial(&self, identity: &PeerIdentity, remote: &PeerId, options: DialOptions) -> Connection;

    /// Registers `identity` for inbound connections; one item per offer.
    fn accept_incoming(&self, identity: &PeerIdentity) -> mpsc::UnboundedReceiver<Connection>;
}

/// One channel to one remote peer, with its lifecycle status.
///
/// Dropping a `Connection` that has not reached a terminal status closes the
/// underlying channel, so an abandoned dial or an aborted lifecycle task never
/// leaks a live link.
pub struct Connection {
    remote: PeerId,
    link: Arc<dyn ChannelLink>,
    events: mpsc::UnboundedReceiver<ConnectionEvent>,
    status: watch::Sender<ConnectionStatus>,
}

impl Connection {
    /// Wraps a transport channel.  The connection starts out `Pending`.
    pub fn new(
        remote: PeerId,
        link: Arc<dyn ChannelLink>,
        events: mpsc::UnboundedReceiver<ConnectionEvent>,
    ) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::Pending);
        Self {
            remote,
            link,
            events,
            status,
        }
    }

    pub fn remote(&self) -> &PeerId {
        &self.remote
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// A cloneable handle for sending, closing and watching the status.
    pub fn handle(&self) -> ConnectionHandle {
        ConnectionHandle {
            remote: self.remote.clone(),
            link: Arc::clone(&self.link),
            status: self.status.subscribe(),
        }
    }

    /// Waits for the next event that is legal in the current status.
    ///
    /// Illegal events (a second open, data after close, ...) are logged and
    /// skipped.  Returns `None` once the connection is terminal or the
    /// transport dropped the channel.
    pub async fn next_event(&mut self) -> Option<ConnectionEvent> {
        loop {
            let current = self.status();
            if current.is_terminal() {
                return None;
            }

            let event = self.events.recv().await?;
            match current.on_event(&event) {
                Some(next) => {
                    if next != current {
                        debug!("connection {}: {current} -> {next}", self.remote);
                        self.status.send_replace(next);
                    }
                    return Some(event);
                }
                None => {
                    warn!(
                        "connection {}: ignoring {} event while {current}",
                        self.remote,
                        event.kind()
                    );
                }
            }
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if !self.status().is_terminal() {
            debug!("connection {}: dropped while {}, closing", self.remote, self.status());
            self.link.close();
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("remote", &self.remote)
            .field("status", &self.status())
            .finish()
    }
}

/// Cloneable view of a [`Connection`] for sending and observing.
#[derive(Clone)]
pub struct ConnectionHandle {
    remote: PeerId,
    link: Arc<dyn ChannelLink>,
    status: watch::Receiver<ConnectionStatus>,
}

impl ConnectionHandle {
    pub fn remote(&self) -> &PeerId {
        &self.remote
    }

    /// Last status published by the owning [`Connection`].
    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Receiver that is notified on every status change.
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Best-effort send; see [`ChannelLink::send`].
    pub fn send(&self, payload: impl Into<Payload>) {
        self.link.send(payload.into());
    }

    pub fn close(&self) {
        self.link.close();
    }
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("remote", &self.remote)
            .field("status", &self.status())
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
