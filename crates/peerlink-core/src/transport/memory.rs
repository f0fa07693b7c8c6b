//! In-process transport.
//!
//! # Why an in-memory transport?
//!
//! A real WebRTC transport needs a signaling server, STUN/TURN reachability
//! and a second peer.  None of that is available in a unit test.
//! [`MemoryTransport`] replaces the whole stack with a hub shared by every
//! clone of the transport: identities register in the hub, `dial` looks the
//! remote up there, and both ends of a channel are a pair of mpsc queues.
//!
//! Behaviour can be switched per transport to exercise every outcome of the
//! bounded waits:
//!
//! - [`IdentityBehavior::Silent`] never answers identity creation (timeout).
//! - [`IdentityBehavior::Fail`] answers with an error.
//! - [`DialBehavior::Silent`] never opens dialled channels (timeout).
//!
//! [`scripted_connection`] builds a single [`Connection`] whose events are
//! pushed by the test, for lifecycle sequences a real peer would not produce
//! on demand (errors after open, duplicate opens, ...).

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, trace};
use uuid::Uuid;

use super::{ChannelLink, Connection, DialOptions, IdentityEvent, PeerTransport};
use crate::domain::config::TransportConfig;
use crate::domain::connection::{ConnectionEvent, Payload};
use crate::domain::identity::{PeerId, PeerIdentity};
use crate::error::TransportFault;

/// How the hub answers identity creation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IdentityBehavior {
    /// Confirm the identity immediately.
    #[default]
    Open,
    /// Report the given error.
    Fail(String),
    /// Never answer.
    Silent,
}

/// How the hub answers a dial to a registered host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialBehavior {
    /// Deliver the offer and open both ends.
    #[default]
    Open,
    /// Never deliver the offer or open the channel.
    Silent,
}

#[derive(Default)]
struct Hub {
    identity_behavior: IdentityBehavior,
    dial_behavior: DialBehavior,
    preset_ids: VecDeque<String>,
    identities: Vec<PeerId>,
    acceptors: HashMap<PeerId, mpsc::UnboundedSender<Connection>>,
    channels: Vec<Arc<ChannelState>>,
    // Kept alive so silent requests never look closed to the other side.
    parked: Vec<mpsc::UnboundedSender<IdentityEvent>>,
    stalled: Vec<Connection>,
}

/// Shared in-process signaling hub; clones talk to the same hub.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    hub: Arc<Mutex<Hub>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out `ids` (in order) before falling back to random ids.
    pub fn with_ids<I, S>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hub
            .lock()
            .preset_ids
            .extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn with_identity_behavior(self, behavior: IdentityBehavior) -> Self {
        self.hub.lock().identity_behavior = behavior;
        self
    }

    pub fn with_dial_behavior(self, behavior: DialBehavior) -> Self {
        self.hub.lock().dial_behavior = behavior;
        self
    }

    /// Number of dialled channels that have not been closed.
    pub fn open_channel_count(&self) -> usize {
        self.hub
            .lock()
            .channels
            .iter()
            .filter(|c| !c.closed.load(Ordering::SeqCst))
            .count()
    }
}

impl PeerTransport for MemoryTransport {
    fn create_identity(&self, config: &TransportConfig) -> mpsc::UnboundedReceiver<IdentityEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut hub = self.hub.lock();
        let signaling = config.signaling();
        debug!(
            "memory transport: identity requested at {}:{}{} with {} ICE server(s)",
            signaling.host,
            signaling.port,
            signaling.path,
            config.ice_servers().len()
        );

        match hub.identity_behavior.clone() {
            IdentityBehavior::Open => {
                let id = hub
                    .preset_ids
                    .pop_front()
                    .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
                let id = PeerId::new(id);
                let event = if hub.identities.contains(&id) {
                    IdentityEvent::Error(TransportFault::new(format!(
                        "unavailable-id: ID \"{id}\" is taken"
                    )))
                } else {
                    hub.identities.push(id.clone());
                    IdentityEvent::Open(PeerIdentity::confirmed(id))
                };
                let _ = tx.send(event);
            }
            IdentityBehavior::Fail(message) => {
                let _ = tx.send(IdentityEvent::Error(TransportFault::new(message)));
            }
            IdentityBehavior::Silent => hub.parked.push(tx),
        }

        rx
    }

    fn dial(&self, identity: &PeerIdentity, remote: &PeerId, options: DialOptions) -> Connection {
        let (dialer_tx, dialer_rx) = mpsc::unbounded_channel();
        let (host_tx, host_rx) = mpsc::unbounded_channel();
        let state = Arc::new(ChannelState::default());

        let dialer_link = Arc::new(MemoryLink {
            state: Arc::clone(&state),
            own: dialer_tx.clone(),
            peer: host_tx.clone(),
        });
        let host_link = Arc::new(MemoryLink {
            state: Arc::clone(&state),
            own: host_tx.clone(),
            peer: dialer_tx.clone(),
        });

        let dialer_side = Connection::new(remote.clone(), dialer_link, dialer_rx);
        let host_side = Connection::new(identity.id().clone(), host_link, host_rx);

        let mut hub = self.hub.lock();
        hub.channels.push(Arc::clone(&state));
        debug!(
            "memory transport: {} dials {remote} (reliable={})",
            identity.id(),
            options.reliable
        );

        let unavailable = || {
            ConnectionEvent::Error(TransportFault::new(format!(
                "peer-unavailable: could not connect to peer {remote}"
            )))
        };

        let acceptor = hub.acceptors.get(remote).cloned();
        match acceptor {
            None => {
                state.closed.store(true, Ordering::SeqCst);
                let _ = dialer_tx.send(unavailable());
            }
            Some(_) if hub.dial_behavior == DialBehavior::Silent => {
                // Held by the hub so the host side never reports closure.
                hub.stalled.push(host_side);
            }
            Some(acceptor) => {
                if acceptor.send(host_side).is_ok() {
                    let _ = host_tx.send(ConnectionEvent::Open);
                    let _ = dialer_tx.send(ConnectionEvent::Open);
                } else {
                    state.closed.store(true, Ordering::SeqCst);
                    let _ = dialer_tx.send(unavailable());
                }
            }
        }

        dialer_side
    }

    fn accept_incoming(&self, identity: &PeerIdentity) -> mpsc::UnboundedReceiver<Connection> {
        let (tx, rx) = mpsc::unbounded_channel();
        debug!("memory transport: {identity} accepts incoming connections");
        self.hub.lock().acceptors.insert(identity.id().clone(), tx);
        rx
    }
}

#[derive(Default)]
struct ChannelState {
    closed: AtomicBool,
}

struct MemoryLink {
    state: Arc<ChannelState>,
    own: mpsc::UnboundedSender<ConnectionEvent>,
    peer: mpsc::UnboundedSender<ConnectionEvent>,
}

impl ChannelLink for MemoryLink {
    fn send(&self, payload: Payload) {
        if self.state.closed.load(Ordering::SeqCst) {
            trace!("memory transport: send on closed channel dropped");
            return;
        }
        let _ = self.peer.send(ConnectionEvent::Data(payload));
    }

    fn close(&self) {
        if self.state.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.own.send(ConnectionEvent::Close);
        let _ = self.peer.send(ConnectionEvent::Close);
    }
}

// ── Scripted connections ──────────────────────────────────────────────────────

#[derive(Default)]
struct ScriptRecord {
    sent: Mutex<Vec<Payload>>,
    closes: AtomicUsize,
}

struct ScriptedLink {
    record: Arc<ScriptRecord>,
}

impl ChannelLink for ScriptedLink {
    fn send(&self, payload: Payload) {
        self.record.sent.lock().push(payload);
    }

    fn close(&self) {
        self.record.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// The transport side of a [`scripted_connection`].
pub struct ScriptedPeer {
    events: mpsc::UnboundedSender<ConnectionEvent>,
    record: Arc<ScriptRecord>,
}

impl ScriptedPeer {
    /// Delivers `event` to the connection as if the transport raised it.
    pub fn emit(&self, event: ConnectionEvent) {
        let _ = self.events.send(event);
    }

    /// Payloads sent through the connection so far.
    pub fn sent(&self) -> Vec<Payload> {
        self.record.sent.lock().clone()
    }

    /// How many times the connection asked to close.
    pub fn close_calls(&self) -> usize {
        self.record.closes.load(Ordering::SeqCst)
    }
}

/// Builds a pending connection to `remote` whose events are driven by hand.
pub fn scripted_connection(remote: impl Into<PeerId>) -> (Connection, ScriptedPeer) {
    let (tx, rx) = mpsc::unbounded_channel();
    let record = Arc::new(ScriptRecord::default());
    let link = Arc::new(ScriptedLink {
        record: Arc::clone(&record),
    });
    let connection = Connection::new(remote.into(), link, rx);
    (connection, ScriptedPeer { events: tx, record })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
