//! Connecting to the host.
//!
//! [`connect`] is the plain use case: dial, then race the open signal
//! against a timeout.  [`ClientSession`] wraps it in a background task and
//! keeps watching the connection after it opened, publishing a
//! [`ClientView`] that a presentation layer can render.
//!
//! # Disposal
//!
//! A `ClientSession` that is disposed (explicitly or by being dropped) while
//! still connecting cancels the bounded wait; the pending connection is
//! dropped and therefore closed, and the view reports
//! [`SessionError::Disposed`].  If the connection opens at the same moment,
//! the task sees the disposed flag and closes it instead of publishing it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use peerlink_core::{
    bounded_wait, Connection, ConnectionEvent, ConnectionHandle, ConnectionStatus, DialOptions,
    Payload, PeerId, PeerIdentity, PeerTransport, SessionError, Stage, TransportFault,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Dials `remote` and waits up to `timeout` for the channel to open.
///
/// # Errors
///
/// [`SessionError::Connection`] if the transport reports an error first,
/// [`SessionError::Timeout`] with [`Stage::Connection`] if nothing happens in
/// time.  In both cases the pending connection is closed.
pub async fn connect<T>(
    transport: &T,
    identity: &PeerIdentity,
    remote: &PeerId,
    timeout: Duration,
) -> Result<Connection, SessionError>
where
    T: PeerTransport + ?Sized,
{
    debug!("setting up new connection to {remote}");
    let connection = transport.dial(identity, remote, DialOptions { reliable: true });
    await_open(connection, timeout).await
}

/// Races the first lifecycle event of a pending `connection` against `timeout`.
pub async fn await_open(mut connection: Connection, timeout: Duration) -> Result<Connection, SessionError> {
    bounded_wait(Stage::Connection, timeout, async {
        loop {
            match connection.next_event().await {
                Some(ConnectionEvent::Open) => return Ok(()),
                Some(ConnectionEvent::Error(fault)) => return Err(SessionError::Connection(fault)),
                // A pending connection only yields open or error.
                Some(_) => continue,
                None => {
                    return Err(SessionError::Connection(TransportFault::new(
                        "transport dropped the channel before it opened",
                    )))
                }
            }
        }
    })
    .await?;

    Ok(connection)
}

/// What a client UI shows: connection status and the last error, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientView {
    pub status: ConnectionStatus,
    pub error: Option<String>,
}

impl ClientView {
    fn connecting() -> Self {
        Self {
            status: ConnectionStatus::Pending,
            error: None,
        }
    }
}

struct Shared {
    view: watch::Sender<ClientView>,
    connection: Mutex<Option<ConnectionHandle>>,
    disposed: AtomicBool,
}

/// A client's single connection to its host, observed in the background.
pub struct ClientSession {
    host: PeerId,
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

impl ClientSession {
    /// Dials `host` and starts observing the connection.
    ///
    /// Returns immediately; progress is visible through [`view`](Self::view)
    /// and [`watch`](Self::watch).
    pub fn start<T>(transport: &T, identity: &PeerIdentity, host: PeerId, timeout: Duration) -> Self
    where
        T: PeerTransport + ?Sized,
    {
        debug!("setting up new connection to {host}");
        let connection = transport.dial(identity, &host, DialOptions { reliable: true });

        let (view, _) = watch::channel(ClientView::connecting());
        let shared = Arc::new(Shared {
            view,
            connection: Mutex::new(None),
            disposed: AtomicBool::new(false),
        });

        let task = tokio::spawn(run_connection(connection, timeout, Arc::clone(&shared)));

        Self { host, shared, task }
    }

    pub fn host(&self) -> &PeerId {
        &self.host
    }

    /// Current view.
    pub fn view(&self) -> ClientView {
        self.shared.view.borrow().clone()
    }

    /// Receiver notified whenever the view changes.
    pub fn watch(&self) -> watch::Receiver<ClientView> {
        self.shared.view.subscribe()
    }

    /// Last error as a human-readable string.
    pub fn error(&self) -> Option<String> {
        self.shared.view.borrow().error.clone()
    }

    /// Handle to the open connection, once there is one.
    pub fn connection(&self) -> Option<ConnectionHandle> {
        self.shared.connection.lock().clone()
    }

    /// Sends `payload` to the host if connected; otherwise does nothing.
    ///
    /// There is no acknowledgement.  Transport errors show up later in
    /// [`error`](Self::error).
    pub fn send(&self, payload: impl Into<Payload>) {
        match self.shared.connection.lock().as_ref() {
            Some(handle) => handle.send(payload),
            None => debug!("not connected to {}; message dropped", self.host),
        }
    }

    /// Stops observing and closes the connection, whatever state it is in.
    ///
    /// Disposing a session that is still connecting leaves the
    /// [`SessionError::Disposed`] text in [`error`](Self::error).
    pub fn dispose(&self) {
        let handle = {
            let mut slot = self.shared.connection.lock();
            if self.shared.disposed.swap(true, Ordering::SeqCst) {
                return;
            }
            slot.take()
        };

        let connecting = handle.is_none();
        self.task.abort();
        if let Some(handle) = handle {
            handle.close();
        }
        self.shared.view.send_if_modified(|view| {
            if view.status.is_terminal() {
                return false;
            }
            if connecting && view.status == ConnectionStatus::Pending {
                view.error = Some(SessionError::Disposed(Stage::Connection).to_string());
            }
            view.status = ConnectionStatus::Closed;
            true
        });
        info!("client session for {} disposed", self.host);
    }
}

impl std::fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSession")
            .field("host", &self.host)
            .field("view", &*self.shared.view.borrow())
            .finish()
    }
}

impl Drop for ClientSession {
    fn drop(&mut self) {
        self.dispose();
    }
}

async fn run_connection(connection: Connection, timeout: Duration, shared: Arc<Shared>) {
    let mut connection = match await_open(connection, timeout).await {
        Ok(connection) => connection,
        Err(err) => {
            error!("{err}");
            shared.view.send_modify(|view| {
                view.status = ConnectionStatus::Errored;
                view.error = Some(err.to_string());
            });
            return;
        }
    };

    {
        let mut slot = shared.connection.lock();
        if shared.disposed.load(Ordering::SeqCst) {
            debug!("connection to {} opened after disposal; closing", connection.remote());
            connection.handle().close();
            return;
        }
        *slot = Some(connection.handle());
    }
    info!("connected to host {}", connection.remote());
    shared.view.send_modify(|view| view.status = ConnectionStatus::Open);

    while let Some(event) = connection.next_event().await {
        match event {
            ConnectionEvent::Error(fault) => {
                let err = SessionError::Connection(fault);
                error!("{err}");
                shared.view.send_modify(|view| view.error = Some(err.to_string()));
            }
            ConnectionEvent::Close => debug!("connection closed"),
            ConnectionEvent::Data(payload) => {
                debug!("host sent data: {}", payload.to_message_text());
            }
            ConnectionEvent::Open => {}
        }
        let status = connection.status();
        shared.view.send_if_modified(|view| {
            let changed = view.status != status;
            view.status = status;
            changed
        });
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use peerlink_core::transport::memory::{scripted_connection, DialBehavior, MemoryTransport};
    use peerlink_core::DEFAULT_TIMEOUT;
    use tokio::time::Instant;
    use tokio_test::{assert_err, assert_ok};

    async fn identity(transport: &MemoryTransport) -> PeerIdentity {
        let config = peerlink_core::TransportConfig::new(Vec::new(), Default::default());
        match transport.create_identity(&config).recv().await {
            Some(peerlink_core::IdentityEvent::Open(identity)) => identity,
            other => panic!("identity not opened: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_await_open_resolves_on_open() {
        // Arrange
        let (connection, peer) = scripted_connection("host");
        peer.emit(ConnectionEvent::Open);

        // Act
        let connection = assert_ok!(await_open(connection, DEFAULT_TIMEOUT).await);

        // Assert
        assert_eq!(connection.status(), ConnectionStatus::Open);
    }

    #[tokio::test]
    async fn test_await_open_rejects_with_connection_error() {
        let (connection, peer) = scripted_connection("host");
        peer.emit(ConnectionEvent::Error(TransportFault::new("negotiation-failed")));

        let result = await_open(connection, DEFAULT_TIMEOUT).await;

        match result {
            Err(SessionError::Connection(fault)) => assert_eq!(fault.message(), "negotiation-failed"),
            other => panic!("expected connection error, got {other:?}"),
        }
        assert_eq!(peer.close_calls(), 0, "errored connection needs no close");
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_open_times_out_and_closes_pending_connection() {
        // Arrange
        let (connection, peer) = scripted_connection("host");
        let started = Instant::now();
        let limit = Duration::from_millis(500);

        // Act
        let result = await_open(connection, limit).await;

        // Assert
        assert!(matches!(
            result,
            Err(SessionError::Timeout { stage: Stage::Connection, timeout }) if timeout == limit
        ));
        assert_eq!(started.elapsed(), limit);
        assert_eq!(peer.close_calls(), 1);
    }

    #[tokio::test]
    async fn test_connect_to_unknown_host_fails() {
        let transport = MemoryTransport::new();
        let me = identity(&transport).await;

        let result = connect(&transport, &me, &PeerId::from("missing"), DEFAULT_TIMEOUT).await;

        let err = assert_err!(result);
        assert!(err.to_string().starts_with("connection error: peer-unavailable"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_times_out_when_host_never_answers() {
        let transport = MemoryTransport::new()
            .with_ids(["host", "client"])
            .with_dial_behavior(DialBehavior::Silent);
        let host = identity(&transport).await;
        let me = identity(&transport).await;
        let _incoming = transport.accept_incoming(&host);

        let result = connect(&transport, &me, host.id(), DEFAULT_TIMEOUT).await;

        assert!(matches!(
            result,
            Err(SessionError::Timeout { stage: Stage::Connection, .. })
        ));
        assert_eq!(transport.open_channel_count(), 0);
    }

    #[tokio::test]
    async fn test_send_before_connected_is_dropped_silently() {
        let transport = MemoryTransport::new()
            .with_ids(["host", "client"])
            .with_dial_behavior(DialBehavior::Silent);
        let host = identity(&transport).await;
        let me = identity(&transport).await;
        let _incoming = transport.accept_incoming(&host);

        let session = ClientSession::start(&transport, &me, host.id().clone(), DEFAULT_TIMEOUT);
        session.send("hi");

        assert!(session.connection().is_none());
        assert_eq!(session.view().status, ConnectionStatus::Pending);
    }
}
