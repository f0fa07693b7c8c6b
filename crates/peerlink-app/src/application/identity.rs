//! Creating the local peer identity.

use std::time::Duration;

use peerlink_core::{
    bounded_wait, IdentityEvent, PeerIdentity, PeerTransport, SessionError, Stage, TransportConfig,
    TransportFault,
};
use tracing::{debug, info};

/// Registers a new identity with the signaling service described by
/// `config` and waits up to `timeout` for it to be confirmed.
///
/// The first identity event decides the outcome; anything the transport
/// reports afterwards is ignored.
///
/// # Errors
///
/// [`SessionError::Identity`] if the transport reports an error first,
/// [`SessionError::Timeout`] with [`Stage::Identity`] if nothing arrives in
/// time.
pub async fn create_identity<T>(
    transport: &T,
    config: &TransportConfig,
    timeout: Duration,
) -> Result<PeerIdentity, SessionError>
where
    T: PeerTransport + ?Sized,
{
    debug!(
        "setting up new peer identity with {} ICE server(s)",
        config.ice_servers().len()
    );
    let mut events = transport.create_identity(config);

    let identity = bounded_wait(Stage::Identity, timeout, async {
        match events.recv().await {
            Some(IdentityEvent::Open(identity)) => Ok(identity),
            Some(IdentityEvent::Error(fault)) => Err(SessionError::Identity(fault)),
            None => Err(SessionError::Identity(TransportFault::new(
                "transport dropped identity creation",
            ))),
        }
    })
    .await?;

    info!("peer identity {identity} is open");
    Ok(identity)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use peerlink_core::transport::memory::{IdentityBehavior, MemoryTransport};
    use peerlink_core::{
        Connection, DialOptions, PeerId, SignalingEndpoint, DEFAULT_TIMEOUT,
    };
    use tokio::sync::mpsc;
    use tokio::time::Instant;
    use tokio_test::{assert_err, assert_ok};

    fn config() -> TransportConfig {
        TransportConfig::new(Vec::new(), SignalingEndpoint::default())
    }

    /// Transport that replays a fixed list of identity events.
    struct ReplayTransport(Vec<IdentityEvent>);

    impl PeerTransport for ReplayTransport {
        fn create_identity(&self, _: &TransportConfig) -> mpsc::UnboundedReceiver<IdentityEvent> {
            let (tx, rx) = mpsc::unbounded_channel();
            for event in &self.0 {
                tx.send(event.clone()).unwrap();
            }
            rx
        }

        fn dial(&self, _: &PeerIdentity, _: &PeerId, _: DialOptions) -> Connection {
            unimplemented!("identity tests never dial")
        }

        fn accept_incoming(&self, _: &PeerIdentity) -> mpsc::UnboundedReceiver<Connection> {
            unimplemented!("identity tests never accept")
        }
    }

    #[tokio::test]
    async fn test_open_identity_is_returned() {
        // Arrange
        let transport = MemoryTransport::new().with_ids(["abc123"]);

        // Act
        let identity = assert_ok!(create_identity(&transport, &config(), DEFAULT_TIMEOUT).await);

        // Assert
        assert_eq!(identity.id(), &PeerId::from("abc123"));
    }

    #[tokio::test]
    async fn test_first_event_wins_and_later_events_are_ignored() {
        let transport = ReplayTransport(vec![
            IdentityEvent::Open(PeerIdentity::confirmed(PeerId::from("abc123"))),
            IdentityEvent::Error(TransportFault::new("late error")),
        ]);

        let identity = assert_ok!(create_identity(&transport, &config(), DEFAULT_TIMEOUT).await);

        assert_eq!(identity.to_string(), "abc123");
    }

    #[tokio::test]
    async fn test_transport_error_is_reported() {
        let transport =
            MemoryTransport::new().with_identity_behavior(IdentityBehavior::Fail("server-error".into()));

        let err = assert_err!(create_identity(&transport, &config(), DEFAULT_TIMEOUT).await);

        assert_eq!(err.to_string(), "creating peer identity failed: server-error");
    }

    #[tokio::test]
    async fn test_taken_id_is_reported() {
        let transport = MemoryTransport::new().with_ids(["abc123", "abc123"]);
        assert_ok!(create_identity(&transport, &config(), DEFAULT_TIMEOUT).await);

        let err = assert_err!(create_identity(&transport, &config(), DEFAULT_TIMEOUT).await);

        assert!(err.to_string().contains("unavailable-id"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_transport_times_out_after_2000ms() {
        // Arrange
        let transport = MemoryTransport::new().with_identity_behavior(IdentityBehavior::Silent);
        let started = Instant::now();

        // Act
        let err = assert_err!(create_identity(&transport, &config(), DEFAULT_TIMEOUT).await);

        // Assert
        assert_eq!(err.to_string(), "initializing identity timed out after 2000ms");
        assert_eq!(err.stage(), Some(Stage::Identity));
        assert_eq!(started.elapsed(), Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn test_closed_event_stream_is_an_identity_error() {
        let transport = ReplayTransport(Vec::new());

        let err = assert_err!(create_identity(&transport, &config(), DEFAULT_TIMEOUT).await);

        assert!(matches!(err, SessionError::Identity(_)));
    }
}
