//! Bounded wait: settle an attempt once, or time out.
//!
//! The transport's "create identity" and "dial" calls have no timeout of
//! their own, so both are wrapped in [`bounded_wait`].  The attempt future
//! and the timer race; whichever finishes first decides the result and the
//! other is dropped on the spot, so a stale timer never fires after success.
//!
//! Cancellation is by dropping: if the task awaiting `bounded_wait` is
//! aborted, both the attempt and the timer go away with it.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{SessionError, Stage};

/// Default bound for identity creation and connection establishment.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);

/// Runs `attempt` for at most `limit`.
///
/// # Errors
///
/// Returns whatever error the attempt settles with, or
/// [`SessionError::Timeout`] carrying `stage` and `limit` if it does not
/// settle in time.
pub async fn bounded_wait<T, F>(stage: Stage, limit: Duration, attempt: F) -> Result<T, SessionError>
where
    F: Future<Output = Result<T, SessionError>>,
{
    match tokio::time::timeout(limit, attempt).await {
        Ok(settled) => settled,
        Err(_) => {
            warn!("{stage} did not open within {}ms", limit.as_millis());
            Err(SessionError::Timeout {
                stage,
                timeout: limit,
            })
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
