//! Node unlock handshake.
//!
//! Structurally the same resilient loop as settlement polling: drive the
//! unlock RPC through the [`ResilientClient`], retrying silently while the
//! node is unreachable or changing state, and stop on the handful of
//! conditions that need the user. Unlike settlement, there is no outer
//! deadline — a node restoring a large wallet can legitimately take minutes —
//! so bounding the wait is the caller's choice via
//! [`RetryPolicy::max_attempts`](crate::client::RetryPolicy).

use crate::{
    client::{NodeApi, ResilientClient},
    error::{AuthError, RetryError},
    types::UnlockRequest,
};
use thiserror::Error;
use tracing::info;

/// Outcome of the unlock handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnlockOutcome {
    /// The node accepted the password and is serving requests.
    Unlocked,
    /// The node was already unlocked; treated as success.
    AlreadyUnlocked,
    /// The wallet must be initialized before it can be unlocked; the caller
    /// should start the init flow.
    NeedsInit,
}

/// Failure of the unlock handshake.
#[derive(Debug, Error)]
pub enum UnlockError {
    /// The node rejected the password. Requires fresh credentials; never
    /// silently retried.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// The configured retry bound was exhausted before the node came up.
    #[error(transparent)]
    Retry(RetryError),
}

/// Unlocks the node, waiting out restarts and state transitions.
///
/// Confirms the node actually came up by fetching its info after the unlock
/// call; a failed confirmation retries like any transient failure.
pub async fn unlock<A: NodeApi + ?Sized>(
    api: &A,
    retry: &ResilientClient,
    request: UnlockRequest,
) -> Result<UnlockOutcome, UnlockError> {
    let result = retry
        .run("unlock", || {
            let request = request.clone();
            async move {
                api.unlock(request).await?;
                api.node_info().await?;
                Ok(())
            }
        })
        .await;

    match result {
        Ok(()) => {
            info!("node unlocked");
            Ok(UnlockOutcome::Unlocked)
        }
        Err(RetryError::AlreadyDone(message)) => {
            info!(%message, "node was already unlocked");
            Ok(UnlockOutcome::AlreadyUnlocked)
        }
        Err(RetryError::NotInitialized) => Ok(UnlockOutcome::NeedsInit),
        Err(RetryError::Auth(err)) => Err(UnlockError::Auth(err)),
        Err(err @ RetryError::Exhausted { .. }) => Err(UnlockError::Retry(err)),
    }
}
