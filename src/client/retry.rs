//! Classification-driven retry wrapper.
//!
//! Shared by settlement polling and the node unlock handshake: both drive
//! their RPC calls through [`ResilientClient::run`], which retries transient
//! failures silently with exponential backoff and surfaces everything else.

use crate::{
    constants::{RETRY_BACKOFF_FACTOR, RETRY_INITIAL_INTERVAL, RETRY_MAX_INTERVAL},
    error::{AuthError, ErrorClass, NodeApiError, RetryError},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Backoff and bound configuration of the [`ResilientClient`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Interval preceding the first retry.
    pub initial_interval: Duration,
    /// Cap applied to the interval.
    pub max_interval: Duration,
    /// Factor the interval grows by after each transient failure.
    pub backoff_factor: f64,
    /// Upper bound on retries. `None` retries until the call succeeds or
    /// fails fatally — the unlock handshake's wait-for-the-node behavior,
    /// where the node may take minutes to come up. Operations without an
    /// outer deadline should set a bound.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: RETRY_INITIAL_INTERVAL,
            max_interval: RETRY_MAX_INTERVAL,
            backoff_factor: RETRY_BACKOFF_FACTOR,
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    /// Returns the policy with a retry bound.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Retry interval after `attempts` consecutive transient failures.
    pub fn interval_after(&self, attempts: u32) -> Duration {
        let grown =
            self.initial_interval.as_millis() as f64 * self.backoff_factor.powi(attempts as i32);
        let capped = (grown as u64).min(self.max_interval.as_millis() as u64);
        Duration::from_millis(capped)
    }
}

/// Progress of an in-flight retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    /// Failures observed so far.
    pub attempts: u32,
    /// Interval that will precede the next attempt.
    pub next_interval: Duration,
    /// Classification of the most recent failure.
    pub classification: ErrorClass,
}

/// Runs fallible node calls to completion under a [`RetryPolicy`].
#[derive(Debug, Clone, Default)]
pub struct ResilientClient {
    policy: RetryPolicy,
}

impl ResilientClient {
    /// Creates a new [`ResilientClient`].
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// The configured policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Drives `op` until it succeeds or fails fatally.
    ///
    /// Transient failures back off and retry; a fatal classification maps to
    /// the matching [`RetryError`] and returns immediately. `label` names the
    /// operation in logs.
    pub async fn run<T, F, Fut>(&self, label: &'static str, mut op: F) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, NodeApiError>>,
    {
        let mut attempts: u32 = 0;
        loop {
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let classification = err.classify();
            match classification {
                ErrorClass::Transient | ErrorClass::StateWait => {
                    if let Some(max) = self.policy.max_attempts
                        && attempts >= max
                    {
                        warn!(label, attempts, error = %err, "retries exhausted");
                        return Err(RetryError::Exhausted { attempts, last: err });
                    }

                    let state = RetryState {
                        attempts,
                        next_interval: self.policy.interval_after(attempts),
                        classification,
                    };
                    debug!(
                        label,
                        attempts = state.attempts,
                        interval = ?state.next_interval,
                        error = %err,
                        "transient failure, backing off"
                    );
                    tokio::time::sleep(state.next_interval).await;
                    attempts += 1;
                }
                ErrorClass::Fatal => return Err(AuthError.into()),
                ErrorClass::NeedsInit => return Err(RetryError::NotInitialized),
                ErrorClass::AlreadyDone => return Err(RetryError::AlreadyDone(err.to_string())),
            }
        }
    }
}
