//! Payment attempts and their state machine.

use crate::{
    constants::{FEE_BLOCKS_FAST, FEE_BLOCKS_NORMAL, FEE_BLOCKS_SLOW},
    types::{HtlcStatus, PaymentTarget},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

/// An id of a payment attempt handled by the engine.
///
/// Ids are session-scoped and monotonically increasing; they never repeat
/// within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttemptId(u64);

impl AttemptId {
    /// Allocates the next attempt id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attempt-{}", self.0)
    }
}

/// Fee selection forwarded to on-chain submissions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeePolicy {
    /// Slowest confirmation target.
    Slow,
    /// Default confirmation target.
    #[default]
    Normal,
    /// Fastest confirmation target.
    Fast,
    /// User-provided rate in sat/vB.
    Custom(f64),
}

impl FeePolicy {
    /// Resolves the policy to a concrete rate against fetched estimates.
    pub fn rate(&self, estimates: &FeeEstimates) -> f64 {
        match self {
            Self::Slow => estimates.slow,
            Self::Normal => estimates.normal,
            Self::Fast => estimates.fast,
            Self::Custom(rate) => *rate,
        }
    }
}

/// Fee rates, in sat/vB, per confirmation target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeEstimates {
    /// Rate targeting [`FEE_BLOCKS_SLOW`] blocks.
    pub slow: f64,
    /// Rate targeting [`FEE_BLOCKS_NORMAL`] blocks.
    pub normal: f64,
    /// Rate targeting [`FEE_BLOCKS_FAST`] blocks.
    pub fast: f64,
}

impl Default for FeeEstimates {
    /// Conservative rates used when the node's estimator is unreachable.
    fn default() -> Self {
        Self { slow: 1.0, normal: 2.0, fast: 3.0 }
    }
}

impl FeeEstimates {
    /// Confirmation targets, in blocks, matching the three estimate tiers.
    pub const BLOCK_TARGETS: (u16, u16, u16) =
        (FEE_BLOCKS_SLOW, FEE_BLOCKS_NORMAL, FEE_BLOCKS_FAST);
}

/// State of a payment attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum PaymentState {
    /// Nothing in flight.
    #[default]
    Idle,
    /// The raw input is being decoded.
    Decoding,
    /// The decoded target is being validated.
    Validating,
    /// Validated and ready to submit.
    Ready,
    /// The submission RPC is in flight.
    Submitting,
    /// Submitted; settlement is observed by polling.
    Pending,
    /// Settled.
    Succeeded,
    /// Failed; carries a human-readable reason.
    Failed(String),
    /// The invoice expired before settling.
    Expired,
    /// Observation was cancelled by the user.
    Cancelled,
}

impl PaymentState {
    /// Whether the state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed(_) | Self::Expired | Self::Cancelled)
    }
}

impl From<HtlcStatus> for PaymentState {
    fn from(status: HtlcStatus) -> Self {
        match status {
            HtlcStatus::Pending => Self::Pending,
            HtlcStatus::Succeeded => Self::Succeeded,
            HtlcStatus::Failed => Self::Failed("payment failed".into()),
            HtlcStatus::Expired => Self::Expired,
        }
    }
}

impl fmt::Display for PaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Decoding => write!(f, "decoding"),
            Self::Validating => write!(f, "validating"),
            Self::Ready => write!(f, "ready"),
            Self::Submitting => write!(f, "submitting"),
            Self::Pending => write!(f, "pending"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
            Self::Expired => write!(f, "expired"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A single payment attempt.
///
/// Owned exclusively by the service that created it; the settlement tracker
/// only ever holds the `(id, payment_hash)` pair and reports observations
/// back over a channel.
#[derive(Debug, Clone)]
pub struct PaymentAttempt {
    /// Id of the attempt.
    pub id: AttemptId,
    /// The destination being paid.
    pub target: PaymentTarget,
    /// Proposed amount in base units of the selected asset (sat for BTC).
    pub amount: u64,
    /// Fee selection for on-chain submissions.
    pub fee_policy: FeePolicy,
    /// Current state.
    pub state: PaymentState,
    /// Payment hash, once known.
    pub payment_hash: Option<String>,
    /// When the attempt was submitted.
    pub started_at: DateTime<Utc>,
    /// When settlement was last polled.
    pub last_polled_at: Option<DateTime<Utc>>,
}

impl PaymentAttempt {
    /// Creates a new attempt for a target.
    pub fn new(target: PaymentTarget, amount: u64, fee_policy: FeePolicy) -> Self {
        let payment_hash = target.payment_hash().map(str::to_owned);
        Self {
            id: AttemptId::next(),
            target,
            amount,
            fee_policy,
            state: PaymentState::Ready,
            payment_hash,
            started_at: Utc::now(),
            last_polled_at: None,
        }
    }
}
