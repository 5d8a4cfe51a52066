use crate::constants::{DUST_LIMIT_SAT, MSATS_PER_SAT};
use thiserror::Error;

/// Blocking validation failures.
///
/// Any of these prevents submission entirely; non-blocking findings travel in
/// [`ValidationOutcome::Warning`](crate::validate::ValidationOutcome::Warning)
/// instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// On-chain amount below the dust floor.
    #[error("amount of {amount_sat} sat is below the {DUST_LIMIT_SAT} sat dust floor")]
    BelowDustLimit {
        /// Proposed amount in satoshi.
        amount_sat: u64,
    },
    /// The proposed amount exceeds the spendable balance.
    #[error("amount of {requested} exceeds the spendable balance of {available}")]
    BalanceInsufficient {
        /// Requested amount in base units of the asset.
        requested: u64,
        /// Spendable balance in base units of the asset.
        available: u64,
    },
    /// The invoice amount exceeds the largest single-channel outbound HTLC
    /// limit. No single channel can forward the payment, regardless of the
    /// total balance.
    #[error(
        "invoice amount of {} sat exceeds the outbound channel capacity of {} sat",
        .requested_msat / MSATS_PER_SAT,
        .limit_msat / MSATS_PER_SAT
    )]
    CapacityExceeded {
        /// Invoice amount in millisatoshi.
        requested_msat: u64,
        /// Largest single-channel outbound HTLC limit in millisatoshi.
        limit_msat: u64,
    },
    /// The invoice asset amount exceeds the largest per-channel local amount
    /// for that asset.
    #[error("requested {requested} of {asset_id} exceeds the channel capacity of {limit}")]
    AssetCapacityExceeded {
        /// Asset id.
        asset_id: String,
        /// Requested amount in the asset's smallest unit.
        requested: u64,
        /// Largest per-channel local amount.
        limit: u64,
    },
    /// The wallet does not hold the requested asset.
    #[error("wallet does not hold asset {asset_id}")]
    UnknownAsset {
        /// Asset id.
        asset_id: String,
    },
    /// Zero spendable balance for the selected asset.
    #[error("zero spendable balance for {asset}")]
    ZeroBalance {
        /// Ticker or asset id.
        asset: String,
    },
    /// The target never resolved to a payable destination.
    #[error("invalid payment target: {reason}")]
    InvalidTarget {
        /// Reason recorded at resolution time.
        reason: String,
    },
}
