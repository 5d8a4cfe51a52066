use super::NodeApiError;
use crate::constants::MIN_WITNESS_AMOUNT_SAT;
use thiserror::Error;

/// Failure submitting a validated payment.
///
/// All variants except [`Rpc`](Self::Rpc) are raised before any RPC call is
/// made; a failed submission is never resubmitted automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// The decoded RGB invoice has no recipient id.
    #[error("decoded RGB invoice is missing a recipient id")]
    MissingRecipientId,
    /// The decoded RGB invoice has no transport endpoints.
    #[error("decoded RGB invoice is missing transport endpoints")]
    MissingTransportEndpoints,
    /// A raw recipient id was used but no default transport endpoint is
    /// configured.
    #[error("no transport endpoint is configured for raw recipient ids")]
    TransportMisconfigured,
    /// The witness amount is below the node's minimum.
    #[error(
        "witness amount of {amount_sat} sat is below the {MIN_WITNESS_AMOUNT_SAT} sat minimum"
    )]
    WitnessAmountTooLow {
        /// Proposed witness amount in satoshi.
        amount_sat: u64,
    },
    /// The target cannot be dispatched to any submission RPC.
    #[error("target cannot be submitted: {reason}")]
    UnsupportedTarget {
        /// Why the target is not submittable.
        reason: String,
    },
    /// The submission RPC failed.
    #[error(transparent)]
    Rpc(#[from] NodeApiError),
}
