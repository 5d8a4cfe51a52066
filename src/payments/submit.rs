//! Dispatch of validated targets to the node's mutating RPCs.

use crate::{
    client::NodeApi,
    constants::{DEFAULT_WITNESS_AMOUNT_SAT, MIN_WITNESS_AMOUNT_SAT},
    error::SubmissionError,
    types::{
        Assignment, FeeEstimates, HtlcStatus, PaymentAttempt, PaymentState, PaymentTarget,
        RecipientKind, SendAssetRequest, SendBtcRequest, SendPaymentRequest, WitnessData,
    },
};
use std::sync::Arc;
use tracing::info;

/// Extra inputs the asset send path needs beyond the attempt itself.
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// Asset selected by the user, for sends where the invoice names none.
    pub asset_id: Option<String>,
    /// Whether the transfer is a donation.
    pub donation: bool,
    /// Witness amount override for witness recipients, in satoshi.
    pub witness_amount_sat: Option<u64>,
    /// Raw recipient id for inputs that did not decode as an RGB invoice but
    /// were explicitly confirmed as an asset send.
    pub raw_recipient: Option<String>,
}

/// Immediate result of the single submission RPC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The node adopted a terminal status in the submission response; the
    /// polling path is skipped entirely.
    Terminal(PaymentState),
    /// The payment is in flight; settlement must be observed by polling.
    Tracking {
        /// Payment hash to correlate by.
        payment_hash: String,
    },
    /// The transaction was accepted for broadcast; on-chain settlement is
    /// not observed by this engine.
    Broadcast {
        /// Transaction id.
        txid: String,
    },
}

/// Maps a validated target to the correct mutating RPC call.
///
/// Exactly one submission RPC is issued per attempt; a failed submission is
/// terminal for the attempt and never resubmitted automatically.
#[derive(Debug)]
pub struct PaymentSubmitter<A: ?Sized> {
    api: Arc<A>,
    /// Transport endpoint used for raw recipient ids.
    default_transport_endpoint: Option<String>,
}

impl<A: NodeApi + ?Sized> PaymentSubmitter<A> {
    /// Creates a new [`PaymentSubmitter`].
    pub fn new(api: Arc<A>, default_transport_endpoint: Option<String>) -> Self {
        Self { api, default_transport_endpoint }
    }

    /// Dispatches the attempt to the node.
    ///
    /// Precondition failures (missing recipient id, missing transport
    /// endpoints, unconfigured default endpoint, bad witness amount) are
    /// raised before any RPC call.
    pub async fn submit(
        &self,
        attempt: &PaymentAttempt,
        options: &SendOptions,
        fees: &FeeEstimates,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        match &attempt.target {
            PaymentTarget::LightningInvoice { raw, payment_hash, .. } => {
                if !raw.starts_with("ln") {
                    return Err(SubmissionError::UnsupportedTarget {
                        reason: "not a lightning invoice".into(),
                    });
                }

                let response =
                    self.api.send_payment(SendPaymentRequest { invoice: raw.clone() }).await?;
                info!(id = %attempt.id, status = ?response.status, "lightning payment submitted");

                Ok(match response.status {
                    HtlcStatus::Pending => {
                        SubmissionOutcome::Tracking { payment_hash: payment_hash.clone() }
                    }
                    status => SubmissionOutcome::Terminal(status.into()),
                })
            }

            PaymentTarget::BitcoinAddress { address } => {
                let response = self
                    .api
                    .send_btc(SendBtcRequest {
                        address: address.clone(),
                        amount: attempt.amount,
                        fee_rate: attempt.fee_policy.rate(fees),
                    })
                    .await?;
                info!(id = %attempt.id, txid = %response.txid, "btc withdrawal broadcast");
                Ok(SubmissionOutcome::Broadcast { txid: response.txid })
            }

            PaymentTarget::RgbInvoice {
                recipient_id,
                asset_id,
                amount,
                transport_endpoints,
                recipient_kind,
                ..
            } => {
                let recipient_id =
                    recipient_id.clone().ok_or(SubmissionError::MissingRecipientId)?;
                if transport_endpoints.is_empty() {
                    return Err(SubmissionError::MissingTransportEndpoints);
                }
                let asset_id = asset_id
                    .clone()
                    .or_else(|| options.asset_id.clone())
                    .ok_or_else(|| SubmissionError::UnsupportedTarget {
                        reason: "no asset selected for the transfer".into(),
                    })?;

                // the invoice's own amount wins over the proposed one
                let value = amount.unwrap_or(attempt.amount);
                self.send_asset(
                    attempt,
                    asset_id,
                    value,
                    recipient_id,
                    transport_endpoints.clone(),
                    *recipient_kind,
                    options,
                    fees,
                )
                .await
            }

            other => {
                if let (Some(recipient), Some(asset_id)) =
                    (&options.raw_recipient, &options.asset_id)
                {
                    // a raw recipient id confirmed as an asset send; delivery
                    // goes through the configured default endpoint
                    let endpoint = self
                        .default_transport_endpoint
                        .clone()
                        .ok_or(SubmissionError::TransportMisconfigured)?;
                    return self
                        .send_asset(
                            attempt,
                            asset_id.clone(),
                            attempt.amount,
                            recipient.clone(),
                            vec![endpoint],
                            RecipientKind::Blind,
                            options,
                            fees,
                        )
                        .await;
                }

                Err(SubmissionError::UnsupportedTarget {
                    reason: match other {
                        PaymentTarget::LightningAddress { .. } => {
                            "lightning addresses require LNURL resolution".into()
                        }
                        PaymentTarget::Invalid { reason } => reason.clone(),
                        _ => "unsupported target".into(),
                    },
                })
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn send_asset(
        &self,
        attempt: &PaymentAttempt,
        asset_id: String,
        value: u64,
        recipient_id: String,
        transport_endpoints: Vec<String>,
        recipient_kind: RecipientKind,
        options: &SendOptions,
        fees: &FeeEstimates,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        let witness_data = match recipient_kind {
            RecipientKind::Witness => {
                let amount_sat =
                    options.witness_amount_sat.unwrap_or(DEFAULT_WITNESS_AMOUNT_SAT);
                if amount_sat < MIN_WITNESS_AMOUNT_SAT {
                    return Err(SubmissionError::WitnessAmountTooLow { amount_sat });
                }
                Some(WitnessData { amount_sat })
            }
            RecipientKind::Blind => None,
        };

        let response = self
            .api
            .send_asset(SendAssetRequest {
                asset_id,
                assignment: Assignment::Fungible { value },
                donation: options.donation,
                fee_rate: attempt.fee_policy.rate(fees),
                recipient_id,
                transport_endpoints,
                witness_data,
            })
            .await?;
        info!(id = %attempt.id, txid = %response.txid, "asset transfer broadcast");
        Ok(SubmissionOutcome::Broadcast { txid: response.txid })
    }
}
