//! Classified payment destinations.

use crate::types::RecipientKind;
use serde::{Deserialize, Serialize};

/// A user-supplied payment destination after classification.
///
/// Produced exclusively by [`resolve_payment`](crate::resolver::resolve_payment);
/// once decoded a target is never mutated, only read by validation and
/// submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentTarget {
    /// On-chain bitcoin address.
    BitcoinAddress {
        /// The bech32 address string.
        address: String,
    },
    /// BOLT11 lightning invoice, decoded by the node.
    LightningInvoice {
        /// The raw invoice string, resubmitted verbatim on payment.
        raw: String,
        /// Payment hash used to correlate settlement.
        payment_hash: String,
        /// Invoice amount in millisatoshi; zero for open-amount invoices.
        amount_msat: u64,
        /// RGB asset requested by the invoice, if any.
        asset_id: Option<String>,
        /// Amount of the RGB asset requested, if any.
        asset_amount: Option<u64>,
        /// Seconds the invoice stays valid after its creation.
        expiry_sec: u64,
    },
    /// LNURL-style lightning address (`user@domain`).
    LightningAddress {
        /// The address as entered.
        handle: String,
    },
    /// RGB transfer invoice, decoded by the node.
    RgbInvoice {
        /// The raw invoice string.
        raw: String,
        /// Recipient id; absent on malformed invoices and rejected at
        /// submission, not here.
        recipient_id: Option<String>,
        /// Asset named by the invoice, if any.
        asset_id: Option<String>,
        /// Fungible amount requested by the invoice, if any.
        amount: Option<u64>,
        /// Proxy endpoints to deliver the consignment through.
        transport_endpoints: Vec<String>,
        /// Recipient kind.
        recipient_kind: RecipientKind,
    },
    /// Input that could not be classified as any payable format.
    Invalid {
        /// Human-readable reason, verbatim from the node where it rejected
        /// the string.
        reason: String,
    },
}

impl PaymentTarget {
    /// The payment hash settlement is correlated by, if the target has one.
    pub fn payment_hash(&self) -> Option<&str> {
        match self {
            Self::LightningInvoice { payment_hash, .. } => Some(payment_hash),
            _ => None,
        }
    }

    /// Whether the target settles over lightning.
    pub fn is_lightning(&self) -> bool {
        matches!(self, Self::LightningInvoice { .. } | Self::LightningAddress { .. })
    }

    /// Short label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BitcoinAddress { .. } => "bitcoin_address",
            Self::LightningInvoice { .. } => "lightning_invoice",
            Self::LightningAddress { .. } => "lightning_address",
            Self::RgbInvoice { .. } => "rgb_invoice",
            Self::Invalid { .. } => "invalid",
        }
    }
}

/// A peer endpoint accepted by the channel-open flow.
///
/// Distinct from [`PaymentTarget`] on purpose: a bare node pubkey is a valid
/// peer but never a payable destination, and the two parsers must not be
/// merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerEndpoint {
    /// The peer's public key, 33 bytes hex encoded.
    pub pubkey: String,
    /// Host and port to dial, when given as `pubkey@host:port`.
    pub address: Option<(String, u16)>,
}
