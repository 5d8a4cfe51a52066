//! Wire types of the node's HTTP API.
//!
//! Field names follow the node's JSON exactly; these types are the contract,
//! not the transport detail.

use serde::{Deserialize, Serialize};

/// Request body of `/decodelninvoice`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodeInvoiceRequest {
    /// The BOLT11 invoice string.
    pub invoice: String,
}

/// Response of `/decodelninvoice`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeInvoiceResponse {
    /// Invoice amount in millisatoshi. Zero when the invoice leaves the
    /// amount open.
    pub amt_msat: u64,
    /// Seconds the invoice stays valid after its creation.
    pub expiry_sec: u64,
    /// Payment hash used to correlate the payment in the node's list.
    pub payment_hash: String,
    /// RGB asset requested by the invoice, if any.
    #[serde(default)]
    pub asset_id: Option<String>,
    /// Amount of the RGB asset requested by the invoice, if any.
    #[serde(default)]
    pub asset_amount: Option<u64>,
}

/// Request body of `/decodergbinvoice`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodeRgbInvoiceRequest {
    /// The RGB invoice string.
    pub invoice: String,
}

/// How an RGB invoice wants the transfer delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecipientKind {
    /// Blinded UTXO recipient; no bitcoin output is created for them.
    #[default]
    Blind,
    /// Witness recipient; the sender funds a witness UTXO for them.
    Witness,
}

/// A single assignment carried by an RGB invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Assignment {
    /// Fungible amount.
    Fungible {
        /// Amount in the asset's smallest unit.
        value: u64,
    },
    /// Non-fungible allocation; carries no spendable amount.
    NonFungible,
    /// Inflation right.
    InflationRight {
        /// Amount in the asset's smallest unit.
        value: u64,
    },
    /// Replace right; carries no spendable amount.
    ReplaceRight,
    /// Any assignment kind.
    Any,
}

impl Assignment {
    /// The spendable amount of the assignment, if it has one.
    pub fn amount(&self) -> Option<u64> {
        match self {
            Self::Fungible { value } | Self::InflationRight { value } => Some(*value),
            Self::NonFungible | Self::ReplaceRight | Self::Any => None,
        }
    }
}

/// Response of `/decodergbinvoice`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeRgbInvoiceResponse {
    /// Blinded UTXO or script recipient id. Absent on malformed invoices.
    #[serde(default)]
    pub recipient_id: Option<String>,
    /// Asset requested by the invoice, if it names one.
    #[serde(default)]
    pub asset_id: Option<String>,
    /// Assignment requested by the invoice.
    #[serde(default)]
    pub assignment: Option<Assignment>,
    /// Proxy endpoints to deliver the consignment through.
    #[serde(default)]
    pub transport_endpoints: Vec<String>,
    /// Recipient kind.
    #[serde(default)]
    pub recipient_type: RecipientKind,
}

/// Settlement status the node reports for a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HtlcStatus {
    /// In flight.
    Pending,
    /// Settled.
    Succeeded,
    /// Failed permanently.
    Failed,
    /// The underlying invoice expired before settling.
    Expired,
}

/// A payment entry of `/listpayments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Payment hash.
    pub payment_hash: String,
    /// Current settlement status.
    pub status: HtlcStatus,
}

/// Response of `/listpayments`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPaymentsResponse {
    /// All payments known to the node.
    pub payments: Vec<Payment>,
}

/// Request body of `/sendpayment`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendPaymentRequest {
    /// The BOLT11 invoice to pay.
    pub invoice: String,
}

/// Response of `/sendpayment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendPaymentResponse {
    /// Payment hash of the initiated payment.
    pub payment_hash: String,
    /// Status adopted by the node at submission time.
    pub status: HtlcStatus,
}

/// Request body of `/sendbtc`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendBtcRequest {
    /// Destination address.
    pub address: String,
    /// Amount in satoshi.
    pub amount: u64,
    /// Fee rate in sat/vB.
    pub fee_rate: f64,
}

/// Response of `/sendbtc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendBtcResponse {
    /// Transaction id of the broadcast transaction.
    pub txid: String,
}

/// Witness UTXO data attached when sending to a witness recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessData {
    /// Bitcoin amount, in satoshi, funding the recipient's witness UTXO.
    pub amount_sat: u64,
}

/// Request body of `/sendasset`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendAssetRequest {
    /// Asset to transfer.
    pub asset_id: String,
    /// Assignment to create for the recipient.
    pub assignment: Assignment,
    /// Whether the transfer is a donation (no change consignment expected).
    pub donation: bool,
    /// Fee rate in sat/vB.
    pub fee_rate: f64,
    /// Recipient id from the decoded invoice, or a raw recipient id.
    pub recipient_id: String,
    /// Proxy endpoints to deliver the consignment through.
    pub transport_endpoints: Vec<String>,
    /// Witness data, required for witness recipients.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub witness_data: Option<WitnessData>,
}

/// Response of `/sendasset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendAssetResponse {
    /// Transaction id of the broadcast transaction.
    pub txid: String,
}

/// Response of `/estimatefee`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimateFeeResponse {
    /// Estimated fee rate in sat/vB.
    pub fee_rate: f64,
}

/// Request body of `/unlock`.
#[derive(Clone, Serialize, Deserialize)]
pub struct UnlockRequest {
    /// Host of the bitcoind backend.
    pub bitcoind_rpc_host: String,
    /// Port of the bitcoind backend.
    pub bitcoind_rpc_port: u16,
    /// Username of the bitcoind backend.
    pub bitcoind_rpc_username: String,
    /// Password of the bitcoind backend.
    pub bitcoind_rpc_password: String,
    /// Indexer the node syncs against.
    pub indexer_url: String,
    /// RGB proxy endpoint.
    pub proxy_endpoint: String,
    /// Wallet password.
    pub password: String,
}

impl std::fmt::Debug for UnlockRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnlockRequest")
            .field("bitcoind_rpc_host", &self.bitcoind_rpc_host)
            .field("bitcoind_rpc_port", &self.bitcoind_rpc_port)
            .field("bitcoind_rpc_username", &self.bitcoind_rpc_username)
            .field("bitcoind_rpc_password", &"<redacted>")
            .field("indexer_url", &self.indexer_url)
            .field("proxy_endpoint", &self.proxy_endpoint)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Response of `/nodeinfo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfoResponse {
    /// The node's public key.
    pub pubkey: String,
}
