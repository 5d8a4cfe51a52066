//! HTTP client for the node API.
//!
//! [`NodeApi`] is the seam every component above sits on: the concrete
//! [`NodeClient`] talks to a real node, tests substitute a mock.

use crate::{
    error::NodeApiError,
    types::{
        DecodeInvoiceRequest, DecodeInvoiceResponse, DecodeRgbInvoiceRequest,
        DecodeRgbInvoiceResponse, EstimateFeeResponse, FeeEstimates, ListPaymentsResponse,
        NodeInfoResponse, SendAssetRequest, SendAssetResponse, SendBtcRequest, SendBtcResponse,
        SendPaymentRequest, SendPaymentResponse, UnlockRequest,
    },
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::warn;
use url::Url;

mod retry;
pub use retry::{ResilientClient, RetryPolicy, RetryState};

/// The node RPC surface consumed by the engine.
///
/// Signatures are the contract; the transport behind them is not.
#[async_trait]
pub trait NodeApi: Send + Sync + 'static {
    /// Decodes a BOLT11 invoice.
    async fn decode_invoice(&self, invoice: &str) -> Result<DecodeInvoiceResponse, NodeApiError>;

    /// Decodes an RGB invoice.
    async fn decode_rgb_invoice(
        &self,
        invoice: &str,
    ) -> Result<DecodeRgbInvoiceResponse, NodeApiError>;

    /// Lists all payments known to the node.
    async fn list_payments(&self) -> Result<ListPaymentsResponse, NodeApiError>;

    /// Pays a BOLT11 invoice.
    async fn send_payment(
        &self,
        request: SendPaymentRequest,
    ) -> Result<SendPaymentResponse, NodeApiError>;

    /// Sends an on-chain BTC transaction.
    async fn send_btc(&self, request: SendBtcRequest) -> Result<SendBtcResponse, NodeApiError>;

    /// Sends an RGB asset transfer.
    async fn send_asset(
        &self,
        request: SendAssetRequest,
    ) -> Result<SendAssetResponse, NodeApiError>;

    /// Estimates the fee rate for a confirmation target.
    async fn estimate_fee(&self, blocks: u16) -> Result<EstimateFeeResponse, NodeApiError>;

    /// Unlocks the node.
    async fn unlock(&self, request: UnlockRequest) -> Result<(), NodeApiError>;

    /// Fetches the node's info; only succeeds on an unlocked node.
    async fn node_info(&self) -> Result<NodeInfoResponse, NodeApiError>;
}

/// Error body the node returns on non-success statuses.
#[derive(Debug, Deserialize)]
struct NodeErrorBody {
    error: String,
}

/// HTTP client for a node's REST API.
#[derive(Debug, Clone)]
pub struct NodeClient {
    http: reqwest::Client,
    base_url: Url,
}

impl NodeClient {
    /// Creates a new [`NodeClient`] against a base URL.
    pub fn new(base_url: Url, request_timeout: Duration) -> eyre::Result<Self> {
        let http = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self { http, base_url })
    }

    /// The base URL of the node.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, NodeApiError> {
        self.base_url.join(path).map_err(|err| NodeApiError::Transport {
            message: format!("invalid endpoint {path}: {err}"),
        })
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, NodeApiError> {
        let response =
            self.http.post(self.endpoint(path)?).json(body).send().await.map_err(to_api_error)?;
        decode_response(response).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, NodeApiError> {
        let response = self.http.get(self.endpoint(path)?).send().await.map_err(to_api_error)?;
        decode_response(response).await
    }
}

fn to_api_error(err: reqwest::Error) -> NodeApiError {
    if err.is_timeout() {
        NodeApiError::Timeout
    } else {
        NodeApiError::Transport { message: err.to_string() }
    }
}

async fn decode_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, NodeApiError> {
    let status = response.status();
    if status.is_success() {
        return response.json().await.map_err(to_api_error);
    }

    // the node reports errors as `{"error": "...", "code": ...}`; fall back to
    // the raw body when it does not
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<NodeErrorBody>(&body)
        .map(|parsed| parsed.error)
        .unwrap_or(body);
    Err(NodeApiError::Api { status: status.as_u16(), message })
}

#[async_trait]
impl NodeApi for NodeClient {
    async fn decode_invoice(&self, invoice: &str) -> Result<DecodeInvoiceResponse, NodeApiError> {
        self.post("decodelninvoice", &DecodeInvoiceRequest { invoice: invoice.to_owned() }).await
    }

    async fn decode_rgb_invoice(
        &self,
        invoice: &str,
    ) -> Result<DecodeRgbInvoiceResponse, NodeApiError> {
        self.post("decodergbinvoice", &DecodeRgbInvoiceRequest { invoice: invoice.to_owned() })
            .await
    }

    async fn list_payments(&self) -> Result<ListPaymentsResponse, NodeApiError> {
        self.get("listpayments").await
    }

    async fn send_payment(
        &self,
        request: SendPaymentRequest,
    ) -> Result<SendPaymentResponse, NodeApiError> {
        self.post("sendpayment", &request).await
    }

    async fn send_btc(&self, request: SendBtcRequest) -> Result<SendBtcResponse, NodeApiError> {
        self.post("sendbtc", &request).await
    }

    async fn send_asset(
        &self,
        request: SendAssetRequest,
    ) -> Result<SendAssetResponse, NodeApiError> {
        self.post("sendasset", &request).await
    }

    async fn estimate_fee(&self, blocks: u16) -> Result<EstimateFeeResponse, NodeApiError> {
        self.post("estimatefee", &serde_json::json!({ "blocks": blocks })).await
    }

    async fn unlock(&self, request: UnlockRequest) -> Result<(), NodeApiError> {
        let _: serde_json::Value = self.post("unlock", &request).await?;
        Ok(())
    }

    async fn node_info(&self) -> Result<NodeInfoResponse, NodeApiError> {
        self.get("nodeinfo").await
    }
}

/// Fetches fee estimates for the three standard confirmation targets.
///
/// Falls back to [`FeeEstimates::default`] when the estimator is unreachable,
/// so an offline estimator never blocks a submission.
pub async fn fetch_fee_estimates<A: NodeApi + ?Sized>(api: &A) -> FeeEstimates {
    let (slow, normal, fast) = FeeEstimates::BLOCK_TARGETS;
    match tokio::try_join!(
        api.estimate_fee(slow),
        api.estimate_fee(normal),
        api.estimate_fee(fast)
    ) {
        Ok((slow, normal, fast)) => {
            FeeEstimates { slow: slow.fee_rate, normal: normal.fee_rate, fast: fast.fee_rate }
        }
        Err(err) => {
            warn!(error = %err, "failed to fetch fee estimates, using fallback rates");
            FeeEstimates::default()
        }
    }
}
