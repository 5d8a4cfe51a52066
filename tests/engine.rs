//! End-to-end engine tests against a scripted mock node.

use rgbpay::{
    client::{NodeApi, ResilientClient, RetryPolicy},
    config::EngineConfig,
    error::NodeApiError,
    payments::{PaymentService, SendOptions},
    types::{
        DecodeInvoiceResponse, DecodeRgbInvoiceResponse, EstimateFeeResponse, FeePolicy,
        HtlcStatus, ListPaymentsResponse, NodeInfoResponse, Payment, PaymentState,
        PaymentTarget, RecipientKind, SendAssetRequest, SendAssetResponse, SendBtcRequest,
        SendBtcResponse, SendPaymentRequest, SendPaymentResponse, UnlockRequest,
    },
    unlock::{UnlockError, UnlockOutcome, unlock},
};
use async_trait::async_trait;
use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

const PAYMENT_HASH: &str = "0404040404040404040404040404040404040404040404040404040404040404";

/// Scripted node: mutating calls are recorded, poll and unlock responses are
/// driven by per-test scripts.
#[derive(Default)]
struct MockNode {
    /// Names of mutating RPCs called, in order.
    mutations: Mutex<Vec<&'static str>>,
    /// Requests passed to `send_asset`.
    asset_requests: Mutex<Vec<SendAssetRequest>>,
    /// Status `send_payment` responds with.
    send_payment_status: Mutex<Option<HtlcStatus>>,
    /// Statuses `list_payments` reports for [`PAYMENT_HASH`], consumed in
    /// order; the last one repeats.
    poll_script: Mutex<VecDeque<HtlcStatus>>,
    /// Number of `list_payments` calls.
    polls: AtomicU32,
    /// Errors `unlock` fails with before succeeding.
    unlock_script: Mutex<VecDeque<NodeApiError>>,
    /// Number of `unlock` calls.
    unlocks: AtomicU32,
}

impl MockNode {
    fn with_send_payment(status: HtlcStatus) -> Self {
        Self { send_payment_status: Mutex::new(Some(status)), ..Default::default() }
    }

    fn poll_script(self, statuses: impl IntoIterator<Item = HtlcStatus>) -> Self {
        *self.poll_script.lock().unwrap() = statuses.into_iter().collect();
        self
    }

    fn unlock_script(self, errors: impl IntoIterator<Item = NodeApiError>) -> Self {
        *self.unlock_script.lock().unwrap() = errors.into_iter().collect();
        self
    }

    fn mutations(&self) -> Vec<&'static str> {
        self.mutations.lock().unwrap().clone()
    }
}

#[async_trait]
impl NodeApi for MockNode {
    async fn decode_invoice(&self, _: &str) -> Result<DecodeInvoiceResponse, NodeApiError> {
        Ok(DecodeInvoiceResponse {
            amt_msat: 500_000,
            expiry_sec: 3_600,
            payment_hash: PAYMENT_HASH.into(),
            asset_id: None,
            asset_amount: None,
        })
    }

    async fn decode_rgb_invoice(
        &self,
        _: &str,
    ) -> Result<DecodeRgbInvoiceResponse, NodeApiError> {
        Ok(DecodeRgbInvoiceResponse {
            recipient_id: Some("utxob:recipient".into()),
            asset_id: Some("rgb:asset".into()),
            assignment: None,
            transport_endpoints: vec!["rpc://proxy.example.com/json-rpc".into()],
            recipient_type: RecipientKind::Blind,
        })
    }

    async fn list_payments(&self) -> Result<ListPaymentsResponse, NodeApiError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.poll_script.lock().unwrap();
        let status = if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            *script.front().unwrap_or(&HtlcStatus::Pending)
        };
        Ok(ListPaymentsResponse {
            payments: vec![Payment { payment_hash: PAYMENT_HASH.into(), status }],
        })
    }

    async fn send_payment(
        &self,
        _: SendPaymentRequest,
    ) -> Result<SendPaymentResponse, NodeApiError> {
        self.mutations.lock().unwrap().push("send_payment");
        let status = self.send_payment_status.lock().unwrap().unwrap_or(HtlcStatus::Pending);
        Ok(SendPaymentResponse { payment_hash: PAYMENT_HASH.into(), status })
    }

    async fn send_btc(&self, _: SendBtcRequest) -> Result<SendBtcResponse, NodeApiError> {
        self.mutations.lock().unwrap().push("send_btc");
        Ok(SendBtcResponse { txid: "aa".repeat(32) })
    }

    async fn send_asset(
        &self,
        request: SendAssetRequest,
    ) -> Result<SendAssetResponse, NodeApiError> {
        self.mutations.lock().unwrap().push("send_asset");
        self.asset_requests.lock().unwrap().push(request);
        Ok(SendAssetResponse { txid: "bb".repeat(32) })
    }

    async fn estimate_fee(&self, blocks: u16) -> Result<EstimateFeeResponse, NodeApiError> {
        Ok(EstimateFeeResponse { fee_rate: blocks as f64 })
    }

    async fn unlock(&self, _: UnlockRequest) -> Result<(), NodeApiError> {
        self.unlocks.fetch_add(1, Ordering::SeqCst);
        match self.unlock_script.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn node_info(&self) -> Result<NodeInfoResponse, NodeApiError> {
        Ok(NodeInfoResponse { pubkey: "02".repeat(33) })
    }
}

fn lightning_invoice() -> PaymentTarget {
    PaymentTarget::LightningInvoice {
        raw: "lnbcrt500u1p".into(),
        payment_hash: PAYMENT_HASH.into(),
        amount_msat: 500_000,
        asset_id: None,
        asset_amount: None,
        expiry_sec: 3_600,
    }
}

fn rgb_invoice(recipient_id: Option<&str>, transport_endpoints: Vec<String>) -> PaymentTarget {
    PaymentTarget::RgbInvoice {
        raw: "rgb:invoice".into(),
        recipient_id: recipient_id.map(str::to_owned),
        asset_id: Some("rgb:asset".into()),
        amount: Some(1_000),
        transport_endpoints,
        recipient_kind: RecipientKind::Blind,
    }
}

fn unlock_request() -> UnlockRequest {
    UnlockRequest {
        bitcoind_rpc_host: "localhost".into(),
        bitcoind_rpc_port: 18443,
        bitcoind_rpc_username: "user".into(),
        bitcoind_rpc_password: "pass".into(),
        indexer_url: "127.0.0.1:50001".into(),
        proxy_endpoint: "rpc://proxy.example.com/json-rpc".into(),
        password: "wallet password".into(),
    }
}

fn api_error(status: u16, message: &str) -> NodeApiError {
    NodeApiError::Api { status, message: message.into() }
}

/// Collects states until a terminal one arrives.
async fn drain_to_terminal(
    status_rx: &mut tokio::sync::mpsc::UnboundedReceiver<PaymentState>,
) -> Vec<PaymentState> {
    let mut states = Vec::new();
    while let Some(state) = status_rx.recv().await {
        let terminal = state.is_terminal();
        states.push(state);
        if terminal {
            break;
        }
    }
    states
}

#[tokio::test]
async fn rgb_invoice_without_recipient_id_fails_before_any_rpc() {
    let api = Arc::new(MockNode::default());
    let handle = PaymentService::spawn(api.clone(), &EngineConfig::default());

    let target = rgb_invoice(None, vec!["rpc://proxy.example.com/json-rpc".into()]);
    let mut status_rx =
        handle.submit(target, 1_000, FeePolicy::Custom(2.0), SendOptions::default());

    let states = drain_to_terminal(&mut status_rx).await;
    assert_eq!(states[0], PaymentState::Submitting);
    match states.last().unwrap() {
        PaymentState::Failed(reason) => assert!(reason.contains("recipient id")),
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(api.mutations().is_empty(), "no RPC may be issued for a doomed submission");
}

#[tokio::test]
async fn rgb_invoice_without_transport_endpoints_fails_before_any_rpc() {
    let api = Arc::new(MockNode::default());
    let handle = PaymentService::spawn(api.clone(), &EngineConfig::default());

    let target = rgb_invoice(Some("utxob:recipient"), vec![]);
    let mut status_rx =
        handle.submit(target, 1_000, FeePolicy::Custom(2.0), SendOptions::default());

    let states = drain_to_terminal(&mut status_rx).await;
    assert!(matches!(states.last().unwrap(), PaymentState::Failed(_)));
    assert!(api.mutations().is_empty());
}

#[tokio::test]
async fn raw_recipient_requires_a_configured_transport_endpoint() {
    let api = Arc::new(MockNode::default());
    // no default transport endpoint configured
    let handle = PaymentService::spawn(api.clone(), &EngineConfig::default());

    let options = SendOptions {
        asset_id: Some("rgb:asset".into()),
        raw_recipient: Some("utxob:raw-recipient".into()),
        ..Default::default()
    };
    let target = PaymentTarget::Invalid { reason: "unrecognized format".into() };
    let mut status_rx = handle.submit(target, 500, FeePolicy::Custom(2.0), options);

    let states = drain_to_terminal(&mut status_rx).await;
    match states.last().unwrap() {
        PaymentState::Failed(reason) => assert!(reason.contains("transport endpoint")),
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(api.mutations().is_empty());
}

#[tokio::test]
async fn raw_recipient_uses_the_configured_default_endpoint() {
    let api = Arc::new(MockNode::default());
    let config = EngineConfig::default()
        .with_default_transport_endpoint("rpc://fallback.example.com/json-rpc");
    let handle = PaymentService::spawn(api.clone(), &config);

    let options = SendOptions {
        asset_id: Some("rgb:asset".into()),
        raw_recipient: Some("utxob:raw-recipient".into()),
        ..Default::default()
    };
    let target = PaymentTarget::Invalid { reason: "unrecognized format".into() };
    let mut status_rx = handle.submit(target, 500, FeePolicy::Custom(2.0), options);

    let states = drain_to_terminal(&mut status_rx).await;
    assert_eq!(*states.last().unwrap(), PaymentState::Succeeded);
    assert_eq!(api.mutations(), vec!["send_asset"]);

    let request = api.asset_requests.lock().unwrap().remove(0);
    assert_eq!(request.recipient_id, "utxob:raw-recipient");
    assert_eq!(request.transport_endpoints, vec!["rpc://fallback.example.com/json-rpc"]);
}

#[tokio::test]
async fn immediately_terminal_payment_skips_polling() {
    let api = Arc::new(MockNode::with_send_payment(HtlcStatus::Succeeded));
    let handle = PaymentService::spawn(api.clone(), &EngineConfig::default());

    let mut status_rx =
        handle.submit(lightning_invoice(), 500, FeePolicy::default(), SendOptions::default());

    let states = drain_to_terminal(&mut status_rx).await;
    assert_eq!(states, vec![PaymentState::Submitting, PaymentState::Succeeded]);
    assert_eq!(api.polls.load(Ordering::SeqCst), 0, "terminal response must not be polled");
}

#[tokio::test(start_paused = true)]
async fn pending_payment_settles_through_polling() {
    let api = Arc::new(
        MockNode::with_send_payment(HtlcStatus::Pending)
            .poll_script([HtlcStatus::Pending, HtlcStatus::Succeeded]),
    );
    let handle = PaymentService::spawn(api.clone(), &EngineConfig::default());

    let mut status_rx =
        handle.submit(lightning_invoice(), 500, FeePolicy::default(), SendOptions::default());

    let states = drain_to_terminal(&mut status_rx).await;
    assert_eq!(
        states,
        vec![PaymentState::Submitting, PaymentState::Pending, PaymentState::Succeeded]
    );
    assert!(api.polls.load(Ordering::SeqCst) >= 2);
}

#[tokio::test(start_paused = true)]
async fn pending_payment_times_out_at_the_ceiling() {
    // the node reports Pending forever
    let api = Arc::new(MockNode::with_send_payment(HtlcStatus::Pending));
    let handle = PaymentService::spawn(api.clone(), &EngineConfig::default());

    let start = tokio::time::Instant::now();
    let mut status_rx =
        handle.submit(lightning_invoice(), 500, FeePolicy::default(), SendOptions::default());

    let states = drain_to_terminal(&mut status_rx).await;
    assert_eq!(*states.last().unwrap(), PaymentState::Failed("timed out".into()));
    assert!(
        start.elapsed() >= Duration::from_secs(60),
        "the ceiling must not fire early: {:?}",
        start.elapsed()
    );

    // polling stops once the ceiling fires
    let polls = api.polls.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(api.polls.load(Ordering::SeqCst), polls);
}

#[tokio::test(start_paused = true)]
async fn a_new_submission_supersedes_the_active_attempt() {
    let api = Arc::new(MockNode::with_send_payment(HtlcStatus::Pending));
    let handle = PaymentService::spawn(api.clone(), &EngineConfig::default());

    let mut first =
        handle.submit(lightning_invoice(), 500, FeePolicy::default(), SendOptions::default());
    assert_eq!(first.recv().await, Some(PaymentState::Submitting));
    assert_eq!(first.recv().await, Some(PaymentState::Pending));

    // second submission cancels observation of the first
    let mut second =
        handle.submit(lightning_invoice(), 500, FeePolicy::default(), SendOptions::default());

    let states = drain_to_terminal(&mut first).await;
    assert_eq!(*states.last().unwrap(), PaymentState::Cancelled);

    assert_eq!(second.recv().await, Some(PaymentState::Submitting));
    assert_eq!(second.recv().await, Some(PaymentState::Pending));
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_observation() {
    let api = Arc::new(MockNode::with_send_payment(HtlcStatus::Pending));
    let handle = PaymentService::spawn(api.clone(), &EngineConfig::default());

    let mut status_rx =
        handle.submit(lightning_invoice(), 500, FeePolicy::default(), SendOptions::default());
    assert_eq!(status_rx.recv().await, Some(PaymentState::Submitting));
    assert_eq!(status_rx.recv().await, Some(PaymentState::Pending));

    handle.cancel();
    let states = drain_to_terminal(&mut status_rx).await;
    assert_eq!(*states.last().unwrap(), PaymentState::Cancelled);

    // observation stopped; the poll counter freezes
    tokio::time::sleep(Duration::from_millis(10)).await;
    let polls = api.polls.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(api.polls.load(Ordering::SeqCst), polls);
}

#[tokio::test]
async fn unlock_succeeds_first_try() {
    let api = MockNode::default();
    let retry = ResilientClient::default();

    let outcome = unlock(&api, &retry, unlock_request()).await.unwrap();
    assert_eq!(outcome, UnlockOutcome::Unlocked);
    assert_eq!(api.unlocks.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn unlock_waits_out_transient_failures() {
    let api = MockNode::default().unlock_script([
        NodeApiError::Transport { message: "connection refused".into() },
        NodeApiError::Timeout,
        api_error(403, "Cannot call other APIs while node is changing state"),
    ]);
    let retry = ResilientClient::default();

    let start = tokio::time::Instant::now();
    let outcome = unlock(&api, &retry, unlock_request()).await.unwrap();
    assert_eq!(outcome, UnlockOutcome::Unlocked);
    assert_eq!(api.unlocks.load(Ordering::SeqCst), 4);
    // three backoffs: 2s + 3s + 4.5s
    assert!(start.elapsed() >= Duration::from_millis(9_500));
}

#[tokio::test]
async fn unlock_surfaces_invalid_password_without_retrying() {
    let api = MockNode::default().unlock_script([api_error(401, "Invalid password")]);
    let retry = ResilientClient::default();

    let result = unlock(&api, &retry, unlock_request()).await;
    assert!(matches!(result, Err(UnlockError::Auth(_))));
    assert_eq!(api.unlocks.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unlock_signals_the_init_flow() {
    let api = MockNode::default()
        .unlock_script([api_error(403, "Wallet has not been initialized (hint: call init)")]);
    let retry = ResilientClient::default();

    let outcome = unlock(&api, &retry, unlock_request()).await.unwrap();
    assert_eq!(outcome, UnlockOutcome::NeedsInit);
}

#[tokio::test]
async fn unlock_treats_already_unlocked_as_success() {
    let api =
        MockNode::default().unlock_script([api_error(403, "Node has already been unlocked")]);
    let retry = ResilientClient::default();

    let outcome = unlock(&api, &retry, unlock_request()).await.unwrap();
    assert_eq!(outcome, UnlockOutcome::AlreadyUnlocked);
}

#[tokio::test(start_paused = true)]
async fn unlock_respects_a_configured_retry_bound() {
    let api = MockNode::default().unlock_script([
        NodeApiError::Timeout,
        NodeApiError::Timeout,
        NodeApiError::Timeout,
        NodeApiError::Timeout,
    ]);
    let retry = ResilientClient::new(RetryPolicy::default().with_max_attempts(2));

    let result = unlock(&api, &retry, unlock_request()).await;
    assert!(matches!(result, Err(UnlockError::Retry(_))));
    assert_eq!(api.unlocks.load(Ordering::SeqCst), 3);
}
