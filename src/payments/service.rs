//! Service owning the single in-flight payment attempt of a session.

use super::{
    PaymentSubmitter, SendOptions, SettlementTracker, SubmissionOutcome, TrackedAttempt,
    TrackerEvent, TrackerHandle,
    metrics::PaymentServiceMetrics,
};
use crate::{
    client::{self, NodeApi, ResilientClient},
    config::EngineConfig,
    types::{FeePolicy, PaymentAttempt, PaymentState, PaymentTarget},
};
use std::{pin::Pin, sync::Arc, time::Duration};
use tokio::{sync::mpsc, time::Instant};
use tracing::{debug, info, warn};

/// Messages accepted by the [`PaymentService`].
#[derive(Debug)]
pub enum PaymentServiceMessage {
    /// Message to submit a payment; supersedes any non-terminal attempt.
    Submit {
        /// The validated target.
        target: PaymentTarget,
        /// Amount in base units of the selected asset.
        amount: u64,
        /// Fee selection.
        fee_policy: FeePolicy,
        /// Asset-send extras.
        options: SendOptions,
        /// Channel receiving state updates for this attempt.
        status_tx: mpsc::UnboundedSender<PaymentState>,
    },
    /// Message to cancel the active attempt.
    Cancel,
}

/// Handle to communicate with the [`PaymentService`].
#[derive(Debug, Clone)]
pub struct PaymentServiceHandle {
    command_tx: mpsc::UnboundedSender<PaymentServiceMessage>,
}

impl PaymentServiceHandle {
    /// Submits a payment, superseding any attempt still in flight.
    ///
    /// Returns a stream of state updates ending in a terminal state; the
    /// caller is never left waiting past the settlement ceiling.
    pub fn submit(
        &self,
        target: PaymentTarget,
        amount: u64,
        fee_policy: FeePolicy,
        options: SendOptions,
    ) -> mpsc::UnboundedReceiver<PaymentState> {
        let (status_tx, status_rx) = mpsc::unbounded_channel();
        let _ = self.command_tx.send(PaymentServiceMessage::Submit {
            target,
            amount,
            fee_policy,
            options,
            status_tx,
        });
        status_rx
    }

    /// Cancels the active attempt, if any.
    pub fn cancel(&self) {
        let _ = self.command_tx.send(PaymentServiceMessage::Cancel);
    }
}

/// The active attempt and its observation plumbing.
struct ActiveAttempt {
    attempt: PaymentAttempt,
    subscriber: mpsc::UnboundedSender<PaymentState>,
    tracker: Option<TrackerHandle>,
}

/// Service handling payment attempts.
///
/// Owns at most one non-terminal [`PaymentAttempt`] at a time: submitting a
/// new one cancels observation of the previous one. All attempt mutation
/// happens inside this service's loop; the submitter and tracker only feed
/// it, which keeps the single-writer discipline trivially true.
pub struct PaymentService<A: ?Sized> {
    api: Arc<A>,
    submitter: PaymentSubmitter<A>,
    retry: ResilientClient,
    poll_interval: Duration,
    settlement_timeout: Duration,
    command_rx: mpsc::UnboundedReceiver<PaymentServiceMessage>,
    events_tx: mpsc::UnboundedSender<TrackerEvent>,
    events_rx: mpsc::UnboundedReceiver<TrackerEvent>,
    active: Option<ActiveAttempt>,
    metrics: Arc<PaymentServiceMetrics>,
}

impl<A: ?Sized> std::fmt::Debug for PaymentService<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentService")
            .field("active", &self.active.as_ref().map(|active| active.attempt.id))
            .finish_non_exhaustive()
    }
}

impl<A: NodeApi + ?Sized> PaymentService<A> {
    /// Creates a new [`PaymentService`].
    pub fn new(api: Arc<A>, config: &EngineConfig) -> (Self, PaymentServiceHandle) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let submitter =
            PaymentSubmitter::new(api.clone(), config.default_transport_endpoint.clone());
        let this = Self {
            api,
            submitter,
            retry: ResilientClient::new(config.retry.clone()),
            poll_interval: config.poll_interval,
            settlement_timeout: config.settlement_timeout,
            command_rx,
            events_tx,
            events_rx,
            active: None,
            metrics: Arc::new(PaymentServiceMetrics::default()),
        };

        (this, PaymentServiceHandle { command_tx })
    }

    /// Creates a new [`PaymentService`] and spawns it.
    pub fn spawn(api: Arc<A>, config: &EngineConfig) -> PaymentServiceHandle {
        let (this, handle) = Self::new(api, config);
        tokio::spawn(this.into_future());
        handle
    }

    async fn handle_command(&mut self, message: PaymentServiceMessage) {
        match message {
            PaymentServiceMessage::Submit { target, amount, fee_policy, options, status_tx } => {
                self.cancel_active("superseded by a new attempt");
                self.submit(target, amount, fee_policy, options, status_tx).await;
            }
            PaymentServiceMessage::Cancel => self.cancel_active("cancelled"),
        }
    }

    /// Cancels observation of the active attempt, if it is still live.
    ///
    /// This only stops client-side observation; a payment the node already
    /// accepted settles (or fails) on its own.
    fn cancel_active(&mut self, reason: &str) {
        let Some(mut active) = self.active.take() else { return };
        if active.attempt.state.is_terminal() {
            return;
        }

        debug!(id = %active.attempt.id, reason, "cancelling active attempt");
        if let Some(tracker) = active.tracker.take() {
            tracker.cancel();
        }
        active.attempt.state = PaymentState::Cancelled;
        let _ = active.subscriber.send(PaymentState::Cancelled);
        self.metrics.cancelled.increment(1);
    }

    async fn submit(
        &mut self,
        target: PaymentTarget,
        amount: u64,
        fee_policy: FeePolicy,
        options: SendOptions,
        status_tx: mpsc::UnboundedSender<PaymentState>,
    ) {
        let mut attempt = PaymentAttempt::new(target, amount, fee_policy);
        let started_at = Instant::now();

        attempt.state = PaymentState::Submitting;
        let _ = status_tx.send(PaymentState::Submitting);
        self.metrics.submitted.increment(1);
        info!(id = %attempt.id, target = attempt.target.kind(), amount, "submitting payment");

        // on-chain dispatches need a concrete rate; fetch unless overridden
        let fees = match fee_policy {
            FeePolicy::Custom(_) => Default::default(),
            _ => client::fetch_fee_estimates(&*self.api).await,
        };

        match self.submitter.submit(&attempt, &options, &fees).await {
            Err(err) => {
                warn!(id = %attempt.id, error = %err, "submission failed");
                let state = PaymentState::Failed(err.to_string());
                let _ = status_tx.send(state);
                self.metrics.failed.increment(1);
                // failed submissions are never resubmitted; a fresh submit
                // with an edited target is required
            }
            Ok(SubmissionOutcome::Broadcast { .. }) => {
                let _ = status_tx.send(PaymentState::Succeeded);
                self.metrics.succeeded.increment(1);
                self.record_settlement(started_at);
            }
            Ok(SubmissionOutcome::Terminal(state)) => {
                // the node settled (or failed) the payment synchronously;
                // adopt its verdict without entering the polling path
                info!(id = %attempt.id, %state, "terminal status adopted from submission");
                match &state {
                    PaymentState::Succeeded => self.metrics.succeeded.increment(1),
                    _ => self.metrics.failed.increment(1),
                }
                let _ = status_tx.send(state);
                self.record_settlement(started_at);
            }
            Ok(SubmissionOutcome::Tracking { payment_hash }) => {
                attempt.payment_hash = Some(payment_hash.clone());
                attempt.state = PaymentState::Pending;
                let _ = status_tx.send(PaymentState::Pending);

                let (tracker, handle) = SettlementTracker::new(
                    self.api.clone(),
                    self.retry.clone(),
                    TrackedAttempt { id: attempt.id, payment_hash },
                    started_at,
                    self.poll_interval,
                    self.settlement_timeout,
                    self.events_tx.clone(),
                    self.metrics.clone(),
                );
                tokio::spawn(tracker.into_future());

                self.active = Some(ActiveAttempt {
                    attempt,
                    subscriber: status_tx,
                    tracker: Some(handle),
                });
            }
        }
    }

    fn handle_event(&mut self, event: TrackerEvent) {
        let Some(active) = self.active.as_mut() else {
            // observation of a superseded attempt; drop it
            return;
        };
        if active.attempt.id != event.id {
            return;
        }

        if let Some(polled_at) = event.polled_at {
            active.attempt.last_polled_at = Some(polled_at);
        }
        if event.state == active.attempt.state {
            return;
        }

        active.attempt.state = event.state.clone();
        let _ = active.subscriber.send(event.state.clone());

        if event.state.is_terminal() {
            info!(id = %event.id, state = %event.state, "payment reached a terminal state");
            match &event.state {
                PaymentState::Succeeded => self.metrics.succeeded.increment(1),
                PaymentState::Failed(reason) if reason == "timed out" => {
                    self.metrics.timed_out.increment(1)
                }
                PaymentState::Cancelled => self.metrics.cancelled.increment(1),
                _ => self.metrics.failed.increment(1),
            }
            let elapsed = (chrono::Utc::now() - active.attempt.started_at)
                .num_milliseconds()
                .max(0) as f64;
            self.metrics.settlement_time.record(elapsed);
            // terminal acknowledgment drops the attempt
            self.active = None;
        }
    }

    fn record_settlement(&self, started_at: Instant) {
        self.metrics.settlement_time.record(started_at.elapsed().as_millis() as f64);
    }
}

impl<A: NodeApi + ?Sized> IntoFuture for PaymentService<A> {
    type Output = ();
    type IntoFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

    fn into_future(mut self) -> Self::IntoFuture {
        Box::pin(async move {
            loop {
                tokio::select! {
                    maybe_command = self.command_rx.recv() => {
                        let Some(command) = maybe_command else {
                            break // all handles dropped
                        };
                        self.handle_command(command).await;
                    }
                    Some(event) = self.events_rx.recv() => self.handle_event(event),
                }
            }
        })
    }
}
