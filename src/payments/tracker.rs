//! Settlement tracking for in-flight lightning payments.

use super::metrics::PaymentServiceMetrics;
use crate::{
    client::{NodeApi, ResilientClient},
    types::{AttemptId, PaymentState},
};
use chrono::{DateTime, Utc};
use std::{pin::Pin, sync::Arc, time::Duration};
use tokio::{
    sync::{mpsc, oneshot},
    time::{Instant, interval, sleep_until},
};
use tracing::{debug, trace};

/// Non-owning reference to the attempt being observed.
///
/// The tracker never holds the attempt itself; observations flow back to the
/// owning service, which is the only writer of attempt state.
#[derive(Debug, Clone)]
pub struct TrackedAttempt {
    /// Id of the attempt.
    pub id: AttemptId,
    /// Payment hash to match against the node's payment list.
    pub payment_hash: String,
}

/// Observation reported by the tracker.
#[derive(Debug, Clone)]
pub struct TrackerEvent {
    /// Id of the observed attempt.
    pub id: AttemptId,
    /// State the node reported, or the tracker concluded.
    pub state: PaymentState,
    /// When the poll that produced this observation completed, if one did.
    pub polled_at: Option<DateTime<Utc>>,
}

/// Handle used to stop an active tracker.
///
/// Cancellation is cooperative: it is honored at the next scheduled tick at
/// the latest, and an RPC already dispatched is not aborted — only its result
/// is discarded. It never undoes a payment the node already accepted.
#[derive(Debug)]
pub struct TrackerHandle {
    cancel_tx: oneshot::Sender<()>,
}

impl TrackerHandle {
    /// Stops observation.
    pub fn cancel(self) {
        let _ = self.cancel_tx.send(());
    }
}

/// Drives a pending payment to a terminal state by polling the node.
///
/// Polls `list_payments` on a fixed interval and adopts the status reported
/// for the matching payment hash. A hard wall-clock ceiling, measured from
/// submission and independent of poll results, fails the payment if the node
/// never reports a terminal status.
#[derive(Debug)]
pub struct SettlementTracker<A: ?Sized> {
    api: Arc<A>,
    retry: ResilientClient,
    attempt: TrackedAttempt,
    started_at: Instant,
    poll_interval: Duration,
    timeout: Duration,
    events_tx: mpsc::UnboundedSender<TrackerEvent>,
    cancel_rx: oneshot::Receiver<()>,
    metrics: Arc<PaymentServiceMetrics>,
}

impl<A: NodeApi + ?Sized> SettlementTracker<A> {
    /// Creates a new [`SettlementTracker`] and its cancellation handle.
    ///
    /// `started_at` is the submission instant; the timeout ceiling counts
    /// from it, not from when polling starts.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        api: Arc<A>,
        retry: ResilientClient,
        attempt: TrackedAttempt,
        started_at: Instant,
        poll_interval: Duration,
        timeout: Duration,
        events_tx: mpsc::UnboundedSender<TrackerEvent>,
        metrics: Arc<PaymentServiceMetrics>,
    ) -> (Self, TrackerHandle) {
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let this = Self {
            api,
            retry,
            attempt,
            started_at,
            poll_interval,
            timeout,
            events_tx,
            cancel_rx,
            metrics,
        };
        (this, TrackerHandle { cancel_tx })
    }
}

impl<A: NodeApi + ?Sized> IntoFuture for SettlementTracker<A> {
    type Output = PaymentState;
    type IntoFuture = Pin<Box<dyn Future<Output = PaymentState> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        let Self {
            api,
            retry,
            attempt,
            started_at,
            poll_interval,
            timeout,
            events_tx,
            mut cancel_rx,
            metrics,
        } = self;

        Box::pin(async move {
            let deadline = sleep_until(started_at + timeout);
            tokio::pin!(deadline);

            let observe = observe(&*api, &retry, &attempt, &events_tx, &*metrics, poll_interval);
            tokio::pin!(observe);

            let state = tokio::select! {
                biased;
                _ = &mut cancel_rx => {
                    debug!(id = %attempt.id, "settlement observation cancelled");
                    PaymentState::Cancelled
                }
                _ = &mut deadline => {
                    debug!(id = %attempt.id, ?timeout, "settlement ceiling reached");
                    PaymentState::Failed("timed out".into())
                }
                state = &mut observe => state,
            };

            let _ = events_tx.send(TrackerEvent {
                id: attempt.id,
                state: state.clone(),
                polled_at: None,
            });
            state
        })
    }
}

/// Polls until the node reports a terminal status.
///
/// Poll failures are not terminal here: the resilient client absorbs
/// transient ones with backoff, anything else is logged and the cadence
/// retries. The outer ceiling bounds the total wait either way.
async fn observe<A: NodeApi + ?Sized>(
    api: &A,
    retry: &ResilientClient,
    attempt: &TrackedAttempt,
    events_tx: &mpsc::UnboundedSender<TrackerEvent>,
    metrics: &PaymentServiceMetrics,
    poll_interval: Duration,
) -> PaymentState {
    let mut clock = interval(poll_interval);
    loop {
        clock.tick().await;
        metrics.polls.increment(1);

        let payments = match retry.run("list_payments", || api.list_payments()).await {
            Ok(response) => response.payments,
            Err(err) => {
                debug!(id = %attempt.id, error = %err, "settlement poll failed");
                continue;
            }
        };

        let polled_at = Utc::now();
        let Some(payment) =
            payments.into_iter().find(|payment| payment.payment_hash == attempt.payment_hash)
        else {
            trace!(id = %attempt.id, "payment not yet in the node's list");
            let _ = events_tx.send(TrackerEvent {
                id: attempt.id,
                state: PaymentState::Pending,
                polled_at: Some(polled_at),
            });
            continue;
        };

        let state = PaymentState::from(payment.status);
        trace!(id = %attempt.id, %state, "settlement poll");
        if state.is_terminal() {
            return state;
        }
        let _ = events_tx.send(TrackerEvent {
            id: attempt.id,
            state,
            polled_at: Some(polled_at),
        });
    }
}
