use metrics::{Counter, Histogram};
use metrics_derive::Metrics;

/// Metrics for the [`PaymentService`](super::PaymentService).
#[derive(Metrics)]
#[metrics(scope = "payments")]
pub struct PaymentServiceMetrics {
    /// Number of submitted attempts.
    pub submitted: Counter,
    /// Number of attempts that settled successfully.
    pub succeeded: Counter,
    /// Number of attempts that failed.
    pub failed: Counter,
    /// Number of attempts cancelled before settling.
    pub cancelled: Counter,
    /// Number of attempts that hit the settlement ceiling.
    pub timed_out: Counter,
    /// Settlement polls issued.
    pub polls: Counter,
    /// Time from submission to a terminal state, in milliseconds.
    pub settlement_time: Histogram,
}
