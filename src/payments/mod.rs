//! Payment submission and settlement tracking.

mod metrics;
pub use metrics::PaymentServiceMetrics;

mod service;
pub use service::*;

mod submit;
pub use submit::*;

mod tracker;
pub use tracker::*;
