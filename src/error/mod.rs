//! Engine error types.

use thiserror::Error;

mod decode;
pub use decode::DecodeError;

mod node;
pub use node::{AuthError, ErrorClass, NodeApiError, RetryError};

mod submit;
pub use submit::SubmissionError;

mod validate;
pub use validate::ValidationError;

/// The overarching error type of the payment engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Failure decoding a payment request.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// Blocking validation failure.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Failure submitting a payment.
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    /// A node call failed.
    #[error(transparent)]
    Node(#[from] NodeApiError),
    /// Credential rejection.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// A retried operation ended without success.
    #[error(transparent)]
    Retry(#[from] RetryError),
    /// An internal error occurred.
    #[error(transparent)]
    Internal(#[from] eyre::Error),
}
