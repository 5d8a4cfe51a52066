use thiserror::Error;

/// Error returned by a node API call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeApiError {
    /// The node answered with an error status; `message` is the node's error
    /// text verbatim.
    #[error("{message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// The node's error text.
        message: String,
    },
    /// The request timed out.
    #[error("request timed out")]
    Timeout,
    /// Connection or transport-level failure.
    #[error("transport error: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
    },
}

/// Messages the node uses for conditions the engine dispatches on.
mod msg {
    pub(super) const CHANGING_STATE: &str =
        "Cannot call other APIs while node is changing state";
    pub(super) const INVALID_PASSWORD: &str = "Invalid password";
    pub(super) const NOT_INITIALIZED: &str =
        "Wallet has not been initialized (hint: call init)";
    pub(super) const ALREADY_UNLOCKED: &str = "Node has already been unlocked";
}

/// Retry classification of a failed node call.
///
/// Drives the [`ResilientClient`](crate::client::ResilientClient): transient
/// classes are retried silently with backoff, the rest stop the loop and
/// surface to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Expected to resolve on its own: timeouts, transport drops and, as a
    /// best-effort default, anything unclassified.
    Transient,
    /// The node refuses calls while changing state; retried like a timeout.
    StateWait,
    /// Credentials rejected; surfaced immediately, never retried.
    Fatal,
    /// The wallet was never initialized; surfaced as a distinct signal so the
    /// caller can start the init flow.
    NeedsInit,
    /// The operation had already completed server-side; treated as success.
    AlreadyDone,
}

impl ErrorClass {
    /// Whether the class allows another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient | Self::StateWait)
    }
}

impl NodeApiError {
    /// Classifies the error for retry purposes.
    pub fn classify(&self) -> ErrorClass {
        match self {
            Self::Timeout | Self::Transport { .. } => ErrorClass::Transient,
            Self::Api { status, message } => match (*status, message.as_str()) {
                (403, msg::CHANGING_STATE) => ErrorClass::StateWait,
                (401, msg::INVALID_PASSWORD) => ErrorClass::Fatal,
                (403, msg::NOT_INITIALIZED) => ErrorClass::NeedsInit,
                (_, msg::ALREADY_UNLOCKED) => ErrorClass::AlreadyDone,
                (_, message) if message.contains("timed out") || message.contains("timeout") => {
                    ErrorClass::Transient
                }
                // unclassified errors are retried best-effort
                _ => ErrorClass::Transient,
            },
        }
    }
}

/// Credential rejection by the node. Terminal for the current operation;
/// requires fresh credentials and is never silently retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid password")]
pub struct AuthError;

/// Terminal result of a classification-driven retry loop.
#[derive(Debug, Error)]
pub enum RetryError {
    /// The node rejected the credentials.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// The wallet must be initialized before this operation can succeed.
    #[error("wallet is not initialized")]
    NotInitialized,
    /// The node reports the operation as already completed; carries the
    /// node's message.
    #[error("already done: {0}")]
    AlreadyDone(String),
    /// The configured attempt bound was exhausted.
    #[error("retries exhausted after {attempts} attempts: {last}")]
    Exhausted {
        /// Failures observed before giving up.
        attempts: u32,
        /// The final failure.
        last: NodeApiError,
    },
}
