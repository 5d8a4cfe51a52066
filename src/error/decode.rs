use thiserror::Error;

/// Failure turning a raw string into a payment target.
///
/// The public resolver folds these into
/// [`PaymentTarget::Invalid`](crate::types::PaymentTarget::Invalid), so the
/// display strings below are what a wallet shows next to the input field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Empty input; distinguished so callers can clear state instead of
    /// showing an error.
    #[error("empty")]
    Empty,
    /// A bare node pubkey was entered where a payable destination is
    /// expected. Valid in the peer-connection context only.
    #[error("a node public key is not a payable destination")]
    PubkeyNotPayable,
    /// No known format matched.
    #[error("unrecognized format")]
    UnrecognizedFormat,
    /// The string is not a valid `pubkey` or `pubkey@host:port` endpoint.
    #[error("invalid peer endpoint")]
    InvalidPeerEndpoint,
    /// The node could not decode the string; carries the node's error text
    /// verbatim.
    #[error("{0}")]
    Node(String),
}
