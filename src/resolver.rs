//! Classification of raw user input into a [`PaymentTarget`].
//!
//! Two call-site contexts exist and stay deliberately separate: payment
//! resolution ([`resolve_payment`]), where a bare node pubkey is never a
//! payable destination, and peer connection ([`parse_peer_endpoint`]), where
//! it is. Merging the two would silently turn pubkeys into payment targets.

use crate::{
    client::NodeApi,
    error::DecodeError,
    types::{Assignment, PaymentTarget, PeerEndpoint},
};
use tracing::debug;

/// Classifies a raw string into a [`PaymentTarget`], decoding invoices
/// through the node.
///
/// Never fails: anything that cannot be classified, including node decode
/// rejections, comes back as [`PaymentTarget::Invalid`] with the reason. Does
/// not touch wallet state.
pub async fn resolve_payment<A: NodeApi + ?Sized>(api: &A, raw: &str) -> PaymentTarget {
    match try_resolve_payment(api, raw).await {
        Ok(target) => target,
        Err(err) => {
            debug!(input.len = raw.len(), reason = %err, "input did not resolve to a target");
            PaymentTarget::Invalid { reason: err.to_string() }
        }
    }
}

/// Fallible variant of [`resolve_payment`].
///
/// Classification order, first match wins: bare pubkey (rejected), `ln`
/// invoice, `rgb` invoice, `bc`/`tb` address, lightning address.
pub async fn try_resolve_payment<A: NodeApi + ?Sized>(
    api: &A,
    raw: &str,
) -> Result<PaymentTarget, DecodeError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(DecodeError::Empty);
    }

    // valid in the peer-connection context only; see `parse_peer_endpoint`
    if is_hex_pubkey(raw) {
        return Err(DecodeError::PubkeyNotPayable);
    }

    if raw.starts_with("ln") {
        let decoded = api
            .decode_invoice(raw)
            .await
            .map_err(|err| DecodeError::Node(err.to_string()))?;
        return Ok(PaymentTarget::LightningInvoice {
            raw: raw.to_owned(),
            payment_hash: decoded.payment_hash,
            amount_msat: decoded.amt_msat,
            asset_id: decoded.asset_id,
            asset_amount: decoded.asset_amount,
            expiry_sec: decoded.expiry_sec,
        });
    }

    if raw.starts_with("rgb") {
        let decoded = api
            .decode_rgb_invoice(raw)
            .await
            .map_err(|err| DecodeError::Node(err.to_string()))?;
        let amount = decoded.assignment.as_ref().and_then(Assignment::amount);
        return Ok(PaymentTarget::RgbInvoice {
            raw: raw.to_owned(),
            recipient_id: decoded.recipient_id,
            asset_id: decoded.asset_id,
            amount,
            transport_endpoints: decoded.transport_endpoints,
            recipient_kind: decoded.recipient_type,
        });
    }

    if raw.starts_with("bc") || raw.starts_with("tb") {
        return Ok(PaymentTarget::BitcoinAddress { address: raw.to_owned() });
    }

    if is_lightning_address(raw) {
        return Ok(PaymentTarget::LightningAddress { handle: raw.to_owned() });
    }

    Err(DecodeError::UnrecognizedFormat)
}

/// Parses a peer endpoint for the channel-open flow.
///
/// Accepts a bare 66-hex-character pubkey, or `pubkey@host:port`. This is the
/// only context where a bare pubkey is valid input; it must never feed the
/// payment path.
pub fn parse_peer_endpoint(raw: &str) -> Result<PeerEndpoint, DecodeError> {
    let raw = raw.trim();
    if is_hex_pubkey(raw) {
        return Ok(PeerEndpoint { pubkey: raw.to_owned(), address: None });
    }

    let Some((pubkey, host_port)) = raw.split_once('@') else {
        return Err(DecodeError::InvalidPeerEndpoint);
    };
    if !is_hex_pubkey(pubkey) {
        return Err(DecodeError::InvalidPeerEndpoint);
    }

    let Some((host, port)) = host_port.split_once(':') else {
        return Err(DecodeError::InvalidPeerEndpoint);
    };
    if host.is_empty() {
        return Err(DecodeError::InvalidPeerEndpoint);
    }
    let port: u16 = port.parse().map_err(|_| DecodeError::InvalidPeerEndpoint)?;
    if port == 0 {
        return Err(DecodeError::InvalidPeerEndpoint);
    }

    Ok(PeerEndpoint { pubkey: pubkey.to_owned(), address: Some((host.to_owned(), port)) })
}

/// Whether the string is a 33-byte compressed pubkey in hex.
fn is_hex_pubkey(input: &str) -> bool {
    input.len() == 66 && input.chars().all(|c| c.is_ascii_hexdigit())
}

/// Whether the string is shaped like `user@domain.tld`.
fn is_lightning_address(input: &str) -> bool {
    let Some((local, domain)) = input.split_once('@') else {
        return false;
    };
    if local.is_empty()
        || !local.chars().all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c))
    {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty()
        && host.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        && tld.len() >= 2
        && tld.chars().all(|c| c.is_ascii_alphabetic())
}
