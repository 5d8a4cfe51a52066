//! Engine constants.

use std::time::Duration;

/// Sentinel asset id the wallet uses for plain bitcoin.
///
/// The node's asset endpoints only ever see real RGB asset ids; this value
/// never crosses the wire.
pub const BTC_ASSET_ID: &str = "BTC";

/// Millisatoshis per satoshi.
pub const MSATS_PER_SAT: u64 = 1_000;

/// On-chain dust floor in satoshis. Outputs below this are not relayed.
pub const DUST_LIMIT_SAT: u64 = 546;

/// Minimum witness UTXO amount the node accepts for RGB witness recipients.
pub const MIN_WITNESS_AMOUNT_SAT: u64 = 512;

/// Default witness UTXO amount attached to RGB witness transfers.
pub const DEFAULT_WITNESS_AMOUNT_SAT: u64 = 1_200;

/// Interval between settlement polls.
pub const SETTLEMENT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Wall-clock ceiling a payment may stay pending before it is failed.
///
/// Polling stops and the attempt fails once this much time has passed since
/// submission, regardless of what the last poll returned.
pub const SETTLEMENT_TIMEOUT: Duration = Duration::from_secs(60);

/// Interval preceding the first retry of the resilient client.
pub const RETRY_INITIAL_INTERVAL: Duration = Duration::from_millis(2_000);

/// Upper bound on the retry interval.
pub const RETRY_MAX_INTERVAL: Duration = Duration::from_millis(15_000);

/// Factor the retry interval grows by after each transient failure.
pub const RETRY_BACKOFF_FACTOR: f64 = 1.5;

/// Confirmation target, in blocks, for the fast fee estimate.
pub const FEE_BLOCKS_FAST: u16 = 1;

/// Confirmation target, in blocks, for the normal fee estimate.
pub const FEE_BLOCKS_NORMAL: u16 = 3;

/// Confirmation target, in blocks, for the slow fee estimate.
pub const FEE_BLOCKS_SLOW: u16 = 6;
