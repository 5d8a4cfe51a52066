//! Read-only wallet and channel snapshots consumed by validation.
//!
//! Snapshots are produced by external collaborators on their own refresh
//! cadence; validation treats them as immutable inputs.

use serde::{Deserialize, Serialize};

/// Spendable balance of a single RGB asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBalance {
    /// Asset id.
    pub asset_id: String,
    /// Ticker, for messages.
    pub ticker: String,
    /// Spendable amount in the asset's smallest unit.
    pub spendable: u64,
}

/// Snapshot of a single channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    /// Whether the channel is ready.
    pub ready: bool,
    /// Whether the channel is currently usable.
    pub usable: bool,
    /// Largest single HTLC this channel can currently forward outbound,
    /// in millisatoshi.
    pub next_outbound_htlc_limit_msat: u64,
    /// Asset carried by the channel, if any.
    #[serde(default)]
    pub asset_id: Option<String>,
    /// Local amount of the carried asset.
    #[serde(default)]
    pub asset_local_amount: u64,
}

impl ChannelSnapshot {
    fn is_payable(&self) -> bool {
        self.ready && self.usable
    }
}

/// Immutable snapshot of wallet balances and channels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSnapshot {
    /// Spendable on-chain BTC balance in satoshi.
    pub btc_spendable_sat: u64,
    /// Per-asset spendable balances, in wallet listing order.
    pub assets: Vec<AssetBalance>,
    /// Channel snapshots.
    pub channels: Vec<ChannelSnapshot>,
}

impl WalletSnapshot {
    /// Whether the wallet holds the asset at all.
    pub fn holds_asset(&self, asset_id: &str) -> bool {
        self.assets.iter().any(|asset| asset.asset_id == asset_id)
    }

    /// Spendable balance of an asset, zero when the wallet does not hold it.
    pub fn asset_balance(&self, asset_id: &str) -> u64 {
        self.assets
            .iter()
            .find(|asset| asset.asset_id == asset_id)
            .map(|asset| asset.spendable)
            .unwrap_or_default()
    }

    /// Ticker of an asset, for messages.
    pub fn asset_ticker(&self, asset_id: &str) -> Option<&str> {
        self.assets
            .iter()
            .find(|asset| asset.asset_id == asset_id)
            .map(|asset| asset.ticker.as_str())
    }

    /// The first asset with a positive spendable balance, in listing order.
    pub fn first_asset_with_balance(&self) -> Option<&AssetBalance> {
        self.assets.iter().find(|asset| asset.spendable > 0)
    }

    /// Largest single outbound HTLC any usable channel can currently forward,
    /// in millisatoshi.
    ///
    /// The maximum across channels, not the sum: a payment travels through
    /// one channel.
    pub fn max_outbound_htlc_msat(&self) -> u64 {
        self.channels
            .iter()
            .filter(|channel| channel.is_payable())
            .map(|channel| channel.next_outbound_htlc_limit_msat)
            .max()
            .unwrap_or_default()
    }

    /// Largest local amount of an asset across usable channels.
    pub fn max_asset_capacity(&self, asset_id: &str) -> u64 {
        self.channels
            .iter()
            .filter(|channel| {
                channel.is_payable() && channel.asset_id.as_deref() == Some(asset_id)
            })
            .map(|channel| channel.asset_local_amount)
            .max()
            .unwrap_or_default()
    }
}
