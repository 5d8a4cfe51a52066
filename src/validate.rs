//! Cross-checks a decoded target against wallet and channel snapshots.
//!
//! Validation is pure: the same target, amount and snapshot always produce
//! the same outcome. All comparisons run on integer base units (msat or the
//! asset's smallest unit); display conversion is a boundary concern that
//! never enters this module.

use crate::{
    constants::{DUST_LIMIT_SAT, MSATS_PER_SAT},
    error::ValidationError,
    types::{PaymentTarget, WalletSnapshot},
};

/// Result of cross-checking a target against wallet state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// The payment can proceed as proposed.
    Ok,
    /// The payment can proceed after applying the stated adjustment.
    Warning {
        /// What was adjusted and why.
        message: String,
        /// The adjusted amount, when the proposal was clamped. Only ever
        /// lowered, never raised.
        adjusted_amount: Option<u64>,
    },
    /// Blocking failure; submission must not be attempted.
    Error(ValidationError),
}

impl ValidationOutcome {
    /// Whether the outcome blocks submission.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// The clamped amount, if the outcome adjusted one.
    pub fn adjusted_amount(&self) -> Option<u64> {
        match self {
            Self::Warning { adjusted_amount, .. } => *adjusted_amount,
            _ => None,
        }
    }
}

/// Validates a target against a wallet snapshot.
///
/// `amount` is the proposed amount in base units of the selected asset (sat
/// for BTC); targets that carry their own amount ignore it.
pub fn validate(
    target: &PaymentTarget,
    amount: Option<u64>,
    wallet: &WalletSnapshot,
) -> ValidationOutcome {
    match target {
        PaymentTarget::BitcoinAddress { .. } => {
            let amount_sat = amount.unwrap_or_default();
            if amount_sat < DUST_LIMIT_SAT {
                return ValidationOutcome::Error(ValidationError::BelowDustLimit { amount_sat });
            }
            if amount_sat > wallet.btc_spendable_sat {
                return ValidationOutcome::Error(ValidationError::BalanceInsufficient {
                    requested: amount_sat,
                    available: wallet.btc_spendable_sat,
                });
            }
            ValidationOutcome::Ok
        }

        PaymentTarget::LightningInvoice { amount_msat, asset_id, asset_amount, .. } => {
            match (asset_id, asset_amount) {
                (Some(asset_id), Some(asset_amount)) => {
                    validate_asset_invoice(asset_id, *asset_amount, *amount_msat, wallet)
                }
                _ if *amount_msat > 0 => validate_btc_invoice(*amount_msat, wallet),
                // open-amount invoice; the amount is validated once proposed
                _ => ValidationOutcome::Ok,
            }
        }

        PaymentTarget::LightningAddress { .. } => {
            if let Some(amount_sat) = amount
                && amount_sat > wallet.btc_spendable_sat
            {
                return ValidationOutcome::Error(ValidationError::BalanceInsufficient {
                    requested: amount_sat,
                    available: wallet.btc_spendable_sat,
                });
            }
            ValidationOutcome::Ok
        }

        PaymentTarget::RgbInvoice { asset_id, amount: invoice_amount, .. } => match asset_id {
            Some(asset_id) => {
                validate_rgb_invoice(asset_id, invoice_amount.or(amount), wallet)
            }
            None => match wallet.first_asset_with_balance() {
                Some(_) => ValidationOutcome::Ok,
                None => ValidationOutcome::Warning {
                    message: "no RGB assets available to send".into(),
                    adjusted_amount: None,
                },
            },
        },

        PaymentTarget::Invalid { reason } => {
            ValidationOutcome::Error(ValidationError::InvalidTarget { reason: reason.clone() })
        }
    }
}

/// BTC lightning invoice: balance first, then single-channel capacity.
fn validate_btc_invoice(amount_msat: u64, wallet: &WalletSnapshot) -> ValidationOutcome {
    let balance_msat = wallet.btc_spendable_sat * MSATS_PER_SAT;
    if amount_msat > balance_msat {
        return ValidationOutcome::Error(ValidationError::BalanceInsufficient {
            requested: amount_msat / MSATS_PER_SAT,
            available: wallet.btc_spendable_sat,
        });
    }

    let limit_msat = wallet.max_outbound_htlc_msat();
    if amount_msat > limit_msat {
        return ValidationOutcome::Error(ValidationError::CapacityExceeded {
            requested_msat: amount_msat,
            limit_msat,
        });
    }

    ValidationOutcome::Ok
}

/// Lightning invoice carrying an RGB asset.
fn validate_asset_invoice(
    asset_id: &str,
    asset_amount: u64,
    amount_msat: u64,
    wallet: &WalletSnapshot,
) -> ValidationOutcome {
    if !wallet.holds_asset(asset_id) {
        return ValidationOutcome::Error(ValidationError::UnknownAsset {
            asset_id: asset_id.to_owned(),
        });
    }

    let balance = wallet.asset_balance(asset_id);
    if asset_amount > balance {
        return ValidationOutcome::Error(ValidationError::BalanceInsufficient {
            requested: asset_amount,
            available: balance,
        });
    }

    let capacity = wallet.max_asset_capacity(asset_id);
    if asset_amount > capacity {
        return ValidationOutcome::Error(ValidationError::AssetCapacityExceeded {
            asset_id: asset_id.to_owned(),
            requested: asset_amount,
            limit: capacity,
        });
    }

    // asset invoices still settle sats alongside the asset
    if amount_msat > 0 {
        let limit_msat = wallet.max_outbound_htlc_msat();
        if amount_msat > limit_msat {
            return ValidationOutcome::Error(ValidationError::CapacityExceeded {
                requested_msat: amount_msat,
                limit_msat,
            });
        }
    }

    ValidationOutcome::Ok
}

/// RGB invoice naming an asset: unknown and empty balances block, an
/// over-balance request clamps down to the balance and warns.
fn validate_rgb_invoice(
    asset_id: &str,
    requested: Option<u64>,
    wallet: &WalletSnapshot,
) -> ValidationOutcome {
    if !wallet.holds_asset(asset_id) {
        return ValidationOutcome::Error(ValidationError::UnknownAsset {
            asset_id: asset_id.to_owned(),
        });
    }

    let balance = wallet.asset_balance(asset_id);
    let asset = wallet.asset_ticker(asset_id).unwrap_or(asset_id).to_owned();
    if balance == 0 {
        return ValidationOutcome::Error(ValidationError::ZeroBalance { asset });
    }

    if let Some(requested) = requested
        && requested > balance
    {
        return ValidationOutcome::Warning {
            message: format!(
                "invoice requested {requested} {asset} but the balance is only {balance}; \
                 adjusted to the maximum sendable amount"
            ),
            adjusted_amount: Some(balance),
        };
    }

    ValidationOutcome::Ok
}

/// Minimum sendable amount for a target, in base units.
///
/// Not itself blocking; callers use it to floor the amount input.
pub fn min_amount(target: &PaymentTarget) -> u64 {
    match target {
        PaymentTarget::BitcoinAddress { .. } => DUST_LIMIT_SAT,
        PaymentTarget::LightningInvoice { amount_msat, .. } if *amount_msat > 0 => {
            *amount_msat / MSATS_PER_SAT
        }
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AssetBalance, ChannelSnapshot};

    fn btc_channel(limit_msat: u64) -> ChannelSnapshot {
        ChannelSnapshot {
            ready: true,
            usable: true,
            next_outbound_htlc_limit_msat: limit_msat,
            asset_id: None,
            asset_local_amount: 0,
        }
    }

    fn wallet(balance_sat: u64, htlc_limit_msat: u64) -> WalletSnapshot {
        WalletSnapshot {
            btc_spendable_sat: balance_sat,
            assets: vec![],
            channels: vec![btc_channel(htlc_limit_msat)],
        }
    }

    fn btc_invoice(amount_msat: u64) -> PaymentTarget {
        PaymentTarget::LightningInvoice {
            raw: "lnbcrt1p".into(),
            payment_hash: "00".repeat(32),
            amount_msat,
            asset_id: None,
            asset_amount: None,
            expiry_sec: 3_600,
        }
    }

    fn rgb_invoice(asset_id: Option<&str>, amount: Option<u64>) -> PaymentTarget {
        PaymentTarget::RgbInvoice {
            raw: "rgb:invoice".into(),
            recipient_id: Some("utxob:recipient".into()),
            asset_id: asset_id.map(str::to_owned),
            amount,
            transport_endpoints: vec!["rpc://proxy.example.com/json-rpc".into()],
            recipient_kind: Default::default(),
        }
    }

    #[test]
    fn invoice_within_balance_and_capacity_is_ok() {
        // amount 500_000 msat, limit 1_000_000 msat, balance 600 sat
        let outcome = validate(&btc_invoice(500_000), None, &wallet(600, 1_000_000));
        assert_eq!(outcome, ValidationOutcome::Ok);
    }

    #[test]
    fn capacity_blocks_even_with_sufficient_balance() {
        // same invoice, limit lowered below the amount
        let outcome = validate(&btc_invoice(500_000), None, &wallet(600, 400_000));
        match outcome {
            ValidationOutcome::Error(err @ ValidationError::CapacityExceeded { .. }) => {
                assert!(err.to_string().contains("capacity"));
            }
            other => panic!("expected capacity error, got {other:?}"),
        }
    }

    #[test]
    fn balance_is_checked_before_capacity() {
        // fails both checks; the balance error must win
        let outcome = validate(&btc_invoice(500_000), None, &wallet(100, 400_000));
        assert!(matches!(
            outcome,
            ValidationOutcome::Error(ValidationError::BalanceInsufficient { .. })
        ));
    }

    #[test]
    fn capacity_is_per_channel_max_not_sum() {
        let mut snapshot = wallet(10_000, 300_000);
        snapshot.channels.push(btc_channel(300_000));
        // two channels of 300k msat cannot forward a 500k msat payment
        let outcome = validate(&btc_invoice(500_000), None, &snapshot);
        assert!(matches!(
            outcome,
            ValidationOutcome::Error(ValidationError::CapacityExceeded {
                limit_msat: 300_000,
                ..
            })
        ));
    }

    #[test]
    fn validation_is_idempotent() {
        let target = btc_invoice(500_000);
        let snapshot = wallet(600, 1_000_000);
        assert_eq!(validate(&target, None, &snapshot), validate(&target, None, &snapshot));

        let target = rgb_invoice(Some("rgb:aaa"), Some(1_000));
        assert_eq!(validate(&target, None, &snapshot), validate(&target, None, &snapshot));
    }

    #[test]
    fn onchain_dust_and_balance() {
        let address =
            PaymentTarget::BitcoinAddress { address: "bcrt1qw508d6qejxtdg4y5r3z".into() };
        let snapshot = wallet(10_000, 0);

        assert!(matches!(
            validate(&address, Some(545), &snapshot),
            ValidationOutcome::Error(ValidationError::BelowDustLimit { amount_sat: 545 })
        ));
        assert_eq!(validate(&address, Some(546), &snapshot), ValidationOutcome::Ok);
        assert!(matches!(
            validate(&address, Some(10_001), &snapshot),
            ValidationOutcome::Error(ValidationError::BalanceInsufficient { .. })
        ));
        // no amount proposed yet counts as zero
        assert!(validate(&address, None, &snapshot).is_blocking());
    }

    #[test]
    fn rgb_invoice_clamps_to_balance_with_warning() {
        let mut snapshot = wallet(0, 0);
        snapshot.assets.push(AssetBalance {
            asset_id: "rgb:xxx".into(),
            ticker: "USDT".into(),
            spendable: 700,
        });

        // invoice wants 1000, balance is 700: warn and clamp down
        let outcome = validate(&rgb_invoice(Some("rgb:xxx"), Some(1_000)), None, &snapshot);
        match outcome {
            ValidationOutcome::Warning { adjusted_amount, .. } => {
                assert_eq!(adjusted_amount, Some(700));
            }
            other => panic!("expected warning, got {other:?}"),
        }
        assert!(!validate(&rgb_invoice(Some("rgb:xxx"), Some(1_000)), None, &snapshot)
            .is_blocking());

        // within balance: no adjustment
        assert_eq!(
            validate(&rgb_invoice(Some("rgb:xxx"), Some(700)), None, &snapshot),
            ValidationOutcome::Ok
        );
    }

    #[test]
    fn rgb_invoice_unknown_asset_blocks() {
        let outcome = validate(&rgb_invoice(Some("rgb:zzz"), Some(10)), None, &wallet(0, 0));
        assert!(matches!(
            outcome,
            ValidationOutcome::Error(ValidationError::UnknownAsset { .. })
        ));
    }

    #[test]
    fn rgb_invoice_zero_balance_blocks() {
        let mut snapshot = wallet(0, 0);
        snapshot.assets.push(AssetBalance {
            asset_id: "rgb:xxx".into(),
            ticker: "USDT".into(),
            spendable: 0,
        });
        let outcome = validate(&rgb_invoice(Some("rgb:xxx"), Some(10)), None, &snapshot);
        assert!(matches!(
            outcome,
            ValidationOutcome::Error(ValidationError::ZeroBalance { .. })
        ));
    }

    #[test]
    fn rgb_invoice_without_asset_picks_first_available() {
        let mut snapshot = wallet(0, 0);
        snapshot.assets.push(AssetBalance {
            asset_id: "rgb:empty".into(),
            ticker: "AAA".into(),
            spendable: 0,
        });
        snapshot.assets.push(AssetBalance {
            asset_id: "rgb:funded".into(),
            ticker: "BBB".into(),
            spendable: 50,
        });

        assert_eq!(validate(&rgb_invoice(None, None), None, &snapshot), ValidationOutcome::Ok);
        assert_eq!(snapshot.first_asset_with_balance().unwrap().asset_id, "rgb:funded");

        // no assets at all: non-blocking warning
        let outcome = validate(&rgb_invoice(None, None), None, &wallet(0, 0));
        assert!(matches!(outcome, ValidationOutcome::Warning { adjusted_amount: None, .. }));
        assert!(!outcome.is_blocking());
    }

    #[test]
    fn asset_invoice_checks_balance_and_channel_capacity() {
        let mut snapshot = wallet(1_000, 10_000_000);
        snapshot.assets.push(AssetBalance {
            asset_id: "rgb:xxx".into(),
            ticker: "USDT".into(),
            spendable: 500,
        });
        snapshot.channels.push(ChannelSnapshot {
            ready: true,
            usable: true,
            next_outbound_htlc_limit_msat: 0,
            asset_id: Some("rgb:xxx".into()),
            asset_local_amount: 400,
        });

        let invoice = |asset_amount| PaymentTarget::LightningInvoice {
            raw: "lnbcrt1p".into(),
            payment_hash: "00".repeat(32),
            amount_msat: 3_000_000,
            asset_id: Some("rgb:xxx".into()),
            asset_amount: Some(asset_amount),
            expiry_sec: 3_600,
        };

        // over the asset balance
        assert!(matches!(
            validate(&invoice(600), None, &snapshot),
            ValidationOutcome::Error(ValidationError::BalanceInsufficient { .. })
        ));
        // within balance, over the per-channel asset capacity
        assert!(matches!(
            validate(&invoice(450), None, &snapshot),
            ValidationOutcome::Error(ValidationError::AssetCapacityExceeded { .. })
        ));
        // within both
        assert_eq!(validate(&invoice(400), None, &snapshot), ValidationOutcome::Ok);
    }

    #[test]
    fn open_amount_invoice_is_ok() {
        assert_eq!(validate(&btc_invoice(0), None, &wallet(0, 0)), ValidationOutcome::Ok);
    }

    #[test]
    fn invalid_target_blocks() {
        let target = PaymentTarget::Invalid { reason: "unrecognized format".into() };
        assert!(validate(&target, None, &wallet(1_000, 0)).is_blocking());
    }

    #[test]
    fn minimum_amounts() {
        let address = PaymentTarget::BitcoinAddress { address: "bcrt1q".into() };
        assert_eq!(min_amount(&address), DUST_LIMIT_SAT);
        assert_eq!(min_amount(&btc_invoice(500_000)), 500);
        assert_eq!(min_amount(&btc_invoice(0)), 1);
        assert_eq!(min_amount(&rgb_invoice(Some("rgb:xxx"), None)), 1);
    }
}
