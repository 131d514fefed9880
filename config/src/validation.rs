//! Validation of a parsed engine config

use common::types::amount::FixedPointAmount;
use tracing::warn;

use crate::EngineConfig;

/// Validate a parsed config
pub(crate) fn validate_config(config: &EngineConfig) -> Result<(), String> {
    if config.taker_fee_rate_privacy <= 0.into() || config.taker_fee_rate_secondary <= 0.into() {
        return Err("taker fee rates must be positive".to_string());
    }

    let non_negative = [
        ("min-taker-fee-privacy", config.min_taker_fee_privacy),
        ("min-taker-fee-secondary", config.min_taker_fee_secondary),
        ("default-tx-fee-per-byte", config.default_tx_fee_per_byte),
        ("min-non-dust-output", config.min_non_dust_output),
        ("max-trade-limit", config.max_trade_limit),
        ("privacy-balance", config.privacy_balance),
        ("secondary-balance", config.secondary_balance),
    ];
    for (name, amount) in non_negative {
        check_non_negative(name, amount)?;
    }

    if let Some(rate) = config.fee_rate_per_byte {
        check_non_negative("fee-rate-per-byte", rate)?;
    }
    if let Some(amount) = config.amount {
        check_non_negative("amount", amount)?;
    }

    if config.funded_tx_size_bytes == 0 {
        return Err("funded-tx-size-bytes must be positive".to_string());
    }

    if config.take && !config.show_pay_funds_screen {
        warn!("taking the offer without freezing the fee estimate first");
    }

    Ok(())
}

/// Error if the amount is negative
fn check_non_negative(name: &str, amount: FixedPointAmount) -> Result<(), String> {
    if amount.is_negative() {
        return Err(format!("{name} must not be negative, got {amount}"));
    }

    Ok(())
}
