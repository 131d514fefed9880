//! Converts amounts between assets using a session's rate snapshot
//!
//! Only conversions into or out of the privacy asset are direct. Moving value
//! between the base and secondary assets takes two explicit steps through the
//! privacy asset, see [`convert_through_privacy`].

use bigdecimal::BigDecimal;
use common::types::{amount::FixedPointAmount, asset::Asset, rates::RateSnapshot};
use num_bigint::BigInt;
use num_traits::{One, ToPrimitive};

use crate::errors::TakeOfferError;

/// The rounding applied when a converted value falls between atomic units
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rounding {
    /// Round toward negative infinity, used for fees and amounts
    Floor,
    /// Round to the nearest atomic unit, halves away from zero, used for
    /// display values
    Nearest,
}

/// Convert an amount into another asset, rounding down
pub fn convert(
    amount: FixedPointAmount,
    to: Asset,
    rates: &RateSnapshot,
) -> Result<FixedPointAmount, TakeOfferError> {
    convert_rounded(amount, to, rates, Rounding::Floor)
}

/// Convert an amount for display, rounding to the nearest atomic unit
pub fn convert_for_display(
    amount: FixedPointAmount,
    to: Asset,
    rates: &RateSnapshot,
) -> Result<FixedPointAmount, TakeOfferError> {
    convert_rounded(amount, to, rates, Rounding::Nearest)
}

/// Convert an amount into another asset with the given rounding
///
/// Fails with `UnsupportedConversion` between the base and secondary assets
pub fn convert_rounded(
    amount: FixedPointAmount,
    to: Asset,
    rates: &RateSnapshot,
    rounding: Rounding,
) -> Result<FixedPointAmount, TakeOfferError> {
    let from = amount.asset();
    if from == to {
        return Ok(amount);
    }

    // Value in whole units of the target asset
    let whole = match (from, to) {
        (_, Asset::Privacy) => amount.to_decimal() * rate_to_privacy(rates, from)?,
        (Asset::Privacy, _) => amount.to_decimal() / rate_to_privacy(rates, to)?,
        _ => return Err(TakeOfferError::UnsupportedConversion(from, to)),
    };

    let atomic = whole * BigDecimal::from(to.atomic_units_per_unit());
    let units = round(&atomic, rounding)
        .to_i64()
        .ok_or_else(|| TakeOfferError::Overflow(format!("converting {amount} to {to}")))?;

    Ok(FixedPointAmount::new(to, units))
}

/// Convert between any two assets, stepping through the privacy asset when
/// neither side is the privacy asset
///
/// Each step rounds independently. With floor rounding the composite result
/// may undershoot the exact cross-rate value by up to one atomic unit of the
/// privacy asset expressed in the target asset, plus one target atomic unit
pub fn convert_through_privacy(
    amount: FixedPointAmount,
    to: Asset,
    rates: &RateSnapshot,
    rounding: Rounding,
) -> Result<FixedPointAmount, TakeOfferError> {
    let from = amount.asset();
    if from == Asset::Privacy || to == Asset::Privacy || from == to {
        return convert_rounded(amount, to, rates, rounding);
    }

    let intermediate = convert_rounded(amount, Asset::Privacy, rates, rounding)?;
    convert_rounded(intermediate, to, rates, rounding)
}

/// Look up the rate into the privacy asset, re-checking its sign
fn rate_to_privacy(rates: &RateSnapshot, asset: Asset) -> Result<&BigDecimal, TakeOfferError> {
    let rate = rates
        .rate_to_privacy(asset)
        .ok_or_else(|| TakeOfferError::InvalidRate(format!("no rate for {asset}")))?;

    if *rate <= BigDecimal::from(0) {
        return Err(TakeOfferError::InvalidRate(format!("non-positive rate for {asset}: {rate}")));
    }

    Ok(rate)
}

/// Round a decimal to an integer
fn round(value: &BigDecimal, rounding: Rounding) -> BigInt {
    match rounding {
        Rounding::Floor => floor(value),
        Rounding::Nearest => {
            // Truncating after a half shift rounds halves away from zero
            let half = BigDecimal::new(BigInt::from(5), 1);
            if *value < BigDecimal::from(0) {
                truncate(&(value - half))
            } else {
                truncate(&(value + half))
            }
        },
    }
}

/// Round toward negative infinity
fn floor(value: &BigDecimal) -> BigInt {
    let truncated = truncate(value);
    if BigDecimal::new(truncated.clone(), 0) > *value {
        truncated - BigInt::one()
    } else {
        truncated
    }
}

/// Round toward zero
fn truncate(value: &BigDecimal) -> BigInt {
    let (int_val, _) = value.with_scale(0).into_bigint_and_exponent();
    int_val
}
