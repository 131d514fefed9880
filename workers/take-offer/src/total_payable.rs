//! Aggregates the amounts a taker must have available to take an offer
//!
//! All values here are denominated in the privacy asset

use common::types::{
    amount::FixedPointAmount, asset::Asset, fee::FeeCurrency, offer::Direction,
};

use crate::errors::TakeOfferError;

/// The network fees of the taker's three dependent transactions
///
/// The deposit and payout fees are pinned to the fee transaction's estimate;
/// the real deposit and payout transactions are larger, so the total is an
/// approximation in both directions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetworkFees {
    /// The fee of the taker fee transaction
    pub fee_tx: FixedPointAmount,
    /// The fee of the deposit transaction
    pub deposit_tx: FixedPointAmount,
    /// The fee of the payout transaction
    pub payout_tx: FixedPointAmount,
}

impl NetworkFees {
    /// All three fees pinned to a single transaction's estimate
    pub fn pinned(estimated_fee: FixedPointAmount) -> Self {
        Self { fee_tx: estimated_fee, deposit_tx: estimated_fee, payout_tx: estimated_fee }
    }

    /// The sum of the three fees
    pub fn total(&self) -> Result<FixedPointAmount, TakeOfferError> {
        Ok(FixedPointAmount::checked_sum(
            self.fee_tx.asset(),
            [self.fee_tx, self.deposit_tx, self.payout_tx],
        )?)
    }
}

/// The total amount the taker must have available
///
/// `offer_direction` is the maker's side. The taker of a sell offer receives
/// the traded asset, so only the fees and the deposit are fronted; taking a
/// buy offer additionally fronts the amount. The taker fee is only included
/// when paid in the privacy asset
pub fn total_to_pay(
    offer_direction: Direction,
    amount: FixedPointAmount,
    taker_fee: FixedPointAmount,
    total_network_fee: FixedPointAmount,
    security_deposit: FixedPointAmount,
    fee_currency: FeeCurrency,
) -> Result<FixedPointAmount, TakeOfferError> {
    let mut total = total_network_fee.checked_add(security_deposit)?;
    if fee_currency == FeeCurrency::Privacy {
        total = total.checked_add(taker_fee)?;
    }
    if offer_direction == Direction::Buy {
        total = total.checked_add(amount)?;
    }

    Ok(total)
}

/// The funds locked by the deposit and payout transactions
///
/// This is what the size estimator sizes and what the trade executor reserves;
/// the fee transaction's own fee and the taker fee are paid separately. Like
/// `total_to_pay` it branches on the offer's direction
pub fn funds_needed_for_trade(
    offer_direction: Direction,
    amount: FixedPointAmount,
    security_deposit: FixedPointAmount,
    fees: &NetworkFees,
) -> Result<FixedPointAmount, TakeOfferError> {
    let mut funds = FixedPointAmount::checked_sum(
        Asset::Privacy,
        [security_deposit, fees.deposit_tx, fees.payout_tx],
    )?;
    if offer_direction == Direction::Buy {
        funds = funds.checked_add(amount)?;
    }

    Ok(funds)
}
