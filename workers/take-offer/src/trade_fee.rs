//! Computes the taker's trading fee

use std::sync::Arc;

use bigdecimal::BigDecimal;
use common::types::{
    amount::FixedPointAmount, asset::Asset, fee::FeeCurrency, offer::Direction,
    rates::RateSnapshot,
};
use num_traits::ToPrimitive;

use crate::{collaborators::FeePolicy, converter::convert, errors::TakeOfferError};

/// Computes the taker fee as a proportional amount with a floor
#[derive(Clone)]
pub struct TradeFeeCalculator {
    /// The fee schedule
    policy: Arc<dyn FeePolicy>,
}

impl TradeFeeCalculator {
    /// Constructor
    pub fn new(policy: Arc<dyn FeePolicy>) -> Self {
        Self { policy }
    }

    /// The taker fee for a trade amount denominated in the privacy asset
    ///
    /// The fee is computed in the selected currency: `max(amount * rate,
    /// minimum)`. Fails with `MissingPrecondition` if no amount is set yet
    pub fn taker_fee(
        &self,
        amount: Option<FixedPointAmount>,
        direction: Direction,
        currency: FeeCurrency,
        rates: &RateSnapshot,
    ) -> Result<FixedPointAmount, TakeOfferError> {
        let amount = amount.ok_or_else(|| {
            TakeOfferError::MissingPrecondition("amount must be set before the taker fee".into())
        })?;

        let fee_asset = currency.asset();
        let amount_in_fee_asset = convert(amount, fee_asset, rates)?;

        let rate = self.policy.taker_fee_rate(currency, direction);
        let proportional = amount_in_fee_asset.to_decimal() * rate;
        let atomic = proportional * BigDecimal::from(fee_asset.atomic_units_per_unit());
        let units = floor_units(&atomic)
            .ok_or_else(|| TakeOfferError::Overflow(format!("taker fee for {amount}")))?;

        let min_fee = self.policy.min_taker_fee(currency);
        Ok(FixedPointAmount::new(fee_asset, units).checked_max(min_fee)?)
    }

    /// The fee currency actually used
    ///
    /// Paying in the secondary asset requires a confirmed secondary balance
    /// covering the fee; otherwise the privacy asset is used regardless of
    /// preference
    pub fn resolve_fee_currency(
        &self,
        prefer_privacy: bool,
        amount: Option<FixedPointAmount>,
        direction: Direction,
        secondary_balance: FixedPointAmount,
        rates: &RateSnapshot,
    ) -> FeeCurrency {
        if prefer_privacy {
            return FeeCurrency::Privacy;
        }

        if self.is_secondary_fee_available(amount, direction, secondary_balance, rates) {
            FeeCurrency::Secondary
        } else {
            FeeCurrency::Privacy
        }
    }

    /// Whether the secondary balance covers the fee computed in the secondary
    /// asset
    pub fn is_secondary_fee_available(
        &self,
        amount: Option<FixedPointAmount>,
        direction: Direction,
        secondary_balance: FixedPointAmount,
        rates: &RateSnapshot,
    ) -> bool {
        if secondary_balance.asset() != Asset::Secondary {
            return false;
        }

        match self.taker_fee(amount, direction, FeeCurrency::Secondary, rates) {
            Ok(fee) => secondary_balance.atomic_units() >= fee.atomic_units(),
            Err(_) => false,
        }
    }
}

/// Round a non-negative decimal down to an `i64`
fn floor_units(value: &BigDecimal) -> Option<i64> {
    let (int_val, _) = value.with_scale(0).into_bigint_and_exponent();
    int_val.to_i64()
}

#[cfg(test)]
mod test {
    use std::{str::FromStr, sync::Arc};

    use bigdecimal::BigDecimal;
    use common::types::{
        amount::FixedPointAmount, asset::Asset, fee::FeeCurrency, offer::Direction,
        rates::RateSnapshot,
    };

    use super::TradeFeeCalculator;
    use crate::{collaborators::StaticFeePolicy, errors::TakeOfferError};

    /// A calculator with a 0.3% privacy fee and 0.15% secondary fee
    fn calculator() -> TradeFeeCalculator {
        TradeFeeCalculator::new(Arc::new(StaticFeePolicy {
            privacy_rate: BigDecimal::from_str("0.003").unwrap(),
            privacy_min_fee: FixedPointAmount::new(Asset::Privacy, 1_000),
            secondary_rate: BigDecimal::from_str("0.0015").unwrap(),
            secondary_min_fee: FixedPointAmount::new(Asset::Secondary, 5),
        }))
    }

    /// Rates where 1 BSQ is worth 0.001 XMR
    fn rates() -> RateSnapshot {
        RateSnapshot::new(BigDecimal::from(150), BigDecimal::from_str("0.001").unwrap()).unwrap()
    }

    /// A privacy asset amount
    fn xmr(units: i64) -> FixedPointAmount {
        FixedPointAmount::new(Asset::Privacy, units)
    }

    /// Tests the proportional fee in the privacy asset
    #[test]
    fn test_proportional_privacy_fee() {
        let fee = calculator()
            .taker_fee(Some(xmr(10_000_000)), Direction::Buy, FeeCurrency::Privacy, &rates())
            .unwrap();
        assert_eq!(fee, xmr(30_000));
    }

    /// Tests that the minimum fee applies to small amounts
    #[test]
    fn test_minimum_fee() {
        let fee = calculator()
            .taker_fee(Some(xmr(100_000)), Direction::Sell, FeeCurrency::Privacy, &rates())
            .unwrap();
        assert_eq!(fee, xmr(1_000));
    }

    /// Tests the unset amount fails while a zero amount yields the minimum
    #[test]
    fn test_unset_vs_zero_amount() {
        let calc = calculator();
        let unset = calc.taker_fee(None, Direction::Buy, FeeCurrency::Privacy, &rates());
        assert!(matches!(unset, Err(TakeOfferError::MissingPrecondition(_))));

        let zero = calc.taker_fee(Some(xmr(0)), Direction::Buy, FeeCurrency::Privacy, &rates());
        assert_eq!(zero.unwrap(), xmr(1_000));
    }

    /// Tests the fee in the secondary asset
    #[test]
    fn test_secondary_fee() {
        // 1 XMR is 1000 BSQ, 0.15% of which is 1.5 BSQ
        let one_xmr = xmr(1_000_000_000_000);
        let fee = calculator()
            .taker_fee(Some(one_xmr), Direction::Buy, FeeCurrency::Secondary, &rates())
            .unwrap();
        assert_eq!(fee, FixedPointAmount::new(Asset::Secondary, 150));
    }

    /// Tests the fee currency falls back to the privacy asset without enough
    /// secondary balance
    #[test]
    fn test_resolve_fee_currency() {
        let calc = calculator();
        let amount = Some(xmr(1_000_000_000_000));
        let rich = FixedPointAmount::new(Asset::Secondary, 1_000);
        let poor = FixedPointAmount::new(Asset::Secondary, 100);

        let preferred = calc.resolve_fee_currency(true, amount, Direction::Buy, rich, &rates());
        assert_eq!(preferred, FeeCurrency::Privacy);

        let funded = calc.resolve_fee_currency(false, amount, Direction::Buy, rich, &rates());
        assert_eq!(funded, FeeCurrency::Secondary);

        let unfunded = calc.resolve_fee_currency(false, amount, Direction::Buy, poor, &rates());
        assert_eq!(unfunded, FeeCurrency::Privacy);
    }
}
