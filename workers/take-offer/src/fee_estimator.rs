//! Estimates the network fee of the taker's transactions
//!
//! The estimator starts `Active`: every fee rate refresh re-derives the fee
//! from the current size hint. Once the taker is shown the funding screen it
//! is frozen, after which refreshes are accepted and discarded so that the
//! total the taker was asked to fund never moves under them.

use common::types::{
    amount::FixedPointAmount, asset::Asset, fee::FeeEstimate, rates::RateSnapshot,
};
use constants::{DEFAULT_FEE_TX_SIZE_BYTES, UNFUNDED_FEE_TX_SIZE_BYTES};
use tracing::{debug, info};

use crate::{
    collaborators::TxSizeEstimator,
    converter::{Rounding, convert, convert_through_privacy},
    errors::TakeOfferError,
};

/// The lifecycle state of the estimator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EstimatorState {
    /// The estimate follows every refresh
    Active,
    /// The estimate is locked for the rest of the session
    Frozen,
}

/// Averages a fee transaction size with the default dependent transaction
/// size
///
/// The fee tx and the deposit tx are mined together, so paying the average
/// per-byte fee over both is sufficient; the same average is applied to the
/// payout tx
pub fn average_size(size_bytes: u32) -> u32 {
    ((size_bytes as u64 + DEFAULT_FEE_TX_SIZE_BYTES as u64) / 2) as u32
}

/// Tracks the per-byte rate, the size hint and the resulting fee
#[derive(Clone, Debug)]
pub struct FeeEstimator {
    /// The latest per-byte fee rate in the privacy asset
    per_byte_rate: FixedPointAmount,
    /// The current estimate of the fee transaction's size
    size_hint: u32,
    /// The estimated fee of a single transaction
    estimated_fee: FixedPointAmount,
    /// The lifecycle state
    state: EstimatorState,
}

impl FeeEstimator {
    /// Create an active estimator from the default size and a starting rate
    pub fn new(per_byte_rate: FixedPointAmount) -> Result<Self, TakeOfferError> {
        check_rate(per_byte_rate)?;
        let size_hint = DEFAULT_FEE_TX_SIZE_BYTES;
        let estimated_fee = fee_for_size(per_byte_rate, average_size(size_hint))?;

        Ok(Self { per_byte_rate, size_hint, estimated_fee, state: EstimatorState::Active })
    }

    /// The current state
    pub fn state(&self) -> EstimatorState {
        self.state
    }

    /// Whether the estimate is frozen
    pub fn is_frozen(&self) -> bool {
        self.state == EstimatorState::Frozen
    }

    /// The estimated fee of a single transaction
    pub fn estimated_fee(&self) -> FixedPointAmount {
        self.estimated_fee
    }

    /// A copy of the current estimate
    pub fn snapshot(&self) -> FeeEstimate {
        FeeEstimate {
            per_byte_rate: self.per_byte_rate,
            estimated_size_bytes: self.size_hint,
            estimated_fee: self.estimated_fee,
            frozen: self.is_frozen(),
        }
    }

    /// Re-estimate the fee from the wallet's funding state
    ///
    /// With confirmed funds in the wallet the size estimator sizes the fee and
    /// deposit transactions together; otherwise a fixed fallback size is used.
    /// Has no effect once frozen
    pub fn estimate(
        &mut self,
        funds_needed: FixedPointAmount,
        trading_fee: FixedPointAmount,
        wallet_has_confirmed_funds: bool,
        size_estimator: &dyn TxSizeEstimator,
        rates: &RateSnapshot,
    ) -> Result<FeeEstimate, TakeOfferError> {
        if self.is_frozen() {
            debug!("fee estimate is frozen, skipping re-estimation");
            return Ok(self.snapshot());
        }

        if wallet_has_confirmed_funds {
            let funds_base = convert(funds_needed, Asset::Base, rates)?;
            let fee_base =
                convert_through_privacy(trading_fee, Asset::Base, rates, Rounding::Floor)?;

            let (fee, size) = size_estimator
                .estimated_fee_and_size(funds_base, fee_base)
                .map_err(TakeOfferError::Collaborator)?;

            self.estimated_fee = convert(fee, Asset::Privacy, rates)?;
            self.size_hint = size;
        } else {
            self.size_hint = UNFUNDED_FEE_TX_SIZE_BYTES;
            self.estimated_fee = fee_for_size(self.per_byte_rate, self.size_hint)?;
            info!(
                size_bytes = self.size_hint,
                fee = %self.estimated_fee,
                per_byte = %self.per_byte_rate,
                "no confirmed funds in the wallet, using the fallback tx size for the fee estimate"
            );
        }

        Ok(self.snapshot())
    }

    /// Apply a refreshed per-byte rate, returns whether it was applied
    ///
    /// A refresh that completes after the estimator froze is discarded
    pub fn refresh(&mut self, per_byte_rate: FixedPointAmount) -> Result<bool, TakeOfferError> {
        if self.is_frozen() {
            debug!(
                rate = %per_byte_rate,
                "received a fee rate after the funding screen was shown, ignoring it"
            );
            return Ok(false);
        }

        check_rate(per_byte_rate)?;
        let estimated_fee = fee_for_size(per_byte_rate, average_size(self.size_hint))?;
        self.per_byte_rate = per_byte_rate;
        self.estimated_fee = estimated_fee;

        info!(fee = %self.estimated_fee, per_byte = %per_byte_rate, "applied refreshed fee rate");
        Ok(true)
    }

    /// Lock the estimate for the rest of the session, idempotent
    pub fn freeze(&mut self) {
        self.state = EstimatorState::Frozen;
    }
}

/// Error unless the rate is a non-negative privacy asset amount
fn check_rate(per_byte_rate: FixedPointAmount) -> Result<(), TakeOfferError> {
    if per_byte_rate.asset() != Asset::Privacy {
        return Err(TakeOfferError::AssetMismatch(per_byte_rate.asset(), Asset::Privacy));
    }
    if per_byte_rate.is_negative() {
        return Err(TakeOfferError::InvalidRate(format!("negative fee rate {per_byte_rate}")));
    }

    Ok(())
}

/// The fee of a transaction of the given size
fn fee_for_size(
    per_byte_rate: FixedPointAmount,
    size_bytes: u32,
) -> Result<FixedPointAmount, TakeOfferError> {
    Ok(per_byte_rate.checked_mul(size_bytes as i64)?)
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use common::types::{amount::FixedPointAmount, asset::Asset, rates::RateSnapshot};

    use super::{EstimatorState, FeeEstimator, average_size};
    use crate::mocks::MockSizeEstimator;

    /// A privacy asset amount
    fn xmr(units: i64) -> FixedPointAmount {
        FixedPointAmount::new(Asset::Privacy, units)
    }

    /// Rates where one satoshi is one piconero
    fn unit_rates() -> RateSnapshot {
        RateSnapshot::new(BigDecimal::from_str("0.0001").unwrap(), BigDecimal::from(1)).unwrap()
    }

    /// Tests the averaging of the fee tx size
    #[test]
    fn test_average_size() {
        assert_eq!(average_size(320), 320);
        assert_eq!(average_size(380), 350);
        assert_eq!(average_size(261), 290);
        assert_eq!(average_size(u32::MAX), ((u32::MAX as u64 + 320) / 2) as u32);
    }

    /// Tests the initial estimate uses the default size
    #[test]
    fn test_initial_estimate() {
        let estimator = FeeEstimator::new(xmr(10)).unwrap();
        let estimate = estimator.snapshot();

        assert_eq!(estimate.estimated_size_bytes, 320);
        assert_eq!(estimate.estimated_fee, xmr(3_200));
        assert!(!estimate.frozen);
        assert_eq!(estimator.state(), EstimatorState::Active);
    }

    /// Tests a refresh while active recomputes the fee from the average size
    #[test]
    fn test_refresh_active() {
        let mut estimator = FeeEstimator::new(xmr(10)).unwrap();
        assert!(estimator.refresh(xmr(20)).unwrap());
        assert_eq!(estimator.estimated_fee(), xmr(6_400));
    }

    /// Tests that refreshes after a freeze never change the fee
    #[test]
    fn test_refresh_after_freeze() {
        let mut estimator = FeeEstimator::new(xmr(10)).unwrap();
        estimator.freeze();
        estimator.freeze();
        assert!(estimator.is_frozen());

        let before = estimator.snapshot();
        assert!(!estimator.refresh(xmr(99)).unwrap());
        assert_eq!(estimator.snapshot(), before);
    }

    /// Tests the fallback estimate when the wallet is unfunded
    #[test]
    fn test_estimate_unfunded() {
        let mut estimator = FeeEstimator::new(xmr(10)).unwrap();
        let estimator_stub = MockSizeEstimator::new(FixedPointAmount::new(Asset::Base, 1), 1);

        let estimate =
            estimator.estimate(xmr(1_000), xmr(10), false, &estimator_stub, &unit_rates()).unwrap();
        assert_eq!(estimate.estimated_size_bytes, 380);
        assert_eq!(estimate.estimated_fee, xmr(3_800));
        assert_eq!(estimator_stub.num_calls(), 0);

        // Later refreshes average the fallback size
        estimator.refresh(xmr(10)).unwrap();
        assert_eq!(estimator.estimated_fee(), xmr(3_500));
    }

    /// Tests that a funded wallet delegates to the size estimator
    #[test]
    fn test_estimate_funded() {
        let mut estimator = FeeEstimator::new(xmr(10)).unwrap();
        let estimator_stub = MockSizeEstimator::new(FixedPointAmount::new(Asset::Base, 5_200), 520);

        let estimate =
            estimator.estimate(xmr(1_000), xmr(10), true, &estimator_stub, &unit_rates()).unwrap();
        assert_eq!(estimate.estimated_size_bytes, 520);
        assert_eq!(estimate.estimated_fee, xmr(5_200));
        assert_eq!(estimator_stub.num_calls(), 1);
    }

    /// Tests that estimation is skipped once frozen
    #[test]
    fn test_estimate_frozen() {
        let mut estimator = FeeEstimator::new(xmr(10)).unwrap();
        estimator.freeze();

        let stub = MockSizeEstimator::new(FixedPointAmount::new(Asset::Base, 5_200), 520);
        let estimate = estimator.estimate(xmr(1_000), xmr(10), true, &stub, &unit_rates()).unwrap();
        assert_eq!(estimate.estimated_fee, xmr(3_200));
        assert_eq!(stub.num_calls(), 0);
    }

    /// Tests that a rate in the wrong asset is rejected
    #[test]
    fn test_wrong_asset_rate() {
        assert!(FeeEstimator::new(FixedPointAmount::new(Asset::Base, 10)).is_err());
    }
}
