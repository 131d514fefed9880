//! Defines the asset-tagged fixed point amount used for all monetary values
//!
//! An amount is an integer count of an asset's atomic units. Arithmetic is
//! checked: overflow and mixing assets are errors rather than panics or
//! silent wraps. Moving value between assets is the job of the converter,
//! never of the arithmetic here.

use std::{
    cmp::Ordering,
    fmt::{self, Display},
};

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::asset::Asset;

/// The error type for amount arithmetic and rate handling
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    /// Two amounts of different assets were combined
    #[error("asset mismatch: cannot combine {0} with {1}")]
    AssetMismatch(Asset, Asset),
    /// An operation overflowed the atomic unit representation
    #[error("overflow in {0}")]
    Overflow(String),
    /// An exchange rate was non-positive or could not be parsed
    #[error("invalid rate: {0}")]
    InvalidRate(String),
}

/// An exact, integer scaled amount of a single asset
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedPointAmount {
    /// The asset the amount is denominated in
    asset: Asset,
    /// The number of atomic units of the asset
    atomic_units: i64,
}

impl FixedPointAmount {
    /// Constructor
    pub const fn new(asset: Asset, atomic_units: i64) -> Self {
        Self { asset, atomic_units }
    }

    /// The zero amount of the given asset
    pub const fn zero(asset: Asset) -> Self {
        Self::new(asset, 0)
    }

    /// The asset the amount is denominated in
    pub fn asset(&self) -> Asset {
        self.asset
    }

    /// The raw number of atomic units
    pub fn atomic_units(&self) -> i64 {
        self.atomic_units
    }

    /// Whether the amount is strictly greater than zero
    pub fn is_positive(&self) -> bool {
        self.atomic_units > 0
    }

    /// Whether the amount is strictly less than zero
    pub fn is_negative(&self) -> bool {
        self.atomic_units < 0
    }

    /// Whether the amount is zero
    pub fn is_zero(&self) -> bool {
        self.atomic_units == 0
    }

    /// The amount in whole units of its asset
    pub fn to_decimal(&self) -> BigDecimal {
        BigDecimal::new(BigInt::from(self.atomic_units), self.asset.decimals() as i64)
    }

    // --------------
    // | Arithmetic |
    // --------------

    /// Add two amounts of the same asset
    pub fn checked_add(self, rhs: Self) -> Result<Self, AmountError> {
        self.require_same_asset(&rhs)?;
        let units = self
            .atomic_units
            .checked_add(rhs.atomic_units)
            .ok_or_else(|| AmountError::Overflow(format!("{self} + {rhs}")))?;

        Ok(Self::new(self.asset, units))
    }

    /// Subtract an amount of the same asset
    ///
    /// The result may be negative; callers that care inspect the sign
    pub fn checked_sub(self, rhs: Self) -> Result<Self, AmountError> {
        self.require_same_asset(&rhs)?;
        let units = self
            .atomic_units
            .checked_sub(rhs.atomic_units)
            .ok_or_else(|| AmountError::Overflow(format!("{self} - {rhs}")))?;

        Ok(Self::new(self.asset, units))
    }

    /// Multiply the amount by an integer factor
    pub fn checked_mul(self, factor: i64) -> Result<Self, AmountError> {
        let units = self
            .atomic_units
            .checked_mul(factor)
            .ok_or_else(|| AmountError::Overflow(format!("{self} * {factor}")))?;

        Ok(Self::new(self.asset, units))
    }

    /// Sum a sequence of amounts of the given asset
    pub fn checked_sum<I>(asset: Asset, amounts: I) -> Result<Self, AmountError>
    where
        I: IntoIterator<Item = Self>,
    {
        amounts.into_iter().try_fold(Self::zero(asset), Self::checked_add)
    }

    // --------------
    // | Comparison |
    // --------------

    /// Compare two amounts of the same asset
    pub fn checked_cmp(&self, rhs: &Self) -> Result<Ordering, AmountError> {
        self.require_same_asset(rhs)?;
        Ok(self.atomic_units.cmp(&rhs.atomic_units))
    }

    /// The larger of two amounts of the same asset
    pub fn checked_max(self, rhs: Self) -> Result<Self, AmountError> {
        match self.checked_cmp(&rhs)? {
            Ordering::Less => Ok(rhs),
            _ => Ok(self),
        }
    }

    /// The smaller of two amounts of the same asset
    pub fn checked_min(self, rhs: Self) -> Result<Self, AmountError> {
        match self.checked_cmp(&rhs)? {
            Ordering::Greater => Ok(rhs),
            _ => Ok(self),
        }
    }

    /// Error unless both amounts are denominated in the same asset
    fn require_same_asset(&self, rhs: &Self) -> Result<(), AmountError> {
        if self.asset != rhs.asset {
            return Err(AmountError::AssetMismatch(self.asset, rhs.asset));
        }

        Ok(())
    }
}

/// Amounts of different assets are unordered
impl PartialOrd for FixedPointAmount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.checked_cmp(other).ok()
    }
}

impl Display for FixedPointAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.to_decimal(), self.asset)
    }
}
