//! Defines the exchange rate snapshot captured when an offer is taken

use std::{collections::HashMap, str::FromStr};

use bigdecimal::BigDecimal;
use constants::{BASE_TO_PRIVACY_RATE_KEY, SECONDARY_TO_PRIVACY_RATE_KEY};
use num_traits::Signed;

use super::{amount::AmountError, asset::Asset};

/// The pair of rates into the privacy asset, parsed once per session
///
/// Both rates are quoted in whole units: `base_to_privacy` is the number of
/// privacy asset units one base asset unit is worth
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateSnapshot {
    /// Privacy asset units per base asset unit
    base_to_privacy: BigDecimal,
    /// Privacy asset units per secondary asset unit
    secondary_to_privacy: BigDecimal,
}

impl RateSnapshot {
    /// Constructor, rejects non-positive rates
    pub fn new(
        base_to_privacy: BigDecimal,
        secondary_to_privacy: BigDecimal,
    ) -> Result<Self, AmountError> {
        check_positive(BASE_TO_PRIVACY_RATE_KEY, &base_to_privacy)?;
        check_positive(SECONDARY_TO_PRIVACY_RATE_KEY, &secondary_to_privacy)?;

        Ok(Self { base_to_privacy, secondary_to_privacy })
    }

    /// Parse a snapshot from the string valued metadata attached to an offer
    pub fn from_metadata(metadata: &HashMap<String, String>) -> Result<Self, AmountError> {
        let base_to_privacy = parse_rate(metadata, BASE_TO_PRIVACY_RATE_KEY)?;
        let secondary_to_privacy = parse_rate(metadata, SECONDARY_TO_PRIVACY_RATE_KEY)?;
        Self::new(base_to_privacy, secondary_to_privacy)
    }

    /// Privacy asset units per base asset unit
    pub fn base_to_privacy(&self) -> &BigDecimal {
        &self.base_to_privacy
    }

    /// Privacy asset units per secondary asset unit
    pub fn secondary_to_privacy(&self) -> &BigDecimal {
        &self.secondary_to_privacy
    }

    /// The rate from the given asset into the privacy asset
    ///
    /// The privacy asset itself has no rate
    pub fn rate_to_privacy(&self, asset: Asset) -> Option<&BigDecimal> {
        match asset {
            Asset::Base => Some(&self.base_to_privacy),
            Asset::Secondary => Some(&self.secondary_to_privacy),
            Asset::Privacy => None,
        }
    }
}

/// Parse a single rate out of the offer metadata
fn parse_rate(metadata: &HashMap<String, String>, key: &str) -> Result<BigDecimal, AmountError> {
    let raw = metadata
        .get(key)
        .ok_or_else(|| AmountError::InvalidRate(format!("{key} missing from offer metadata")))?;

    BigDecimal::from_str(raw.trim())
        .map_err(|e| AmountError::InvalidRate(format!("{key}={raw}: {e}")))
}

/// Error unless the rate is strictly positive
fn check_positive(key: &str, rate: &BigDecimal) -> Result<(), AmountError> {
    if !rate.is_positive() {
        return Err(AmountError::InvalidRate(format!("{key} must be positive, got {rate}")));
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use constants::{BASE_TO_PRIVACY_RATE_KEY, SECONDARY_TO_PRIVACY_RATE_KEY};

    use super::RateSnapshot;
    use crate::types::amount::AmountError;

    /// Build offer metadata from the two rate strings
    fn metadata(base: &str, secondary: &str) -> HashMap<String, String> {
        HashMap::from([
            (BASE_TO_PRIVACY_RATE_KEY.to_string(), base.to_string()),
            (SECONDARY_TO_PRIVACY_RATE_KEY.to_string(), secondary.to_string()),
        ])
    }

    /// Tests parsing a valid pair of rates
    #[test]
    fn test_parse_rates() {
        let rates = RateSnapshot::from_metadata(&metadata("152.25", "0.0004")).unwrap();
        assert_eq!(rates.base_to_privacy().to_string(), "152.25");
        assert_eq!(rates.secondary_to_privacy().to_string(), "0.0004");
    }

    /// Tests that malformed, missing and non-positive rates are rejected
    #[test]
    fn test_invalid_rates() {
        let unparsable = RateSnapshot::from_metadata(&metadata("abc", "1"));
        assert!(matches!(unparsable, Err(AmountError::InvalidRate(_))));

        let zero = RateSnapshot::from_metadata(&metadata("0", "1"));
        assert!(matches!(zero, Err(AmountError::InvalidRate(_))));

        let negative = RateSnapshot::from_metadata(&metadata("1", "-2.5"));
        assert!(matches!(negative, Err(AmountError::InvalidRate(_))));

        let mut missing = metadata("1", "1");
        missing.remove(SECONDARY_TO_PRIVACY_RATE_KEY);
        assert!(matches!(RateSnapshot::from_metadata(&missing), Err(AmountError::InvalidRate(_))));
    }
}
