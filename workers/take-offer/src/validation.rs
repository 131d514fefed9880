//! Stateless guards evaluated before an offer may be taken
//!
//! Each predicate that accepts optional operands has a fixed default for the
//! case where an operand is absent, pinned by the tests below:
//! - [`is_min_amount_satisfied`] defaults to `true`
//! - [`exceeds_offer_amount`] defaults to `true`
//! - [`would_create_dust`] defaults to `true`
//!
//! Operands of different assets take the same default

use std::cmp::Ordering;

use common::types::{amount::FixedPointAmount, filter::BanReason, offer::Offer};
use tracing::info;

use crate::{collaborators::OfferFilter, errors::TakeOfferError};

/// A filter check paired with the reason reported when it matches
type BanCheck = (fn(&Offer, &dyn OfferFilter) -> bool, BanReason);

/// The filter checks in priority order, the first match wins
const BAN_CHECKS: [BanCheck; 5] = [
    (currency_banned, BanReason::CurrencyBanned),
    (payment_method_banned, BanReason::PaymentMethodBanned),
    (offer_banned, BanReason::OfferBanned),
    (node_banned, BanReason::NodeBanned),
    (version_outdated, BanReason::VersionOutdated),
];

/// Whether the offer's currency is banned
fn currency_banned(offer: &Offer, filter: &dyn OfferFilter) -> bool {
    filter.is_currency_banned(&offer.currency_code)
}

/// Whether the offer's payment method is banned
fn payment_method_banned(offer: &Offer, filter: &dyn OfferFilter) -> bool {
    filter.is_payment_method_banned(&offer.payment_method_id)
}

/// Whether the offer id is banned
fn offer_banned(offer: &Offer, filter: &dyn OfferFilter) -> bool {
    filter.is_offer_id_banned(&offer.id)
}

/// Whether the maker's node is banned
fn node_banned(offer: &Offer, filter: &dyn OfferFilter) -> bool {
    filter.is_node_address_banned(&offer.maker_node_address)
}

/// Whether trading requires a newer version
fn version_outdated(_offer: &Offer, filter: &dyn OfferFilter) -> bool {
    filter.requires_update_for_trading()
}

/// Clamp an amount into `[min_amount, max_limit]`
///
/// The lower bound wins when `min_amount > max_limit`
pub fn clamp_to_limit(
    raw_amount: FixedPointAmount,
    min_amount: FixedPointAmount,
    max_limit: FixedPointAmount,
) -> Result<FixedPointAmount, TakeOfferError> {
    let capped = raw_amount.checked_min(max_limit)?;
    Ok(min_amount.checked_max(capped)?)
}

/// Whether the current amount reaches the offer's minimum
pub fn is_min_amount_satisfied(
    offer_min: Option<FixedPointAmount>,
    current_amount: Option<FixedPointAmount>,
) -> bool {
    match (offer_min, current_amount) {
        (Some(min), Some(current)) => current.checked_cmp(&min).map_or(true, Ordering::is_ge),
        _ => true,
    }
}

/// Whether the current amount is larger than the offer's amount
pub fn exceeds_offer_amount(
    current_amount: Option<FixedPointAmount>,
    offer_amount: Option<FixedPointAmount>,
) -> bool {
    match (current_amount, offer_amount) {
        (Some(current), Some(offer)) => current.checked_cmp(&offer).map_or(true, Ordering::is_gt),
        _ => true,
    }
}

/// Whether taking the current amount leaves a dust remainder on the offer
///
/// Only a strictly positive leftover below the threshold counts as dust
pub fn would_create_dust(
    offer_amount: Option<FixedPointAmount>,
    current_amount: Option<FixedPointAmount>,
    min_non_dust_output: FixedPointAmount,
) -> bool {
    let (offer_amount, current_amount) = match (offer_amount, current_amount) {
        (Some(offer), Some(current)) => (offer, current),
        _ => return true,
    };

    let leftover = match offer_amount.checked_sub(current_amount) {
        Ok(leftover) => leftover,
        Err(_) => return true,
    };

    let below_threshold =
        leftover.checked_cmp(&min_non_dust_output).map_or(true, Ordering::is_lt);
    let dust = leftover.is_positive() && below_threshold;
    if dust {
        info!(%leftover, threshold = %min_non_dust_output, "amount would leave a dust remainder");
    }

    dust
}

/// The first ban reason matching the offer, if any
pub fn is_banned(offer: &Offer, filter: &dyn OfferFilter) -> Option<BanReason> {
    BAN_CHECKS.iter().find(|(check, _)| check(offer, filter)).map(|(_, reason)| *reason)
}

#[cfg(test)]
mod test {
    use common::types::{amount::FixedPointAmount, asset::Asset, filter::BanReason};

    use super::{
        clamp_to_limit, exceeds_offer_amount, is_banned, is_min_amount_satisfied,
        would_create_dust,
    };
    use crate::mocks::{MockFilter, mock_offer};

    /// A privacy asset amount
    fn xmr(units: i64) -> FixedPointAmount {
        FixedPointAmount::new(Asset::Privacy, units)
    }

    /// Tests that clamping always lands in `[min, max]`
    #[test]
    fn test_clamp_to_limit() {
        let (min, max) = (xmr(100_000), xmr(1_000_000));
        for raw in [0, 50_000, 100_000, 500_000, 1_000_000, 5_000_000, -10] {
            let clamped = clamp_to_limit(xmr(raw), min, max).unwrap();
            assert!(clamped >= min && clamped <= max, "clamp of {raw}");
        }

        assert_eq!(clamp_to_limit(xmr(50_000), min, max).unwrap(), min);
        assert_eq!(clamp_to_limit(xmr(500_000), min, max).unwrap(), xmr(500_000));
        assert_eq!(clamp_to_limit(xmr(5_000_000), min, max).unwrap(), max);
    }

    /// Tests the minimum amount check and its default
    #[test]
    fn test_min_amount() {
        assert!(is_min_amount_satisfied(Some(xmr(10)), Some(xmr(10))));
        assert!(!is_min_amount_satisfied(Some(xmr(10)), Some(xmr(9))));
        assert!(is_min_amount_satisfied(None, Some(xmr(9))));
        assert!(is_min_amount_satisfied(Some(xmr(10)), None));
    }

    /// Tests the offer amount check and its default
    #[test]
    fn test_exceeds_offer_amount() {
        assert!(exceeds_offer_amount(Some(xmr(11)), Some(xmr(10))));
        assert!(!exceeds_offer_amount(Some(xmr(10)), Some(xmr(10))));
        assert!(exceeds_offer_amount(None, Some(xmr(10))));
    }

    /// Tests the dust check and its default
    #[test]
    fn test_would_create_dust() {
        let threshold = xmr(2_000);
        assert!(would_create_dust(Some(xmr(1_000_000)), Some(xmr(999_999)), threshold));
        assert!(!would_create_dust(Some(xmr(1_000_000)), Some(xmr(1_000_000)), threshold));
        assert!(!would_create_dust(Some(xmr(1_000_000)), Some(xmr(998_000)), threshold));
        assert!(!would_create_dust(Some(xmr(1_000_000)), Some(xmr(1_000_001)), threshold));

        assert!(would_create_dust(None, Some(xmr(1)), threshold));
        assert!(would_create_dust(Some(xmr(1)), None, threshold));
    }

    /// Tests that operands of different assets take the absent operand default
    #[test]
    fn test_asset_mismatch_defaults() {
        let btc = FixedPointAmount::new(Asset::Base, 10);
        assert!(is_min_amount_satisfied(Some(btc), Some(xmr(1))));
        assert!(exceeds_offer_amount(Some(xmr(1)), Some(btc)));
        assert!(would_create_dust(Some(btc), Some(xmr(1)), xmr(2_000)));
    }

    /// Tests the filter checks are evaluated in priority order
    #[test]
    fn test_ban_order() {
        let offer = mock_offer();
        let mut filter = MockFilter::default();
        assert_eq!(is_banned(&offer, &filter), None);

        filter.outdated_version = true;
        assert_eq!(is_banned(&offer, &filter), Some(BanReason::VersionOutdated));

        filter.banned_node_addresses.insert(offer.maker_node_address.clone());
        assert_eq!(is_banned(&offer, &filter), Some(BanReason::NodeBanned));

        filter.banned_offer_ids.insert(offer.id.clone());
        assert_eq!(is_banned(&offer, &filter), Some(BanReason::OfferBanned));

        filter.banned_payment_methods.insert(offer.payment_method_id.clone());
        assert_eq!(is_banned(&offer, &filter), Some(BanReason::PaymentMethodBanned));

        filter.banned_currencies.insert(offer.currency_code.clone());
        assert_eq!(is_banned(&offer, &filter), Some(BanReason::CurrencyBanned));
    }
}
