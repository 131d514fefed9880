//! Reasons an offer may be filtered out before it is taken

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// The reason a take-offer attempt was blocked by the filter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BanReason {
    /// The offer's currency is banned
    CurrencyBanned,
    /// The offer's payment method is banned
    PaymentMethodBanned,
    /// The offer itself is banned
    OfferBanned,
    /// The maker's node address is banned
    NodeBanned,
    /// The local software must be updated before trading
    VersionOutdated,
}

impl Display for BanReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            BanReason::CurrencyBanned => "the currency of this offer was banned by the developers",
            BanReason::PaymentMethodBanned => {
                "the payment method of this offer was banned by the developers"
            },
            BanReason::OfferBanned => "this offer was blocked by the developers",
            BanReason::NodeBanned => "the maker of this offer was blocked by the developers",
            BanReason::VersionOutdated => "you need to update to the latest version to trade",
        };
        write!(f, "{msg}")
    }
}
