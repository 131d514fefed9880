//! The assets a take-offer computation may be expressed in

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use constants::{
    BASE_ASSET_DECIMALS, BASE_ASSET_TICKER, PRIVACY_ASSET_DECIMALS, PRIVACY_ASSET_TICKER,
    SECONDARY_ASSET_DECIMALS, SECONDARY_ASSET_TICKER,
};
use serde::{Deserialize, Serialize};

/// One of the three ledgers an offer's value is expressed in
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum Asset {
    /// The base ledger asset (BTC)
    #[serde(rename = "BTC")]
    Base,
    /// The secondary ledger asset (BSQ)
    #[serde(rename = "BSQ")]
    Secondary,
    /// The privacy asset (XMR)
    #[serde(rename = "XMR")]
    Privacy,
}

impl Asset {
    /// The number of decimal places one whole unit is split into
    pub const fn decimals(&self) -> u32 {
        match self {
            Asset::Base => BASE_ASSET_DECIMALS,
            Asset::Secondary => SECONDARY_ASSET_DECIMALS,
            Asset::Privacy => PRIVACY_ASSET_DECIMALS,
        }
    }

    /// The number of atomic units in one whole unit of the asset
    pub const fn atomic_units_per_unit(&self) -> i64 {
        10i64.pow(self.decimals())
    }

    /// The ticker of the asset
    pub const fn ticker(&self) -> &'static str {
        match self {
            Asset::Base => BASE_ASSET_TICKER,
            Asset::Secondary => SECONDARY_ASSET_TICKER,
            Asset::Privacy => PRIVACY_ASSET_TICKER,
        }
    }
}

impl Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ticker())
    }
}

impl FromStr for Asset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            BASE_ASSET_TICKER => Ok(Asset::Base),
            SECONDARY_ASSET_TICKER => Ok(Asset::Secondary),
            PRIVACY_ASSET_TICKER => Ok(Asset::Privacy),
            _ => Err(format!("Unknown asset: {s}")),
        }
    }
}
