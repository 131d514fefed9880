//! Types describing the fees a taker pays

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use super::{amount::FixedPointAmount, asset::Asset};

/// The currency the trading fee is paid in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeeCurrency {
    /// The fee is paid in the privacy asset, from the trading wallet
    Privacy,
    /// The fee is paid in the secondary asset, from its own wallet
    Secondary,
}

impl FeeCurrency {
    /// The asset the fee is denominated in
    pub fn asset(&self) -> Asset {
        match self {
            FeeCurrency::Privacy => Asset::Privacy,
            FeeCurrency::Secondary => Asset::Secondary,
        }
    }
}

impl Display for FeeCurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.asset())
    }
}

/// A network fee estimate for the taker's transactions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeEstimate {
    /// The network fee rate per byte
    pub per_byte_rate: FixedPointAmount,
    /// The estimated size of the fee transaction in bytes
    pub estimated_size_bytes: u32,
    /// The estimated fee of a single transaction
    pub estimated_fee: FixedPointAmount,
    /// Whether the estimate is locked for the remainder of the session
    pub frozen: bool,
}
