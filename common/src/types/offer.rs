//! Defines the read-only offer snapshot a taker accepts

use std::{
    collections::HashMap,
    fmt::{self, Display},
};

use serde::{Deserialize, Serialize};

use super::{
    amount::{AmountError, FixedPointAmount},
    asset::Asset,
    rates::RateSnapshot,
};

/// The direction of an offer, from the maker's point of view
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// The maker buys the base asset, so the taker sells it
    Buy,
    /// The maker sells the base asset, so the taker buys it
    Sell,
}

impl Direction {
    /// The direction seen from the other side of the trade
    pub fn mirrored(&self) -> Self {
        match self {
            Direction::Buy => Direction::Sell,
            Direction::Sell => Direction::Buy,
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "BUY"),
            Direction::Sell => write!(f, "SELL"),
        }
    }
}

/// An offer published by a maker
///
/// Amounts and deposits are denominated in the base asset, exchange rates
/// live in the extensible metadata map as decimal strings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    /// The offer identifier
    pub id: String,
    /// The direction of the offer
    pub direction: Direction,
    /// The total amount offered
    pub amount: FixedPointAmount,
    /// The smallest amount the maker accepts
    pub min_amount: FixedPointAmount,
    /// The deposit locked by the buyer of the base asset
    pub buyer_security_deposit: FixedPointAmount,
    /// The deposit locked by the seller of the base asset
    pub seller_security_deposit: FixedPointAmount,
    /// The payment method identifier
    pub payment_method_id: String,
    /// The counter currency code
    pub currency_code: String,
    /// The network address of the maker
    pub maker_node_address: String,
    /// Extensible metadata, holds the exchange rates
    #[serde(default)]
    pub extra_data: HashMap<String, String>,
}

impl Offer {
    /// Check that all amounts are non-negative base asset amounts and that
    /// the minimum does not exceed the total
    pub fn validate(&self) -> Result<(), String> {
        let amounts = [
            ("amount", &self.amount),
            ("minAmount", &self.min_amount),
            ("buyerSecurityDeposit", &self.buyer_security_deposit),
            ("sellerSecurityDeposit", &self.seller_security_deposit),
        ];

        for (name, amount) in amounts {
            if amount.asset() != Asset::Base {
                return Err(format!("{name} must be denominated in {}", Asset::Base));
            }
            if amount.is_negative() {
                return Err(format!("{name} must not be negative"));
            }
        }

        if self.min_amount.atomic_units() > self.amount.atomic_units() {
            return Err("minAmount exceeds amount".to_string());
        }

        Ok(())
    }

    /// The security deposit the taker locks, in the base asset
    ///
    /// Taking a sell offer makes the taker the buyer and vice versa
    pub fn taker_security_deposit(&self) -> FixedPointAmount {
        match self.direction {
            Direction::Sell => self.buyer_security_deposit,
            Direction::Buy => self.seller_security_deposit,
        }
    }

    /// Parse the exchange rates from the offer metadata
    pub fn rate_snapshot(&self) -> Result<RateSnapshot, AmountError> {
        RateSnapshot::from_metadata(&self.extra_data)
    }
}
