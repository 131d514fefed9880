//! Interfaces to the external collaborators the engine consults
//!
//! The engine never talks to a wallet, a fee service or the trade protocol
//! directly; it sees them only through these traits

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use common::types::{
    amount::FixedPointAmount,
    asset::Asset,
    fee::FeeCurrency,
    offer::{Direction, Offer},
};

use crate::{jobs::TakeOfferQueue, session::TakeOfferRequest};

/// Identifies a balance listener registered with the wallet
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Quotes the current network fee rate
#[async_trait]
pub trait FeeQuoter: Send + Sync {
    /// Request a fresh per-byte fee rate, denominated in the privacy asset
    ///
    /// The quoter may retry internally; the engine applies whatever it
    /// eventually returns unless the estimate was frozen in the meantime
    async fn request_fee_rate(&self) -> Result<FixedPointAmount, String>;
}

/// Estimates the taker's fee and deposit transactions from wallet contents
pub trait TxSizeEstimator: Send + Sync {
    /// Estimate the combined fee and the size in bytes for the given funds
    /// and trading fee, all in base asset units
    fn estimated_fee_and_size(
        &self,
        funds_needed: FixedPointAmount,
        trading_fee: FixedPointAmount,
    ) -> Result<(FixedPointAmount, u32), String>;
}

/// Supplies the taker fee schedule
pub trait FeePolicy: Send + Sync {
    /// The proportional fee rate for the given fee currency
    fn taker_fee_rate(&self, currency: FeeCurrency, direction: Direction) -> BigDecimal;
    /// The minimum taker fee, denominated in the fee currency's asset
    fn min_taker_fee(&self, currency: FeeCurrency) -> FixedPointAmount;
}

/// Checks offers against the network's banned entity filter
pub trait OfferFilter: Send + Sync {
    /// Whether the currency code is banned
    fn is_currency_banned(&self, currency_code: &str) -> bool;
    /// Whether the payment method is banned
    fn is_payment_method_banned(&self, payment_method_id: &str) -> bool;
    /// Whether the offer id is banned
    fn is_offer_id_banned(&self, offer_id: &str) -> bool;
    /// Whether the maker's node address is banned
    fn is_node_address_banned(&self, node_address: &str) -> bool;
    /// Whether trading requires updating to a newer version
    fn requires_update_for_trading(&self) -> bool;
}

/// Reads wallet balances and notifies the session of changes
pub trait WalletBalances: Send + Sync {
    /// The confirmed balance available for the given asset
    fn available_confirmed_balance(&self, asset: Asset) -> FixedPointAmount;
    /// Register a listener that enqueues a balance-changed job on every change
    fn add_balance_listener(&self, queue: TakeOfferQueue) -> ListenerId;
    /// Unregister a listener
    fn remove_balance_listener(&self, id: ListenerId);
}

/// Supplies the account-age based trade limit
pub trait TradeLimitProvider: Send + Sync {
    /// The maximum trade amount in base asset units for the payment account,
    /// zero when no account is selected
    fn my_trade_limit(
        &self,
        payment_account_id: Option<&str>,
        currency_code: &str,
        direction: Direction,
    ) -> FixedPointAmount;
}

/// Executes the trade protocol once the engine hands off an accepted offer
pub trait TradeExecutor: Send + Sync {
    /// Start taking the offer; the executor invokes the request's callbacks
    fn on_take_offer(&self, request: TakeOfferRequest);
    /// Cancel a pending availability request for the offer
    fn cancel_availability_request(&self, offer: &Offer);
}

// ---------------------
// | Static Fee Policy |
// ---------------------

/// A fee policy with fixed rates and minimums per fee currency
#[derive(Clone, Debug)]
pub struct StaticFeePolicy {
    /// The proportional rate when paying in the privacy asset
    pub privacy_rate: BigDecimal,
    /// The minimum fee when paying in the privacy asset
    pub privacy_min_fee: FixedPointAmount,
    /// The proportional rate when paying in the secondary asset
    pub secondary_rate: BigDecimal,
    /// The minimum fee when paying in the secondary asset
    pub secondary_min_fee: FixedPointAmount,
}

impl FeePolicy for StaticFeePolicy {
    fn taker_fee_rate(&self, currency: FeeCurrency, _direction: Direction) -> BigDecimal {
        match currency {
            FeeCurrency::Privacy => self.privacy_rate.clone(),
            FeeCurrency::Secondary => self.secondary_rate.clone(),
        }
    }

    fn min_taker_fee(&self, currency: FeeCurrency) -> FixedPointAmount {
        match currency {
            FeeCurrency::Privacy => self.privacy_min_fee,
            FeeCurrency::Secondary => self.secondary_min_fee,
        }
    }
}
