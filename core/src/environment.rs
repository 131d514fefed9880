//! A static environment for the engine's collaborators, built from the config
//!
//! Balances, limits and the fee rate are fixed for the lifetime of the
//! process, so no balance change is ever posted to a session

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

use async_trait::async_trait;
use common::types::{
    amount::FixedPointAmount,
    asset::Asset,
    offer::{Direction, Offer},
    rates::RateSnapshot,
};
use config::EngineConfig;
use take_offer::{
    collaborators::{
        FeeQuoter, ListenerId, OfferFilter, StaticFeePolicy, TradeExecutor, TradeLimitProvider,
        TxSizeEstimator, WalletBalances,
    },
    converter::convert,
    jobs::TakeOfferQueue,
    session::{Collaborators, TakeOfferRequest},
};
use tracing::{debug, info};

/// Build the collaborators and the fee quoter for an offer
pub fn build_environment(
    config: &EngineConfig,
    rates: RateSnapshot,
) -> (Collaborators, Arc<dyn FeeQuoter>) {
    let fee_policy = StaticFeePolicy {
        privacy_rate: config.taker_fee_rate_privacy.clone(),
        privacy_min_fee: config.min_taker_fee_privacy,
        secondary_rate: config.taker_fee_rate_secondary.clone(),
        secondary_min_fee: config.min_taker_fee_secondary,
    };
    let size_estimator = ConfiguredSizeEstimator {
        per_byte_rate: config.fee_rate_per_byte.unwrap_or(config.default_tx_fee_per_byte),
        size_bytes: config.funded_tx_size_bytes,
        rates,
    };

    let collaborators = Collaborators {
        fee_policy: Arc::new(fee_policy),
        size_estimator: Arc::new(size_estimator),
        filter: Arc::new(SetFilter::from_config(config)),
        wallet: Arc::new(StaticWallet::new(config.privacy_balance, config.secondary_balance)),
        trade_limits: Arc::new(FixedTradeLimit { limit: config.max_trade_limit }),
        trade_executor: Arc::new(DryRunTradeExecutor),
    };
    let fee_quoter = Arc::new(StaticFeeQuoter { rate: config.fee_rate_per_byte });

    (collaborators, fee_quoter)
}

// --------------
// | Fee Quotes |
// --------------

/// Quotes the configured fee rate, failing when none is configured
pub struct StaticFeeQuoter {
    /// The configured per-byte rate
    rate: Option<FixedPointAmount>,
}

#[async_trait]
impl FeeQuoter for StaticFeeQuoter {
    async fn request_fee_rate(&self) -> Result<FixedPointAmount, String> {
        self.rate.ok_or_else(|| "no fee rate configured".to_string())
    }
}

/// Sizes a funded wallet's transactions at a fixed size
pub struct ConfiguredSizeEstimator {
    /// The per-byte rate in the privacy asset
    per_byte_rate: FixedPointAmount,
    /// The combined size of the fee and deposit transactions
    size_bytes: u32,
    /// The offer's rates, used to express the fee in the base asset
    rates: RateSnapshot,
}

impl TxSizeEstimator for ConfiguredSizeEstimator {
    fn estimated_fee_and_size(
        &self,
        _funds_needed: FixedPointAmount,
        _trading_fee: FixedPointAmount,
    ) -> Result<(FixedPointAmount, u32), String> {
        let fee = self
            .per_byte_rate
            .checked_mul(i64::from(self.size_bytes))
            .map_err(|e| e.to_string())?;
        let fee = convert(fee, Asset::Base, &self.rates).map_err(|e| e.to_string())?;

        Ok((fee, self.size_bytes))
    }
}

// ----------
// | Filter |
// ----------

/// A filter over fixed sets of banned entities
#[derive(Debug, Default)]
pub struct SetFilter {
    /// Banned currency codes
    currencies: HashSet<String>,
    /// Banned payment method ids
    payment_methods: HashSet<String>,
    /// Banned offer ids
    offer_ids: HashSet<String>,
    /// Banned maker node addresses
    node_addresses: HashSet<String>,
    /// Whether trading requires an update
    require_update: bool,
}

impl SetFilter {
    /// Build the filter from the config's ban lists
    pub fn from_config(config: &EngineConfig) -> Self {
        let to_set = |list: &[String]| list.iter().cloned().collect::<HashSet<_>>();
        Self {
            currencies: to_set(&config.banned_currencies),
            payment_methods: to_set(&config.banned_payment_methods),
            offer_ids: to_set(&config.banned_offer_ids),
            node_addresses: to_set(&config.banned_node_addresses),
            require_update: config.require_update_for_trading,
        }
    }
}

impl OfferFilter for SetFilter {
    fn is_currency_banned(&self, currency_code: &str) -> bool {
        self.currencies.contains(currency_code)
    }

    fn is_payment_method_banned(&self, payment_method_id: &str) -> bool {
        self.payment_methods.contains(payment_method_id)
    }

    fn is_offer_id_banned(&self, offer_id: &str) -> bool {
        self.offer_ids.contains(offer_id)
    }

    fn is_node_address_banned(&self, node_address: &str) -> bool {
        self.node_addresses.contains(node_address)
    }

    fn requires_update_for_trading(&self) -> bool {
        self.require_update
    }
}

// ----------
// | Wallet |
// ----------

/// A wallet with fixed confirmed balances
pub struct StaticWallet {
    /// The privacy asset balance
    privacy_balance: FixedPointAmount,
    /// The secondary asset balance
    secondary_balance: FixedPointAmount,
    /// The id handed to the next listener
    next_listener: AtomicU64,
    /// The registered listeners
    listeners: Mutex<HashMap<ListenerId, TakeOfferQueue>>,
}

impl StaticWallet {
    /// Constructor
    pub fn new(privacy_balance: FixedPointAmount, secondary_balance: FixedPointAmount) -> Self {
        Self {
            privacy_balance,
            secondary_balance,
            next_listener: AtomicU64::new(0),
            listeners: Mutex::new(HashMap::new()),
        }
    }
}

impl WalletBalances for StaticWallet {
    fn available_confirmed_balance(&self, asset: Asset) -> FixedPointAmount {
        match asset {
            Asset::Privacy => self.privacy_balance,
            Asset::Secondary => self.secondary_balance,
            Asset::Base => FixedPointAmount::zero(Asset::Base),
        }
    }

    fn add_balance_listener(&self, queue: TakeOfferQueue) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.insert(id, queue);
        }

        id
    }

    fn remove_balance_listener(&self, id: ListenerId) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.remove(&id);
        }
    }
}

/// A trade limit that does not depend on the account's age
pub struct FixedTradeLimit {
    /// The limit in the base asset
    limit: FixedPointAmount,
}

impl TradeLimitProvider for FixedTradeLimit {
    fn my_trade_limit(
        &self,
        payment_account_id: Option<&str>,
        _currency_code: &str,
        _direction: Direction,
    ) -> FixedPointAmount {
        match payment_account_id {
            Some(_) => self.limit,
            None => FixedPointAmount::zero(Asset::Base),
        }
    }
}

/// Logs the hand-off instead of running the trade protocol
///
/// The request's callbacks are dropped unfired
pub struct DryRunTradeExecutor;

impl TradeExecutor for DryRunTradeExecutor {
    fn on_take_offer(&self, request: TakeOfferRequest) {
        info!(
            offer_id = %request.offer.id,
            amount = %request.amount,
            taker_fee = %request.taker_fee,
            funds_needed = %request.funds_needed,
            "dry run, not starting the trade protocol"
        );
    }

    fn cancel_availability_request(&self, offer: &Offer) {
        debug!(offer_id = %offer.id, "no availability request to cancel");
    }
}

#[cfg(test)]
mod test {
    use common::types::{amount::FixedPointAmount, asset::Asset, offer::Direction};
    use config::EngineConfig;
    use take_offer::{
        collaborators::{OfferFilter, TradeLimitProvider, TxSizeEstimator, WalletBalances},
        jobs::new_take_offer_queue,
        mocks::mock_offer,
    };

    use super::{ConfiguredSizeEstimator, FixedTradeLimit, SetFilter, StaticWallet};

    /// Tests the filter built from the config's ban lists
    #[test]
    fn test_set_filter() {
        let mut config = EngineConfig::default();
        config.banned_currencies = vec!["EUR".to_string()];
        config.require_update_for_trading = true;

        let filter = SetFilter::from_config(&config);
        assert!(filter.is_currency_banned("EUR"));
        assert!(!filter.is_currency_banned("USD"));
        assert!(!filter.is_offer_id_banned("mock-offer"));
        assert!(filter.requires_update_for_trading());
    }

    /// Tests that the estimator prices the configured size in the base asset
    #[test]
    fn test_size_estimator() {
        let rates = mock_offer().rate_snapshot().unwrap();
        let estimator = ConfiguredSizeEstimator {
            per_byte_rate: FixedPointAmount::new(Asset::Privacy, 10),
            size_bytes: 520,
            rates,
        };

        let zero = FixedPointAmount::zero(Asset::Base);
        let (fee, size) = estimator.estimated_fee_and_size(zero, zero).unwrap();
        assert_eq!(fee, FixedPointAmount::new(Asset::Base, 5_200));
        assert_eq!(size, 520);
    }

    /// Tests the trade limit requires a selected account
    #[test]
    fn test_trade_limit() {
        let limit = FixedPointAmount::new(Asset::Base, 1_000);
        let limits = FixedTradeLimit { limit };

        assert_eq!(limits.my_trade_limit(Some("acct"), "EUR", Direction::Buy), limit);
        assert!(limits.my_trade_limit(None, "EUR", Direction::Buy).is_zero());
    }

    /// Tests listener registration on the static wallet
    #[test]
    fn test_wallet_listeners() {
        let balance = FixedPointAmount::new(Asset::Privacy, 7);
        let wallet = StaticWallet::new(balance, FixedPointAmount::zero(Asset::Secondary));
        let (queue, _recv) = new_take_offer_queue();

        let id = wallet.add_balance_listener(queue);
        assert_eq!(wallet.listeners.lock().unwrap().len(), 1);
        assert_eq!(wallet.available_confirmed_balance(Asset::Privacy), balance);

        wallet.remove_balance_listener(id);
        assert!(wallet.listeners.lock().unwrap().is_empty());
    }
}
