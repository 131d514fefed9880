//! Mock collaborators and fixtures for testing take-offer sessions

use std::{
    collections::{HashMap, HashSet},
    str::FromStr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use common::types::{
    amount::FixedPointAmount,
    asset::Asset,
    offer::{Direction, Offer},
};
use constants::{BASE_TO_PRIVACY_RATE_KEY, SECONDARY_TO_PRIVACY_RATE_KEY};
use tokio::sync::Notify;

use crate::{
    collaborators::{
        FeeQuoter, ListenerId, OfferFilter, StaticFeePolicy, TradeExecutor, TradeLimitProvider,
        TxSizeEstimator, WalletBalances,
    },
    jobs::{TakeOfferJob, TakeOfferQueue},
    session::{Collaborators, TakeOfferConfig, TakeOfferRequest},
};

// ------------
// | Fixtures |
// ------------

/// A sell offer of 1_000_000 base units with a minimum of 100_000
///
/// The rates make one base atomic unit worth exactly one privacy atomic unit
pub fn mock_offer() -> Offer {
    let base = |units| FixedPointAmount::new(Asset::Base, units);
    Offer {
        id: "mock-offer".to_string(),
        direction: Direction::Sell,
        amount: base(1_000_000),
        min_amount: base(100_000),
        buyer_security_deposit: base(150_000),
        seller_security_deposit: base(100_000),
        payment_method_id: "SEPA".to_string(),
        currency_code: "EUR".to_string(),
        maker_node_address: "maker.onion:9999".to_string(),
        extra_data: HashMap::from([
            (BASE_TO_PRIVACY_RATE_KEY.to_string(), "0.0001".to_string()),
            (SECONDARY_TO_PRIVACY_RATE_KEY.to_string(), "0.01".to_string()),
        ]),
    }
}

/// A session config paying the fee in the privacy asset at 10 units per byte
pub fn mock_config() -> TakeOfferConfig {
    TakeOfferConfig {
        default_tx_fee_per_byte: FixedPointAmount::new(Asset::Privacy, 10),
        min_non_dust_output: FixedPointAmount::new(Asset::Base, 546),
        prefer_fee_in_privacy_asset: true,
        payment_account_id: Some("mock-account".to_string()),
    }
}

/// A fee policy of 0.3% in the privacy asset and 0.15% in the secondary
/// asset
pub fn mock_fee_policy() -> StaticFeePolicy {
    StaticFeePolicy {
        privacy_rate: BigDecimal::from_str("0.003").expect("valid decimal"),
        privacy_min_fee: FixedPointAmount::new(Asset::Privacy, 1_000),
        secondary_rate: BigDecimal::from_str("0.0015").expect("valid decimal"),
        secondary_min_fee: FixedPointAmount::new(Asset::Secondary, 5),
    }
}

/// The mocks a session's collaborators are built from
pub struct MockEnvironment {
    /// The taker's wallet
    pub wallet: Arc<MockWallet>,
    /// The banned entity filter
    pub filter: Arc<Mutex<MockFilter>>,
    /// The trade limit provider
    pub trade_limits: Arc<MockTradeLimits>,
    /// Records forwarded requests
    pub trade_executor: Arc<RecordingTradeExecutor>,
    /// The transaction size estimator
    pub size_estimator: Arc<MockSizeEstimator>,
}

impl Default for MockEnvironment {
    fn default() -> Self {
        Self {
            wallet: Arc::new(MockWallet::default()),
            filter: Arc::new(Mutex::new(MockFilter::default())),
            trade_limits: Arc::new(MockTradeLimits::new(FixedPointAmount::new(
                Asset::Base,
                2_000_000,
            ))),
            trade_executor: Arc::new(RecordingTradeExecutor::default()),
            size_estimator: Arc::new(MockSizeEstimator::new(
                FixedPointAmount::new(Asset::Base, 5_200),
                520,
            )),
        }
    }
}

/// Build session collaborators over the mock environment
pub fn mock_collaborators(env: &MockEnvironment) -> Collaborators {
    Collaborators {
        fee_policy: Arc::new(mock_fee_policy()),
        size_estimator: env.size_estimator.clone(),
        filter: env.filter.clone(),
        wallet: env.wallet.clone(),
        trade_limits: env.trade_limits.clone(),
        trade_executor: env.trade_executor.clone(),
    }
}

// ----------------
// | Fee Services |
// ----------------

/// A fee quoter returning a fixed rate, optionally held back until released
pub struct MockFeeQuoter {
    /// The rate to return
    rate: Result<FixedPointAmount, String>,
    /// Holds the response until notified
    gate: Option<Arc<Notify>>,
}

impl MockFeeQuoter {
    /// A quoter that responds immediately
    pub fn new(rate: FixedPointAmount) -> Self {
        Self { rate: Ok(rate), gate: None }
    }

    /// A quoter that responds once the returned gate is notified
    pub fn gated(rate: FixedPointAmount) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        (Self { rate: Ok(rate), gate: Some(gate.clone()) }, gate)
    }

    /// A quoter that always fails
    pub fn failing(msg: &str) -> Self {
        Self { rate: Err(msg.to_string()), gate: None }
    }
}

#[async_trait]
impl FeeQuoter for MockFeeQuoter {
    async fn request_fee_rate(&self) -> Result<FixedPointAmount, String> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        self.rate.clone()
    }
}

/// A size estimator returning a fixed fee and size, counting its calls
pub struct MockSizeEstimator {
    /// The fee to return, in the base asset
    fee: FixedPointAmount,
    /// The size to return
    size_bytes: u32,
    /// The number of calls made
    calls: AtomicUsize,
}

impl MockSizeEstimator {
    /// Constructor
    pub fn new(fee: FixedPointAmount, size_bytes: u32) -> Self {
        Self { fee, size_bytes, calls: AtomicUsize::new(0) }
    }

    /// The number of estimates requested
    pub fn num_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TxSizeEstimator for MockSizeEstimator {
    fn estimated_fee_and_size(
        &self,
        _funds_needed: FixedPointAmount,
        _trading_fee: FixedPointAmount,
    ) -> Result<(FixedPointAmount, u32), String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((self.fee, self.size_bytes))
    }
}

// ----------
// | Filter |
// ----------

/// A filter over explicit sets of banned entities
#[derive(Clone, Debug, Default)]
pub struct MockFilter {
    /// Banned currency codes
    pub banned_currencies: HashSet<String>,
    /// Banned payment method ids
    pub banned_payment_methods: HashSet<String>,
    /// Banned offer ids
    pub banned_offer_ids: HashSet<String>,
    /// Banned node addresses
    pub banned_node_addresses: HashSet<String>,
    /// Whether trading requires an update
    pub outdated_version: bool,
}

impl OfferFilter for MockFilter {
    fn is_currency_banned(&self, currency_code: &str) -> bool {
        self.banned_currencies.contains(currency_code)
    }

    fn is_payment_method_banned(&self, payment_method_id: &str) -> bool {
        self.banned_payment_methods.contains(payment_method_id)
    }

    fn is_offer_id_banned(&self, offer_id: &str) -> bool {
        self.banned_offer_ids.contains(offer_id)
    }

    fn is_node_address_banned(&self, node_address: &str) -> bool {
        self.banned_node_addresses.contains(node_address)
    }

    fn requires_update_for_trading(&self) -> bool {
        self.outdated_version
    }
}

impl OfferFilter for Mutex<MockFilter> {
    fn is_currency_banned(&self, currency_code: &str) -> bool {
        self.lock().unwrap().is_currency_banned(currency_code)
    }

    fn is_payment_method_banned(&self, payment_method_id: &str) -> bool {
        self.lock().unwrap().is_payment_method_banned(payment_method_id)
    }

    fn is_offer_id_banned(&self, offer_id: &str) -> bool {
        self.lock().unwrap().is_offer_id_banned(offer_id)
    }

    fn is_node_address_banned(&self, node_address: &str) -> bool {
        self.lock().unwrap().is_node_address_banned(node_address)
    }

    fn requires_update_for_trading(&self) -> bool {
        self.lock().unwrap().requires_update_for_trading()
    }
}

// ----------
// | Wallet |
// ----------

/// A wallet with settable balances that records its listeners
pub struct MockWallet {
    /// The confirmed privacy asset balance
    balance: Mutex<FixedPointAmount>,
    /// The confirmed secondary asset balance
    secondary_balance: Mutex<FixedPointAmount>,
    /// The registered listeners
    listeners: Mutex<HashMap<ListenerId, TakeOfferQueue>>,
    /// The next listener id
    next_id: AtomicU64,
}

impl Default for MockWallet {
    fn default() -> Self {
        Self {
            balance: Mutex::new(FixedPointAmount::zero(Asset::Privacy)),
            secondary_balance: Mutex::new(FixedPointAmount::zero(Asset::Secondary)),
            listeners: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }
}

impl MockWallet {
    /// Set the confirmed privacy asset balance
    pub fn set_balance(&self, balance: FixedPointAmount) {
        *self.balance.lock().unwrap() = balance;
    }

    /// Set the confirmed secondary asset balance
    pub fn set_secondary_balance(&self, balance: FixedPointAmount) {
        *self.secondary_balance.lock().unwrap() = balance;
    }

    /// The number of registered listeners
    pub fn num_listeners(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }

    /// Enqueue a balance-changed job for every listener
    pub fn notify_listeners(&self) {
        for queue in self.listeners.lock().unwrap().values() {
            let _ = queue.send(TakeOfferJob::BalanceChanged);
        }
    }
}

impl WalletBalances for MockWallet {
    fn available_confirmed_balance(&self, asset: Asset) -> FixedPointAmount {
        match asset {
            Asset::Privacy => *self.balance.lock().unwrap(),
            Asset::Secondary => *self.secondary_balance.lock().unwrap(),
            Asset::Base => FixedPointAmount::zero(Asset::Base),
        }
    }

    fn add_balance_listener(&self, queue: TakeOfferQueue) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.listeners.lock().unwrap().insert(id, queue);
        id
    }

    fn remove_balance_listener(&self, id: ListenerId) {
        self.listeners.lock().unwrap().remove(&id);
    }
}

// ------------------
// | Trade Services |
// ------------------

/// A trade limit provider returning a settable limit for any account
pub struct MockTradeLimits {
    /// The limit, in the base asset
    limit: Mutex<FixedPointAmount>,
}

impl MockTradeLimits {
    /// Constructor
    pub fn new(limit: FixedPointAmount) -> Self {
        Self { limit: Mutex::new(limit) }
    }

    /// Change the limit
    pub fn set_limit(&self, limit: FixedPointAmount) {
        *self.limit.lock().unwrap() = limit;
    }
}

impl TradeLimitProvider for MockTradeLimits {
    fn my_trade_limit(
        &self,
        payment_account_id: Option<&str>,
        _currency_code: &str,
        _direction: Direction,
    ) -> FixedPointAmount {
        match payment_account_id {
            Some(_) => *self.limit.lock().unwrap(),
            None => FixedPointAmount::zero(Asset::Base),
        }
    }
}

/// The values of a forwarded request, without its callbacks
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRequest {
    /// The amount being taken
    pub amount: FixedPointAmount,
    /// The network fee of a single transaction
    pub tx_fee: FixedPointAmount,
    /// The trading fee
    pub taker_fee: FixedPointAmount,
    /// The funds needed for the trade
    pub funds_needed: FixedPointAmount,
    /// The id of the offer taken
    pub offer_id: String,
    /// The selected payment account
    pub payment_account_id: Option<String>,
}

/// A trade executor that records what it is handed
#[derive(Default)]
pub struct RecordingTradeExecutor {
    /// The forwarded requests
    requests: Mutex<Vec<RecordedRequest>>,
    /// The number of availability cancellations
    cancellations: AtomicUsize,
}

impl RecordingTradeExecutor {
    /// The requests forwarded so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The number of availability requests cancelled
    pub fn num_cancellations(&self) -> usize {
        self.cancellations.load(Ordering::SeqCst)
    }
}

impl TradeExecutor for RecordingTradeExecutor {
    fn on_take_offer(&self, request: TakeOfferRequest) {
        self.requests.lock().unwrap().push(RecordedRequest {
            amount: request.amount,
            tx_fee: request.tx_fee,
            taker_fee: request.taker_fee,
            funds_needed: request.funds_needed,
            offer_id: request.offer.id,
            payment_account_id: request.payment_account_id,
        });
    }

    fn cancel_availability_request(&self, _offer: &Offer) {
        self.cancellations.fetch_add(1, Ordering::SeqCst);
    }
}
