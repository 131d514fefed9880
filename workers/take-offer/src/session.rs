//! The stateful orchestrator of a single take-offer attempt
//!
//! A session owns the offer, the rate snapshot captured at construction, the
//! amount being taken and the fee estimator. Every state-changing operation
//! ends in `recompute`, which derives the totals from the current state as a
//! pure function and publishes an immutable [`SessionSnapshot`] on a watch
//! channel.

use std::{cmp::Ordering, sync::Arc};

use common::types::{
    amount::FixedPointAmount,
    asset::Asset,
    fee::{FeeCurrency, FeeEstimate},
    filter::BanReason,
    offer::{Direction, Offer},
    rates::RateSnapshot,
};
use serde::Serialize;
use tokio::sync::watch::{self, Receiver as WatchReceiver, Sender as WatchSender};
use tracing::{info, instrument, warn};

use crate::{
    collaborators::{
        FeePolicy, ListenerId, OfferFilter, TradeExecutor, TradeLimitProvider, TxSizeEstimator,
        WalletBalances,
    },
    converter::{convert, convert_for_display},
    errors::TakeOfferError,
    fee_estimator::FeeEstimator,
    jobs::{ErrorMessageHandler, TakeOfferQueue, TradeResultHandler},
    total_payable::{NetworkFees, funds_needed_for_trade, total_to_pay},
    trade_fee::TradeFeeCalculator,
    validation::{
        clamp_to_limit, exceeds_offer_amount, is_banned, is_min_amount_satisfied,
        would_create_dust,
    },
};

// -----------
// | Configs |
// -----------

/// The static configuration of a session
#[derive(Clone, Debug)]
pub struct TakeOfferConfig {
    /// The per-byte fee rate used until the first refresh completes, in the
    /// privacy asset
    pub default_tx_fee_per_byte: FixedPointAmount,
    /// The smallest output the base ledger relays, in the base asset
    pub min_non_dust_output: FixedPointAmount,
    /// Whether the taker prefers paying the trading fee in the privacy asset
    pub prefer_fee_in_privacy_asset: bool,
    /// The payment account selected when the session starts
    pub payment_account_id: Option<String>,
}

/// The external collaborators a session consults
#[derive(Clone)]
pub struct Collaborators {
    /// The taker fee schedule
    pub fee_policy: Arc<dyn FeePolicy>,
    /// Sizes the fee and deposit transactions from wallet contents
    pub size_estimator: Arc<dyn TxSizeEstimator>,
    /// The banned entity filter
    pub filter: Arc<dyn OfferFilter>,
    /// The taker's wallet
    pub wallet: Arc<dyn WalletBalances>,
    /// The account-age based trade limits
    pub trade_limits: Arc<dyn TradeLimitProvider>,
    /// Runs the trade protocol once the offer is taken
    pub trade_executor: Arc<dyn TradeExecutor>,
}

// -------------------
// | Session Outputs |
// -------------------

/// An immutable view of the session's derived state
///
/// All amounts are in the privacy asset unless named otherwise
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// The id of the offer being taken
    pub offer_id: String,
    /// The taker's side of the trade
    pub taker_direction: Direction,
    /// The amount being taken
    pub amount: Option<FixedPointAmount>,
    /// The offer's minimum amount
    pub offer_min_amount: FixedPointAmount,
    /// The offer's total amount
    pub offer_amount: FixedPointAmount,
    /// The taker's trade limit for the selected payment account
    pub max_trade_limit: FixedPointAmount,
    /// The security deposit the taker locks
    pub security_deposit: FixedPointAmount,
    /// The network fee estimate
    pub fee_estimate: FeeEstimate,
    /// The currency the trading fee is paid in
    pub fee_currency: FeeCurrency,
    /// The trading fee, in the fee currency's asset
    pub taker_fee: Option<FixedPointAmount>,
    /// The fees of the three dependent transactions
    pub total_network_fee: FixedPointAmount,
    /// The funds locked by the deposit and payout transactions
    pub funds_needed: Option<FixedPointAmount>,
    /// The total the taker must have available
    pub total_to_pay: Option<FixedPointAmount>,
    /// The total expressed in the base asset, rounded for display
    pub total_to_pay_in_base: Option<FixedPointAmount>,
    /// The wallet's confirmed privacy asset balance
    pub available_balance: FixedPointAmount,
    /// Whether the confirmed balance covers the total
    pub is_wallet_funded: bool,
    /// Whether the amount reaches the offer's minimum
    pub min_amount_satisfied: bool,
    /// Whether the amount is larger than the offer
    pub exceeds_offer_amount: bool,
    /// Whether the amount leaves a dust remainder on the offer
    pub would_create_dust: bool,
}

/// The request handed to the trade executor when an offer is taken
pub struct TakeOfferRequest {
    /// The amount being taken
    pub amount: FixedPointAmount,
    /// The network fee estimate of a single transaction
    pub tx_fee: FixedPointAmount,
    /// The trading fee, in the fee currency's asset
    pub taker_fee: FixedPointAmount,
    /// The funds locked by the deposit and payout transactions
    pub funds_needed: FixedPointAmount,
    /// The offer being taken
    pub offer: Offer,
    /// The selected payment account
    pub payment_account_id: Option<String>,
    /// Invoked by the executor once the trade has been taken
    pub on_success: TradeResultHandler,
    /// Invoked by the executor with a failure reason
    pub on_error: ErrorMessageHandler,
}

/// The reason a take-offer attempt was not forwarded
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Rejection {
    /// The filter matched the offer
    Banned(BanReason),
    /// The amount is below the offer's minimum
    BelowMinAmount,
    /// The amount exceeds the offer's amount
    ExceedsOfferAmount,
    /// The amount leaves a dust remainder on the offer
    WouldCreateDust,
    /// The wallet does not cover the total
    InsufficientFunds,
}

/// The engine's decision on a take-offer request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TakeOfferOutcome {
    /// The request was forwarded to the trade executor
    Submitted,
    /// The request was blocked before forwarding
    Rejected(Rejection),
}

// -----------
// | Session |
// -----------

/// A single take-offer attempt
pub struct TakeOfferSession {
    /// The offer being taken
    offer: Offer,
    /// The rates captured at session start
    rates: RateSnapshot,
    /// The session's configuration
    config: TakeOfferConfig,
    /// The external collaborators
    collaborators: Collaborators,
    /// Computes the trading fee
    fee_calculator: TradeFeeCalculator,
    /// The network fee estimator
    estimator: FeeEstimator,
    /// The taker's side of the trade
    taker_direction: Direction,
    /// The offer amount in the privacy asset
    offer_amount: FixedPointAmount,
    /// The offer's minimum amount in the privacy asset
    offer_min_amount: FixedPointAmount,
    /// The security deposit in the privacy asset
    security_deposit: FixedPointAmount,
    /// The dust threshold in the privacy asset
    min_non_dust_output: FixedPointAmount,
    /// The trade limit in the privacy asset
    max_trade_limit: FixedPointAmount,
    /// The amount being taken
    amount: Option<FixedPointAmount>,
    /// The balance listener registered with the wallet
    balance_listener: Option<ListenerId>,
    /// The latest derived state
    state_sender: WatchSender<SessionSnapshot>,
}

impl TakeOfferSession {
    /// Start a session for the given offer
    ///
    /// Parses the offer's rates once, converts the offer's amounts and the
    /// security deposit into the privacy asset and registers a balance
    /// listener that enqueues onto `queue`
    pub fn new(
        offer: Offer,
        config: TakeOfferConfig,
        collaborators: Collaborators,
        queue: TakeOfferQueue,
    ) -> Result<Self, TakeOfferError> {
        offer.validate().map_err(TakeOfferError::InvalidOffer)?;
        let rates = offer.rate_snapshot()?;
        let taker_direction = offer.direction.mirrored();

        let offer_amount = convert(offer.amount, Asset::Privacy, &rates)?;
        let offer_min_amount = convert(offer.min_amount, Asset::Privacy, &rates)?;
        let security_deposit = convert(offer.taker_security_deposit(), Asset::Privacy, &rates)?;
        let min_non_dust_output = convert(config.min_non_dust_output, Asset::Privacy, &rates)?;
        let max_trade_limit = trade_limit(
            collaborators.trade_limits.as_ref(),
            &offer,
            config.payment_account_id.as_deref(),
            taker_direction,
            &rates,
        )?;
        let amount = offer_amount.checked_min(max_trade_limit)?;

        let estimator = FeeEstimator::new(config.default_tx_fee_per_byte)?;
        let fee_calculator = TradeFeeCalculator::new(collaborators.fee_policy.clone());
        let fee_currency = if config.prefer_fee_in_privacy_asset {
            FeeCurrency::Privacy
        } else {
            FeeCurrency::Secondary
        };

        let initial = SessionSnapshot {
            offer_id: offer.id.clone(),
            taker_direction,
            amount: Some(amount),
            offer_min_amount,
            offer_amount,
            max_trade_limit,
            security_deposit,
            fee_estimate: estimator.snapshot(),
            fee_currency,
            taker_fee: None,
            total_network_fee: FixedPointAmount::zero(Asset::Privacy),
            funds_needed: None,
            total_to_pay: None,
            total_to_pay_in_base: None,
            available_balance: FixedPointAmount::zero(Asset::Privacy),
            is_wallet_funded: false,
            min_amount_satisfied: true,
            exceeds_offer_amount: false,
            would_create_dust: false,
        };
        let (state_sender, _) = watch::channel(initial);

        let balance_listener = Some(collaborators.wallet.add_balance_listener(queue));
        let mut session = Self {
            offer,
            rates,
            config,
            collaborators,
            fee_calculator,
            estimator,
            taker_direction,
            offer_amount,
            offer_min_amount,
            security_deposit,
            min_non_dust_output,
            max_trade_limit,
            amount: Some(amount),
            balance_listener,
            state_sender,
        };

        session.recompute()?;
        info!(offer_id = %session.offer.id, %amount, "started take-offer session");
        Ok(session)
    }

    // -----------
    // | Getters |
    // -----------

    /// The latest derived state
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state_sender.borrow().clone()
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> WatchReceiver<SessionSnapshot> {
        self.state_sender.subscribe()
    }

    /// The offer being taken
    pub fn offer(&self) -> &Offer {
        &self.offer
    }

    /// The rates captured at session start
    pub fn rates(&self) -> &RateSnapshot {
        &self.rates
    }

    /// The amount being taken
    pub fn amount(&self) -> Option<FixedPointAmount> {
        self.amount
    }

    /// Whether the fee estimate is frozen
    pub fn is_fee_frozen(&self) -> bool {
        self.estimator.is_frozen()
    }

    /// Whether the secondary asset balance covers the fee computed in the
    /// secondary asset
    pub fn is_taker_fee_valid(&self) -> bool {
        let balance = self.collaborators.wallet.available_confirmed_balance(Asset::Secondary);
        self.fee_calculator.is_secondary_fee_available(
            self.amount,
            self.taker_direction,
            balance,
            &self.rates,
        )
    }

    // --------------
    // | Operations |
    // --------------

    /// Set the amount to take, clamped into the offer's minimum and the trade
    /// limit
    #[instrument(skip(self), fields(offer_id = %self.offer.id))]
    pub fn apply_amount(&mut self, raw: FixedPointAmount) -> Result<(), TakeOfferError> {
        let clamped = clamp_to_limit(raw, self.offer_min_amount, self.max_trade_limit)?;
        if clamped != raw {
            info!(%raw, %clamped, "clamped requested amount into the allowed range");
        }

        self.amount = Some(clamped);
        self.recompute()
    }

    /// Select a payment account, re-reading its trade limit and re-clamping
    /// the amount
    #[instrument(skip(self), fields(offer_id = %self.offer.id))]
    pub fn on_payment_account_selected(
        &mut self,
        account_id: String,
    ) -> Result<(), TakeOfferError> {
        self.max_trade_limit = trade_limit(
            self.collaborators.trade_limits.as_ref(),
            &self.offer,
            Some(&account_id),
            self.taker_direction,
            &self.rates,
        )?;
        self.config.payment_account_id = Some(account_id);

        if let Some(amount) = self.amount {
            self.amount =
                Some(clamp_to_limit(amount, self.offer_min_amount, self.max_trade_limit)?);
        }
        self.recompute()
    }

    /// Change the preferred trading fee currency
    pub fn set_fee_currency_preference(
        &mut self,
        prefer_privacy: bool,
    ) -> Result<(), TakeOfferError> {
        self.config.prefer_fee_in_privacy_asset = prefer_privacy;
        self.recompute()
    }

    /// Apply the result of an asynchronous fee rate request
    ///
    /// Discarded when the estimate froze while the request was in flight
    pub fn on_fee_rate_refreshed(
        &mut self,
        per_byte_rate: FixedPointAmount,
    ) -> Result<(), TakeOfferError> {
        if self.estimator.refresh(per_byte_rate)? {
            self.recompute()?;
        }

        Ok(())
    }

    /// Recompute the totals after a wallet balance change
    ///
    /// Never touches the fee estimate
    pub fn on_balance_changed(&mut self) -> Result<(), TakeOfferError> {
        self.recompute()
    }

    /// The taker is shown the funding screen: estimate the fee from the
    /// wallet's current funding state and freeze it
    #[instrument(skip(self), fields(offer_id = %self.offer.id))]
    pub fn on_show_pay_funds_screen(&mut self) -> Result<(), TakeOfferError> {
        if !self.estimator.is_frozen() {
            let amount = self.require_amount()?;
            let fees = NetworkFees::pinned(self.estimator.estimated_fee());
            let funds_needed = funds_needed_for_trade(
                self.offer.direction,
                amount,
                self.security_deposit,
                &fees,
            )?;
            let trading_fee = self.current_taker_fee()?;
            let funded = self
                .collaborators
                .wallet
                .available_confirmed_balance(Asset::Privacy)
                .is_positive();

            self.estimator.estimate(
                funds_needed,
                trading_fee,
                funded,
                self.collaborators.size_estimator.as_ref(),
                &self.rates,
            )?;
            self.estimator.freeze();
            info!(fee = %self.estimator.estimated_fee(), "froze the network fee estimate");
        }

        self.recompute()
    }

    /// Validate the session and hand the offer to the trade executor
    ///
    /// The callbacks are forwarded untouched; the engine never invokes them
    #[instrument(skip_all, fields(offer_id = %self.offer.id))]
    pub fn take_offer(
        &mut self,
        on_success: TradeResultHandler,
        on_error: ErrorMessageHandler,
    ) -> Result<TakeOfferOutcome, TakeOfferError> {
        let amount = self.require_amount()?;
        let taker_fee = self.current_taker_fee()?;
        let tx_fee = self.estimator.estimated_fee();
        let fees = NetworkFees::pinned(tx_fee);
        let funds_needed =
            funds_needed_for_trade(self.offer.direction, amount, self.security_deposit, &fees)?;

        if let Some(reason) = is_banned(&self.offer, self.collaborators.filter.as_ref()) {
            warn!(%reason, "offer rejected by the filter");
            return Ok(TakeOfferOutcome::Rejected(Rejection::Banned(reason)));
        }

        let snapshot = self.recompute_snapshot()?;
        if !snapshot.min_amount_satisfied {
            return Ok(TakeOfferOutcome::Rejected(Rejection::BelowMinAmount));
        }
        if snapshot.exceeds_offer_amount {
            return Ok(TakeOfferOutcome::Rejected(Rejection::ExceedsOfferAmount));
        }
        if snapshot.would_create_dust {
            return Ok(TakeOfferOutcome::Rejected(Rejection::WouldCreateDust));
        }
        if !snapshot.is_wallet_funded {
            return Ok(TakeOfferOutcome::Rejected(Rejection::InsufficientFunds));
        }

        let request = TakeOfferRequest {
            amount,
            tx_fee,
            taker_fee,
            funds_needed,
            offer: self.offer.clone(),
            payment_account_id: self.config.payment_account_id.clone(),
            on_success,
            on_error,
        };
        self.collaborators.trade_executor.on_take_offer(request);

        info!(%amount, %taker_fee, %funds_needed, "forwarded offer to the trade executor");
        Ok(TakeOfferOutcome::Submitted)
    }

    /// Tear down the session's registrations with its collaborators
    pub fn close(&mut self) {
        if let Some(id) = self.balance_listener.take() {
            self.collaborators.wallet.remove_balance_listener(id);
            self.collaborators.trade_executor.cancel_availability_request(&self.offer);
            info!(offer_id = %self.offer.id, "closed take-offer session");
        }
    }

    // -----------
    // | Helpers |
    // -----------

    /// The amount, failing if it is not set
    fn require_amount(&self) -> Result<FixedPointAmount, TakeOfferError> {
        self.amount.ok_or_else(|| TakeOfferError::MissingPrecondition("amount is not set".into()))
    }

    /// The fee currency actually used for the current state
    fn fee_currency(&self) -> FeeCurrency {
        let balance = self.collaborators.wallet.available_confirmed_balance(Asset::Secondary);
        self.fee_calculator.resolve_fee_currency(
            self.config.prefer_fee_in_privacy_asset,
            self.amount,
            self.taker_direction,
            balance,
            &self.rates,
        )
    }

    /// The trading fee for the current state
    fn current_taker_fee(&self) -> Result<FixedPointAmount, TakeOfferError> {
        self.fee_calculator.taker_fee(
            self.amount,
            self.taker_direction,
            self.fee_currency(),
            &self.rates,
        )
    }

    /// Derive and publish the session's state
    fn recompute(&mut self) -> Result<(), TakeOfferError> {
        self.recompute_snapshot().map(|_| ())
    }

    /// Derive the session's state, publish it and return a copy
    fn recompute_snapshot(&mut self) -> Result<SessionSnapshot, TakeOfferError> {
        let fee_currency = self.fee_currency();
        let taker_fee = match self.amount {
            Some(_) => Some(self.current_taker_fee()?),
            None => None,
        };

        let fees = NetworkFees::pinned(self.estimator.estimated_fee());
        let total_network_fee = fees.total()?;
        let funds_needed = self
            .amount
            .map(|amount| {
                funds_needed_for_trade(self.offer.direction, amount, self.security_deposit, &fees)
            })
            .transpose()?;

        let total = match (self.amount, taker_fee) {
            (Some(amount), Some(fee)) => Some(total_to_pay(
                self.offer.direction,
                amount,
                fee,
                total_network_fee,
                self.security_deposit,
                fee_currency,
            )?),
            _ => None,
        };
        let total_in_base =
            total.map(|t| convert_for_display(t, Asset::Base, &self.rates)).transpose()?;

        let available_balance =
            self.collaborators.wallet.available_confirmed_balance(Asset::Privacy);
        let is_wallet_funded = total.map_or(false, |total| {
            available_balance.checked_cmp(&total).map_or(false, Ordering::is_ge)
        });

        let snapshot = SessionSnapshot {
            offer_id: self.offer.id.clone(),
            taker_direction: self.taker_direction,
            amount: self.amount,
            offer_min_amount: self.offer_min_amount,
            offer_amount: self.offer_amount,
            max_trade_limit: self.max_trade_limit,
            security_deposit: self.security_deposit,
            fee_estimate: self.estimator.snapshot(),
            fee_currency,
            taker_fee,
            total_network_fee,
            funds_needed,
            total_to_pay: total,
            total_to_pay_in_base: total_in_base,
            available_balance,
            is_wallet_funded,
            min_amount_satisfied: is_min_amount_satisfied(Some(self.offer_min_amount), self.amount),
            exceeds_offer_amount: exceeds_offer_amount(self.amount, Some(self.offer_amount)),
            would_create_dust: would_create_dust(
                Some(self.offer_amount),
                self.amount,
                self.min_non_dust_output,
            ),
        };

        self.state_sender.send_replace(snapshot.clone());
        Ok(snapshot)
    }
}

impl Drop for TakeOfferSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// The taker's trade limit converted into the privacy asset
fn trade_limit(
    provider: &dyn TradeLimitProvider,
    offer: &Offer,
    payment_account_id: Option<&str>,
    taker_direction: Direction,
    rates: &RateSnapshot,
) -> Result<FixedPointAmount, TakeOfferError> {
    let limit = provider.my_trade_limit(payment_account_id, &offer.currency_code, taker_direction);
    convert(limit, Asset::Privacy, rates)
}

#[cfg(test)]
mod test {
    use std::sync::{Arc, Mutex};

    use common::types::{
        amount::FixedPointAmount, asset::Asset, fee::FeeCurrency, filter::BanReason,
        offer::Direction,
    };

    use super::{Rejection, TakeOfferOutcome, TakeOfferSession};
    use crate::{
        errors::TakeOfferError,
        jobs::{TakeOfferJob, new_take_offer_queue},
        mocks::{MockEnvironment, mock_collaborators, mock_config, mock_offer},
    };

    /// A privacy asset amount; the mock rates make it equal to the same
    /// number of base asset units
    fn xmr(units: i64) -> FixedPointAmount {
        FixedPointAmount::new(Asset::Privacy, units)
    }

    /// A no-op handler
    fn noop() -> Box<dyn FnOnce(String) + Send> {
        Box::new(|_: String| {})
    }

    /// Build a session over the mock offer and environment
    fn session(env: &MockEnvironment) -> TakeOfferSession {
        let (queue, _recv) = new_take_offer_queue();
        TakeOfferSession::new(mock_offer(), mock_config(), mock_collaborators(env), queue).unwrap()
    }

    /// Tests the initial state of a session
    #[test]
    fn test_initial_state() {
        let env = MockEnvironment::default();
        let session = session(&env);
        let snapshot = session.snapshot();

        // The mock offer is a sell, so the taker buys and locks the buyer
        // deposit
        assert_eq!(snapshot.taker_direction, Direction::Buy);
        assert_eq!(snapshot.security_deposit, xmr(150_000));
        assert_eq!(snapshot.amount, Some(xmr(1_000_000)));
        assert_eq!(snapshot.fee_estimate.estimated_size_bytes, 320);
        assert_eq!(snapshot.total_network_fee, xmr(3 * 3_200));
        assert_eq!(env.wallet.num_listeners(), 1);
    }

    /// Tests that a small amount is raised to the offer's minimum before any
    /// fee is computed
    #[test]
    fn test_apply_amount_clamps_to_min() {
        let env = MockEnvironment::default();
        let mut session = session(&env);

        session.apply_amount(xmr(50_000)).unwrap();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.amount, Some(xmr(100_000)));
        assert!(snapshot.min_amount_satisfied);
        assert_eq!(snapshot.taker_fee, Some(xmr(1_000)));
    }

    /// Tests the trade limit caps the amount and follows account selection
    #[test]
    fn test_trade_limit() {
        let env = MockEnvironment::default();
        env.trade_limits.set_limit(FixedPointAmount::new(Asset::Base, 400_000));
        let mut session = session(&env);
        assert_eq!(session.amount(), Some(xmr(400_000)));

        session.apply_amount(xmr(900_000)).unwrap();
        assert_eq!(session.amount(), Some(xmr(400_000)));

        env.trade_limits.set_limit(FixedPointAmount::new(Asset::Base, 250_000));
        session.on_payment_account_selected("account-2".to_string()).unwrap();
        assert_eq!(session.amount(), Some(xmr(250_000)));
        assert_eq!(session.snapshot().max_trade_limit, xmr(250_000));
    }

    /// Tests the totals for a buying taker
    #[test]
    fn test_total_to_pay() {
        let env = MockEnvironment::default();
        let mut session = session(&env);
        session.apply_amount(xmr(500_000)).unwrap();

        // fee 0.3% of 500_000 = 1_500, network 3 * 3_200, deposit 150_000;
        // the taker receives the amount of a sell offer so it is not fronted
        let snapshot = session.snapshot();
        assert_eq!(snapshot.fee_currency, FeeCurrency::Privacy);
        assert_eq!(snapshot.taker_fee, Some(xmr(1_500)));
        assert_eq!(snapshot.total_to_pay, Some(xmr(1_500 + 9_600 + 150_000)));
        assert_eq!(
            snapshot.total_to_pay_in_base,
            Some(FixedPointAmount::new(Asset::Base, 161_100))
        );
    }

    /// Tests that only a buy offer's totals include the traded amount
    #[test]
    fn test_totals_follow_offer_direction() {
        let env = MockEnvironment::default();

        let mut buy_offer = mock_offer();
        buy_offer.direction = Direction::Buy;
        let (queue, _recv) = new_take_offer_queue();
        let mut buy =
            TakeOfferSession::new(buy_offer, mock_config(), mock_collaborators(&env), queue)
                .unwrap();
        buy.apply_amount(xmr(500_000)).unwrap();

        // The taker sells into a buy offer and locks the seller deposit
        let snapshot = buy.snapshot();
        assert_eq!(snapshot.taker_direction, Direction::Sell);
        assert_eq!(snapshot.security_deposit, xmr(100_000));
        assert_eq!(snapshot.total_to_pay, Some(xmr(500_000 + 1_500 + 9_600 + 100_000)));
        assert_eq!(snapshot.funds_needed, Some(xmr(500_000 + 100_000 + 2 * 3_200)));

        let mut sell = session(&env);
        sell.apply_amount(xmr(500_000)).unwrap();

        let snapshot = sell.snapshot();
        assert_eq!(snapshot.taker_direction, Direction::Buy);
        assert_eq!(snapshot.total_to_pay, Some(xmr(1_500 + 9_600 + 150_000)));
        assert_eq!(snapshot.funds_needed, Some(xmr(150_000 + 2 * 3_200)));
    }

    /// Tests that a refresh after the funding screen never moves the fee
    #[test]
    fn test_refresh_after_freeze() {
        let env = MockEnvironment::default();
        let mut session = session(&env);

        let mut updates = session.subscribe();
        session.on_fee_rate_refreshed(xmr(20)).unwrap();
        assert!(updates.has_changed().unwrap());
        assert_eq!(updates.borrow_and_update().fee_estimate.estimated_fee, xmr(6_400));

        session.on_show_pay_funds_screen().unwrap();
        let frozen = session.snapshot();
        assert!(session.is_fee_frozen());
        assert!(frozen.fee_estimate.frozen);
        assert_eq!(frozen.fee_estimate.estimated_size_bytes, 380);

        session.on_fee_rate_refreshed(xmr(500)).unwrap();
        assert_eq!(session.snapshot().fee_estimate, frozen.fee_estimate);
    }

    /// Tests that a balance change updates the funded flag without touching
    /// the fee estimate
    #[test]
    fn test_balance_changed() {
        let env = MockEnvironment::default();
        let mut session = session(&env);
        let before = session.snapshot();
        assert!(!before.is_wallet_funded);

        env.wallet.set_balance(xmr(10_000_000));
        session.on_balance_changed().unwrap();
        let after = session.snapshot();
        assert!(after.is_wallet_funded);
        assert_eq!(after.fee_estimate, before.fee_estimate);
    }

    /// Tests the fee currency falls back to the privacy asset
    #[test]
    fn test_fee_currency_preference() {
        let env = MockEnvironment::default();
        let mut session = session(&env);

        session.set_fee_currency_preference(false).unwrap();
        assert_eq!(session.snapshot().fee_currency, FeeCurrency::Privacy);
        assert!(!session.is_taker_fee_valid());

        env.wallet.set_secondary_balance(FixedPointAmount::new(Asset::Secondary, 1_000_000));
        session.on_balance_changed().unwrap();
        assert!(session.is_taker_fee_valid());
        assert_eq!(session.snapshot().fee_currency, FeeCurrency::Secondary);
    }

    /// Tests a successful take is forwarded with the computed values
    #[test]
    fn test_take_offer_submitted() {
        let env = MockEnvironment::default();
        env.wallet.set_balance(xmr(10_000_000));
        let mut session = session(&env);

        let outcome = session.take_offer(noop(), noop()).unwrap();
        assert_eq!(outcome, TakeOfferOutcome::Submitted);

        let requests = env.trade_executor.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].amount, xmr(1_000_000));
        assert_eq!(requests[0].funds_needed, xmr(150_000 + 2 * 3_200));
    }

    /// Tests the engine forwards the callbacks without invoking them
    #[test]
    fn test_callbacks_not_invoked() {
        let env = MockEnvironment::default();
        env.wallet.set_balance(xmr(10_000_000));
        let mut session = session(&env);

        let calls = Arc::new(Mutex::new(0));
        let success_calls = calls.clone();
        let on_success = Box::new(move |_: String| *success_calls.lock().unwrap() += 1);
        session.take_offer(on_success, noop()).unwrap();
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    /// Tests the rejection paths of a take
    #[test]
    fn test_take_offer_rejected() {
        let env = MockEnvironment::default();
        let mut session = session(&env);

        let outcome = session.take_offer(noop(), noop()).unwrap();
        assert_eq!(outcome, TakeOfferOutcome::Rejected(Rejection::InsufficientFunds));

        env.wallet.set_balance(xmr(10_000_000));
        session.apply_amount(xmr(999_999)).unwrap();
        let outcome = session.take_offer(noop(), noop()).unwrap();
        assert_eq!(outcome, TakeOfferOutcome::Rejected(Rejection::WouldCreateDust));

        env.filter.lock().unwrap().outdated_version = true;
        let outcome = session.take_offer(noop(), noop()).unwrap();
        let banned = Rejection::Banned(BanReason::VersionOutdated);
        assert_eq!(outcome, TakeOfferOutcome::Rejected(banned));
        assert!(env.trade_executor.requests().is_empty());
    }

    /// Tests that a session over an offer with unusable rates fails
    #[test]
    fn test_invalid_rates() {
        let env = MockEnvironment::default();
        let mut offer = mock_offer();
        offer.extra_data.insert(constants::BASE_TO_PRIVACY_RATE_KEY.to_string(), "-1".into());

        let (queue, _recv) = new_take_offer_queue();
        let res = TakeOfferSession::new(offer, mock_config(), mock_collaborators(&env), queue);
        assert!(matches!(res, Err(TakeOfferError::InvalidRate(_))));
    }

    /// Tests that closing unregisters the listener and cancels availability
    #[test]
    fn test_close() {
        let env = MockEnvironment::default();
        let (queue, mut recv) = new_take_offer_queue();
        let mut session =
            TakeOfferSession::new(mock_offer(), mock_config(), mock_collaborators(&env), queue)
                .unwrap();

        env.wallet.notify_listeners();
        assert!(matches!(recv.try_recv(), Ok(TakeOfferJob::BalanceChanged)));

        session.close();
        session.close();
        assert_eq!(env.wallet.num_listeners(), 0);
        assert_eq!(env.trade_executor.num_cancellations(), 1);

        drop(session);
        assert_eq!(env.trade_executor.num_cancellations(), 1);
    }
}
