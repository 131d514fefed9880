//! Defines all jobs accepted by a take-offer session's executor
use common::types::amount::FixedPointAmount;
use tokio::sync::mpsc::{
    UnboundedReceiver as TokioUnboundedReceiver, UnboundedSender as TokioUnboundedSender,
    unbounded_channel,
};
use tokio::sync::oneshot::Sender as TokioSender;

use crate::{
    errors::TakeOfferError,
    session::{SessionSnapshot, TakeOfferOutcome},
};

/// The queue type for a take-offer session
pub type TakeOfferQueue = TokioUnboundedSender<TakeOfferJob>;
/// The queue receiver type for a take-offer session
pub type TakeOfferReceiver = TokioUnboundedReceiver<TakeOfferJob>;

/// Create a new take-offer queue and receiver
pub fn new_take_offer_queue() -> (TakeOfferQueue, TakeOfferReceiver) {
    unbounded_channel()
}

/// The channel on which a job's response is returned
pub type ResponseSender<T> = TokioSender<T>;

/// Invoked by the trade executor once the trade has been taken
pub type TradeResultHandler = Box<dyn FnOnce(String) + Send>;
/// Invoked by the trade executor with a human readable failure reason
pub type ErrorMessageHandler = Box<dyn FnOnce(String) + Send>;

/// All jobs a take-offer session accepts
pub enum TakeOfferJob {
    /// Set the amount to take, clamped into the allowed range
    ApplyAmount {
        /// The raw amount in the privacy asset
        amount: FixedPointAmount,
    },
    /// The taker selected a payment account, re-reading the trade limit
    SelectPaymentAccount {
        /// The id of the selected account
        account_id: String,
    },
    /// Change the preferred trading fee currency
    SetFeeCurrencyPreference {
        /// Whether the taker prefers paying the fee in the privacy asset
        prefer_privacy: bool,
    },
    /// A fee rate request completed
    ///
    /// Discarded if the estimate froze while the request was in flight
    FeeRateRefreshed {
        /// The per-byte rate in the privacy asset
        per_byte_rate: FixedPointAmount,
    },
    /// The wallet's balance changed
    BalanceChanged,
    /// The taker was shown the funding screen, freezing the fee estimate
    ShowPayFundsScreen,
    /// Validate the session and hand the offer to the trade executor
    TakeOffer {
        /// Forwarded to the trade executor for a successful trade
        on_success: TradeResultHandler,
        /// Forwarded to the trade executor for a failed trade
        on_error: ErrorMessageHandler,
        /// The channel on which the engine's decision is returned
        response: ResponseSender<Result<TakeOfferOutcome, TakeOfferError>>,
    },
    /// Peek at the session's current snapshot
    PeekState {
        /// The return channel for the snapshot
        channel: ResponseSender<SessionSnapshot>,
    },
}

impl TakeOfferJob {
    /// A short name for the job, used in logs
    pub fn name(&self) -> &'static str {
        match self {
            TakeOfferJob::ApplyAmount { .. } => "apply-amount",
            TakeOfferJob::SelectPaymentAccount { .. } => "select-payment-account",
            TakeOfferJob::SetFeeCurrencyPreference { .. } => "set-fee-currency-preference",
            TakeOfferJob::FeeRateRefreshed { .. } => "fee-rate-refreshed",
            TakeOfferJob::BalanceChanged => "balance-changed",
            TakeOfferJob::ShowPayFundsScreen => "show-pay-funds-screen",
            TakeOfferJob::TakeOffer { .. } => "take-offer",
            TakeOfferJob::PeekState { .. } => "peek-state",
        }
    }
}
