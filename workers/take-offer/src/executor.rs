//! The executor drives a session from its job queue
//!
//! All session state is mutated from the execution loop only, one job at a
//! time. The asynchronous fee rate request runs on its own task and posts its
//! result back onto the queue, so a response that lands after the funding
//! screen was shown is handled, and discarded, in order behind the freeze.

use std::sync::Arc;

use common::types::CancelChannel;
use tracing::{Instrument, debug, error, info, info_span, instrument, warn};

use crate::{
    collaborators::FeeQuoter,
    errors::TakeOfferError,
    jobs::{TakeOfferJob, TakeOfferQueue, TakeOfferReceiver},
    session::TakeOfferSession,
};

/// Runs a take-offer session's job loop
pub struct TakeOfferExecutor {
    /// The session being driven
    session: TakeOfferSession,
    /// A sender onto the session's own queue, used by the fee request
    job_queue: TakeOfferQueue,
    /// The channel on which jobs are received
    job_receiver: TakeOfferReceiver,
    /// Quotes the network fee rate
    fee_quoter: Arc<dyn FeeQuoter>,
    /// The channel on which the owner may cancel the session
    cancel_channel: CancelChannel,
}

impl TakeOfferExecutor {
    /// Constructor
    pub fn new(
        session: TakeOfferSession,
        job_queue: TakeOfferQueue,
        job_receiver: TakeOfferReceiver,
        fee_quoter: Arc<dyn FeeQuoter>,
        cancel_channel: CancelChannel,
    ) -> Self {
        Self { session, job_queue, job_receiver, fee_quoter, cancel_channel }
    }

    /// The execution loop of the session
    ///
    /// Requests a fee rate, then handles jobs until cancelled. The session is
    /// closed on exit
    pub async fn execution_loop(self) -> Result<(), TakeOfferError> {
        let Self { mut session, job_queue, mut job_receiver, fee_quoter, mut cancel_channel } =
            self;
        spawn_fee_request(fee_quoter, job_queue);

        let res = loop {
            tokio::select! {
                // Dequeue the next job for the session
                job = job_receiver.recv() => {
                    let Some(job) = job else {
                        break Err(TakeOfferError::QueueClosed("all senders dropped".to_string()));
                    };

                    let name = job.name();
                    if let Err(e) = handle_job(&mut session, job) {
                        error!("error handling {name} job: {e}");
                    }
                },

                // Await cancellation by the owner
                _ = cancel_channel.changed() => {
                    info!("take-offer session cancelled, shutting down...");
                    break Ok(());
                }
            }
        };

        session.close();
        res
    }
}

/// Request a fee rate on a separate task, posting the result to the queue
fn spawn_fee_request(fee_quoter: Arc<dyn FeeQuoter>, job_queue: TakeOfferQueue) {
    tokio::spawn(
        async move {
            match fee_quoter.request_fee_rate().await {
                Ok(per_byte_rate) => {
                    let job = TakeOfferJob::FeeRateRefreshed { per_byte_rate };
                    if job_queue.send(job).is_err() {
                        debug!("session closed before the fee rate arrived");
                    }
                },
                Err(e) => warn!("fee rate request failed, keeping the current estimate: {e}"),
            }
        }
        .instrument(info_span!("request_fee_rate")),
    );
}

/// Handle a single job against the session
#[instrument(name = "handle_take_offer_job", skip_all, fields(job = job.name()))]
fn handle_job(session: &mut TakeOfferSession, job: TakeOfferJob) -> Result<(), TakeOfferError> {
    match job {
        TakeOfferJob::ApplyAmount { amount } => session.apply_amount(amount),
        TakeOfferJob::SelectPaymentAccount { account_id } => {
            session.on_payment_account_selected(account_id)
        },
        TakeOfferJob::SetFeeCurrencyPreference { prefer_privacy } => {
            session.set_fee_currency_preference(prefer_privacy)
        },
        TakeOfferJob::FeeRateRefreshed { per_byte_rate } => {
            session.on_fee_rate_refreshed(per_byte_rate)
        },
        TakeOfferJob::BalanceChanged => session.on_balance_changed(),
        TakeOfferJob::ShowPayFundsScreen => session.on_show_pay_funds_screen(),
        TakeOfferJob::TakeOffer { on_success, on_error, response } => {
            let outcome = session.take_offer(on_success, on_error);
            if response.send(outcome).is_err() {
                warn!("take-offer response channel dropped");
            }
            Ok(())
        },
        TakeOfferJob::PeekState { channel } => {
            if channel.send(session.snapshot()).is_err() {
                warn!("peek state response channel dropped");
            }
            Ok(())
        },
    }
}
