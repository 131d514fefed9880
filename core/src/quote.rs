//! Runs a single take-offer session and collects its quote

use std::fs;

use common::types::{amount::FixedPointAmount, new_cancel_channel, offer::Offer};
use config::EngineConfig;
use serde::Serialize;
use take_offer::{
    errors::TakeOfferError,
    executor::TakeOfferExecutor,
    jobs::{TakeOfferJob, TakeOfferQueue, new_take_offer_queue},
    session::{SessionSnapshot, TakeOfferConfig, TakeOfferOutcome, TakeOfferSession},
};
use tokio::sync::oneshot;
use tracing::{error, info};
use util::err_str;

use crate::{environment::build_environment, error::QuoteError};

/// The quote printed by the tool
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteReport {
    /// The session state once all requested actions ran
    pub snapshot: SessionSnapshot,
    /// The engine's decision, if the offer was taken
    pub outcome: Option<TakeOfferOutcome>,
}

/// Read and decode a JSON offer
pub fn load_offer(path: &str) -> Result<Offer, QuoteError> {
    let contents = fs::read_to_string(path).map_err(err_str!(QuoteError::Offer))?;
    serde_json::from_str(&contents).map_err(err_str!(QuoteError::Offer))
}

/// Quote the offer in the environment described by the config
pub async fn run_quote(offer: Offer, config: &EngineConfig) -> Result<QuoteReport, QuoteError> {
    let rates = offer.rate_snapshot().map_err(TakeOfferError::from)?;
    let (collaborators, fee_quoter) = build_environment(config, rates);
    let session_config = TakeOfferConfig {
        default_tx_fee_per_byte: config.default_tx_fee_per_byte,
        min_non_dust_output: config.min_non_dust_output,
        prefer_fee_in_privacy_asset: config.prefer_fee_in_privacy_asset,
        payment_account_id: Some(config.payment_account_id.clone()),
    };

    let (job_queue, job_receiver) = new_take_offer_queue();
    let session = TakeOfferSession::new(offer, session_config, collaborators, job_queue.clone())?;

    let (cancel_sender, cancel_channel) = new_cancel_channel();
    let executor = TakeOfferExecutor::new(
        session,
        job_queue.clone(),
        job_receiver,
        fee_quoter,
        cancel_channel,
    );
    let handle = tokio::spawn(executor.execution_loop());

    let report = drive_session(&job_queue, config).await;

    // Stop the executor whether or not the session was driven to completion
    if cancel_sender.send(()).is_err() {
        error!("executor exited before cancellation");
    }
    match handle.await {
        Ok(res) => res?,
        Err(e) => return Err(QuoteError::Executor(e.to_string())),
    }

    report
}

/// Send the requested actions to the session and collect the quote
async fn drive_session(
    job_queue: &TakeOfferQueue,
    config: &EngineConfig,
) -> Result<QuoteReport, QuoteError> {
    if let Some(amount) = config.amount {
        send(job_queue, TakeOfferJob::ApplyAmount { amount })?;
    }
    if config.show_pay_funds_screen {
        send(job_queue, TakeOfferJob::ShowPayFundsScreen)?;
    }

    let snapshot = peek(job_queue).await?;
    log_quote(&snapshot);

    let outcome = if config.take { Some(take(job_queue).await?) } else { None };
    Ok(QuoteReport { snapshot, outcome })
}

/// Enqueue a job
fn send(job_queue: &TakeOfferQueue, job: TakeOfferJob) -> Result<(), QuoteError> {
    job_queue.send(job).map_err(|_| QuoteError::Executor("job queue closed".to_string()))
}

/// Fetch the session's current snapshot
async fn peek(job_queue: &TakeOfferQueue) -> Result<SessionSnapshot, QuoteError> {
    let (channel, recv) = oneshot::channel();
    send(job_queue, TakeOfferJob::PeekState { channel })?;
    recv.await.map_err(err_str!(QuoteError::Executor))
}

/// Take the offer and await the engine's decision
async fn take(job_queue: &TakeOfferQueue) -> Result<TakeOfferOutcome, QuoteError> {
    let (response, recv) = oneshot::channel();
    let job = TakeOfferJob::TakeOffer {
        on_success: Box::new(|trade_id: String| info!(%trade_id, "trade taken")),
        on_error: Box::new(|reason: String| error!(%reason, "trade failed")),
        response,
    };
    send(job_queue, job)?;

    let outcome = recv.await.map_err(err_str!(QuoteError::Executor))??;
    Ok(outcome)
}

/// Log the headline figures of a quote
fn log_quote(snapshot: &SessionSnapshot) {
    let fmt_amount = |amount: Option<FixedPointAmount>| {
        amount.map(|a| a.to_string()).unwrap_or_else(|| "n/a".to_string())
    };

    info!(
        offer_id = %snapshot.offer_id,
        amount = %fmt_amount(snapshot.amount),
        total_to_pay = %fmt_amount(snapshot.total_to_pay),
        total_to_pay_in_base = %fmt_amount(snapshot.total_to_pay_in_base),
        funded = snapshot.is_wallet_funded,
        "quoted offer"
    );
}

#[cfg(test)]
mod test {
    use std::{fs::File, io::Write};

    use common::types::{amount::FixedPointAmount, asset::Asset, offer::Direction};
    use config::EngineConfig;
    use take_offer::{mocks::mock_offer, session::{Rejection, TakeOfferOutcome}};
    use tempfile::tempdir;

    use super::{load_offer, run_quote};

    /// A privacy asset amount
    fn xmr(units: i64) -> FixedPointAmount {
        FixedPointAmount::new(Asset::Privacy, units)
    }

    /// Tests that an offer round trips through its JSON file
    #[test]
    fn test_load_offer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("offer.json");
        let mut file = File::create(&path).unwrap();
        file.write_all(serde_json::to_string(&mock_offer()).unwrap().as_bytes()).unwrap();

        let offer = load_offer(path.to_str().unwrap()).unwrap();
        assert_eq!(offer, mock_offer());
        assert!(load_offer("missing-offer.json").is_err());
    }

    /// Tests a quote without taking the offer
    #[tokio::test]
    async fn test_quote_only() {
        let config = EngineConfig::default();
        let report = run_quote(mock_offer(), &config).await.unwrap();

        assert_eq!(report.snapshot.taker_direction, Direction::Buy);
        assert_eq!(report.snapshot.amount, Some(xmr(1_000_000)));
        assert!(report.outcome.is_none());

        // The taker receives the amount of a sell offer, so it is not fronted
        let total = report.snapshot.total_to_pay.unwrap();
        assert!(total < xmr(1_000_000));
    }

    /// Tests that taking with an empty wallet is rejected
    #[tokio::test]
    async fn test_take_unfunded() {
        let mut config = EngineConfig::default();
        config.take = true;

        let report = run_quote(mock_offer(), &config).await.unwrap();
        assert_eq!(report.outcome, Some(TakeOfferOutcome::Rejected(Rejection::InsufficientFunds)));
    }

    /// Tests taking a funded offer at a chosen amount
    #[tokio::test]
    async fn test_take_funded() {
        let mut config = EngineConfig::default();
        config.amount = Some(xmr(1_000_000));
        config.privacy_balance = xmr(1_000_000_000_000);
        config.show_pay_funds_screen = true;
        config.take = true;

        let report = run_quote(mock_offer(), &config).await.unwrap();
        assert!(report.snapshot.fee_estimate.frozen);
        assert!(report.snapshot.is_wallet_funded);
        assert_eq!(report.outcome, Some(TakeOfferOutcome::Submitted));
    }

    /// Tests that a banned currency blocks the take
    #[tokio::test]
    async fn test_take_banned() {
        let mut config = EngineConfig::default();
        config.banned_currencies = vec!["EUR".to_string()];
        config.privacy_balance = xmr(1_000_000_000_000);
        config.take = true;

        let report = run_quote(mock_offer(), &config).await.unwrap();
        assert!(matches!(report.outcome, Some(TakeOfferOutcome::Rejected(Rejection::Banned(_)))));
    }
}
