//! Groups top-level errors of the quote tool

use take_offer::errors::TakeOfferError;
use thiserror::Error;

/// The error type of the quote tool
#[derive(Debug, Error)]
pub enum QuoteError {
    /// The config could not be parsed
    #[error("error parsing config: {0}")]
    Config(String),
    /// The offer file could not be read or decoded
    #[error("error loading offer: {0}")]
    Offer(String),
    /// The take-offer engine failed
    #[error(transparent)]
    TakeOffer(#[from] TakeOfferError),
    /// The session's executor stopped before answering
    #[error("session executor stopped: {0}")]
    Executor(String),
    /// The report could not be encoded
    #[error("error encoding report: {0}")]
    Encode(#[from] serde_json::Error),
}
