//! Defines the error type for the take-offer engine

use common::types::{amount::AmountError, asset::Asset};
use thiserror::Error;

/// The error type thrown by the take-offer engine
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TakeOfferError {
    /// A value required by the computation has not been set yet
    #[error("missing precondition: {0}")]
    MissingPrecondition(String),
    /// An exchange rate is non-positive or unparsable
    #[error("invalid rate: {0}")]
    InvalidRate(String),
    /// The requested conversion must go through the privacy asset
    #[error("no direct conversion from {0} to {1}, convert through the privacy asset")]
    UnsupportedConversion(Asset, Asset),
    /// Two amounts of different assets were combined
    #[error("asset mismatch: {0} vs {1}")]
    AssetMismatch(Asset, Asset),
    /// An arithmetic operation overflowed
    #[error("arithmetic overflow: {0}")]
    Overflow(String),
    /// The offer snapshot is malformed
    #[error("invalid offer: {0}")]
    InvalidOffer(String),
    /// An external collaborator failed
    #[error("collaborator error: {0}")]
    Collaborator(String),
    /// The session's job queue was closed
    #[error("job queue closed: {0}")]
    QueueClosed(String),
}

impl From<AmountError> for TakeOfferError {
    fn from(err: AmountError) -> Self {
        match err {
            AmountError::AssetMismatch(lhs, rhs) => TakeOfferError::AssetMismatch(lhs, rhs),
            AmountError::Overflow(op) => TakeOfferError::Overflow(op),
            AmountError::InvalidRate(msg) => TakeOfferError::InvalidRate(msg),
        }
    }
}
