//! The take-offer engine computes, before any funds move, the exact amount a
//! taker must reserve to accept an offer: the trade amount, the network fees
//! of the dependent transactions, the security deposit and the trading fee.
//!
//! The pure calculators live in their own modules; the session sequences them
//! across the lifetime of a single take-offer attempt and the executor drives
//! the session from a job queue on a single logical execution context.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod collaborators;
pub mod converter;
pub mod errors;
pub mod executor;
pub mod fee_estimator;
pub mod jobs;
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
pub mod session;
pub mod total_payable;
pub mod trade_fee;
pub mod validation;
