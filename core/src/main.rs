//! The entrypoint to the take-offer quote tool
//!
//! Loads an offer, runs a take-offer session against the static environment
//! described by the config, and prints the resulting quote as JSON
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

mod environment;
mod error;
mod quote;

use config::parse_command_line_args;
use tracing::info;

use crate::{
    error::QuoteError,
    quote::{load_offer, run_quote},
};

/// The entrypoint to the quote tool's execution
#[tokio::main]
async fn main() -> Result<(), QuoteError> {
    // Parse command line arguments
    let config = parse_command_line_args().map_err(QuoteError::Config)?;
    config.configure_telemetry();

    let offer = load_offer(&config.offer_file)?;
    info!(offer_id = %offer.id, direction = %offer.direction, "loaded offer");

    let report = run_quote(offer, &config).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
