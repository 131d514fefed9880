//! Parsing logic for the engine config

use std::{env, str::FromStr};

use bigdecimal::BigDecimal;
use clap::Parser;
use common::types::{amount::FixedPointAmount, asset::Asset};

use crate::{
    Cli, EngineConfig, parsing::config_file::config_file_args, validation::validate_config,
};

pub mod config_file;

/// Parses command line args into the engine config
///
/// We allow for configurations to come from both a config file and overrides
/// on the command line directly. To support this, we first read configuration
/// options from the config file, prepend them to the cli args string, and
/// parse so that cli args (which come after config file args) take
/// precedence.
pub fn parse_command_line_args() -> Result<EngineConfig, String> {
    // The first argument from the command line is the executable name, so
    // place this before all args
    let mut command_line_args: Vec<String> =
        env::args_os().map(|val| val.to_string_lossy().to_string()).collect();
    let config_file_args = config_file_args(&command_line_args)?;

    let mut full_args = vec![command_line_args.remove(0)];
    full_args.extend(config_file_args);
    full_args.extend(command_line_args);

    let cli = Cli::try_parse_from(full_args).map_err(|e| e.to_string())?;
    parse_config_from_args(cli)
}

/// Parse the config from a set of command line arguments
///
/// Separating out this functionality allows us to easily inject custom args
/// apart from what is specified on the command line
pub(crate) fn parse_config_from_args(cli_args: Cli) -> Result<EngineConfig, String> {
    let privacy = |units| FixedPointAmount::new(Asset::Privacy, units);
    let base = |units| FixedPointAmount::new(Asset::Base, units);
    let secondary = |units| FixedPointAmount::new(Asset::Secondary, units);

    let config = EngineConfig {
        offer_file: cli_args.offer_file,
        amount: cli_args.amount.map(privacy),
        payment_account_id: cli_args.payment_account_id,
        max_trade_limit: base(cli_args.max_trade_limit),
        privacy_balance: privacy(cli_args.privacy_balance),
        secondary_balance: secondary(cli_args.secondary_balance),
        default_tx_fee_per_byte: privacy(cli_args.default_tx_fee_per_byte),
        fee_rate_per_byte: cli_args.fee_rate_per_byte.map(privacy),
        funded_tx_size_bytes: cli_args.funded_tx_size_bytes,
        min_non_dust_output: base(cli_args.min_non_dust_output),
        taker_fee_rate_privacy: parse_rate(
            "taker-fee-rate-privacy",
            &cli_args.taker_fee_rate_privacy,
        )?,
        min_taker_fee_privacy: privacy(cli_args.min_taker_fee_privacy),
        taker_fee_rate_secondary: parse_rate(
            "taker-fee-rate-secondary",
            &cli_args.taker_fee_rate_secondary,
        )?,
        min_taker_fee_secondary: secondary(cli_args.min_taker_fee_secondary),
        prefer_fee_in_privacy_asset: !cli_args.pay_fee_in_secondary_asset,
        banned_currencies: cli_args.banned_currencies,
        banned_payment_methods: cli_args.banned_payment_methods,
        banned_offer_ids: cli_args.banned_offer_ids,
        banned_node_addresses: cli_args.banned_node_addresses,
        require_update_for_trading: cli_args.require_update_for_trading,
        show_pay_funds_screen: cli_args.show_pay_funds_screen,
        take: cli_args.take,
        debug: cli_args.debug,
        json_logs: cli_args.json_logs,
    };

    validate_config(&config)?;
    Ok(config)
}

/// Parse a decimal fee rate
fn parse_rate(name: &str, raw: &str) -> Result<BigDecimal, String> {
    BigDecimal::from_str(raw.trim()).map_err(|e| format!("invalid {name} `{raw}`: {e}"))
}
