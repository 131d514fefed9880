//! The quote tool's CLI and the parsed engine config

use bigdecimal::BigDecimal;
use clap::Parser;
use common::types::amount::FixedPointAmount;
use serde::{Deserialize, Serialize};
use util::telemetry::{configure_telemetry, level_for};

use crate::parsing::parse_config_from_args;

// -------
// | CLI |
// -------

/// Defines the take-offer quote command line interface
#[derive(Debug, Parser, Serialize, Deserialize)]
#[clap(author, about, long_about = None)]
#[rustfmt::skip]
pub struct Cli {
    // ---------------
    // | Config File |
    // ---------------
    /// A TOML config file to read options from
    #[clap(long, value_parser)]
    pub config_file: Option<String>,

    // ---------------------
    // | Offer and Account |
    // ---------------------

    /// The path to the JSON encoded offer to take
    #[clap(long, value_parser, env = "OFFER_FILE")]
    pub offer_file: String,
    /// The amount to take, in privacy asset atomic units
    ///
    /// Defaults to the offer amount capped by the trade limit
    #[clap(long, value_parser)]
    pub amount: Option<i64>,
    /// The payment account to take the offer with
    #[clap(long, value_parser, default_value = "default")]
    pub payment_account_id: String,
    /// The account's trade limit, in base asset atomic units
    #[clap(long, value_parser, default_value = "100000000")]
    pub max_trade_limit: i64,
    /// The confirmed privacy asset balance of the taker's wallet, in atomic units
    #[clap(long, value_parser, default_value = "0")]
    pub privacy_balance: i64,
    /// The confirmed secondary asset balance of the taker's wallet, in atomic units
    #[clap(long, value_parser, default_value = "0")]
    pub secondary_balance: i64,

    // ----------------
    // | Network Fees |
    // ----------------

    /// The per-byte fee rate used until a quoted rate arrives, in privacy asset atomic units
    #[clap(long, value_parser, default_value_t = constants::DEFAULT_TX_FEE_PER_BYTE)]
    pub default_tx_fee_per_byte: i64,
    /// The quoted per-byte fee rate, in privacy asset atomic units
    ///
    /// If unset, the default rate is kept for the whole session
    #[clap(long, value_parser, env = "FEE_RATE_PER_BYTE")]
    pub fee_rate_per_byte: Option<i64>,
    /// The combined size of the fee and deposit transactions when the wallet is funded
    #[clap(long, value_parser, default_value = "520")]
    pub funded_tx_size_bytes: u32,
    /// The smallest output the base ledger relays, in base asset atomic units
    #[clap(long, value_parser, default_value_t = constants::DEFAULT_MIN_NON_DUST_OUTPUT)]
    pub min_non_dust_output: i64,

    // ----------------
    // | Trading Fees |
    // ----------------

    /// The proportional taker fee when paying in the privacy asset
    #[clap(long, value_parser, default_value = constants::DEFAULT_TAKER_FEE_RATE_PRIVACY)]
    pub taker_fee_rate_privacy: String,
    /// The minimum taker fee when paying in the privacy asset, in atomic units
    #[clap(long, value_parser, default_value_t = constants::DEFAULT_MIN_TAKER_FEE_PRIVACY)]
    pub min_taker_fee_privacy: i64,
    /// The proportional taker fee when paying in the secondary asset
    #[clap(long, value_parser, default_value = constants::DEFAULT_TAKER_FEE_RATE_SECONDARY)]
    pub taker_fee_rate_secondary: String,
    /// The minimum taker fee when paying in the secondary asset, in atomic units
    #[clap(long, value_parser, default_value_t = constants::DEFAULT_MIN_TAKER_FEE_SECONDARY)]
    pub min_taker_fee_secondary: i64,
    /// Prefer paying the taker fee in the secondary asset when its balance allows
    #[clap(long, value_parser)]
    pub pay_fee_in_secondary_asset: bool,

    // ----------
    // | Filter |
    // ----------

    /// Currency codes that may not be traded
    #[clap(long, value_parser)]
    pub banned_currencies: Vec<String>,
    /// Payment methods that may not be used
    #[clap(long, value_parser)]
    pub banned_payment_methods: Vec<String>,
    /// Offer ids that may not be taken
    #[clap(long, value_parser)]
    pub banned_offer_ids: Vec<String>,
    /// Maker node addresses that may not be traded with
    #[clap(long, value_parser)]
    pub banned_node_addresses: Vec<String>,
    /// Block trading until the software is updated
    #[clap(long, value_parser)]
    pub require_update_for_trading: bool,

    // -----------
    // | Actions |
    // -----------

    /// Show the funding screen, freezing the fee estimate before quoting
    #[clap(long, value_parser)]
    pub show_pay_funds_screen: bool,
    /// Take the offer after quoting
    #[clap(long, value_parser)]
    pub take: bool,

    // -------------
    // | Telemetry |
    // -------------

    /// Whether to log at debug level
    #[clap(long, value_parser)]
    pub debug: bool,
    /// Whether to emit logs as JSON
    #[clap(long, value_parser, env = "JSON_LOGS")]
    pub json_logs: bool,
}

// ----------
// | Config |
// ----------

/// The parsed config of the take-offer engine and quote tool
#[derive(Clone, Debug)]
pub struct EngineConfig {
    // ---------------------
    // | Offer and Account |
    // ---------------------
    /// The path to the JSON encoded offer to take
    pub offer_file: String,
    /// The amount to take, in the privacy asset
    pub amount: Option<FixedPointAmount>,
    /// The payment account to take the offer with
    pub payment_account_id: String,
    /// The account's trade limit, in the base asset
    pub max_trade_limit: FixedPointAmount,
    /// The confirmed privacy asset balance of the taker's wallet
    pub privacy_balance: FixedPointAmount,
    /// The confirmed secondary asset balance of the taker's wallet
    pub secondary_balance: FixedPointAmount,

    // ----------------
    // | Network Fees |
    // ----------------
    /// The per-byte fee rate used until a quoted rate arrives
    pub default_tx_fee_per_byte: FixedPointAmount,
    /// The quoted per-byte fee rate
    pub fee_rate_per_byte: Option<FixedPointAmount>,
    /// The combined size of the fee and deposit transactions when funded
    pub funded_tx_size_bytes: u32,
    /// The smallest output the base ledger relays, in the base asset
    pub min_non_dust_output: FixedPointAmount,

    // ----------------
    // | Trading Fees |
    // ----------------
    /// The proportional taker fee when paying in the privacy asset
    pub taker_fee_rate_privacy: BigDecimal,
    /// The minimum taker fee when paying in the privacy asset
    pub min_taker_fee_privacy: FixedPointAmount,
    /// The proportional taker fee when paying in the secondary asset
    pub taker_fee_rate_secondary: BigDecimal,
    /// The minimum taker fee when paying in the secondary asset
    pub min_taker_fee_secondary: FixedPointAmount,
    /// Whether the taker prefers paying the fee in the privacy asset
    pub prefer_fee_in_privacy_asset: bool,

    // ----------
    // | Filter |
    // ----------
    /// Currency codes that may not be traded
    pub banned_currencies: Vec<String>,
    /// Payment methods that may not be used
    pub banned_payment_methods: Vec<String>,
    /// Offer ids that may not be taken
    pub banned_offer_ids: Vec<String>,
    /// Maker node addresses that may not be traded with
    pub banned_node_addresses: Vec<String>,
    /// Whether trading is blocked until the software is updated
    pub require_update_for_trading: bool,

    // -----------
    // | Actions |
    // -----------
    /// Whether to freeze the fee estimate before quoting
    pub show_pay_funds_screen: bool,
    /// Whether to take the offer after quoting
    pub take: bool,

    // -------------
    // | Telemetry |
    // -------------
    /// Whether to log at debug level
    pub debug: bool,
    /// Whether to emit logs as JSON
    pub json_logs: bool,
}

impl EngineConfig {
    /// Configure the logging layers from the config
    pub fn configure_telemetry(&self) {
        configure_telemetry(self.json_logs, level_for(self.debug));
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        // Parse a minimal set of command line args and convert this to a config
        let cli = Cli::parse_from(["take-offer-quote", "--offer-file", "offer.json"]);
        parse_config_from_args(cli).expect("default config does not parse")
    }
}

// ---------
// | Tests |
// ---------
