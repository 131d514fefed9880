//! Defines system-wide constants for the take-offer engine

#![deny(unsafe_code)]
#![deny(clippy::missing_docs_in_private_items)]
#![deny(missing_docs)]

// ------------------
// | Asset Decimals |
// ------------------

/// The number of decimals in the base ledger asset (BTC), i.e. satoshis
pub const BASE_ASSET_DECIMALS: u32 = 8;

/// The number of decimals in the secondary ledger asset (BSQ)
pub const SECONDARY_ASSET_DECIMALS: u32 = 2;

/// The number of decimals in the privacy asset (XMR), i.e. piconero
pub const PRIVACY_ASSET_DECIMALS: u32 = 12;

/// The ticker of the base asset
pub const BASE_ASSET_TICKER: &str = "BTC";
/// The ticker of the secondary asset
pub const SECONDARY_ASSET_TICKER: &str = "BSQ";
/// The ticker of the privacy asset
pub const PRIVACY_ASSET_TICKER: &str = "XMR";

// -------------------
// | Offer Metadata |
// -------------------

/// The offer metadata key holding the base -> privacy asset rate
pub const BASE_TO_PRIVACY_RATE_KEY: &str = "btcToXmrRate";

/// The offer metadata key holding the secondary -> privacy asset rate
pub const SECONDARY_TO_PRIVACY_RATE_KEY: &str = "bsqToXmrRate";

// ---------------------
// | Transaction Sizes |
// ---------------------

/// The default size of the taker fee transaction, in bytes
///
/// A one-input trade fee tx is ~260 bytes while the deposit and payout txs
/// range from 336 to 414 bytes, 320 is used as their average
pub const DEFAULT_FEE_TX_SIZE_BYTES: u32 = 320;

/// The size assumed for the fee transaction when the wallet holds no
/// confirmed funds to estimate from
pub const UNFUNDED_FEE_TX_SIZE_BYTES: u32 = 380;

// ------------------------
// | Default Fee Policy |
// ------------------------

/// The default network fee rate, in privacy asset atomic units per byte
pub const DEFAULT_TX_FEE_PER_BYTE: i64 = 20_000;

/// The default taker fee rate when paying in the privacy asset
pub const DEFAULT_TAKER_FEE_RATE_PRIVACY: &str = "0.003";

/// The default minimum taker fee in the privacy asset, in atomic units
pub const DEFAULT_MIN_TAKER_FEE_PRIVACY: i64 = 5_000_000_000;

/// The default taker fee rate when paying in the secondary asset
pub const DEFAULT_TAKER_FEE_RATE_SECONDARY: &str = "0.0015";

/// The default minimum taker fee in the secondary asset, in atomic units
pub const DEFAULT_MIN_TAKER_FEE_SECONDARY: i64 = 5;

/// The smallest output on the base ledger that is not considered dust, in
/// base asset atomic units
pub const DEFAULT_MIN_NON_DUST_OUTPUT: i64 = 546;
