//! Groups configurations used by the take-offer engine and its quote tool
//!
//! Options may be given on the command line, through the environment, or in
//! a TOML config file passed as `--config-file`. Command line arguments take
//! precedence over the config file.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

mod cli;
pub mod parsing;
mod validation;

pub use cli::{Cli, EngineConfig};
pub use parsing::{config_file::parse_config_from_file, parse_command_line_args};
