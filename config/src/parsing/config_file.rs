//! Parsing logic for a separate engine config file

use std::fs;

use clap::Parser;
use toml::{Value, map::Map};

use crate::{Cli, EngineConfig, parsing::parse_config_from_args};

/// The CLI argument name for the config file
const CONFIG_FILE_ARG: &str = "--config-file";

/// Parse args from a config file
pub(crate) fn config_file_args(cli_args: &[String]) -> Result<Vec<String>, String> {
    // If we find "--config-file", the next argument is the file to read from
    let index = match cli_args.iter().position(|arg| arg == CONFIG_FILE_ARG) {
        Some(index) => index + 1,
        None => return Ok(vec![]),
    };

    let path = cli_args
        .get(index)
        .ok_or_else(|| format!("{CONFIG_FILE_ARG} requires a path"))?;
    read_config_file(path)
}

/// Parse a config entirely from a file
pub fn parse_config_from_file(path: &str) -> Result<EngineConfig, String> {
    let mut file_args = read_config_file(path)?;
    file_args.insert(0, "dummy-program-name".to_string());
    let cli = Cli::try_parse_from(file_args).map_err(|e| e.to_string())?;
    parse_config_from_args(cli)
}

/// Parse a config file
fn read_config_file(path: &str) -> Result<Vec<String>, String> {
    // Read in the config file
    let file_contents = fs::read_to_string(path).map_err(|err| err.to_string())?;
    let config_kv_pairs: Map<_, _> =
        toml::from_str(&file_contents).map_err(|err| err.to_string())?;

    let mut config_file_args: Vec<String> = Vec::with_capacity(config_kv_pairs.len());
    for (toml_key, value) in config_kv_pairs.iter() {
        // Format the TOML key into --key
        let cli_arg = format!("--{}", toml_key);
        let cli_values = parse_toml_value(cli_arg, value)?;
        config_file_args.extend(cli_values);
    }

    Ok(config_file_args)
}

// ----------------
// | TOML Parsing |
// ----------------

/// Parse a toml value into a list of strings to append to the CLI args
fn parse_toml_value(cli_arg: String, val: &Value) -> Result<Vec<String>, String> {
    let values: Vec<String> = match val {
        Value::Boolean(b) => toml_boolean_to_args(cli_arg, *b),
        Value::Array(arr) => toml_array_to_args(&cli_arg, arr)?,
        x => vec![cli_arg, toml_value_to_string(x)?],
    };

    Ok(values)
}

/// Parse a toml boolean into a string that is CLI compatible
///
/// This will be "--key" if the boolean is true, otherwise it will be empty
fn toml_boolean_to_args(cli_arg: String, b: bool) -> Vec<String> {
    if b { vec![cli_arg] } else { vec![] }
}

/// Parse a toml array into "--arg val1 --arg val2 --arg val3"
///
/// We assume that the array has no nested arrays
fn toml_array_to_args(cli_arg: &str, arr: &[Value]) -> Result<Vec<String>, String> {
    let mut res: Vec<String> = Vec::new();
    for val in arr.iter() {
        res.push(cli_arg.to_string());
        res.push(toml_value_to_string(val)?);
    }

    Ok(res)
}

/// Helper method to convert a toml value to a string
///
/// Fee rates are decimals and must be quoted in the file so that no precision
/// is lost to a float
fn toml_value_to_string(val: &Value) -> Result<String, String> {
    Ok(match val {
        Value::String(val) => val.clone(),
        Value::Integer(val) => format!("{:?}", val),
        Value::Boolean(val) => format!("{:?}", val),
        Value::Float(_) => {
            return Err("float values are not supported, quote decimals as strings".to_string());
        },
        _ => {
            return Err("unsupported value".to_string());
        },
    })
}

#[cfg(test)]
mod test {
    use std::{fs::File, io::Write};

    use common::types::{amount::FixedPointAmount, asset::Asset};
    use tempfile::{TempDir, tempdir};

    use super::{config_file_args, parse_config_from_file};

    /// Write a config file into a fresh temp dir
    ///
    /// The dir must be kept alive by the caller so the file is not removed
    fn write_config(contents: &str) -> (TempDir, String) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml").to_str().unwrap().to_string();
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();

        (dir, path)
    }

    /// Tests parsing a full config from a file
    #[test]
    fn test_parse_config_file() {
        let (_dir, path) = write_config(
            r#"
            offer-file = "offer.json"
            amount = 400000
            taker-fee-rate-privacy = "0.002"
            banned-currencies = ["EUR", "USD"]
            require-update-for-trading = true
            debug = false
            "#,
        );

        let config = parse_config_from_file(&path).unwrap();
        assert_eq!(config.amount, Some(FixedPointAmount::new(Asset::Privacy, 400_000)));
        assert_eq!(config.taker_fee_rate_privacy.to_string(), "0.002");
        assert_eq!(config.banned_currencies.len(), 2);
        assert!(config.require_update_for_trading);
        assert!(!config.debug);
    }

    /// Tests that config file args are placed so the command line wins
    #[test]
    fn test_config_file_args() {
        let (_dir, path) = write_config("amount = 1\nshow-pay-funds-screen = true\n");
        let cli_args =
            vec!["quote".to_string(), "--config-file".to_string(), path, "--amount".into()];

        let args = config_file_args(&cli_args).unwrap();
        assert_eq!(args, vec!["--amount", "1", "--show-pay-funds-screen"]);
        assert!(config_file_args(&["quote".to_string()]).unwrap().is_empty());
    }

    /// Tests that float values are rejected
    #[test]
    fn test_float_rejected() {
        let (_dir, path) =
            write_config("offer-file = \"offer.json\"\ntaker-fee-rate-privacy = 0.1\n");
        assert!(parse_config_from_file(&path).is_err());
    }
}
