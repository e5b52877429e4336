// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later ones win:
//! 1. TOML file (base values)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, StorageFormat, SynmatConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const CONFIG_FILE_NAME: &str = "synmat_configuration.toml";

/// Find the configuration file
///
/// Search order:
/// 1. `SYNMAT_CONFIG_PATH` environment variable
/// 2. Current working directory
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("SYNMAT_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by SYNMAT_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        search_paths.extend(cwd.ancestors().skip(1).take(5).map(|dir| dir.join(CONFIG_FILE_NAME)));
    }

    if let Some(found) = search_paths.iter().find(|path| path.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\n\
         Set SYNMAT_CONFIG_PATH to specify a custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from a TOML file and apply overrides
///
/// `config_path` of `None` searches with [`find_config_file`]. Validation is
/// left to [`crate::validate_config`].
///
/// # Errors
///
/// Returns an error if the file is missing or unreadable, the TOML is invalid,
/// or an override value cannot be parsed.
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<SynmatConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: SynmatConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config)?;
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli)?;
    }

    Ok(config)
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(format!("{} = '{}'", key, value)))
}

/// Apply environment variable overrides
///
/// Supported environment variables:
/// - `SYNMAT_NUM_ROWS` -> `matrix.num_rows`
/// - `SYNMAT_NUM_COLUMNS` -> `matrix.num_columns`
/// - `SYNMAT_FORMAT` -> `storage.format`
/// - `SYNMAT_DEVICE_BACKEND` -> `device.backend` (also enables mirroring)
/// - `SYNMAT_SEED` -> `connectivity.seed`
/// - `SYNMAT_LOG_LEVEL` -> `logging.log_level`
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` naming the variable if a value does not parse.
pub fn apply_environment_overrides(config: &mut SynmatConfig) -> ConfigResult<()> {
    if let Ok(value) = env::var("SYNMAT_NUM_ROWS") {
        config.matrix.num_rows = parse_value("SYNMAT_NUM_ROWS", &value)?;
    }
    if let Ok(value) = env::var("SYNMAT_NUM_COLUMNS") {
        config.matrix.num_columns = parse_value("SYNMAT_NUM_COLUMNS", &value)?;
    }
    if let Ok(value) = env::var("SYNMAT_FORMAT") {
        config.storage.format = StorageFormat::from_str(&value)?;
    }
    if let Ok(value) = env::var("SYNMAT_DEVICE_BACKEND") {
        config.device.backend = value.to_lowercase();
        config.device.enabled = true;
    }
    if let Ok(value) = env::var("SYNMAT_SEED") {
        config.connectivity.seed = Some(parse_value("SYNMAT_SEED", &value)?);
    }
    if let Ok(value) = env::var("SYNMAT_LOG_LEVEL") {
        config.logging.log_level = value;
    }
    Ok(())
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

/// Apply CLI argument overrides
///
/// Keys: `num_rows`, `num_columns`, `format`, `probability`, `count`, `seed`,
/// `device`, `log_level`. Unknown keys are ignored.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` naming the key if a value does not parse.
pub fn apply_cli_overrides(
    config: &mut SynmatConfig,
    cli_args: &HashMap<String, String>,
) -> ConfigResult<()> {
    if let Some(value) = cli_args.get("num_rows") {
        config.matrix.num_rows = parse_value("num_rows", value)?;
    }
    if let Some(value) = cli_args.get("num_columns") {
        config.matrix.num_columns = parse_value("num_columns", value)?;
    }
    if let Some(value) = cli_args.get("format") {
        config.storage.format = StorageFormat::from_str(value)?;
    }
    if let Some(value) = cli_args.get("probability") {
        config.connectivity.probability = parse_value("probability", value)?;
    }
    if let Some(value) = cli_args.get("count") {
        config.connectivity.count = parse_value("count", value)?;
    }
    if let Some(value) = cli_args.get("seed") {
        config.connectivity.seed = Some(parse_value("seed", value)?);
    }
    if let Some(value) = cli_args.get("device") {
        config.device.enabled = parse_flag(value);
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.log_level = value.clone();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const OVERRIDE_VARS: [&str; 6] = [
        "SYNMAT_NUM_ROWS",
        "SYNMAT_NUM_COLUMNS",
        "SYNMAT_FORMAT",
        "SYNMAT_DEVICE_BACKEND",
        "SYNMAT_SEED",
        "SYNMAT_LOG_LEVEL",
    ];

    fn clear_overrides() {
        for var in OVERRIDE_VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom_config.toml");
        File::create(&config_path).unwrap();

        env::set_var("SYNMAT_CONFIG_PATH", config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var("SYNMAT_CONFIG_PATH");

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_missing_env_path_is_file_not_found() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        env::set_var("SYNMAT_CONFIG_PATH", dir.path().join("absent.toml"));
        let result = find_config_file();
        env::remove_var("SYNMAT_CONFIG_PATH");

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_overrides();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[matrix]").unwrap();
        writeln!(file, "num_rows = 64").unwrap();
        writeln!(file, "[storage]").unwrap();
        writeln!(file, "format = \"csrc\"").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.matrix.num_rows, 64);
        assert_eq!(config.matrix.num_columns, 1000);
        assert_eq!(config.storage.format, StorageFormat::Csrc);
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = SynmatConfig::default();

        env::set_var("SYNMAT_NUM_COLUMNS", "250");
        env::set_var("SYNMAT_DEVICE_BACKEND", "WGPU");
        env::set_var("SYNMAT_SEED", "42");
        let result = apply_environment_overrides(&mut config);
        clear_overrides();

        result.unwrap();
        assert_eq!(config.matrix.num_columns, 250);
        assert_eq!(config.device.backend, "wgpu");
        assert!(config.device.enabled);
        assert_eq!(config.connectivity.seed, Some(42));
    }

    #[test]
    fn test_unparsable_environment_value() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = SynmatConfig::default();

        env::set_var("SYNMAT_NUM_ROWS", "many");
        let result = apply_environment_overrides(&mut config);
        clear_overrides();

        match result {
            Err(ConfigError::InvalidValue(msg)) => assert!(msg.contains("SYNMAT_NUM_ROWS")),
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = SynmatConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("format".to_string(), "ell".to_string());
        cli_args.insert("probability".to_string(), "0.5".to_string());
        cli_args.insert("device".to_string(), "yes".to_string());

        apply_cli_overrides(&mut config, &cli_args).unwrap();

        assert_eq!(config.storage.format, StorageFormat::Ell);
        assert_eq!(config.connectivity.probability, 0.5);
        assert!(config.device.enabled);
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_overrides();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[matrix]").unwrap();
        writeln!(file, "num_rows = 10").unwrap();
        writeln!(file, "num_columns = 10").unwrap();

        env::set_var("SYNMAT_NUM_ROWS", "20");
        env::set_var("SYNMAT_NUM_COLUMNS", "20");

        let mut cli_args = HashMap::new();
        cli_args.insert("num_rows".to_string(), "30".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args));
        clear_overrides();
        let config = config.unwrap();

        // CLI wins for rows, env wins for columns
        assert_eq!(config.matrix.num_rows, 30);
        assert_eq!(config.matrix.num_columns, 20);
    }
}
