// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Build the configured sparse store and report its statistics.
//!
//! Loads `synmat_configuration.toml` (or `--config <path>`), applies
//! environment and `key=value` overrides, generates connectivity, builds the
//! store and optionally mirrors it to a device.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use tracing::info;

use synmat::config::{load_config, validate_config};
use synmat::observability::{debug_flags_help, parse_debug_flags};
use synmat::report;

struct Args {
    config_path: Option<PathBuf>,
    overrides: HashMap<String, String>,
    json: bool,
}

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: matrix_report [--config <path>] [--json] [key=value ...] [--debug-<crate>]\n\n\
         Override keys: num_rows, num_columns, format, probability, count, seed, device, \
         log_level\n\n\
         {}",
        debug_flags_help()
    );
    process::exit(2);
}

fn parse_args() -> Args {
    let mut args = Args {
        config_path: None,
        overrides: HashMap::new(),
        json: false,
    };

    let mut raw = env::args().skip(1);
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--config" => {
                let v = raw.next().unwrap_or_else(|| usage_and_exit());
                args.config_path = Some(PathBuf::from(v));
            }
            "--json" => args.json = true,
            "-h" | "--help" => usage_and_exit(),
            other if other.starts_with("--debug-") => {}
            other => match other.split_once('=') {
                Some((key, value)) => {
                    args.overrides.insert(key.to_string(), value.to_string());
                }
                None => {
                    eprintln!("Unknown argument: {other}");
                    usage_and_exit();
                }
            },
        }
    }

    args
}

fn main() -> Result<()> {
    let args = parse_args();

    let config = load_config(args.config_path.as_deref(), Some(&args.overrides))
        .context("failed to load configuration")?;

    let flags = parse_debug_flags().with_default_level(config.logging.log_level.as_str());

    #[cfg(feature = "file-logging")]
    let _guard = match &config.logging.log_dir {
        Some(dir) => Some(synmat::observability::init_logging(
            &flags,
            dir,
            synmat::observability::LogRetention::default(),
        )?),
        None => {
            synmat::observability::init_console_logging(&flags)?;
            None
        }
    };
    #[cfg(not(feature = "file-logging"))]
    synmat::observability::init_console_logging(&flags)?;

    validate_config(&config)?;

    info!(
        format = %config.storage.format,
        rows = config.matrix.num_rows,
        columns = config.matrix.num_columns,
        index = %config.storage.column_index_width,
        pointer = %config.storage.row_pointer_width,
        "building store"
    );

    let report = report::run(&config)?;
    info!("statistics:\n{}", report.statistics);
    info!(bytes = report.size_in_bytes, "host structure size");
    if let Some(device) = &report.device {
        info!(
            device = %device.device,
            arrays = ?device.arrays,
            bytes = device.bytes,
            "device mirror"
        );
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}
