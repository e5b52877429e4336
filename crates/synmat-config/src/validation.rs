// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Hard violations are collected and reported together. Index widths that
//! only overflow for very dense connectivity are warnings.

use std::fmt;

use tracing::warn;

use crate::{ConfigError, ConfigResult, ConnectivityRule, SynmatConfig};

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    ZeroDimension { field: String },
    WidthTooNarrow { field: String, value: usize, width: String },
    InvalidValue { field: String, reason: String },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroDimension { field } => write!(f, "{} must be non-zero", field),
            Self::WidthTooNarrow { field, value, width } => {
                write!(f, "{} = {} does not fit column_index_width {}", field, value, width)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - Non-zero dimensions
/// - Dimensions representable in `storage.column_index_width`
/// - Connectivity parameters in range
/// - A known device backend
///
/// Capacity warnings from [`capacity_warnings`] are logged, not returned.
///
/// # Errors
///
/// Returns `ConfigError::Validation` listing every violation
pub fn validate_config(config: &SynmatConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_dimensions(config, &mut errors);
    validate_connectivity(config, &mut errors);
    validate_device(config, &mut errors);

    for warning in capacity_warnings(config) {
        warn!("{}", warning);
    }

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::Validation(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

/// Non-fatal capacity concerns
///
/// `row_pointer_width` has to hold the total entry count. The worst case is a
/// dense matrix, `num_rows * num_columns`; sparse connectivity usually stays
/// far below that, so this is reported rather than enforced.
pub fn capacity_warnings(config: &SynmatConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    let rows = config.matrix.num_rows as u128;
    let columns = config.matrix.num_columns as u128;
    let worst_case = rows * columns;
    let width = config.storage.row_pointer_width;

    if worst_case > u128::from(width.max_value()) {
        warnings.push(format!(
            "row_pointer_width {} cannot hold a dense {} x {} matrix ({} entries); \
             builds with more than {} entries will fail",
            width,
            config.matrix.num_rows,
            config.matrix.num_columns,
            worst_case,
            width.max_value()
        ));
    }
    warnings
}

fn validate_dimensions(config: &SynmatConfig, errors: &mut Vec<ConfigValidationError>) {
    let width = config.storage.column_index_width;
    let dimensions = [
        ("matrix.num_rows", config.matrix.num_rows),
        ("matrix.num_columns", config.matrix.num_columns),
    ];

    for (field, value) in dimensions {
        if value == 0 {
            errors.push(ConfigValidationError::ZeroDimension {
                field: field.to_string(),
            });
        } else if !width.holds_indices(value as u64) {
            errors.push(ConfigValidationError::WidthTooNarrow {
                field: field.to_string(),
                value,
                width: width.to_string(),
            });
        }
    }
}

fn validate_connectivity(config: &SynmatConfig, errors: &mut Vec<ConfigValidationError>) {
    let connectivity = &config.connectivity;
    match connectivity.rule {
        ConnectivityRule::FixedProbability => {
            if !(0.0..=1.0).contains(&connectivity.probability) {
                errors.push(ConfigValidationError::InvalidValue {
                    field: "connectivity.probability".to_string(),
                    reason: "must be between 0.0 and 1.0".to_string(),
                });
            }
        }
        ConnectivityRule::FixedCount => {
            if connectivity.count > config.matrix.num_columns {
                errors.push(ConfigValidationError::InvalidValue {
                    field: "connectivity.count".to_string(),
                    reason: format!(
                        "{} exceeds matrix.num_columns ({})",
                        connectivity.count, config.matrix.num_columns
                    ),
                });
            }
        }
    }
}

fn validate_device(config: &SynmatConfig, errors: &mut Vec<ConfigValidationError>) {
    if !matches!(config.device.backend.as_str(), "host" | "wgpu" | "cuda") {
        errors.push(ConfigValidationError::InvalidValue {
            field: "device.backend".to_string(),
            reason: "must be 'host', 'wgpu' or 'cuda'".to_string(),
        });
    }
}
