// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to a section of `synmat_configuration.toml`. Every field
//! has a default so partial files are accepted.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SynmatConfig {
    pub matrix: MatrixConfig,
    pub storage: StorageConfig,
    pub connectivity: ConnectivityConfig,
    pub device: DeviceSettings,
    pub logging: LoggingConfig,
}

/// Matrix dimensions
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MatrixConfig {
    /// Target (post-synaptic) population size
    pub num_rows: usize,
    /// Source (pre-synaptic) population size
    pub num_columns: usize,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            num_rows: 1000,
            num_columns: 1000,
        }
    }
}

/// Which store to build and with which index widths
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub format: StorageFormat,
    /// Only read when `format = "ell"`
    pub ell_layout: EllLayoutSetting,
    /// Width of ranks and per-entry column indices
    pub column_index_width: IndexWidth,
    /// Width of cumulative row/column offsets
    pub row_pointer_width: IndexWidth,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            format: StorageFormat::Csr,
            ell_layout: EllLayoutSetting::RowMajor,
            column_index_width: IndexWidth::U32,
            row_pointer_width: IndexWidth::U32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageFormat {
    Csr,
    Csrc,
    Ell,
}

impl StorageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageFormat::Csr => "csr",
            StorageFormat::Csrc => "csrc",
            StorageFormat::Ell => "ell",
        }
    }
}

impl FromStr for StorageFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csr" => Ok(StorageFormat::Csr),
            "csrc" => Ok(StorageFormat::Csrc),
            "ell" | "ellpack" => Ok(StorageFormat::Ell),
            other => Err(ConfigError::InvalidValue(format!(
                "unknown storage format '{}' (expected csr, csrc or ell)",
                other
            ))),
        }
    }
}

impl fmt::Display for StorageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EllLayoutSetting {
    RowMajor,
    ColumnMajor,
}

/// Unsigned integer width for index arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexWidth {
    U8,
    U16,
    U32,
    U64,
}

impl IndexWidth {
    /// Largest representable value
    pub fn max_value(&self) -> u64 {
        match self {
            IndexWidth::U8 => u64::from(u8::MAX),
            IndexWidth::U16 => u64::from(u16::MAX),
            IndexWidth::U32 => u64::from(u32::MAX),
            IndexWidth::U64 => u64::MAX,
        }
    }

    /// True if indices `0..count` are all representable
    pub fn holds_indices(&self, count: u64) -> bool {
        count == 0 || count - 1 <= self.max_value()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IndexWidth::U8 => "u8",
            IndexWidth::U16 => "u16",
            IndexWidth::U32 => "u32",
            IndexWidth::U64 => "u64",
        }
    }
}

impl fmt::Display for IndexWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the initial List Input is generated
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    pub rule: ConnectivityRule,
    /// Inclusion probability for `fixed_probability`
    pub probability: f64,
    /// Entries per row for `fixed_count`
    pub count: usize,
    pub allow_self_connections: bool,
    /// Fixed seed; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            rule: ConnectivityRule::FixedProbability,
            probability: 0.1,
            count: 10,
            allow_self_connections: true,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivityRule {
    FixedCount,
    FixedProbability,
}

/// Device mirroring settings
///
/// `backend` is kept as a string here and parsed by the device crate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DeviceSettings {
    pub enabled: bool,
    /// "host", "wgpu" or "cuda"
    pub backend: String,
    pub device_index: usize,
    /// Cap for the host-emulated device
    pub memory_limit_bytes: Option<usize>,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            backend: "host".to_string(),
            device_index: 0,
            memory_limit_bytes: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when no `RUST_LOG` is set
    pub log_level: String,
    /// Directory for per-run log files (file logging builds only)
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_width_capacity() {
        assert!(IndexWidth::U8.holds_indices(256));
        assert!(!IndexWidth::U8.holds_indices(257));
        assert!(IndexWidth::U16.holds_indices(0));
        assert!(IndexWidth::U64.holds_indices(u64::MAX));
    }

    #[test]
    fn test_storage_format_from_str() {
        assert_eq!("CSRC".parse::<StorageFormat>().unwrap(), StorageFormat::Csrc);
        assert_eq!("ellpack".parse::<StorageFormat>().unwrap(), StorageFormat::Ell);
        assert!(matches!(
            "coo".parse::<StorageFormat>(),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_partial_sections_use_defaults() {
        let config: SynmatConfig = toml::from_str(
            r#"
            [storage]
            format = "ell"
            ell_layout = "column_major"
            column_index_width = "u16"
            "#,
        )
        .unwrap();
        assert_eq!(config.storage.format, StorageFormat::Ell);
        assert_eq!(config.storage.ell_layout, EllLayoutSetting::ColumnMajor);
        assert_eq!(config.storage.column_index_width, IndexWidth::U16);
        assert_eq!(config.storage.row_pointer_width, IndexWidth::U32);
        assert_eq!(config.matrix, MatrixConfig::default());
    }
}
