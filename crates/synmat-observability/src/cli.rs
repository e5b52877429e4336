// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-crate debug flags
//!
//! Supports flags like `--debug-synmat-sparse` and `--debug-all`, plus the
//! `SYNMAT_DEBUG` environment variable.

use std::collections::BTreeSet;
use std::env;

use crate::KNOWN_CRATES;

/// Crates with debug logging enabled, plus the level for everything else
///
/// # Example
/// ```rust
/// use synmat_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(vec!["--debug-synmat-device".to_string()]);
/// assert!(flags.is_enabled("synmat-device"));
/// assert_eq!(flags.to_filter_string(), "synmat_device=debug,info");
/// ```
#[derive(Debug, Clone)]
pub struct CrateDebugFlags {
    enabled_crates: BTreeSet<String>,
    default_level: String,
}

impl Default for CrateDebugFlags {
    fn default() -> Self {
        Self {
            enabled_crates: BTreeSet::new(),
            default_level: "info".to_string(),
        }
    }
}

impl CrateDebugFlags {
    /// Parse `--debug-{crate-name}` and `--debug-all` from arguments
    ///
    /// Other arguments are ignored.
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = Self::default();
        for arg in args {
            if arg == "--debug-all" {
                flags.enable_all();
            } else if let Some(crate_name) = arg.strip_prefix("--debug-") {
                flags.enable(crate_name);
            }
        }
        flags
    }

    /// Level for crates without a debug flag
    pub fn with_default_level(mut self, level: impl Into<String>) -> Self {
        self.default_level = level.into().to_lowercase();
        self
    }

    pub fn enable(&mut self, crate_name: &str) {
        self.enabled_crates.insert(crate_name.to_string());
    }

    pub fn enable_all(&mut self) {
        for crate_name in KNOWN_CRATES {
            self.enable(crate_name);
        }
    }

    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains(crate_name)
    }

    pub fn enabled_crates(&self) -> impl Iterator<Item = &str> {
        self.enabled_crates.iter().map(String::as_str)
    }

    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// `DEBUG` if enabled, `INFO` otherwise
    pub fn log_level(&self, crate_name: &str) -> tracing::Level {
        if self.is_enabled(crate_name) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Directive string for `EnvFilter`
    ///
    /// Tracing targets use the module path, so crate names are written with
    /// underscores: `synmat_sparse=debug,info`.
    pub fn to_filter_string(&self) -> String {
        let mut filters: Vec<String> = self
            .enabled_crates
            .iter()
            .map(|name| format!("{}=debug", name.replace('-', "_")))
            .collect();
        filters.push(self.default_level.clone());
        filters.join(",")
    }
}

/// Flags from the process arguments and `SYNMAT_DEBUG`
///
/// `SYNMAT_DEBUG` is a comma-separated list of crate names, or `all`.
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());
    if let Ok(value) = env::var("SYNMAT_DEBUG") {
        apply_debug_env(&mut flags, &value);
    }
    flags
}

fn apply_debug_env(flags: &mut CrateDebugFlags, value: &str) {
    if value.trim() == "all" {
        flags.enable_all();
        return;
    }
    for crate_name in value.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        flags.enable(crate_name);
    }
}

/// Help text for debug flags
pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug-all                    Enable debug logging for all crates
  --debug-{{crate-name}}          Enable debug logging for specific crate

Available crates:
  {}

Environment Variable:
  SYNMAT_DEBUG={{crate-name}}[,{{crate-name}}]  Enable debug for crates (comma-separated)
  SYNMAT_DEBUG=all                               Enable debug for all crates
"#,
        KNOWN_CRATES.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_crate_flag() {
        let flags = CrateDebugFlags::from_args(vec![
            "report".to_string(),
            "--debug-synmat-sparse".to_string(),
        ]);
        assert!(flags.is_enabled("synmat-sparse"));
        assert!(!flags.is_enabled("synmat-device"));
        assert!(flags.any_enabled());
    }

    #[test]
    fn test_debug_all() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-all".to_string()]);
        for crate_name in KNOWN_CRATES {
            assert!(flags.is_enabled(crate_name), "{} should be enabled", crate_name);
        }
    }

    #[test]
    fn test_filter_string() {
        let flags = CrateDebugFlags::default();
        assert_eq!(flags.to_filter_string(), "info");

        let flags = CrateDebugFlags::from_args(vec![
            "--debug-synmat-sparse".to_string(),
            "--debug-synmat-device".to_string(),
        ])
        .with_default_level("WARN");
        assert_eq!(
            flags.to_filter_string(),
            "synmat_device=debug,synmat_sparse=debug,warn"
        );
    }

    #[test]
    fn test_env_value() {
        let mut flags = CrateDebugFlags::default();
        apply_debug_env(&mut flags, " synmat-config , ,synmat-device");
        assert_eq!(
            flags.enabled_crates().collect::<Vec<_>>(),
            vec!["synmat-config", "synmat-device"]
        );

        let mut flags = CrateDebugFlags::default();
        apply_debug_env(&mut flags, "all");
        assert_eq!(flags.enabled_crates().count(), KNOWN_CRATES.len());
    }

    #[test]
    fn test_log_level() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-synmat-device".to_string()]);
        assert_eq!(flags.log_level("synmat-device"), tracing::Level::DEBUG);
        assert_eq!(flags.log_level("synmat-sparse"), tracing::Level::INFO);
    }
}
