// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # synmat-observability
//!
//! Logging setup shared by the synmat binaries and tests, with per-crate
//! debug flag support.
//!
//! ## Features
//! - `file-logging`: per-run JSON log files with daily rotation

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Crate names accepted by `--debug-{crate}`
pub const KNOWN_CRATES: &[&str] = &[
    "synmat",
    "synmat-sparse",
    "synmat-device",
    "synmat-config",
    "synmat-observability",
    "matrix-report",
];
