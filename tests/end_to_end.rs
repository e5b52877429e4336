// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file to built store, through the umbrella crate

use std::fs;

use synmat::config::{load_config, validate_config, IndexWidth, StorageFormat, SynmatConfig};
use synmat::report;
use synmat::sparse::FormatKind;
use tempfile::tempdir;

fn load(toml: &str) -> SynmatConfig {
    let dir = tempdir().unwrap();
    let path = dir.path().join("synmat_configuration.toml");
    fs::write(&path, toml).unwrap();
    let config = load_config(Some(&path), None).unwrap();
    validate_config(&config).unwrap();
    config
}

const FIXED_COUNT: &str = r#"
[matrix]
num_rows = 120
num_columns = 80

[storage]
format = "csrc"
column_index_width = "u16"
row_pointer_width = "u32"

[connectivity]
rule = "fixed_count"
count = 7
seed = 11

[device]
enabled = true
backend = "host"
"#;

#[test]
fn test_fixed_count_csrc_with_host_mirror() {
    let config = load(FIXED_COUNT);
    assert_eq!(config.storage.format, StorageFormat::Csrc);

    let report = report::run(&config).unwrap();
    assert_eq!(report.statistics.format, FormatKind::Csrc);
    assert_eq!(report.statistics.nnz, 120 * 7);
    assert_eq!(report.statistics.empty_rows, 0);
    assert_eq!(report.column_index_width, IndexWidth::U16);

    let device = report.device.expect("mirror requested");
    assert_eq!(device.device, "host");
    assert_eq!(
        device.arrays,
        vec!["post_rank", "row_ptr", "pre_rank", "col_ptr", "row_idx", "inv_idx"]
    );
    // post_rank + pre_rank + row_idx as u16, row_ptr + col_ptr + inv_idx as u32
    let expected = 2 * (120 + 840 + 840) + 4 * (121 + 81 + 840);
    assert_eq!(device.bytes, expected);
}

#[test]
fn test_same_seed_same_structure() {
    let mut config = SynmatConfig::default();
    config.matrix.num_rows = 60;
    config.matrix.num_columns = 60;
    config.connectivity.probability = 0.3;
    config.connectivity.seed = Some(99);

    let first = report::run(&config).unwrap();
    let second = report::run(&config).unwrap();
    assert_eq!(first.statistics, second.statistics);
    assert!(first.device.is_none());
}

#[test]
fn test_ell_report_and_mirror_refusal() {
    let mut config = SynmatConfig::default();
    config.matrix.num_rows = 30;
    config.matrix.num_columns = 30;
    config.storage.format = StorageFormat::Ell;
    config.connectivity.seed = Some(5);

    let report = report::run(&config).unwrap();
    assert_eq!(report.statistics.format, FormatKind::Ellpack);
    assert!(report.statistics.dense_shape.is_some());

    config.device.enabled = true;
    assert!(report::run(&config).is_err());
}

#[test]
fn test_report_serialises() {
    let config = load(FIXED_COUNT);
    let report = report::run(&config).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["statistics"]["nnz"], 840);
    assert_eq!(json["row_pointer_width"], "u32");
}
