// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Build the store described by a [`SynmatConfig`] and summarise it
//!
//! Index widths are chosen at run time from the configuration and dispatched
//! to the matching monomorphised store.

use std::str::FromStr;

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info};

use synmat_config::{ConnectivityRule, EllLayoutSetting, IndexWidth, StorageFormat, SynmatConfig};
use synmat_device::{
    select_device, DeviceBackend, DeviceConfig, DeviceMemory, DeviceMirror, MirrorFormat,
};
use synmat_sparse::{
    build_fixed_count, build_fixed_probability, CsrMatrix, CsrcMatrix, EllLayout, EllMatrix,
    ListInput, MatrixStatistics, SparseConnectivity, SparseIndex, SparseResult,
};

/// What was built, and where it was mirrored
#[derive(Debug, Clone, Serialize)]
pub struct StoreReport {
    pub statistics: MatrixStatistics,
    pub column_index_width: IndexWidth,
    pub row_pointer_width: IndexWidth,
    /// Host footprint of the structural arrays
    pub size_in_bytes: usize,
    pub device: Option<DeviceReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceReport {
    pub device: String,
    pub arrays: Vec<&'static str>,
    pub bytes: usize,
}

/// Device selection from configuration settings
pub fn device_config(config: &SynmatConfig) -> Result<DeviceConfig> {
    let backend = DeviceBackend::from_str(&config.device.backend)?;
    Ok(DeviceConfig {
        backend,
        device_index: config.device.device_index,
        memory_limit_bytes: config.device.memory_limit_bytes,
    })
}

macro_rules! with_pointer_width {
    ($config:expr, $index:ty) => {
        match $config.storage.row_pointer_width {
            IndexWidth::U8 => build_report::<$index, u8>($config),
            IndexWidth::U16 => build_report::<$index, u16>($config),
            IndexWidth::U32 => build_report::<$index, u32>($config),
            IndexWidth::U64 => build_report::<$index, u64>($config),
        }
    };
}

/// Generate connectivity, build the configured store and optionally mirror it
///
/// The configuration is expected to be validated already.
pub fn run(config: &SynmatConfig) -> Result<StoreReport> {
    match config.storage.column_index_width {
        IndexWidth::U8 => with_pointer_width!(config, u8),
        IndexWidth::U16 => with_pointer_width!(config, u16),
        IndexWidth::U32 => with_pointer_width!(config, u32),
        IndexWidth::U64 => with_pointer_width!(config, u64),
    }
}

fn ranks<I: SparseIndex>(count: usize) -> SparseResult<Vec<I>> {
    (0..count).map(I::try_from_usize).collect()
}

/// List input from the `[connectivity]` section
pub fn generate_input<I: SparseIndex>(config: &SynmatConfig) -> Result<ListInput<I>> {
    let mut rng = match config.connectivity.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let post_ranks = ranks::<I>(config.matrix.num_rows)?;
    let pre_ranks = ranks::<I>(config.matrix.num_columns)?;

    let connectivity = &config.connectivity;
    let input = match connectivity.rule {
        ConnectivityRule::FixedCount => {
            build_fixed_count(&post_ranks, &pre_ranks, connectivity.count, &mut rng)?
        }
        ConnectivityRule::FixedProbability => build_fixed_probability(
            &post_ranks,
            &pre_ranks,
            connectivity.probability,
            connectivity.allow_self_connections,
            &mut rng,
        )?,
    };

    debug!(
        rows = input.row_count(),
        entries = input.total_entries(),
        "generated list input"
    );
    Ok(input)
}

fn build_report<I: SparseIndex, P: SparseIndex>(config: &SynmatConfig) -> Result<StoreReport> {
    let input = generate_input::<I>(config)?;
    let (rows, columns) = (config.matrix.num_rows, config.matrix.num_columns);

    let (statistics, size_in_bytes, device) = match config.storage.format {
        StorageFormat::Csr => {
            let store: CsrMatrix<I, P> = CsrMatrix::from_lil(rows, columns, &input)?;
            let device = maybe_mirror(config, store.clone())?;
            (store.statistics(), store.size_in_bytes(), device)
        }
        StorageFormat::Csrc => {
            let store: CsrcMatrix<I, P> = CsrcMatrix::from_lil(rows, columns, &input)?;
            let device = maybe_mirror(config, store.clone())?;
            (store.statistics(), store.size_in_bytes(), device)
        }
        StorageFormat::Ell => {
            if config.device.enabled {
                bail!("device mirrors are available for csr and csrc only, not ell");
            }
            let layout = match config.storage.ell_layout {
                EllLayoutSetting::RowMajor => EllLayout::RowMajor,
                EllLayoutSetting::ColumnMajor => EllLayout::ColumnMajor,
            };
            let store: EllMatrix<I> = EllMatrix::from_lil(rows, columns, layout, &input)?;
            (store.statistics(), store.size_in_bytes(), None)
        }
    };

    Ok(StoreReport {
        statistics,
        column_index_width: config.storage.column_index_width,
        row_pointer_width: config.storage.row_pointer_width,
        size_in_bytes,
        device,
    })
}

fn maybe_mirror<M: MirrorFormat>(config: &SynmatConfig, store: M) -> Result<Option<DeviceReport>> {
    if !config.device.enabled {
        return Ok(None);
    }

    let device = select_device(&device_config(config)?)?;
    let mirror = DeviceMirror::new(device, store).context("failed to mirror store to device")?;
    let report = DeviceReport {
        device: mirror.device().name().to_string(),
        arrays: mirror.structure_names(),
        bytes: mirror.device_bytes(),
    };
    mirror.release()?;

    info!(device = %report.device, bytes = report.bytes, "mirrored structure");
    Ok(Some(report))
}
