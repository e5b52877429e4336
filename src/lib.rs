// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # synmat - Sparse Synaptic Connectivity Storage
//!
//! Compact storage for the sparse connectivity between two populations, with
//! per-entry (matrix) and per-row (vector) variables laid out by the store.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! synmat = "0.1"
//! ```
//!
//! ## Feature Flags
//!
//! - **`parallel`**: rayon-backed bulk readback of matrix variables
//! - **`gpu`**: WGPU device backend (Metal/Vulkan/DirectX)
//! - **`cuda`**: CUDA device backend (NVIDIA only)
//! - **`file-logging`**: per-run JSON log files for the tools
//!
//! ## Usage
//!
//! ```rust
//! use synmat::prelude::*;
//!
//! // Rows 0 and 2 of a 3 x 4 matrix are connected
//! let input = ListInput::new(vec![0u32, 2], vec![vec![1, 3], vec![0]])?;
//! let csr: CsrMatrix = CsrMatrix::from_lil(3, 4, &input)?;
//!
//! let mut weights = csr.init_matrix_variable(0.5f32);
//! csr.update_matrix_variable(&mut weights, 2, 0, 1.25)?;
//! assert_eq!(csr.get_matrix_variable(&weights, 2, 0)?, Some(1.25));
//! assert_eq!(csr.get_matrix_variable(&weights, 1, 0)?, None);
//!
//! let mirror = CsrDeviceMirror::new(HostDevice::new(), csr)?;
//! let on_device = mirror.upload_matrix_variable(&weights)?;
//! assert_eq!(
//!     mirror.download_matrix_variable_as_lil(&on_device)?,
//!     vec![vec![0.5, 0.5], vec![1.25]]
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Storage: synmat-sparse                                 │
//! │  (ListInput, CSR, CSRC, ELLPACK, diagnostics)           │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Devices: synmat-device                                 │
//! │  (DeviceMemory backends, scoped buffers, mirrors)       │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Infrastructure: synmat-config, synmat-observability    │
//! │  (TOML configuration, tracing setup)                    │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub use synmat_config as config;
pub use synmat_device as device;
pub use synmat_observability as observability;
pub use synmat_sparse as sparse;

pub mod report;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::sparse::{
        build_fixed_count, build_fixed_probability, CsrMatrix, CsrcMatrix, EllLayout, EllMatrix,
        ListInput, MatrixStatistics, SparseConnectivity, SparseError, SparseIndex, SparseResult,
    };

    pub use crate::device::{
        CsrDeviceMirror, CsrcDeviceMirror, DeviceArray, DeviceMemory, DeviceMirror, HostDevice,
        MirrorError, MirrorResult,
    };

    pub use crate::config::SynmatConfig;
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_facade_imports() {
        use crate::prelude::*;
        let csr: CsrMatrix = CsrMatrix::new(2, 2).unwrap();
        assert_eq!(csr.statistics().nnz, 0);
    }
}
