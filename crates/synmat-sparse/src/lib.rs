// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Sparse Connectivity Storage
//!
//! Host-side sparse stores for synaptic connectivity between two populations.
//! Rows are post-synaptic neurons, columns pre-synaptic ones.
//!
//! ## Formats
//! - [`CsrMatrix`]: compressed row storage
//! - [`CsrcMatrix`]: CSR plus a column-major reverse view
//! - [`EllMatrix`]: fixed row width, padded, row- or column-major
//!
//! All stores are built from a [`ListInput`] and only ever rebuilt wholesale.
//! Per-connection ("matrix") and per-row ("vector") variables are plain `Vec`s
//! owned by the caller and sized by the store's `init_*` methods.
//!
//! ## Usage
//!
//! ```rust
//! use synmat_sparse::{CsrMatrix, ListInput, SparseConnectivity};
//!
//! let input = ListInput::new(vec![0u32, 1, 3], vec![vec![1], vec![0, 2], vec![2]])?;
//! let matrix: CsrMatrix = CsrMatrix::from_lil(4, 3, &input)?;
//!
//! let mut weights = matrix.init_matrix_variable(0.0f32);
//! matrix.update_matrix_variable_row(&mut weights, 1, &[0.5, 0.25])?;
//! assert_eq!(matrix.get_matrix_variable(&weights, 1, 2)?, Some(0.25));
//! assert_eq!(matrix.get_matrix_variable(&weights, 2, 0)?, None);
//! # Ok::<(), synmat_sparse::SparseError>(())
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod csr;
pub mod csrc;
pub mod diagnostics;
pub mod ell;
pub mod error;
pub mod index;
pub mod lil;
pub mod traits;
mod variable;

pub use csr::CsrMatrix;
pub use csrc::CsrcMatrix;
pub use diagnostics::{DataRepresentation, EllLayout, FormatKind, MatrixStatistics};
pub use ell::EllMatrix;
pub use error::{SparseError, SparseResult};
pub use index::SparseIndex;
pub use lil::{build_fixed_count, build_fixed_probability, ListInput};
pub use traits::SparseConnectivity;
