// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Query interface shared by every sparse store
//!
//! ## Design Philosophy
//!
//! - **Shape vs payload**: stores own the structural arrays only; variable
//!   arrays are plain `Vec`s owned by the caller and laid out by the store
//! - **LIL indices**: row accessors take the compact position in `post_ranks`,
//!   never the dense row index, unless stated otherwise

use crate::diagnostics::{DataRepresentation, MatrixStatistics};
use crate::error::SparseResult;
use crate::index::SparseIndex;
use crate::lil::ListInput;

/// Read-only view of a sparse connectivity structure
pub trait SparseConnectivity<I: SparseIndex> {
    /// Rows of the dense matrix
    fn num_rows(&self) -> usize;

    /// Columns of the dense matrix
    fn num_columns(&self) -> usize;

    /// Dense indices of the non-empty rows, in LIL order
    fn post_ranks(&self) -> &[I];

    /// Number of non-empty rows
    fn row_count(&self) -> usize {
        self.post_ranks().len()
    }

    /// Columns of one row, in input order
    fn dendrite_columns(&self, lil_idx: usize) -> SparseResult<Vec<I>>;

    /// Entries stored in one row
    fn entry_count(&self, lil_idx: usize) -> SparseResult<usize>;

    /// Entries stored over all rows
    fn total_entries(&self) -> usize;

    /// Capacity-based footprint of the structural arrays
    fn size_in_bytes(&self) -> usize;

    /// Summary statistics
    fn statistics(&self) -> MatrixStatistics;

    /// Full structural dump
    fn data_representation(&self) -> DataRepresentation;

    /// Read the structure back as a list input
    fn to_list_input(&self) -> SparseResult<ListInput<I>> {
        let mut pre_ranks = Vec::with_capacity(self.row_count());
        for lil_idx in 0..self.row_count() {
            pre_ranks.push(self.dendrite_columns(lil_idx)?);
        }
        ListInput::new(self.post_ranks().to_vec(), pre_ranks)
    }
}
