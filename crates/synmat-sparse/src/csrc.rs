// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
CSR with an additional column-major (backward) view.

The forward view is a plain [`CsrMatrix`]. The backward view enumerates the same
entries column by column:

```text
col_ptr = [ 0, 1, 2, 4 ]     // per column, like row_begin
row_idx = [ 1, 0, 1, 3 ]     // dense row of each backward entry
inv_idx = [ 1, 0, 2, 3 ]     // forward position of each backward entry
```

`inv_idx` lets matrix variables, which are laid out in forward order, be read
column-wise without a second copy. Within a column, entries appear in ascending
row order. Both views are only ever rebuilt together.
*/

use core::fmt;
use core::ops::{Deref, Range};

use rand::Rng;
use tracing::debug;

use crate::csr::{assemble, CsrMatrix, CsrParts};
use crate::diagnostics::{widen, DataRepresentation, FormatKind, MatrixStatistics};
use crate::error::{ensure_in_range, ensure_len, SparseResult};
use crate::index::SparseIndex;
use crate::lil::{self, ListInput};
use crate::traits::SparseConnectivity;

struct BackwardParts<I, P> {
    col_ptr: Vec<P>,
    row_idx: Vec<I>,
    inv_idx: Vec<P>,
}

/// Counting sort of the forward entries by column
fn invert<I, P>(num_columns: usize, forward: &CsrParts<I, P>) -> SparseResult<BackwardParts<I, P>>
where
    I: SparseIndex,
    P: SparseIndex,
{
    let nnz = forward.nnz;

    // pass 1: occurrences per column, shifted by one for the prefix sum
    let mut offsets = vec![0usize; num_columns + 1];
    for &column in &forward.col_idx {
        offsets[column.as_usize() + 1] += 1;
    }
    for c in 0..num_columns {
        offsets[c + 1] += offsets[c];
    }
    ensure_len("backward entries", nnz, offsets[num_columns])?;

    let col_ptr = offsets
        .iter()
        .map(|&v| P::try_from_usize(v))
        .collect::<SparseResult<Vec<P>>>()?;

    // pass 2: place every forward entry into the next free slot of its column
    let mut cursor = offsets;
    let mut row_idx = vec![I::default(); nnz];
    let mut inv_idx = vec![P::default(); nnz];

    for (row, bounds) in forward.row_begin.windows(2).enumerate() {
        let row_rank = I::try_from_usize(row)?;
        for position in bounds[0].as_usize()..bounds[1].as_usize() {
            let column = forward.col_idx[position].as_usize();
            let slot = cursor[column];
            cursor[column] += 1;

            row_idx[slot] = row_rank;
            inv_idx[slot] = P::try_from_usize(position)?;
        }
    }

    Ok(BackwardParts {
        col_ptr,
        row_idx,
        inv_idx,
    })
}

/// CSR store plus backward view
///
/// Derefs to the forward [`CsrMatrix`] for all row-wise accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrcMatrix<I = u32, P = u32> {
    forward: CsrMatrix<I, P>,
    col_ptr: Vec<P>,
    row_idx: Vec<I>,
    inv_idx: Vec<P>,
}

impl<I: SparseIndex, P: SparseIndex> CsrcMatrix<I, P> {
    /// Create an empty store
    pub fn new(num_rows: usize, num_columns: usize) -> SparseResult<Self> {
        Ok(Self {
            forward: CsrMatrix::new(num_rows, num_columns)?,
            col_ptr: vec![P::default(); num_columns + 1],
            row_idx: Vec::new(),
            inv_idx: Vec::new(),
        })
    }

    pub fn from_lil(
        num_rows: usize,
        num_columns: usize,
        input: &ListInput<I>,
    ) -> SparseResult<Self> {
        let mut matrix = Self::new(num_rows, num_columns)?;
        matrix.build(&input.post_ranks, &input.pre_ranks)?;
        Ok(matrix)
    }

    /// Rebuild both views; on error neither view changes
    pub fn build(&mut self, row_indices: &[I], column_lists: &[Vec<I>]) -> SparseResult<()> {
        let num_columns = self.forward.num_columns();
        let forward = assemble(self.forward.num_rows(), num_columns, row_indices, column_lists)?;
        let backward = invert(num_columns, &forward)?;

        self.forward.install(forward);
        self.col_ptr = backward.col_ptr;
        self.row_idx = backward.row_idx;
        self.inv_idx = backward.inv_idx;

        debug!(
            rows = self.forward.num_rows(),
            columns = num_columns,
            nnz = self.forward.nnz(),
            "built CSRC matrix"
        );
        Ok(())
    }

    pub fn generate_fixed_count<R: Rng + ?Sized>(
        &mut self,
        post_ranks: &[I],
        pre_ranks: &[I],
        count: usize,
        rng: &mut R,
    ) -> SparseResult<()> {
        let input = lil::build_fixed_count(post_ranks, pre_ranks, count, rng)?;
        self.build(&input.post_ranks, &input.pre_ranks)
    }

    pub fn generate_fixed_probability<R: Rng + ?Sized>(
        &mut self,
        post_ranks: &[I],
        pre_ranks: &[I],
        probability: f64,
        allow_self_connections: bool,
        rng: &mut R,
    ) -> SparseResult<()> {
        let input = lil::build_fixed_probability(
            post_ranks,
            pre_ranks,
            probability,
            allow_self_connections,
            rng,
        )?;
        self.build(&input.post_ranks, &input.pre_ranks)
    }

    /// Reset both views to the empty state
    pub fn clear(&mut self) {
        self.forward.clear();
        self.col_ptr.fill(P::default());
        self.row_idx = Vec::new();
        self.inv_idx = Vec::new();
    }

    /// The forward view
    pub fn forward(&self) -> &CsrMatrix<I, P> {
        &self.forward
    }

    /// Column pointer array (`num_columns + 1` entries)
    pub fn col_ptr(&self) -> &[P] {
        &self.col_ptr
    }

    /// Dense row of every entry in backward order
    pub fn row_idx(&self) -> &[I] {
        &self.row_idx
    }

    /// Forward position of every entry in backward order
    pub fn inv_idx(&self) -> &[P] {
        &self.inv_idx
    }

    /// Backward range of one column
    pub fn column_range(&self, column: usize) -> SparseResult<Range<usize>> {
        ensure_in_range("column", column, self.forward.num_columns())?;
        Ok(self.col_ptr[column].as_usize()..self.col_ptr[column + 1].as_usize())
    }

    /// Rows connected to `column`, ascending
    pub fn column_rows(&self, column: usize) -> SparseResult<&[I]> {
        let range = self.column_range(column)?;
        Ok(&self.row_idx[range])
    }

    /// `(row, forward position)` of every entry in `column`
    pub fn column_entries(&self, column: usize) -> SparseResult<Vec<(I, P)>> {
        let range = self.column_range(column)?;
        Ok(self.row_idx[range.clone()]
            .iter()
            .copied()
            .zip(self.inv_idx[range].iter().copied())
            .collect())
    }

    /// Read a forward-ordered matrix variable column-wise
    pub fn get_matrix_variable_column<T: Clone>(
        &self,
        variable: &[T],
        column: usize,
    ) -> SparseResult<Vec<T>> {
        ensure_len("matrix variable", self.forward.nnz(), variable.len())?;
        let range = self.column_range(column)?;
        Ok(self.inv_idx[range]
            .iter()
            .map(|&position| variable[position.as_usize()].clone())
            .collect())
    }
}

impl<I, P> Deref for CsrcMatrix<I, P> {
    type Target = CsrMatrix<I, P>;

    fn deref(&self) -> &Self::Target {
        &self.forward
    }
}

impl<I: SparseIndex, P: SparseIndex> SparseConnectivity<I> for CsrcMatrix<I, P> {
    fn num_rows(&self) -> usize {
        self.forward.num_rows()
    }

    fn num_columns(&self) -> usize {
        self.forward.num_columns()
    }

    fn post_ranks(&self) -> &[I] {
        self.forward.post_ranks()
    }

    fn dendrite_columns(&self, lil_idx: usize) -> SparseResult<Vec<I>> {
        self.forward.dendrite_columns(lil_idx)
    }

    fn entry_count(&self, lil_idx: usize) -> SparseResult<usize> {
        self.forward.entry_count(lil_idx)
    }

    fn total_entries(&self) -> usize {
        self.forward.nnz()
    }

    fn size_in_bytes(&self) -> usize {
        self.forward.structure_bytes()
            + self.col_ptr.capacity() * core::mem::size_of::<P>()
            + self.row_idx.capacity() * core::mem::size_of::<I>()
            + self.inv_idx.capacity() * core::mem::size_of::<P>()
    }

    fn statistics(&self) -> MatrixStatistics {
        MatrixStatistics {
            format: FormatKind::Csrc,
            ..self.forward.statistics()
        }
    }

    fn data_representation(&self) -> DataRepresentation {
        let mut repr = self.forward.data_representation();
        repr.statistics.format = FormatKind::Csrc;
        repr.arrays.extend([
            ("col_ptr", widen(&self.col_ptr)),
            ("row_idx", widen(&self.row_idx)),
            ("inv_idx", widen(&self.inv_idx)),
        ]);
        repr
    }
}

impl<I: SparseIndex, P: SparseIndex> fmt::Display for CsrcMatrix<I, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "-- Store a {} times {} Matrix in CSRC format --",
            self.num_rows(),
            self.num_columns()
        )?;
        write!(f, "{}", self.data_representation())
    }
}
