// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Compressed sparse row (CSR) connectivity.

Consider the 4 x 3 matrix

```text
    | 0 1 0 |
A = | 2 0 3 |
    | 0 0 0 |
    | 0 0 4 |
```

Column indices of all entries are stored row after row, and a row pointer array
marks where each dense row starts:

```text
col_idx   = [ 1, 0, 2, 2 ]
row_begin = [ 0, 1, 3, 3, 4 ]
```

Row `r` spans `row_begin[r]..row_begin[r + 1]`; an empty row has two equal
bounds. Unlike the list input, CSR keeps empty rows in `row_begin`, so
`post_ranks` maps a LIL index back to its dense row.
*/

use core::fmt;
use core::ops::Range;

use num_traits::Float;
use rand::distributions::uniform::SampleUniform;
use rand::distributions::Distribution;
use rand::Rng;
use rand_distr::StandardNormal;
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::diagnostics::{widen, DataRepresentation, FormatKind, MatrixStatistics};
use crate::error::{ensure_in_range, ensure_len, SparseError, SparseResult};
use crate::index::{ensure_capacity, SparseIndex};
use crate::lil::{self, validate_rows, ListInput};
use crate::traits::SparseConnectivity;
use crate::variable;

/// Structural arrays produced by a CSR build
pub(crate) struct CsrParts<I, P> {
    pub post_ranks: Vec<I>,
    pub row_begin: Vec<P>,
    pub col_idx: Vec<I>,
    pub nnz: usize,
}

/// Convert a list input into CSR arrays without touching any store
pub(crate) fn assemble<I, P>(
    num_rows: usize,
    num_columns: usize,
    row_indices: &[I],
    column_lists: &[Vec<I>],
) -> SparseResult<CsrParts<I, P>>
where
    I: SparseIndex,
    P: SparseIndex,
{
    validate_rows(row_indices, column_lists, num_rows, num_columns)?;

    let expected_nnz: usize = column_lists.iter().map(Vec::len).sum();
    // row_begin holds values up to and including nnz
    ensure_capacity::<P>(expected_nnz + 1)?;

    let mut row_begin = Vec::with_capacity(num_rows + 1);
    let mut col_idx = Vec::with_capacity(expected_nnz);
    let mut lil_idx = 0;
    let mut nnz = 0;

    for r in 0..num_rows {
        row_begin.push(P::try_from_usize(col_idx.len())?);

        if lil_idx < row_indices.len() && row_indices[lil_idx].as_usize() == r {
            col_idx.extend_from_slice(&column_lists[lil_idx]);
            nnz += column_lists[lil_idx].len();
            lil_idx += 1;
        }
    }
    row_begin.push(P::try_from_usize(col_idx.len())?);

    ensure_len("consumed rows", row_indices.len(), lil_idx)?;
    ensure_len("stored entries", nnz, col_idx.len())?;

    Ok(CsrParts {
        post_ranks: row_indices.to_vec(),
        row_begin,
        col_idx,
        nnz,
    })
}

/// CSR store over `num_rows x num_columns`
///
/// `I` is the rank/column index type, `P` the row pointer type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrMatrix<I = u32, P = u32> {
    num_rows: usize,
    num_columns: usize,
    post_ranks: Vec<I>,
    row_begin: Vec<P>,
    col_idx: Vec<I>,
    nnz: usize,
}

impl<I: SparseIndex, P: SparseIndex> CsrMatrix<I, P> {
    /// Create an empty store
    pub fn new(num_rows: usize, num_columns: usize) -> SparseResult<Self> {
        ensure_capacity::<I>(num_rows)?;
        ensure_capacity::<I>(num_columns)?;

        Ok(Self {
            num_rows,
            num_columns,
            post_ranks: Vec::new(),
            row_begin: vec![P::default(); num_rows + 1],
            col_idx: Vec::new(),
            nnz: 0,
        })
    }

    /// Build a store directly from a list input
    pub fn from_lil(
        num_rows: usize,
        num_columns: usize,
        input: &ListInput<I>,
    ) -> SparseResult<Self> {
        let mut matrix = Self::new(num_rows, num_columns)?;
        matrix.build(&input.post_ranks, &input.pre_ranks)?;
        Ok(matrix)
    }

    /// Replace the structure with the given rows
    ///
    /// On error the previous structure is left untouched.
    pub fn build(&mut self, row_indices: &[I], column_lists: &[Vec<I>]) -> SparseResult<()> {
        let parts = assemble(self.num_rows, self.num_columns, row_indices, column_lists)?;
        self.install(parts);

        debug!(
            rows = self.num_rows,
            columns = self.num_columns,
            nnz = self.nnz,
            "built CSR matrix"
        );
        Ok(())
    }

    pub(crate) fn install(&mut self, parts: CsrParts<I, P>) {
        self.post_ranks = parts.post_ranks;
        self.row_begin = parts.row_begin;
        self.col_idx = parts.col_idx;
        self.nnz = parts.nnz;
    }

    /// Rebuild with exactly `count` random columns per row
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

    /// Rebuild with every (post, pre) pair connected with probability `probability`
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

    /// Reset to the empty state and release the entry storage
    pub fn clear(&mut self) {
        self.row_begin.fill(P::default());
        self.col_idx = Vec::new();
        self.post_ranks = Vec::new();
        self.nnz = 0;
    }

    // === Structure ===

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.nnz
    }

    /// Row pointer array (`num_rows + 1` entries)
    pub fn row_begin(&self) -> &[P] {
        &self.row_begin
    }

    /// Column index of every entry, grouped by row
    pub fn col_idx(&self) -> &[I] {
        &self.col_idx
    }

    /// Entry range of a dense row
    pub fn dense_row_range(&self, row: usize) -> SparseResult<Range<usize>> {
        ensure_in_range("dense row", row, self.num_rows)?;
        Ok(self.row_begin[row].as_usize()..self.row_begin[row + 1].as_usize())
    }

    /// Entry range of a non-empty row, by LIL index
    pub fn row_range(&self, lil_idx: usize) -> SparseResult<Range<usize>> {
        ensure_in_range("lil index", lil_idx, self.post_ranks.len())?;
        self.dense_row_range(self.post_ranks[lil_idx].as_usize())
    }

    /// Columns of a non-empty row, borrowed from the store
    pub fn row_columns(&self, lil_idx: usize) -> SparseResult<&[I]> {
        let range = self.row_range(lil_idx)?;
        Ok(&self.col_idx[range])
    }

    // === Variable initialisation ===

    /// One value per stored entry
    pub fn init_matrix_variable<T: Clone>(&self, default_value: T) -> Vec<T> {
        vec![default_value; self.nnz]
    }

    /// One uniform sample in `[low, high)` per stored entry
    pub fn init_matrix_variable_uniform<T, R>(
        &self,
        low: T,
        high: T,
        rng: &mut R,
    ) -> SparseResult<Vec<T>>
    where
        T: Float + SampleUniform,
        R: Rng + ?Sized,
    {
        let dist = variable::uniform(low, high)?;
        Ok(variable::sample_vec(&dist, self.nnz, rng))
    }

    /// One normal sample per stored entry
    pub fn init_matrix_variable_normal<T, R>(
        &self,
        mean: T,
        sigma: T,
        rng: &mut R,
    ) -> SparseResult<Vec<T>>
    where
        T: Float,
        StandardNormal: Distribution<T>,
        R: Rng + ?Sized,
    {
        let dist = variable::normal(mean, sigma)?;
        Ok(variable::sample_vec(&dist, self.nnz, rng))
    }

    /// One value per non-empty row
    pub fn init_vector_variable<T: Clone>(&self, default_value: T) -> Vec<T> {
        vec![default_value; self.post_ranks.len()]
    }

    // === Matrix variables ===

    fn check_matrix_variable(&self, len: usize) -> SparseResult<()> {
        ensure_len("matrix variable", self.nnz, len)
    }

    /// Value stored for `(row, column)`, `None` if no such entry exists
    ///
    /// `row` is the dense row index. Scans the row, O(row length).
    pub fn get_matrix_variable<T: Copy>(
        &self,
        variable: &[T],
        row: usize,
        column: usize,
    ) -> SparseResult<Option<T>> {
        self.check_matrix_variable(variable.len())?;
        let range = self.dense_row_range(row)?;
        Ok(self
            .find_entry(range, column)
            .map(|position| variable[position]))
    }

    /// Overwrite the value stored for `(row, column)`
    ///
    /// Fails with `EntryNotFound` if the pair is not stored.
    pub fn update_matrix_variable<T>(
        &self,
        variable: &mut [T],
        row: usize,
        column: usize,
        value: T,
    ) -> SparseResult<()> {
        self.check_matrix_variable(variable.len())?;
        let range = self.dense_row_range(row)?;
        match self.find_entry(range, column) {
            Some(position) => {
                variable[position] = value;
                Ok(())
            }
            None => Err(SparseError::EntryNotFound { row, column }),
        }
    }

    fn find_entry(&self, range: Range<usize>, column: usize) -> Option<usize> {
        let start = range.start;
        self.col_idx[range]
            .iter()
            .position(|c| c.as_usize() == column)
            .map(|offset| start + offset)
    }

    /// Values of one row, by LIL index
    pub fn get_matrix_variable_row<T: Clone>(
        &self,
        variable: &[T],
        lil_idx: usize,
    ) -> SparseResult<Vec<T>> {
        self.check_matrix_variable(variable.len())?;
        let range = self.row_range(lil_idx)?;
        Ok(variable[range].to_vec())
    }

    /// Overwrite one row; `data` must match the row length
    pub fn update_matrix_variable_row<T: Clone>(
        &self,
        variable: &mut [T],
        lil_idx: usize,
        data: &[T],
    ) -> SparseResult<()> {
        self.check_matrix_variable(variable.len())?;
        let range = self.row_range(lil_idx)?;
        ensure_len("matrix variable row", range.len(), data.len())?;
        variable[range].clone_from_slice(data);
        Ok(())
    }

    /// Values of every row, in `post_ranks` order
    pub fn get_matrix_variable_all<T>(&self, variable: &[T]) -> SparseResult<Vec<Vec<T>>>
    where
        T: Clone + Send + Sync,
    {
        self.check_matrix_variable(variable.len())?;

        #[cfg(feature = "parallel")]
        let rows = (0..self.post_ranks.len())
            .into_par_iter()
            .map(|lil_idx| self.row_slice(variable, lil_idx).to_vec())
            .collect();

        #[cfg(not(feature = "parallel"))]
        let rows = (0..self.post_ranks.len())
            .map(|lil_idx| self.row_slice(variable, lil_idx).to_vec())
            .collect();

        Ok(rows)
    }

    /// Overwrite every row; one list per non-empty row, each matching its row length
    ///
    /// Nothing is written unless every row matches.
    pub fn update_matrix_variable_all<T: Clone>(
        &self,
        variable: &mut [T],
        data: &[Vec<T>],
    ) -> SparseResult<()> {
        self.check_matrix_variable(variable.len())?;
        ensure_len("matrix variable rows", self.post_ranks.len(), data.len())?;
        for (lil_idx, row) in data.iter().enumerate() {
            ensure_len("matrix variable row", self.row_slice_range(lil_idx).len(), row.len())?;
        }

        for (lil_idx, row) in data.iter().enumerate() {
            let range = self.row_slice_range(lil_idx);
            variable[range].clone_from_slice(row);
        }
        Ok(())
    }

    /// Row range for an in-bounds LIL index
    fn row_slice_range(&self, lil_idx: usize) -> Range<usize> {
        let row = self.post_ranks[lil_idx].as_usize();
        self.row_begin[row].as_usize()..self.row_begin[row + 1].as_usize()
    }

    fn row_slice<'a, T>(&self, variable: &'a [T], lil_idx: usize) -> &'a [T] {
        &variable[self.row_slice_range(lil_idx)]
    }

    // === Vector variables ===

    fn check_vector_variable(&self, len: usize) -> SparseResult<()> {
        ensure_len("vector variable", self.post_ranks.len(), len)
    }

    /// Value of one non-empty row
    pub fn get_vector_variable<T: Copy>(&self, variable: &[T], lil_idx: usize) -> SparseResult<T> {
        self.check_vector_variable(variable.len())?;
        ensure_in_range("lil index", lil_idx, self.post_ranks.len())?;
        Ok(variable[lil_idx])
    }

    /// Overwrite the value of one non-empty row
    pub fn update_vector_variable<T>(
        &self,
        variable: &mut [T],
        lil_idx: usize,
        value: T,
    ) -> SparseResult<()> {
        self.check_vector_variable(variable.len())?;
        ensure_in_range("lil index", lil_idx, self.post_ranks.len())?;
        variable[lil_idx] = value;
        Ok(())
    }

    /// Copy of the whole vector variable
    pub fn get_vector_variable_all<T: Clone>(&self, variable: &[T]) -> SparseResult<Vec<T>> {
        self.check_vector_variable(variable.len())?;
        Ok(variable.to_vec())
    }

    /// Overwrite the whole vector variable
    pub fn update_vector_variable_all<T: Clone>(
        &self,
        variable: &mut [T],
        values: &[T],
    ) -> SparseResult<()> {
        self.check_vector_variable(variable.len())?;
        ensure_len("vector variable values", variable.len(), values.len())?;
        variable.clone_from_slice(values);
        Ok(())
    }

    pub(crate) fn structure_bytes(&self) -> usize {
        3 * core::mem::size_of::<usize>()
            + self.row_begin.capacity() * core::mem::size_of::<P>()
            + self.col_idx.capacity() * core::mem::size_of::<I>()
            + self.post_ranks.capacity() * core::mem::size_of::<I>()
    }

    pub(crate) fn row_lengths(&self) -> impl Iterator<Item = usize> + '_ {
        self.row_begin
            .windows(2)
            .map(|w| w[1].as_usize() - w[0].as_usize())
    }
}

impl<I: SparseIndex, P: SparseIndex> SparseConnectivity<I> for CsrMatrix<I, P> {
    fn num_rows(&self) -> usize {
        self.num_rows
    }

    fn num_columns(&self) -> usize {
        self.num_columns
    }

    fn post_ranks(&self) -> &[I] {
        &self.post_ranks
    }

    fn dendrite_columns(&self, lil_idx: usize) -> SparseResult<Vec<I>> {
        self.row_columns(lil_idx).map(<[I]>::to_vec)
    }

    fn entry_count(&self, lil_idx: usize) -> SparseResult<usize> {
        self.row_range(lil_idx).map(|range| range.len())
    }

    fn total_entries(&self) -> usize {
        self.nnz
    }

    fn size_in_bytes(&self) -> usize {
        self.structure_bytes()
    }

    fn statistics(&self) -> MatrixStatistics {
        MatrixStatistics::from_row_lengths(
            FormatKind::Csr,
            self.num_rows,
            self.num_columns,
            self.row_lengths(),
        )
    }

    fn data_representation(&self) -> DataRepresentation {
        DataRepresentation {
            statistics: self.statistics(),
            arrays: vec![
                ("post_ranks", widen(&self.post_ranks)),
                ("row_begin", widen(&self.row_begin)),
                ("col_idx", widen(&self.col_idx)),
            ],
            dense_rows: None,
        }
    }
}

impl<I: SparseIndex, P: SparseIndex> fmt::Display for CsrMatrix<I, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "-- Store a {} times {} Matrix in CSR format --",
            self.num_rows, self.num_columns
        )?;
        write!(f, "{}", self.data_representation())
    }
}
