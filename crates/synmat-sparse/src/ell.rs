// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
ELLPACK connectivity: every non-empty row padded to the same width.

For the 4 x 3 example used throughout this crate the stored rows are
`post_ranks = [0, 1, 3]`, `rl = [1, 2, 1]` and `maxnzr = 2`:

```text
row major    col_idx = [ 1, _, 0, 2, 2, _ ]   slot = lil * maxnzr + offset
column major col_idx = [ 1, 0, 2, _, 2, _ ]   slot = offset * rows + lil
```

Padding slots (`_`) hold zero and are never read: all traversal stops at
`rl[lil]`. Matrix variables share the padded layout.

Row-major is the complete path. Column-major stores support construction,
single-row reads and point reads; bulk and row-write accessors return
`NotImplemented`.
*/

use core::fmt;

use ndarray::Array2;
use num_traits::Float;
use rand::distributions::uniform::SampleUniform;
use rand::distributions::Distribution;
use rand::Rng;
use rand_distr::StandardNormal;
use tracing::debug;

use crate::diagnostics::{widen, DataRepresentation, EllLayout, FormatKind, MatrixStatistics};
use crate::error::{ensure_in_range, ensure_len, SparseError, SparseResult};
use crate::index::{ensure_capacity, SparseIndex};
use crate::lil::{self, validate_rows, ListInput};
use crate::traits::SparseConnectivity;
use crate::variable;

const FORMAT: &str = "ELLPACK column_major";

/// ELLPACK store over `num_rows x num_columns`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EllMatrix<I = u32> {
    num_rows: usize,
    num_columns: usize,
    layout: EllLayout,
    post_ranks: Vec<I>,
    rl: Vec<usize>,
    maxnzr: usize,
    col_idx: Vec<I>,
    nnz: usize,
}

impl<I: SparseIndex> EllMatrix<I> {
    /// Create an empty row-major store
    pub fn new(num_rows: usize, num_columns: usize) -> SparseResult<Self> {
        Self::with_layout(num_rows, num_columns, EllLayout::RowMajor)
    }

    /// Create an empty store with the given padded layout
    pub fn with_layout(
        num_rows: usize,
        num_columns: usize,
        layout: EllLayout,
    ) -> SparseResult<Self> {
        ensure_capacity::<I>(num_rows)?;
        ensure_capacity::<I>(num_columns)?;

        Ok(Self {
            num_rows,
            num_columns,
            layout,
            post_ranks: Vec::new(),
            rl: Vec::new(),
            maxnzr: 0,
            col_idx: Vec::new(),
            nnz: 0,
        })
    }

    pub fn from_lil(
        num_rows: usize,
        num_columns: usize,
        layout: EllLayout,
        input: &ListInput<I>,
    ) -> SparseResult<Self> {
        let mut matrix = Self::with_layout(num_rows, num_columns, layout)?;
        matrix.build(&input.post_ranks, &input.pre_ranks)?;
        Ok(matrix)
    }

    /// Replace the structure; on error the previous structure is kept
    pub fn build(&mut self, row_indices: &[I], column_lists: &[Vec<I>]) -> SparseResult<()> {
        validate_rows(row_indices, column_lists, self.num_rows, self.num_columns)?;

        // pass 1: row lengths and stride
        let rl: Vec<usize> = column_lists.iter().map(Vec::len).collect();
        let maxnzr = rl.iter().copied().max().unwrap_or(0);
        let rows = row_indices.len();
        let size = maxnzr.checked_mul(rows).ok_or_else(|| {
            SparseError::InvalidArgument(format!(
                "padded size {} x {} overflows usize",
                rows, maxnzr
            ))
        })?;

        // pass 2: left-packed placement
        let mut col_idx = vec![I::default(); size];
        for (lil_idx, columns) in column_lists.iter().enumerate() {
            for (offset, &column) in columns.iter().enumerate() {
                col_idx[slot(self.layout, rows, maxnzr, lil_idx, offset)] = column;
            }
        }

        self.post_ranks = row_indices.to_vec();
        self.nnz = column_lists.iter().map(Vec::len).sum();
        self.rl = rl;
        self.maxnzr = maxnzr;
        self.col_idx = col_idx;

        debug!(
            rows = self.num_rows,
            columns = self.num_columns,
            stored_rows = rows,
            maxnzr,
            layout = self.layout.as_str(),
            "built ELLPACK matrix"
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

    /// Reset to the empty state and release storage
    pub fn clear(&mut self) {
        self.post_ranks = Vec::new();
        self.rl = Vec::new();
        self.col_idx = Vec::new();
        self.maxnzr = 0;
        self.nnz = 0;
    }

    // === Structure ===

    pub fn layout(&self) -> EllLayout {
        self.layout
    }

    /// Row stride: the longest stored row
    pub fn maxnzr(&self) -> usize {
        self.maxnzr
    }

    /// Entries per stored row
    pub fn rl(&self) -> &[usize] {
        &self.rl
    }

    /// Padded column indices in the store's layout
    pub fn col_idx(&self) -> &[I] {
        &self.col_idx
    }

    /// Length of a padded matrix variable
    pub fn padded_len(&self) -> usize {
        self.col_idx.len()
    }

    fn slot(&self, lil_idx: usize, offset: usize) -> usize {
        slot(self.layout, self.post_ranks.len(), self.maxnzr, lil_idx, offset)
    }

    fn row_length(&self, lil_idx: usize) -> SparseResult<usize> {
        ensure_in_range("lil index", lil_idx, self.post_ranks.len())?;
        Ok(self.rl[lil_idx])
    }

    /// Padded slots of the valid entries of one row, in entry order
    fn row_slots(&self, lil_idx: usize) -> SparseResult<impl Iterator<Item = usize> + '_> {
        let len = self.row_length(lil_idx)?;
        Ok((0..len).map(move |offset| self.slot(lil_idx, offset)))
    }

    fn require_row_major(&self, operation: &'static str) -> SparseResult<()> {
        match self.layout {
            EllLayout::RowMajor => Ok(()),
            EllLayout::ColumnMajor => Err(SparseError::not_implemented(operation, FORMAT)),
        }
    }

    /// Column indices as a `(stored rows, maxnzr)` array, padding included
    pub fn dense_column_indices(&self) -> Array2<I> {
        Array2::from_shape_fn((self.post_ranks.len(), self.maxnzr), |(lil_idx, offset)| {
            self.col_idx[self.slot(lil_idx, offset)]
        })
    }

    // === Variable initialisation ===

    /// Padded matrix variable; valid slots hold `default_value`, padding `T::default()`
    pub fn init_matrix_variable<T: Clone + Default>(&self, default_value: T) -> Vec<T> {
        let mut values = vec![T::default(); self.padded_len()];
        for lil_idx in 0..self.post_ranks.len() {
            for offset in 0..self.rl[lil_idx] {
                values[self.slot(lil_idx, offset)] = default_value.clone();
            }
        }
        values
    }

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
        Ok(self.fill_valid(&dist, rng))
    }

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
        Ok(self.fill_valid(&dist, rng))
    }

    /// Draw one sample per valid slot, row by row
    fn fill_valid<T, D, R>(&self, dist: &D, rng: &mut R) -> Vec<T>
    where
        T: Float,
        D: Distribution<T>,
        R: Rng + ?Sized,
    {
        let mut values = vec![T::zero(); self.padded_len()];
        for lil_idx in 0..self.post_ranks.len() {
            let row = variable::sample_vec(dist, self.rl[lil_idx], rng);
            for (offset, value) in row.into_iter().enumerate() {
                values[self.slot(lil_idx, offset)] = value;
            }
        }
        values
    }

    pub fn init_vector_variable<T: Clone>(&self, default_value: T) -> Vec<T> {
        vec![default_value; self.post_ranks.len()]
    }

    // === Matrix variables ===

    fn check_matrix_variable(&self, len: usize) -> SparseResult<()> {
        ensure_len("padded matrix variable", self.padded_len(), len)
    }

    /// Value stored for `(row, column)`, `None` if the entry does not exist
    ///
    /// `row` is the dense row index; empty rows yield `None`.
    pub fn get_matrix_variable<T: Copy>(
        &self,
        variable: &[T],
        row: usize,
        column: usize,
    ) -> SparseResult<Option<T>> {
        self.check_matrix_variable(variable.len())?;
        ensure_in_range("dense row", row, self.num_rows)?;

        let Ok(lil_idx) = self.post_ranks.binary_search_by_key(&row, |r| r.as_usize()) else {
            return Ok(None);
        };
        let found = self
            .row_slots(lil_idx)?
            .find(|&slot| self.col_idx[slot].as_usize() == column)
            .map(|slot| variable[slot]);
        Ok(found)
    }

    /// Not supported for ELLPACK in either layout
    pub fn update_matrix_variable<T>(
        &self,
        _variable: &mut [T],
        _row: usize,
        _column: usize,
        _value: T,
    ) -> SparseResult<()> {
        Err(SparseError::not_implemented("update_matrix_variable", FormatKind::Ellpack.as_str()))
    }

    /// Valid values of one row
    pub fn get_matrix_variable_row<T: Clone>(
        &self,
        variable: &[T],
        lil_idx: usize,
    ) -> SparseResult<Vec<T>> {
        self.check_matrix_variable(variable.len())?;
        Ok(self.row_slots(lil_idx)?.map(|slot| variable[slot].clone()).collect())
    }

    /// Overwrite the valid values of one row (row-major only)
    pub fn update_matrix_variable_row<T: Clone>(
        &self,
        variable: &mut [T],
        lil_idx: usize,
        data: &[T],
    ) -> SparseResult<()> {
        self.require_row_major("update_matrix_variable_row")?;
        self.check_matrix_variable(variable.len())?;
        let len = self.row_length(lil_idx)?;
        ensure_len("matrix variable row", len, data.len())?;

        let start = lil_idx * self.maxnzr;
        variable[start..start + len].clone_from_slice(data);
        Ok(())
    }

    /// Valid values of every row (row-major only)
    pub fn get_matrix_variable_all<T: Clone>(&self, variable: &[T]) -> SparseResult<Vec<Vec<T>>> {
        self.require_row_major("get_matrix_variable_all")?;
        self.check_matrix_variable(variable.len())?;

        Ok(self
            .rl
            .iter()
            .enumerate()
            .map(|(lil_idx, len)| {
                let start = lil_idx * self.maxnzr;
                variable[start..start + len].to_vec()
            })
            .collect())
    }

    /// Overwrite every row (row-major only); padding is left untouched
    pub fn update_matrix_variable_all<T: Clone>(
        &self,
        variable: &mut [T],
        data: &[Vec<T>],
    ) -> SparseResult<()> {
        self.require_row_major("update_matrix_variable_all")?;
        self.check_matrix_variable(variable.len())?;
        ensure_len("matrix variable rows", self.post_ranks.len(), data.len())?;
        for (len, row) in self.rl.iter().zip(data) {
            ensure_len("matrix variable row", *len, row.len())?;
        }

        for (lil_idx, row) in data.iter().enumerate() {
            let start = lil_idx * self.maxnzr;
            variable[start..start + row.len()].clone_from_slice(row);
        }
        Ok(())
    }

    // === Vector variables ===

    fn check_vector_variable(&self, len: usize) -> SparseResult<()> {
        ensure_len("vector variable", self.post_ranks.len(), len)
    }

    pub fn get_vector_variable<T: Copy>(&self, variable: &[T], lil_idx: usize) -> SparseResult<T> {
        self.check_vector_variable(variable.len())?;
        ensure_in_range("lil index", lil_idx, self.post_ranks.len())?;
        Ok(variable[lil_idx])
    }

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

    pub fn get_vector_variable_all<T: Clone>(&self, variable: &[T]) -> SparseResult<Vec<T>> {
        self.check_vector_variable(variable.len())?;
        Ok(variable.to_vec())
    }

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
}

fn slot(layout: EllLayout, rows: usize, maxnzr: usize, lil_idx: usize, offset: usize) -> usize {
    match layout {
        EllLayout::RowMajor => lil_idx * maxnzr + offset,
        EllLayout::ColumnMajor => offset * rows + lil_idx,
    }
}

impl<I: SparseIndex> SparseConnectivity<I> for EllMatrix<I> {
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
        Ok(self.row_slots(lil_idx)?.map(|slot| self.col_idx[slot]).collect())
    }

    fn entry_count(&self, lil_idx: usize) -> SparseResult<usize> {
        self.row_length(lil_idx)
    }

    fn total_entries(&self) -> usize {
        self.nnz
    }

    fn size_in_bytes(&self) -> usize {
        4 * core::mem::size_of::<usize>()
            + (self.post_ranks.capacity() + self.col_idx.capacity()) * core::mem::size_of::<I>()
            + self.rl.capacity() * core::mem::size_of::<usize>()
    }

    fn statistics(&self) -> MatrixStatistics {
        let mut stats = MatrixStatistics::from_row_lengths(
            FormatKind::Ellpack,
            self.num_rows,
            self.num_columns,
            self.rl.iter().copied(),
        );
        stats.dense_shape = Some((self.post_ranks.len(), self.maxnzr));
        stats.layout = Some(self.layout);
        stats
    }

    fn data_representation(&self) -> DataRepresentation {
        let dense_rows = self
            .dense_column_indices()
            .rows()
            .into_iter()
            .map(|row| row.iter().map(|v| v.as_usize() as u64).collect())
            .collect();

        DataRepresentation {
            statistics: self.statistics(),
            arrays: vec![("post_ranks", widen(&self.post_ranks)), ("rl", widen(&self.rl))],
            dense_rows: Some(dense_rows),
        }
    }

    fn to_list_input(&self) -> SparseResult<ListInput<I>> {
        self.require_row_major("to_list_input")?;
        let pre_ranks = (0..self.post_ranks.len())
            .map(|lil_idx| self.dendrite_columns(lil_idx))
            .collect::<SparseResult<Vec<_>>>()?;
        ListInput::new(self.post_ranks.clone(), pre_ranks)
    }
}

impl<I: SparseIndex> fmt::Display for EllMatrix<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "-- Store a {} times {} Matrix in ELLPACK format --",
            self.num_rows, self.num_columns
        )?;
        write!(f, "{}", self.data_representation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn example(layout: EllLayout) -> EllMatrix<u32> {
        let input = ListInput::new(vec![0u32, 1, 3], vec![vec![1], vec![0, 2], vec![2]]).unwrap();
        EllMatrix::from_lil(4, 3, layout, &input).unwrap()
    }

    #[test]
    fn test_row_major_layout() {
        let m = example(EllLayout::RowMajor);
        assert_eq!(m.maxnzr(), 2);
        assert_eq!(m.rl(), &[1, 2, 1]);
        assert_eq!(m.col_idx(), &[1, 0, 0, 2, 2, 0]);
        assert_eq!(m.dense_column_indices(), array![[1u32, 0], [0, 2], [2, 0]]);
        assert_eq!(m.total_entries(), 4);
    }

    #[test]
    fn test_column_major_layout() {
        let m = example(EllLayout::ColumnMajor);
        assert_eq!(m.col_idx(), &[1, 0, 2, 0, 2, 0]);
        assert_eq!(m.dense_column_indices(), array![[1u32, 0], [0, 2], [2, 0]]);
        assert_eq!(m.dendrite_columns(1).unwrap(), vec![0, 2]);
        assert_eq!(m.entry_count(2).unwrap(), 1);
    }

    #[test]
    fn test_padding_never_surfaces() {
        let m = example(EllLayout::RowMajor);
        let mut w = m.init_matrix_variable(1.0f32);
        assert_eq!(w, vec![1.0, 0.0, 1.0, 1.0, 1.0, 0.0]);

        m.update_matrix_variable_all(&mut w, &[vec![5.0], vec![6.0, 7.0], vec![8.0]])
            .unwrap();
        assert_eq!(w, vec![5.0, 0.0, 6.0, 7.0, 8.0, 0.0]);
        assert_eq!(
            m.get_matrix_variable_all(&w).unwrap(),
            vec![vec![5.0], vec![6.0, 7.0], vec![8.0]]
        );
        // column 0 is padding in row 0, not an entry
        assert_eq!(m.get_matrix_variable(&w, 0, 0).unwrap(), None);
        assert_eq!(m.get_matrix_variable(&w, 0, 1).unwrap(), Some(5.0));
        assert_eq!(m.get_matrix_variable(&w, 2, 1).unwrap(), None);
    }

    #[test]
    fn test_point_update_not_implemented() {
        let m = example(EllLayout::RowMajor);
        let mut w = m.init_matrix_variable(0.0f64);
        assert!(matches!(
            m.update_matrix_variable(&mut w, 1, 0, 1.0),
            Err(SparseError::NotImplemented { .. })
        ));
    }

    #[test]
    fn test_column_major_restrictions() {
        let m = example(EllLayout::ColumnMajor);
        let mut w = m.init_matrix_variable(3i32);
        assert_eq!(m.get_matrix_variable_row(&w, 1).unwrap(), vec![3, 3]);
        assert_eq!(m.get_matrix_variable(&w, 3, 2).unwrap(), Some(3));

        assert!(matches!(
            m.get_matrix_variable_all(&w),
            Err(SparseError::NotImplemented { .. })
        ));
        assert!(matches!(
            m.update_matrix_variable_row(&mut w, 0, &[1]),
            Err(SparseError::NotImplemented { .. })
        ));
        assert!(matches!(
            m.update_matrix_variable_all(&mut w, &[vec![1], vec![1, 1], vec![1]]),
            Err(SparseError::NotImplemented { .. })
        ));
        assert!(matches!(m.to_list_input(), Err(SparseError::NotImplemented { .. })));
    }

    #[test]
    fn test_row_update_checks_length() {
        let m = example(EllLayout::RowMajor);
        let mut w = m.init_matrix_variable(0u8);
        assert!(matches!(
            m.update_matrix_variable_row(&mut w, 1, &[1, 2, 3]),
            Err(SparseError::ConnectivityMismatch { .. })
        ));
        m.update_matrix_variable_row(&mut w, 1, &[1, 2]).unwrap();
        assert_eq!(m.get_matrix_variable_row(&w, 1).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_random_init_leaves_padding_zero() {
        let m = example(EllLayout::ColumnMajor);
        let mut rng = StdRng::seed_from_u64(5);
        let w = m.init_matrix_variable_uniform(1.0f32, 2.0, &mut rng).unwrap();
        // padding slots in column-major order: (lil 0, offset 1) and (lil 2, offset 1)
        assert_eq!(w[3], 0.0);
        assert_eq!(w[5], 0.0);
        assert!(m
            .get_matrix_variable_row(&w, 1)
            .unwrap()
            .iter()
            .all(|v| (1.0..2.0).contains(v)));
    }

    #[test]
    fn test_vector_variables() {
        let m = example(EllLayout::RowMajor);
        let mut v = m.init_vector_variable(0i32);
        assert_eq!(v, vec![0, 0, 0]);

        m.update_vector_variable(&mut v, 2, 7).unwrap();
        assert_eq!(m.get_vector_variable(&v, 2).unwrap(), 7);
        assert!(matches!(
            m.get_vector_variable(&v, 3),
            Err(SparseError::OutOfRange { .. })
        ));
        assert!(matches!(
            m.update_vector_variable(&mut v, 3, 1),
            Err(SparseError::OutOfRange { .. })
        ));
        assert!(matches!(
            m.get_vector_variable(&[1, 2], 0),
            Err(SparseError::ConnectivityMismatch { expected: 3, actual: 2, .. })
        ));

        m.update_vector_variable_all(&mut v, &[4, 5, 6]).unwrap();
        assert_eq!(m.get_vector_variable_all(&v).unwrap(), vec![4, 5, 6]);
        assert!(matches!(
            m.update_vector_variable_all(&mut v, &[1, 2]),
            Err(SparseError::ConnectivityMismatch { .. })
        ));
        assert!(matches!(
            m.get_vector_variable_all(&[1, 2, 3, 4]),
            Err(SparseError::ConnectivityMismatch { .. })
        ));
        assert_eq!(v, vec![4, 5, 6]);
    }

    #[test]
    fn test_normal_init_leaves_padding_zero() {
        let m = example(EllLayout::RowMajor);
        let mut rng = StdRng::seed_from_u64(17);
        let w = m.init_matrix_variable_normal(10.0f64, 0.1, &mut rng).unwrap();
        assert_eq!(w.len(), 6);
        // row-major padding: (lil 0, offset 1) and (lil 2, offset 1)
        assert_eq!(w[1], 0.0);
        assert_eq!(w[5], 0.0);
        for row in m.get_matrix_variable_all(&w).unwrap() {
            assert!(row.iter().all(|v| (9.0..11.0).contains(v)));
        }
        assert!(matches!(
            m.init_matrix_variable_normal(0.0f64, -1.0, &mut rng),
            Err(SparseError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_generate_fixed_count() {
        let mut m: EllMatrix = EllMatrix::new(6, 5).unwrap();
        let posts: Vec<u32> = (0..6).collect();
        let pres: Vec<u32> = (0..5).collect();
        let mut rng = StdRng::seed_from_u64(3);
        m.generate_fixed_count(&posts, &pres, 3, &mut rng).unwrap();

        assert_eq!(m.post_ranks(), posts.as_slice());
        assert_eq!(m.maxnzr(), 3);
        assert_eq!(m.rl(), &[3; 6]);
        assert_eq!(m.padded_len(), 18);
        assert_eq!(m.total_entries(), 18);
        for lil_idx in 0..6 {
            let columns = m.dendrite_columns(lil_idx).unwrap();
            assert!(columns.windows(2).all(|w| w[0] < w[1]));
            assert!(columns.iter().all(|&c| c < 5));
        }

        assert!(m.generate_fixed_count(&posts, &pres, 6, &mut rng).is_err());
        assert_eq!(m.total_entries(), 18);
    }

    #[test]
    fn test_full_row_with_narrow_index() {
        // 256 columns fit u8 indices even though a full row holds 256 entries
        let mut m: EllMatrix<u8> = EllMatrix::new(2, 256).unwrap();
        let full: Vec<u8> = (0..=255).collect();
        m.build(&[1], &[full]).unwrap();
        assert_eq!(m.maxnzr(), 256);
        assert_eq!(m.rl(), &[256]);
        assert_eq!(m.entry_count(0).unwrap(), 256);
        assert_eq!(m.dendrite_columns(0).unwrap()[255], 255);
    }

    #[test]
    fn test_empty_store() {
        let mut m: EllMatrix = EllMatrix::new(5, 5).unwrap();
        m.build(&[], &[]).unwrap();
        assert_eq!(m.maxnzr(), 0);
        assert_eq!(m.padded_len(), 0);
        assert_eq!(m.dense_column_indices().dim(), (0, 0));
        assert_eq!(m.statistics().empty_rows, 5);
    }

    #[test]
    fn test_statistics() {
        let stats = example(EllLayout::ColumnMajor).statistics();
        assert_eq!(stats.dense_shape, Some((3, 2)));
        assert_eq!(stats.layout, Some(EllLayout::ColumnMajor));
        assert_eq!(stats.empty_rows, 1);
    }

    #[test]
    fn test_failed_build_keeps_state() {
        let mut m = example(EllLayout::RowMajor);
        let before = m.clone();
        assert!(m.build(&[2, 1], &[vec![0], vec![0]]).is_err());
        assert_eq!(m, before);
    }
}
