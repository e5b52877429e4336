// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
List-of-lists (LIL) connectivity input.

A `ListInput` names every occupied row (post rank) in ascending order together
with an unordered list of its columns (pre ranks). Empty rows are omitted.
All stores in this crate are built from this shape.

The generators draw from a caller-owned random engine; reproducibility depends
on the caller seeding it identically and issuing the same calls in order.
*/

use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ensure_in_range, ensure_len, SparseError, SparseResult};
use crate::index::SparseIndex;

/// Row-wise connectivity as produced by a connectivity generator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListInput<I> {
    /// Dense indices of the occupied rows, strictly ascending
    pub post_ranks: Vec<I>,
    /// Column lists, one per entry of `post_ranks`
    pub pre_ranks: Vec<Vec<I>>,
}

impl<I: SparseIndex> ListInput<I> {
    /// Pair up row indices and column lists; both must have the same length
    pub fn new(post_ranks: Vec<I>, pre_ranks: Vec<Vec<I>>) -> SparseResult<Self> {
        ensure_len("list input rows", post_ranks.len(), pre_ranks.len())?;
        Ok(Self {
            post_ranks,
            pre_ranks,
        })
    }

    /// Number of occupied rows
    pub fn row_count(&self) -> usize {
        self.post_ranks.len()
    }

    /// Total number of entries over all rows
    pub fn total_entries(&self) -> usize {
        self.pre_ranks.iter().map(Vec::len).sum()
    }

    /// Longest row
    pub fn max_row_length(&self) -> usize {
        self.pre_ranks.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Check the input against a `num_rows x num_columns` matrix
    pub fn validate(&self, num_rows: usize, num_columns: usize) -> SparseResult<()> {
        validate_rows(&self.post_ranks, &self.pre_ranks, num_rows, num_columns)
    }

    /// Split into `(post_ranks, pre_ranks)`
    pub fn into_parts(self) -> (Vec<I>, Vec<Vec<I>>) {
        (self.post_ranks, self.pre_ranks)
    }
}

/// Validate the shape shared by every `build` entry point
pub(crate) fn validate_rows<I: SparseIndex>(
    row_indices: &[I],
    column_lists: &[Vec<I>],
    num_rows: usize,
    num_columns: usize,
) -> SparseResult<()> {
    ensure_len("list input rows", row_indices.len(), column_lists.len())?;
    ensure_strictly_ascending(row_indices)?;

    for (&row, columns) in row_indices.iter().zip(column_lists) {
        ensure_in_range("row index", row.as_usize(), num_rows)?;
        for &column in columns {
            ensure_in_range("column index", column.as_usize(), num_columns)?;
        }
    }
    Ok(())
}

fn ensure_strictly_ascending<I: SparseIndex>(ranks: &[I]) -> SparseResult<()> {
    if let Some(pos) = ranks.windows(2).position(|w| w[0] >= w[1]) {
        return Err(SparseError::InvalidArgument(format!(
            "row indices must be strictly ascending (position {}: {} followed by {})",
            pos + 1,
            ranks[pos],
            ranks[pos + 1]
        )));
    }
    Ok(())
}

/// Connect every post rank to exactly `count` distinct pre ranks
///
/// Columns of each row are sampled without replacement and sorted ascending.
pub fn build_fixed_count<I, R>(
    post_ranks: &[I],
    pre_ranks: &[I],
    count: usize,
    rng: &mut R,
) -> SparseResult<ListInput<I>>
where
    I: SparseIndex,
    R: Rng + ?Sized,
{
    ensure_strictly_ascending(post_ranks)?;
    if count > pre_ranks.len() {
        return Err(SparseError::InvalidArgument(format!(
            "cannot draw {} distinct pre ranks from {} candidates",
            count,
            pre_ranks.len()
        )));
    }
    if count == 0 {
        return Ok(ListInput::default());
    }

    let mut columns = Vec::with_capacity(post_ranks.len());
    for _ in post_ranks {
        let mut row: Vec<I> = index::sample(rng, pre_ranks.len(), count)
            .into_iter()
            .map(|i| pre_ranks[i])
            .collect();
        row.sort_unstable();
        columns.push(row);
    }

    debug!(
        rows = post_ranks.len(),
        count,
        "generated fixed-count connectivity"
    );
    Ok(ListInput {
        post_ranks: post_ranks.to_vec(),
        pre_ranks: columns,
    })
}

/// Connect each (post, pre) pair independently with probability `probability`
///
/// Every candidate consumes one draw from `rng`, the diagonal included, so a
/// seed yields the same off-diagonal entries whether or not self connections
/// are allowed. The diagonal (`pre == post`) is dropped unless
/// `allow_self_connections` is set. Rows that receive no entries are omitted.
pub fn build_fixed_probability<I, R>(
    post_ranks: &[I],
    pre_ranks: &[I],
    probability: f64,
    allow_self_connections: bool,
    rng: &mut R,
) -> SparseResult<ListInput<I>>
where
    I: SparseIndex,
    R: Rng + ?Sized,
{
    ensure_strictly_ascending(post_ranks)?;
    if !(0.0..=1.0).contains(&probability) {
        return Err(SparseError::InvalidArgument(format!(
            "connection probability {} outside [0, 1]",
            probability
        )));
    }

    let mut input = ListInput::default();
    for &post in post_ranks {
        let row: Vec<I> = pre_ranks
            .iter()
            .copied()
            .filter(|&pre| rng.gen_bool(probability) && (allow_self_connections || pre != post))
            .collect();

        if !row.is_empty() {
            input.post_ranks.push(post);
            input.pre_ranks.push(row);
        }
    }

    debug!(
        rows = input.row_count(),
        nnz = input.total_entries(),
        probability,
        "generated fixed-probability connectivity"
    );
    Ok(input)
}
