// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for sparse connectivity storage

/// Result type for sparse storage operations
pub type SparseResult<T> = Result<T, SparseError>;

/// Errors raised while building or accessing a sparse store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SparseError {
    /// Row/column counts, entry counts or variable sizes disagree
    #[error("Connectivity mismatch in {context}: expected {expected}, got {actual}")]
    ConnectivityMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Index access beyond the stored rows, columns or pointers
    #[error("Index {index} out of range for {context} (bound: {bound})")]
    OutOfRange {
        context: &'static str,
        index: usize,
        bound: usize,
    },

    /// Operation not supported by the current format/layout combination
    #[error("{operation} is not implemented for {format}")]
    NotImplemented {
        operation: &'static str,
        format: &'static str,
    },

    /// A value does not fit into the configured index type
    #[error("Value {value} does not fit into index type {type_name}")]
    IndexOverflow {
        value: usize,
        type_name: &'static str,
    },

    /// Point update addressed a (row, column) pair with no stored entry
    #[error("No entry stored at row {row}, column {column}")]
    EntryNotFound { row: usize, column: usize },

    /// Caller supplied an argument outside its domain
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl SparseError {
    pub(crate) fn mismatch(context: &'static str, expected: usize, actual: usize) -> Self {
        SparseError::ConnectivityMismatch {
            context,
            expected,
            actual,
        }
    }

    pub(crate) fn out_of_range(context: &'static str, index: usize, bound: usize) -> Self {
        SparseError::OutOfRange {
            context,
            index,
            bound,
        }
    }

    pub(crate) fn not_implemented(operation: &'static str, format: &'static str) -> Self {
        SparseError::NotImplemented { operation, format }
    }
}

/// Fails with `ConnectivityMismatch` unless `actual == expected`
#[inline]
pub(crate) fn ensure_len(
    context: &'static str,
    expected: usize,
    actual: usize,
) -> SparseResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(SparseError::mismatch(context, expected, actual))
    }
}

/// Fails with `OutOfRange` unless `index < bound`
#[inline]
pub(crate) fn ensure_in_range(
    context: &'static str,
    index: usize,
    bound: usize,
) -> SparseResult<()> {
    if index < bound {
        Ok(())
    } else {
        Err(SparseError::out_of_range(context, index, bound))
    }
}
