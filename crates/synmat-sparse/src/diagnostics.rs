// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Diagnostic records for sparse stores
//!
//! Stores never print. They return these records and the caller decides whether
//! to log them, assert on them or serialise them.

use core::fmt;

use serde::Serialize;

/// Storage format tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatKind {
    Csr,
    Csrc,
    Ellpack,
}

impl FormatKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatKind::Csr => "CSR",
            FormatKind::Csrc => "CSRC",
            FormatKind::Ellpack => "ELLPACK",
        }
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dense sub-matrix ordering used by ELLPACK
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EllLayout {
    /// `col_idx[row * maxnzr + c]`, the fully supported path
    #[default]
    RowMajor,
    /// `col_idx[c * num_rows + row]`, intended for coalesced device access
    ColumnMajor,
}

impl EllLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            EllLayout::RowMajor => "row_major",
            EllLayout::ColumnMajor => "column_major",
        }
    }
}

impl fmt::Display for EllLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary statistics of a store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixStatistics {
    pub format: FormatKind,
    pub num_rows: usize,
    pub num_columns: usize,
    pub nnz: usize,
    /// Dense rows without any entry
    pub empty_rows: usize,
    /// Mean entries over non-empty rows (0.0 if there are none)
    pub avg_nnz_per_row: f64,
    /// ELLPACK only: `(stored rows, maxnzr)`
    pub dense_shape: Option<(usize, usize)>,
    /// ELLPACK only
    pub layout: Option<EllLayout>,
}

impl MatrixStatistics {
    pub(crate) fn from_row_lengths(
        format: FormatKind,
        num_rows: usize,
        num_columns: usize,
        row_lengths: impl IntoIterator<Item = usize>,
    ) -> Self {
        let (sum, non_empty) = row_lengths
            .into_iter()
            .filter(|&len| len > 0)
            .fold((0usize, 0usize), |(sum, rows), len| (sum + len, rows + 1));

        let avg_nnz_per_row = if non_empty == 0 {
            0.0
        } else {
            sum as f64 / non_empty as f64
        };

        Self {
            format,
            num_rows,
            num_columns,
            nnz: sum,
            empty_rows: num_rows.saturating_sub(non_empty),
            avg_nnz_per_row,
            dense_shape: None,
            layout: None,
        }
    }
}

impl fmt::Display for MatrixStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  format: {}", self.format)?;
        writeln!(f, "  #rows: {}", self.num_rows)?;
        writeln!(f, "  #columns: {}", self.num_columns)?;
        writeln!(f, "  #nnz: {}", self.nnz)?;
        writeln!(f, "  empty rows: {}", self.empty_rows)?;
        write!(f, "  avg_nnz_per_row: {:.3}", self.avg_nnz_per_row)?;
        if let Some((rows, maxnzr)) = self.dense_shape {
            write!(f, "\n  dense matrix = ({}, {})", rows, maxnzr)?;
            if let Some(layout) = self.layout {
                write!(f, " stored as {}", layout)?;
            }
        }
        Ok(())
    }
}

/// Full dump of the structural arrays, widened to `u64`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataRepresentation {
    pub statistics: MatrixStatistics,
    /// Named flat arrays (`row_begin`, `col_idx`, ...)
    pub arrays: Vec<(&'static str, Vec<u64>)>,
    /// ELLPACK only: dense column indices per stored row, padding included
    pub dense_rows: Option<Vec<Vec<u64>>>,
}

impl DataRepresentation {
    /// Look up a named array
    pub fn array(&self, name: &str) -> Option<&[u64]> {
        self.arrays
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, values)| values.as_slice())
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, values: &[u64]) -> fmt::Result {
    f.write_str("[ ")?;
    for v in values {
        write!(f, "{} ", v)?;
    }
    f.write_str("]")
}

impl fmt::Display for DataRepresentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} matrix", self.statistics.format)?;
        writeln!(f, "{}", self.statistics)?;
        for (name, values) in &self.arrays {
            write!(f, "  {} = ", name)?;
            write_list(f, values)?;
            writeln!(f)?;
        }
        if let Some(rows) = &self.dense_rows {
            writeln!(f, "  column_indices = [")?;
            for row in rows {
                f.write_str("    ")?;
                write_list(f, row)?;
                writeln!(f, ",")?;
            }
            writeln!(f, "  ]")?;
        }
        Ok(())
    }
}

pub(crate) fn widen<T: crate::SparseIndex>(values: &[T]) -> Vec<u64> {
    values.iter().map(|v| v.as_usize() as u64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics_from_row_lengths() {
        let stats = MatrixStatistics::from_row_lengths(FormatKind::Csr, 4, 3, [1, 2, 0, 1]);
        assert_eq!(stats.nnz, 4);
        assert_eq!(stats.empty_rows, 1);
        assert!((stats.avg_nnz_per_row - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_statistics_empty() {
        let stats = MatrixStatistics::from_row_lengths(FormatKind::Ellpack, 5, 5, []);
        assert_eq!(stats.nnz, 0);
        assert_eq!(stats.empty_rows, 5);
        assert_eq!(stats.avg_nnz_per_row, 0.0);
    }

    #[test]
    fn test_display_contains_shape() {
        let mut stats = MatrixStatistics::from_row_lengths(FormatKind::Ellpack, 4, 3, [1, 2, 1]);
        stats.dense_shape = Some((3, 2));
        stats.layout = Some(EllLayout::RowMajor);
        let text = stats.to_string();
        assert!(text.contains("dense matrix = (3, 2) stored as row_major"));
        assert!(text.contains("empty rows: 1"));
    }
}
