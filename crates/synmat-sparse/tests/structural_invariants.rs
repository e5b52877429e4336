// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Property tests over arbitrary list inputs

use proptest::prelude::*;
use synmat_sparse::{
    CsrMatrix, CsrcMatrix, EllLayout, EllMatrix, ListInput, SparseConnectivity,
};

/// `(num_rows, num_columns, input)` with ascending rows, possibly empty or duplicated columns
fn list_input() -> impl Strategy<Value = (usize, usize, ListInput<u32>)> {
    (1usize..24, 1usize..24).prop_flat_map(|(rows, cols)| {
        let row = prop::option::of(prop::collection::vec(0..cols as u32, 0..=cols));
        prop::collection::vec(row, rows).prop_map(move |slots| {
            let mut input = ListInput::default();
            for (r, columns) in slots.into_iter().enumerate() {
                if let Some(columns) = columns {
                    input.post_ranks.push(r as u32);
                    input.pre_ranks.push(columns);
                }
            }
            (rows, cols, input)
        })
    })
}

proptest! {
    #[test]
    fn csr_preserves_rows((rows, cols, input) in list_input()) {
        let m: CsrMatrix = CsrMatrix::from_lil(rows, cols, &input).unwrap();

        prop_assert_eq!(m.nnz(), input.total_entries());
        prop_assert_eq!(m.post_ranks(), input.post_ranks.as_slice());
        for (lil, columns) in input.pre_ranks.iter().enumerate() {
            prop_assert_eq!(&m.dendrite_columns(lil).unwrap(), columns);
            prop_assert_eq!(m.entry_count(lil).unwrap(), columns.len());
        }
        prop_assert_eq!(m.to_list_input().unwrap(), input);
    }

    #[test]
    fn csr_row_pointers_are_consistent((rows, cols, input) in list_input()) {
        let m: CsrMatrix<u16, u64> = {
            let narrowed = ListInput::new(
                input.post_ranks.iter().map(|&r| r as u16).collect(),
                input.pre_ranks.iter().map(|row| row.iter().map(|&c| c as u16).collect()).collect(),
            ).unwrap();
            CsrMatrix::from_lil(rows, cols, &narrowed).unwrap()
        };

        let row_begin = m.row_begin();
        prop_assert_eq!(row_begin.len(), rows + 1);
        prop_assert!(row_begin.windows(2).all(|w| w[0] <= w[1]));
        prop_assert_eq!(row_begin[rows] as usize, m.nnz());
        for r in 0..rows {
            if !input.post_ranks.contains(&(r as u32)) {
                prop_assert_eq!(row_begin[r], row_begin[r + 1]);
            }
        }
    }

    #[test]
    fn csrc_inverse_index_is_a_bijection((rows, cols, input) in list_input()) {
        let m: CsrcMatrix = CsrcMatrix::from_lil(rows, cols, &input).unwrap();
        let nnz = m.nnz();

        let mut seen: Vec<usize> = m.inv_idx().iter().map(|&p| p as usize).collect();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..nnz).collect::<Vec<_>>());
        prop_assert_eq!(m.col_ptr()[cols] as usize, nnz);

        // dense row of every forward position
        let mut forward_row = vec![0usize; nnz];
        for r in 0..rows {
            let range = m.dense_row_range(r).unwrap();
            forward_row[range].fill(r);
        }

        for c in 0..cols {
            for q in m.column_range(c).unwrap() {
                let p = m.inv_idx()[q] as usize;
                prop_assert_eq!(m.col_idx()[p] as usize, c);
                prop_assert_eq!(m.row_idx()[q] as usize, forward_row[p]);
            }
            let rows_of_column = m.column_rows(c).unwrap();
            prop_assert!(rows_of_column.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn ell_shape_matches_input(
        (rows, cols, input) in list_input(),
        column_major in any::<bool>(),
    ) {
        let layout = if column_major { EllLayout::ColumnMajor } else { EllLayout::RowMajor };
        let m: EllMatrix = EllMatrix::from_lil(rows, cols, layout, &input).unwrap();

        prop_assert_eq!(m.maxnzr(), input.max_row_length());
        prop_assert_eq!(m.padded_len(), m.maxnzr() * input.row_count());
        prop_assert_eq!(m.total_entries(), input.total_entries());

        let dense = m.dense_column_indices();
        for (lil, columns) in input.pre_ranks.iter().enumerate() {
            prop_assert_eq!(m.rl()[lil], columns.len());
            prop_assert_eq!(m.entry_count(lil).unwrap(), columns.len());
            prop_assert_eq!(&m.dendrite_columns(lil).unwrap(), columns);
            for offset in columns.len()..m.maxnzr() {
                prop_assert_eq!(dense[[lil, offset]], 0);
            }
        }
    }

    #[test]
    fn row_writes_read_back((rows, cols, input) in list_input(), seed in any::<i32>()) {
        let csr: CsrMatrix = CsrMatrix::from_lil(rows, cols, &input).unwrap();
        let ell: EllMatrix = EllMatrix::from_lil(rows, cols, EllLayout::RowMajor, &input).unwrap();

        let mut csr_var = csr.init_matrix_variable(0i64);
        let mut ell_var = ell.init_matrix_variable(0i64);

        for (lil, columns) in input.pre_ranks.iter().enumerate() {
            let data: Vec<i64> = (0..columns.len())
                .map(|k| seed as i64 * 31 + (lil * 7 + k) as i64)
                .collect();
            csr.update_matrix_variable_row(&mut csr_var, lil, &data).unwrap();
            ell.update_matrix_variable_row(&mut ell_var, lil, &data).unwrap();
            prop_assert_eq!(&csr.get_matrix_variable_row(&csr_var, lil).unwrap(), &data);
            prop_assert_eq!(&ell.get_matrix_variable_row(&ell_var, lil).unwrap(), &data);
        }

        prop_assert_eq!(
            csr.get_matrix_variable_all(&csr_var).unwrap(),
            ell.get_matrix_variable_all(&ell_var).unwrap()
        );
    }
}
