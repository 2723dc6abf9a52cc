//! Sparse matrices in coordinate (triplet) form.
//!
//! Jacobians are produced node by node as `(row, col, value)` triplets and
//! converted to compressed sparse column storage for the QP backend.
//! Duplicate entries are summed on conversion.

use clarabel::algebra::CscMatrix;
use nalgebra::DMatrix;

/// A sparse matrix as unsorted triplets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripletMatrix {
    n_rows: usize,
    n_cols: usize,
    rows: Vec<usize>,
    cols: Vec<usize>,
    values: Vec<f64>,
}

impl TripletMatrix {
    /// Empty `n_rows × n_cols` matrix.
    #[must_use]
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            ..Self::default()
        }
    }

    /// Empty matrix with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(n_rows: usize, n_cols: usize, capacity: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            rows: Vec::with_capacity(capacity),
            cols: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Number of stored entries (duplicates counted).
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Append an entry. Exact zeros are dropped.
    pub fn push(&mut self, row: usize, col: usize, value: f64) {
        debug_assert!(row < self.n_rows && col < self.n_cols);
        if value != 0.0 {
            self.rows.push(row);
            self.cols.push(col);
            self.values.push(value);
        }
    }

    /// Append all entries of `other` shifted down by `row_offset`.
    pub fn append_rows(&mut self, other: &Self, row_offset: usize) {
        for ((&r, &c), &v) in other.rows.iter().zip(&other.cols).zip(&other.values) {
            self.push(r + row_offset, c, v);
        }
    }

    /// Iterate over `(row, col, value)`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.rows
            .iter()
            .zip(&self.cols)
            .zip(&self.values)
            .map(|((&r, &c), &v)| (r, c, v))
    }

    /// `y = A x`.
    #[must_use]
    pub fn mul_vec(&self, x: &[f64]) -> Vec<f64> {
        let mut y = vec![0.0; self.n_rows];
        for (r, c, v) in self.iter() {
            y[r] += v * x[c];
        }
        y
    }

    /// `y = Aᵀ x`.
    #[must_use]
    pub fn transpose_mul_vec(&self, x: &[f64]) -> Vec<f64> {
        let mut y = vec![0.0; self.n_cols];
        for (r, c, v) in self.iter() {
            y[c] += v * x[r];
        }
        y
    }

    /// Entries grouped by row, duplicates summed, columns ascending.
    #[must_use]
    pub fn row_lists(&self) -> Vec<Vec<(usize, f64)>> {
        let mut lists = vec![Vec::new(); self.n_rows];
        for (r, c, v) in self.iter() {
            lists[r].push((c, v));
        }
        for list in &mut lists {
            list.sort_unstable_by_key(|&(c, _)| c);
            list.dedup_by(|next, kept| {
                if next.0 == kept.0 {
                    kept.1 += next.1;
                    true
                } else {
                    false
                }
            });
        }
        lists
    }

    /// Compressed sparse column form.
    #[must_use]
    pub fn to_csc(&self) -> CscMatrix<f64> {
        let mut order: Vec<usize> = (0..self.nnz()).collect();
        order.sort_unstable_by_key(|&k| (self.cols[k], self.rows[k]));

        let mut colptr = vec![0usize; self.n_cols + 1];
        let mut rowval: Vec<usize> = Vec::with_capacity(self.nnz());
        let mut nzval: Vec<f64> = Vec::with_capacity(self.nnz());
        let mut last: Option<(usize, usize)> = None;
        for k in order {
            let key = (self.cols[k], self.rows[k]);
            if last == Some(key) {
                if let Some(v) = nzval.last_mut() {
                    *v += self.values[k];
                }
                continue;
            }
            last = Some(key);
            rowval.push(key.1);
            nzval.push(self.values[k]);
            colptr[key.0 + 1] += 1;
        }
        for j in 0..self.n_cols {
            colptr[j + 1] += colptr[j];
        }
        CscMatrix::new(self.n_rows, self.n_cols, colptr, rowval, nzval)
    }

    /// Dense copy.
    #[must_use]
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut m = DMatrix::zeros(self.n_rows, self.n_cols);
        for (r, c, v) in self.iter() {
            m[(r, c)] += v;
        }
        m
    }
}
