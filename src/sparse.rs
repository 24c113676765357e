//! Sparse matrix assembly support.
//!
//! Assembly accumulates (row, col, value) triplets and converts to CSR once
//! complete; duplicate entries from shared DOFs are summed during the
//! conversion. CSR is the handoff format to the linear solvers.

use nalgebra_sparse::csr::CsrMatrix as NalgebraCsr;

/// Compressed Sparse Row matrix.
pub type CsrMatrix = NalgebraCsr<f64>;

/// Triplet (COO) accumulator for global-system assembly.
pub struct TripletMatrix {
    n_rows: usize,
    n_cols: usize,
    rows: Vec<usize>,
    cols: Vec<usize>,
    values: Vec<f64>,
}

impl TripletMatrix {
    /// Create an empty accumulator.
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            rows: Vec::new(),
            cols: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Create with an estimated non-zero capacity.
    pub fn with_capacity(n_rows: usize, n_cols: usize, nnz_estimate: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            rows: Vec::with_capacity(nnz_estimate),
            cols: Vec::with_capacity(nnz_estimate),
            values: Vec::with_capacity(nnz_estimate),
        }
    }

    /// Add a value at (row, col). Duplicates are summed on conversion.
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        debug_assert!(row < self.n_rows, "row index out of bounds");
        debug_assert!(col < self.n_cols, "column index out of bounds");

        if value.abs() > f64::EPSILON {
            self.rows.push(row);
            self.cols.push(col);
            self.values.push(value);
        }
    }

    /// Scatter a dense local block into the global positions `rows`/`cols`.
    /// Entries mapped outside the matrix bounds are dropped, which is how
    /// fixed-DOF rows and columns are eliminated during assembly.
    pub fn scatter(&mut self, rows: &[usize], cols: &[usize], block: &nalgebra::DMatrix<f64>) {
        debug_assert_eq!(block.nrows(), rows.len());
        debug_assert_eq!(block.ncols(), cols.len());

        for (i, &gi) in rows.iter().enumerate() {
            if gi >= self.n_rows {
                continue;
            }
            for (j, &gj) in cols.iter().enumerate() {
                if gj >= self.n_cols {
                    continue;
                }
                let value = block[(i, j)];
                if value.abs() > f64::EPSILON {
                    self.rows.push(gi);
                    self.cols.push(gj);
                    self.values.push(value);
                }
            }
        }
    }

    /// Number of stored triplets.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Convert to CSR, summing duplicate entries.
    pub fn to_csr(self) -> CsrMatrix {
        use nalgebra_sparse::coo::CooMatrix;

        let coo =
            CooMatrix::try_from_triplets(self.n_rows, self.n_cols, self.rows, self.cols, self.values)
                .expect("triplet indices validated on insertion");
        CsrMatrix::from(&coo)
    }
}

/// Sparse matrix-vector product y = A·x.
pub fn spmv(matrix: &CsrMatrix, x: &[f64]) -> Vec<f64> {
    debug_assert_eq!(matrix.ncols(), x.len());
    let mut y = vec![0.0; matrix.nrows()];
    for (row, lane) in matrix.row_iter().enumerate() {
        let mut acc = 0.0;
        for (&col, &value) in lane.col_indices().iter().zip(lane.values()) {
            acc += value * x[col];
        }
        y[row] = acc;
    }
    y
}

/// Euclidean norm of a vector.
pub fn norm(x: &[f64]) -> f64 {
    x.iter().map(|v| v * v).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    #[test]
    fn test_triplet_to_csr() {
        let mut triplet = TripletMatrix::new(3, 3);
        triplet.add(0, 0, 1.0);
        triplet.add(1, 1, 2.0);
        triplet.add(2, 2, 3.0);
        triplet.add(0, 1, 0.5);

        let csr = triplet.to_csr();
        assert_eq!(csr.nrows(), 3);
        assert_eq!(csr.nnz(), 4);
    }

    #[test]
    fn test_duplicate_summation() {
        let mut triplet = TripletMatrix::new(2, 2);
        triplet.add(0, 0, 1.0);
        triplet.add(0, 0, 2.5);

        let csr = triplet.to_csr();
        let dense = DMatrix::from(&csr);
        assert_relative_eq!(dense[(0, 0)], 3.5, epsilon = 1e-12);
    }

    #[test]
    fn test_scatter_drops_out_of_range() {
        // 2x2 free system; equation ids >= 2 belong to fixed DOFs.
        let mut triplet = TripletMatrix::new(2, 2);
        let block = DMatrix::from_row_slice(3, 3, &[
            4.0, 1.0, 9.0,
            1.0, 5.0, 9.0,
            9.0, 9.0, 9.0,
        ]);
        triplet.scatter(&[0, 1, 2], &[0, 1, 2], &block);

        let dense = DMatrix::from(&triplet.to_csr());
        assert_relative_eq!(dense[(0, 0)], 4.0);
        assert_relative_eq!(dense[(0, 1)], 1.0);
        assert_relative_eq!(dense[(1, 1)], 5.0);
    }

    #[test]
    fn test_spmv() {
        let mut triplet = TripletMatrix::new(2, 2);
        triplet.add(0, 0, 2.0);
        triplet.add(0, 1, 1.0);
        triplet.add(1, 1, 3.0);
        let csr = triplet.to_csr();

        let y = spmv(&csr, &[1.0, 2.0]);
        assert_relative_eq!(y[0], 4.0);
        assert_relative_eq!(y[1], 6.0);
    }

    #[test]
    fn test_norm() {
        assert_relative_eq!(norm(&[3.0, 4.0]), 5.0);
        assert_relative_eq!(norm(&[]), 0.0);
    }
}
