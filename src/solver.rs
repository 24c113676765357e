//! Linear system solvers.
//!
//! Solves the assembled free-DOF system K·Δx = b once per nonlinear
//! iteration.
//!
//! # Backends
//!
//! - [`SparseCholesky`]: sparse LLᵀ factorization through faer. The
//!   assembled tangent of the supported elements is symmetric positive
//!   definite once the Dirichlet partition is applied, so this is the
//!   production path.
//! - [`CachedCholesky`]: same factorization with the symbolic analysis
//!   reused across solves; the Newton-Raphson strategy rebuilds values every
//!   iteration while the sparsity pattern stays constant.
//! - [`DenseLu`]: nalgebra dense LU for small systems and tests.

use crate::error::{Error, Result};
use crate::sparse::CsrMatrix;
use faer::prelude::*;
use faer::sparse::linalg::solvers::{Cholesky as Llt, SymbolicCholesky as SymbolicLlt};
use faer::sparse::linalg::CholeskyError as SparseLltError;
use faer::sparse::{SparseColMat, SymbolicSparseColMat};

/// Linear solver interface.
pub trait LinearSolver: Send + Sync {
    /// Solve K·x = b, returning x.
    fn solve(&self, matrix: &CsrMatrix, rhs: &[f64]) -> Result<Vec<f64>>;

    /// Solver name for diagnostics.
    fn name(&self) -> &str;
}

fn check_dimensions(matrix: &CsrMatrix, rhs: &[f64]) -> Result<usize> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(Error::Solver("matrix must be square".into()));
    }
    if n != rhs.len() {
        return Err(Error::Solver(format!(
            "rhs size {} does not match system size {}",
            rhs.len(),
            n
        )));
    }
    Ok(n)
}

/// Convert an assembled CSR matrix to faer's CSC format.
///
/// The assembled tangents are symmetric, so the CSR data reinterpreted
/// column-wise is the CSC form of the same matrix (K = Kᵀ).
fn csr_to_faer_csc(csr: &CsrMatrix) -> SparseColMat<usize, f64> {
    let nrows = csr.nrows();
    let ncols = csr.ncols();

    let (row_offsets, col_indices, values) = (csr.row_offsets(), csr.col_indices(), csr.values());

    let mut col_counts = vec![0usize; ncols];
    for &col in col_indices {
        col_counts[col] += 1;
    }

    let mut col_offsets = vec![0usize; ncols + 1];
    for i in 0..ncols {
        col_offsets[i + 1] = col_offsets[i] + col_counts[i];
    }

    let nnz = values.len();
    let mut csc_row_indices = vec![0usize; nnz];
    let mut csc_values = vec![0.0f64; nnz];
    let mut col_positions = col_offsets[..ncols].to_vec();

    for row in 0..nrows {
        for idx in row_offsets[row]..row_offsets[row + 1] {
            let col = col_indices[idx];
            let pos = col_positions[col];
            csc_row_indices[pos] = row;
            csc_values[pos] = values[idx];
            col_positions[col] += 1;
        }
    }

    // SAFETY: offsets and indices were constructed consistently above.
    unsafe {
        SparseColMat::new(
            SymbolicSparseColMat::new_unchecked(nrows, ncols, col_offsets, None, csc_row_indices),
            csc_values,
        )
    }
}

fn map_llt_error(e: SparseLltError) -> Error {
    match e {
        SparseLltError::Generic(err) => Error::Solver(format!("sparse Cholesky error: {:?}", err)),
        SparseLltError::SymbolicSingular | SparseLltError::NotPositiveDefinite => {
            Error::SingularSystem("matrix is not positive definite".into())
        }
    }
}

/// Sparse Cholesky (LLᵀ) solver backed by faer.
pub struct SparseCholesky;

impl SparseCholesky {
    /// Create a new sparse Cholesky solver.
    pub fn new() -> Self {
        Self
    }
}

impl Default for SparseCholesky {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearSolver for SparseCholesky {
    fn solve(&self, matrix: &CsrMatrix, rhs: &[f64]) -> Result<Vec<f64>> {
        let n = check_dimensions(matrix, rhs)?;
        if n == 0 {
            return Ok(vec![]);
        }

        let csc = csr_to_faer_csc(matrix);
        let csc_ref = csc.as_ref();

        let symbolic = SymbolicLlt::try_new(csc_ref.symbolic(), faer::Side::Lower)
            .map_err(|_| Error::Solver("symbolic Cholesky analysis failed".into()))?;
        let llt = Llt::try_new_with_symbolic(symbolic, csc_ref, faer::Side::Lower)
            .map_err(map_llt_error)?;

        let mut x = faer::Mat::from_fn(n, 1, |i, _| rhs[i]);
        llt.solve_in_place(x.as_mut());
        Ok((0..n).map(|i| x[(i, 0)]).collect())
    }

    fn name(&self) -> &str {
        "sparse Cholesky (LLᵀ)"
    }
}

/// Sparse Cholesky with cached symbolic factorization.
///
/// Newton-Raphson iterations refactorize the same sparsity pattern with new
/// values; [`CachedCholesky::analyze`] runs the symbolic analysis once and
/// subsequent solves reuse it.
pub struct CachedCholesky {
    symbolic: Option<SymbolicLlt<usize>>,
}

impl CachedCholesky {
    /// Create an unanalyzed cached solver.
    pub fn new() -> Self {
        Self { symbolic: None }
    }

    /// Whether a symbolic factorization is cached.
    pub fn is_analyzed(&self) -> bool {
        self.symbolic.is_some()
    }

    /// Run the symbolic analysis for the matrix sparsity pattern.
    pub fn analyze(&mut self, matrix: &CsrMatrix) -> Result<()> {
        let csc = csr_to_faer_csc(matrix);
        let symbolic = SymbolicLlt::try_new(csc.as_ref().symbolic(), faer::Side::Lower)
            .map_err(|_| Error::Solver("symbolic Cholesky analysis failed".into()))?;
        self.symbolic = Some(symbolic);
        Ok(())
    }
}

impl Default for CachedCholesky {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearSolver for CachedCholesky {
    fn solve(&self, matrix: &CsrMatrix, rhs: &[f64]) -> Result<Vec<f64>> {
        let symbolic = match &self.symbolic {
            Some(s) => s,
            // Not analyzed: fall back to a one-shot solve.
            None => return SparseCholesky::new().solve(matrix, rhs),
        };

        let n = check_dimensions(matrix, rhs)?;
        if n == 0 {
            return Ok(vec![]);
        }

        let csc = csr_to_faer_csc(matrix);
        let llt = Llt::try_new_with_symbolic(symbolic.clone(), csc.as_ref(), faer::Side::Lower)
            .map_err(map_llt_error)?;

        let mut x = faer::Mat::from_fn(n, 1, |i, _| rhs[i]);
        llt.solve_in_place(x.as_mut());
        Ok((0..n).map(|i| x[(i, 0)]).collect())
    }

    fn name(&self) -> &str {
        "sparse Cholesky (cached symbolic)"
    }
}

/// Dense LU solver for small systems and tests.
pub struct DenseLu;

impl DenseLu {
    /// Create a dense LU solver.
    pub fn new() -> Self {
        Self
    }
}

impl Default for DenseLu {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearSolver for DenseLu {
    fn solve(&self, matrix: &CsrMatrix, rhs: &[f64]) -> Result<Vec<f64>> {
        use nalgebra::{DMatrix, DVector};

        let n = check_dimensions(matrix, rhs)?;
        if n == 0 {
            return Ok(vec![]);
        }

        let dense = DMatrix::from(matrix);
        let b = DVector::from_column_slice(rhs);
        let solution = dense
            .lu()
            .solve(&b)
            .ok_or_else(|| Error::SingularSystem("LU factorization failed".into()))?;
        Ok(solution.as_slice().to_vec())
    }

    fn name(&self) -> &str {
        "dense LU"
    }
}
