//! The linear-operator contract consumed by the GMRES core, plus a handful of
//! reference implementations for exercising the solver on plain `Vec<f64>`
//! systems.

use faer::prelude::*;
use faer::sparse::{SparseColMat, Triplet};

use crate::operand::Operand;

/// Wraps a linear map `A`. `apply` is pure: it must not mutate `v` and may
/// allocate a fresh result. No symmetry, positive-definiteness, or sparsity
/// is assumed.
pub trait Operator<V: Operand> {
    /// Compute `A * v`.
    fn apply(&self, v: &V) -> V;
}

/// A diagonal operator `A = diag(d_0, ..., d_{n-1})` over `Vec<f64>`.
///
/// Useful as a minimal test fixture; not a substitute for a concrete PDE
/// operator, which remains an external collaborator of this crate.
pub struct DiagonalOperator {
    diag: Vec<f64>,
}

impl DiagonalOperator {
    pub fn new(diag: Vec<f64>) -> Self {
        Self { diag }
    }
}

impl Operator<Vec<f64>> for DiagonalOperator {
    fn apply(&self, v: &Vec<f64>) -> Vec<f64> {
        assert_eq!(v.len(), self.diag.len());
        v.iter().zip(self.diag.iter()).map(|(vi, di)| vi * di).collect()
    }
}

/// A dense row-major operator over `Vec<f64>`.
pub struct DenseOperator {
    rows: Vec<Vec<f64>>,
}

impl DenseOperator {
    /// Build from a row-major dense matrix.
    pub fn new(rows: Vec<Vec<f64>>) -> Self {
        Self { rows }
    }

    pub fn dim(&self) -> usize {
        self.rows.len()
    }
}

impl Operator<Vec<f64>> for DenseOperator {
    fn apply(&self, v: &Vec<f64>) -> Vec<f64> {
        let n = self.dim();
        assert_eq!(v.len(), n);
        let mut out = vec![0.0; n];
        for (i, row) in self.rows.iter().enumerate() {
            let mut acc = 0.0;
            for (j, &aij) in row.iter().enumerate() {
                acc += aij * v[j];
            }
            out[i] = acc;
        }
        out
    }
}

/// A sparse operator over `Vec<f64>`, backed by a `faer` CSC matrix.
///
/// Wraps a `faer::sparse::SparseColMat<usize, f64>`, the same representation
/// used for the sparse MNA matrices this solver was originally paired with.
pub struct SparseOperator {
    matrix: SparseColMat<usize, f64>,
}

impl SparseOperator {
    pub fn from_matrix(matrix: SparseColMat<usize, f64>) -> Self {
        Self { matrix }
    }

    /// Build from `(row, col, value)` triplets; duplicate entries are summed.
    pub fn from_triplets(size: usize, triplets: &[(usize, usize, f64)]) -> Option<Self> {
        let faer_triplets: Vec<_> = triplets.iter().map(|&(r, c, v)| Triplet::new(r, c, v)).collect();
        SparseColMat::<usize, f64>::try_new_from_triplets(size, size, &faer_triplets)
            .ok()
            .map(|matrix| Self { matrix })
    }

    pub fn dim(&self) -> usize {
        self.matrix.nrows()
    }
}

impl Operator<Vec<f64>> for SparseOperator {
    fn apply(&self, v: &Vec<f64>) -> Vec<f64> {
        let n = self.dim();
        assert_eq!(v.len(), n);

        let mut out = vec![0.0; n];
        let mat_ref = self.matrix.as_ref();
        let col_ptrs = mat_ref.col_ptr();
        let row_indices = mat_ref.row_idx();
        let values = mat_ref.val();

        for j in 0..n {
            let col_start = col_ptrs[j];
            let col_end = col_ptrs[j + 1];
            let vj = v[j];
            for idx in col_start..col_end {
                let i = row_indices[idx];
                out[i] += values[idx] * vj;
            }
        }
        out
    }
}
