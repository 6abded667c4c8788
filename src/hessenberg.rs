//! The growing upper Hessenberg matrix, its accumulated Givens rotations, and
//! the rotated right-hand-side shadow `g`.
//!
//! Replaces the source's `Double**` pointer-to-pointer tables with a flat
//! row-major buffer, per the Design Notes. Only entries on or above the
//! first subdiagonal are ever written; the access pattern is always
//! `H[i][j]` with `i <= j + 1`.

/// Dense `(m+1) x m` Hessenberg store plus its Givens rotations and the
/// rotated RHS shadow `g`, all re-zeroed (not reallocated) at the start of
/// every restart cycle.
pub struct HessenbergStore {
    m: usize,
    /// Row-major, `(m+1)` rows by `m` columns.
    h: Vec<f64>,
    /// One `(cos, sin)` pair per row position, `m` entries.
    givens: Vec<(f64, f64)>,
    /// Rotated right-hand side, `m+1` entries.
    pub g: Vec<f64>,
}

impl HessenbergStore {
    /// Allocate a store with capacity for a Krylov dimension of `m`.
    pub fn with_capacity(m: usize) -> Self {
        Self {
            m,
            h: vec![0.0; (m + 1) * m],
            givens: vec![(0.0, 0.0); m],
            g: vec![0.0; m + 1],
        }
    }

    /// Re-zero all buffers for a fresh restart cycle. Capacity is retained.
    pub fn reset(&mut self) {
        self.h.iter_mut().for_each(|v| *v = 0.0);
        self.givens.iter_mut().for_each(|v| *v = (0.0, 0.0));
        self.g.iter_mut().for_each(|v| *v = 0.0);
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> usize {
        row * self.m + col
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.h[self.index(row, col)]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        let idx = self.index(row, col);
        self.h[idx] = value;
    }

    pub fn rotation(&self, row: usize) -> (f64, f64) {
        self.givens[row]
    }

    pub fn set_rotation(&mut self, row: usize, cs: (f64, f64)) {
        self.givens[row] = cs;
    }
}
