//! Restarted, right-preconditioned GMRES(m).
//!
//! - [`engine`] — the restart controller and inner Arnoldi/Givens iteration.
//! - [`helpers`] — the stable Givens rotation used to triangularize `H`.
//!
//! # Usage
//!
//! ```
//! use gmres_solver::{solve, GmresConfig};
//! use gmres_solver::operator::DiagonalOperator;
//! use gmres_solver::preconditioner::IdentityPreconditioner;
//!
//! let op = DiagonalOperator::new(vec![1.0, 2.0, 3.0, 4.0]);
//! let precond = IdentityPreconditioner;
//! let b = vec![1.0, 1.0, 1.0, 1.0];
//! let mut x = vec![0.0; 4];
//!
//! let outcome = solve(&op, &precond, &mut x, &b, &GmresConfig::default()).unwrap();
//! assert!(matches!(outcome, gmres_solver::GmresOutcome::Converged { .. }));
//! ```

pub mod engine;
pub mod helpers;

pub use engine::solve;

use crate::error::BreakdownKind;

/// GMRES(m) configuration: restart dimension, outer cycle budget, and
/// convergence tolerance.
#[derive(Debug, Clone)]
pub struct GmresConfig {
    /// Krylov subspace dimension per restart cycle (`m >= 1`).
    pub m: usize,
    /// Maximum number of outer restart cycles.
    pub max_restarts: usize,
    /// Relative residual tolerance (`tol > 0`).
    pub tol: f64,
    /// Minimum denominator used for the relative residual test, guarding
    /// against a vanishingly small `||b||`.
    pub rhs_norm_floor: f64,
}

impl Default for GmresConfig {
    fn default() -> Self {
        Self {
            m: 30,
            max_restarts: 500,
            tol: 1e-8,
            rhs_norm_floor: 1e-5,
        }
    }
}

impl GmresConfig {
    pub fn with_m(mut self, m: usize) -> Self {
        self.m = m;
        self
    }

    pub fn with_max_restarts(mut self, max_restarts: usize) -> Self {
        self.max_restarts = max_restarts;
        self
    }

    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn with_rhs_norm_floor(mut self, rhs_norm_floor: f64) -> Self {
        self.rhs_norm_floor = rhs_norm_floor;
        self
    }
}

/// Result of a call to [`solve`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GmresOutcome {
    /// The final residual satisfies the relative tolerance. `iterations` is
    /// the total number of inner (Arnoldi) iterations across all cycles.
    Converged { iterations: usize },
    /// The restart budget was exhausted above tolerance; `x` still holds the
    /// best iterate produced.
    NotConverged { iterations: usize },
    /// A numerical breakdown prevented further progress.
    Breakdown {
        kind: BreakdownKind,
        iterations: usize,
    },
}
