//! Error types for the GMRES core.

use thiserror::Error;

/// Errors rejected before a solve allocates any of its working buffers.
#[derive(Debug, Error)]
pub enum GmresError {
    /// A configuration or input precondition was violated (`m < 1`,
    /// `tol <= 0`, `rhs_norm_floor <= 0`, or `x`/`b` shapes disagree).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type for [`crate::solve`].
pub type Result<T> = std::result::Result<T, GmresError>;

/// Which numerical breakdown stopped the iteration, see
/// [`crate::gmres::GmresOutcome::Breakdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakdownKind {
    /// The Arnoldi subdiagonal entry `H[j+1][j]` underflowed below the
    /// breakdown floor, and the residual test did not hold for the subspace
    /// built so far.
    ZeroSubdiagonal,
    /// A zero pivot (`H[k][k] == 0`) was encountered during back-substitution.
    SingularTriangular,
}

impl std::fmt::Display for BreakdownKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BreakdownKind::ZeroSubdiagonal => write!(f, "zero Arnoldi subdiagonal"),
            BreakdownKind::SingularTriangular => write!(f, "singular triangular pivot"),
        }
    }
}
