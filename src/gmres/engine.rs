//! The restart controller and inner Arnoldi/Givens iteration, combined into
//! the single public entry point `solve`.
//!
//! An outer `for cycle in 0..max_restarts` loop recomputes the residual,
//! wrapping an inner `for j in 0..m` loop that performs one Arnoldi step,
//! rotates the new Hessenberg column, and checks the residual shadow. Every
//! operand operation goes through the generic [`crate::operand::Operand`]
//! trait, so the same loop runs over `Vec<f64>` or any other conforming
//! operand type.

use super::helpers::givens_rotation;
use super::{GmresConfig, GmresOutcome};
use crate::basis::KrylovBasis;
use crate::error::{BreakdownKind, GmresError, Result};
use crate::hessenberg::HessenbergStore;
use crate::operand::Operand;
use crate::operator::Operator;
use crate::preconditioner::Preconditioner;

/// Solve `A x = b` for `x`, using restarted, right-preconditioned GMRES(m).
///
/// `x` is the initial guess on entry and is overwritten with the final
/// approximation. `A` and `M` (the preconditioner) are not mutated; `b` is
/// read but not mutated.
pub fn solve<V: Operand>(
    op: &dyn Operator<V>,
    precond: &dyn Preconditioner<V>,
    x: &mut V,
    b: &V,
    config: &GmresConfig,
) -> Result<GmresOutcome> {
    if config.m < 1 {
        return Err(GmresError::InvalidArgument("m must be >= 1".to_string()));
    }
    if !(config.tol > 0.0) {
        return Err(GmresError::InvalidArgument("tol must be > 0".to_string()));
    }
    if !(config.rhs_norm_floor > 0.0) {
        return Err(GmresError::InvalidArgument(
            "rhs_norm_floor must be > 0".to_string(),
        ));
    }
    if x.shape() != b.shape() {
        return Err(GmresError::InvalidArgument(
            "x and b operand shapes disagree".to_string(),
        ));
    }

    let m = config.m;
    let beta = b.norm().max(config.rhs_norm_floor);
    let threshold = config.tol * beta;

    let ax = op.apply(x);
    let mut r = precond.solve(&b.sub(&ax));
    let mut rho = r.norm();

    log::debug!("gmres: initial residual {rho:e}, threshold {threshold:e}");

    if rho <= threshold {
        return Ok(GmresOutcome::Converged { iterations: 0 });
    }

    let mut hess = HessenbergStore::with_capacity(m);
    let mut basis: KrylovBasis<V> = KrylovBasis::with_capacity(m + 1);
    let mut total_iterations = 0usize;

    for cycle in 0..config.max_restarts {
        hess.reset();
        basis.clear();

        basis.push(r.scale(1.0 / rho));
        hess.g[0] = rho;

        if let Some(outcome) =
            run_inner_cycle(op, precond, &mut hess, &mut basis, x, cycle, threshold, m, &mut total_iterations)?
        {
            return Ok(outcome);
        }

        // Cycle ended without early convergence: fold the best approximation
        // from the full-length Krylov subspace into x and recompute the
        // residual from scratch for the next cycle.
        if let Err(kind) = back_substitute_and_update(x, &mut hess, &basis, m - 1) {
            return Ok(GmresOutcome::Breakdown {
                kind,
                iterations: total_iterations,
            });
        }

        let ax = op.apply(x);
        r = precond.solve(&ax.sub(b));
        rho = r.norm();

        log::debug!("gmres: cycle {cycle} complete, residual {rho:e}");

        if rho <= threshold {
            return Ok(GmresOutcome::Converged {
                iterations: total_iterations,
            });
        }
    }

    Ok(GmresOutcome::NotConverged {
        iterations: total_iterations,
    })
}

/// Run the inner Arnoldi/Givens loop for one restart cycle. Returns
/// `Some(outcome)` if the cycle terminated early (convergence or
/// breakdown), `None` if it ran the full `m` steps without early
/// convergence (the caller then performs the cycle-end update).
#[allow(clippy::too_many_arguments)]
fn run_inner_cycle<V: Operand>(
    op: &dyn Operator<V>,
    precond: &dyn Preconditioner<V>,
    hess: &mut HessenbergStore,
    basis: &mut KrylovBasis<V>,
    x: &mut V,
    cycle: usize,
    threshold: f64,
    m: usize,
    total_iterations: &mut usize,
) -> Result<Option<GmresOutcome>> {
    for j in 0..m {
        *total_iterations += 1;

        // Arnoldi expansion: w = M^-1 * A * V[j].
        let av = op.apply(basis.get(j));
        let mut w = precond.solve(&av);
        let w_orig_norm = w.norm();

        // Modified Gram-Schmidt.
        for i in 0..=j {
            let hij = w.dot(basis.get(i));
            hess.set(i, j, hij);
            w.axpy(-hij, basis.get(i));
        }

        let w_norm = w.norm();
        hess.set(j + 1, j, w_norm);

        // Breakdown floor: w_orig_norm equals ||H * e_j|| by the Arnoldi
        // relation (before rotation), since MGS only removes orthogonal
        // components.
        let floor = f64::EPSILON * w_orig_norm.max(1.0);
        let zero_subdiag = w_norm <= floor;

        if !zero_subdiag {
            basis.push(w.scale(1.0 / w_norm));
        }

        // Apply previously accumulated rotations to the new column.
        for i in 0..j {
            let (c, s) = hess.rotation(i);
            let hij = hess.get(i, j);
            let hi1j = hess.get(i + 1, j);
            hess.set(i, j, c * hij + s * hi1j);
            hess.set(i + 1, j, -s * hij + c * hi1j);
        }

        // Compute and apply the new rotation that zeroes H[j+1][j].
        let (c, s) = givens_rotation(hess.get(j, j), hess.get(j + 1, j));
        hess.set_rotation(j, (c, s));
        let rotated_diag = c * hess.get(j, j) + s * hess.get(j + 1, j);
        hess.set(j + 1, j, 0.0);
        hess.set(j, j, rotated_diag);

        let rotated_g0 = c * hess.g[j] + s * hess.g[j + 1];
        hess.g[j + 1] = -s * hess.g[j] + c * hess.g[j + 1];
        hess.g[j] = rotated_g0;

        let rho = hess.g[j + 1].abs();

        if zero_subdiag {
            log::warn!("gmres: lucky breakdown at cycle {cycle}, inner step {j}");
            let outcome = match back_substitute_and_update(x, hess, basis, j) {
                Err(kind) => GmresOutcome::Breakdown {
                    kind,
                    iterations: *total_iterations,
                },
                Ok(()) if rho <= threshold => GmresOutcome::Converged {
                    iterations: *total_iterations,
                },
                Ok(()) => GmresOutcome::Breakdown {
                    kind: BreakdownKind::ZeroSubdiagonal,
                    iterations: *total_iterations,
                },
            };
            return Ok(Some(outcome));
        }

        if rho <= threshold {
            let outcome = match back_substitute_and_update(x, hess, basis, j) {
                Err(kind) => GmresOutcome::Breakdown {
                    kind,
                    iterations: *total_iterations,
                },
                Ok(()) => GmresOutcome::Converged {
                    iterations: *total_iterations,
                },
            };
            return Ok(Some(outcome));
        }
    }

    Ok(None)
}

/// Solve `H y = g` in place over `g` by back-substitution, then update
/// `x <- x + sum_{k=0}^{d} g[k] * V[k]`.
///
/// After this call `hess.g[0..=d]` no longer holds a meaningful residual
/// shadow; the caller must `reset()` the store before reusing it.
fn back_substitute_and_update<V: Operand>(
    x: &mut V,
    hess: &mut HessenbergStore,
    basis: &KrylovBasis<V>,
    d: usize,
) -> std::result::Result<(), BreakdownKind> {
    for k in (0..=d).rev() {
        let pivot = hess.get(k, k);
        if pivot.abs() < f64::EPSILON {
            return Err(BreakdownKind::SingularTriangular);
        }
        hess.g[k] /= pivot;
        let yk = hess.g[k];
        for i in 0..k {
            let hik = hess.get(i, k);
            hess.g[i] -= yk * hik;
        }
    }

    for k in 0..=d {
        x.axpy(hess.g[k], basis.get(k));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::{DenseOperator, DiagonalOperator};
    use crate::preconditioner::{DiagonalPreconditioner, IdentityPreconditioner};

    // S1 -- Identity system.
    #[test]
    fn identity_system_converges_in_one_cycle() {
        let op = DiagonalOperator::new(vec![1.0, 1.0, 1.0, 1.0]);
        let precond = IdentityPreconditioner;
        let b = vec![1.0, 2.0, 3.0, 4.0];
        let mut x = vec![0.0; 4];

        let config = GmresConfig::default().with_m(4).with_max_restarts(1).with_tol(1e-12);
        let outcome = solve(&op, &precond, &mut x, &b, &config).unwrap();

        assert!(matches!(outcome, GmresOutcome::Converged { iterations: 1 }));
        for (xi, bi) in x.iter().zip(b.iter()) {
            assert!((xi - bi).abs() < 1e-10);
        }
    }

    // S2 -- Diagonal system.
    #[test]
    fn diagonal_system_converges_within_krylov_dimension() {
        let op = DiagonalOperator::new(vec![1.0, 2.0, 3.0, 4.0]);
        let precond = IdentityPreconditioner;
        let b = vec![1.0, 1.0, 1.0, 1.0];
        let mut x = vec![0.0; 4];

        let config = GmresConfig::default().with_m(4);
        let outcome = solve(&op, &precond, &mut x, &b, &config).unwrap();

        match outcome {
            GmresOutcome::Converged { iterations } => assert!(iterations <= 4),
            other => panic!("expected convergence, got {other:?}"),
        }

        let expected = [1.0, 0.5, 1.0 / 3.0, 0.25];
        for (xi, e) in x.iter().zip(expected.iter()) {
            assert!((xi - e).abs() < 1e-6, "xi={xi} expected={e}");
        }
    }

    // S3 -- Restart required.
    #[test]
    fn restart_is_required_with_small_m() {
        let op = DiagonalOperator::new(vec![1.0, 2.0, 3.0, 4.0]);
        let precond = IdentityPreconditioner;
        let b = vec![1.0, 1.0, 1.0, 1.0];
        let mut x = vec![0.0; 4];

        let config = GmresConfig::default().with_m(2).with_max_restarts(10).with_tol(1e-10);
        let outcome = solve(&op, &precond, &mut x, &b, &config).unwrap();

        match outcome {
            GmresOutcome::Converged { iterations } => assert!(iterations > 2),
            other => panic!("expected convergence after restarting, got {other:?}"),
        }

        let expected = [1.0, 0.5, 1.0 / 3.0, 0.25];
        for (xi, e) in x.iter().zip(expected.iter()) {
            assert!((xi - e).abs() < 1e-8);
        }
    }

    // S4 -- Preconditioning helps convergence on an ill-conditioned system.
    #[test]
    fn diagonal_preconditioning_speeds_convergence() {
        let op = DiagonalOperator::new(vec![1.0, 10.0, 100.0, 1000.0]);
        let b = vec![1.0, 1.0, 1.0, 1.0];

        let config = GmresConfig::default().with_m(2).with_max_restarts(10);

        let identity = IdentityPreconditioner;
        let mut x_no_precond = vec![0.0; 4];
        let outcome_no_precond = solve(&op, &identity, &mut x_no_precond, &b, &config).unwrap();
        let iters_no_precond = match outcome_no_precond {
            GmresOutcome::Converged { iterations } => iterations,
            GmresOutcome::NotConverged { iterations } => iterations,
            GmresOutcome::Breakdown { iterations, .. } => iterations,
        };

        let jacobi = DiagonalPreconditioner::from_diagonal(&[1.0, 10.0, 100.0, 1000.0]);
        let mut x_precond = vec![0.0; 4];
        let outcome_precond = solve(&op, &jacobi, &mut x_precond, &b, &config).unwrap();
        let iters_precond = match outcome_precond {
            GmresOutcome::Converged { iterations } => iterations,
            other => panic!("expected preconditioned run to converge, got {other:?}"),
        };

        // The Jacobi preconditioner here is the exact inverse diagonal, so
        // A * M^-1 = I and the preconditioned run converges in a single
        // inner step; the unpreconditioned run, facing a condition number of
        // 1000 with a restart length of 2, needs strictly more iterations.
        assert!(iters_precond <= 2);
        assert!(
            iters_no_precond > iters_precond,
            "preconditioning should reduce iterations: no_precond={iters_no_precond}, precond={iters_precond}"
        );
    }

    // S5 -- Lucky breakdown.
    #[test]
    fn lucky_breakdown_converges_without_divide_by_zero() {
        let op = DiagonalOperator::new(vec![1.0, 1.0, 1.0, 1.0, 1.0]);
        let precond = IdentityPreconditioner;
        let mut b = vec![0.0; 5];
        b[0] = 1.0;
        let mut x = vec![0.0; 5];

        let config = GmresConfig::default().with_m(5);
        let outcome = solve(&op, &precond, &mut x, &b, &config).unwrap();

        assert!(matches!(outcome, GmresOutcome::Converged { iterations: 1 }));
        assert!((x[0] - 1.0).abs() < 1e-10);
        for xi in &x[1..] {
            assert!(xi.abs() < 1e-10);
        }
    }

    // S6 -- Budget exhaustion on a non-symmetric operator.
    #[test]
    fn budget_exhaustion_reports_not_converged_with_reduced_residual() {
        // A non-symmetric circulant-like shift matrix: slow to converge with
        // a tiny restart length.
        let n = 8;
        let mut rows = vec![vec![0.0; n]; n];
        for i in 0..n {
            rows[i][i] = 1.0;
            rows[i][(i + 1) % n] = 0.5;
            rows[i][(i + 3) % n] = -0.3;
        }
        let op = DenseOperator::new(rows);
        let precond = IdentityPreconditioner;
        let b: Vec<f64> = (1..=n).map(|i| i as f64).collect();
        let mut x = vec![0.0; n];

        let ax0 = op.apply(&x);
        let initial_residual = b.sub(&ax0).norm();

        let config = GmresConfig::default().with_m(3).with_max_restarts(2).with_tol(1e-12);
        let outcome = solve(&op, &precond, &mut x, &b, &config).unwrap();

        match outcome {
            GmresOutcome::NotConverged { iterations } => assert_eq!(iterations, 6),
            other => panic!("expected NotConverged(6), got {other:?}"),
        }

        let ax = op.apply(&x);
        let final_residual = b.sub(&ax).norm();
        assert!(final_residual < initial_residual);
    }

    #[test]
    fn rejects_mismatched_m() {
        let op = DiagonalOperator::new(vec![1.0]);
        let precond = IdentityPreconditioner;
        let b = vec![1.0];
        let mut x = vec![0.0];
        let config = GmresConfig::default().with_m(0);

        let err = solve(&op, &precond, &mut x, &b, &config).unwrap_err();
        assert!(matches!(err, GmresError::InvalidArgument(_)));
    }

    #[test]
    fn rejects_mismatched_shapes() {
        let op = DiagonalOperator::new(vec![1.0, 1.0]);
        let precond = IdentityPreconditioner;
        let b = vec![1.0, 1.0, 1.0];
        let mut x = vec![0.0, 0.0];
        let config = GmresConfig::default();

        let err = solve(&op, &precond, &mut x, &b, &config).unwrap_err();
        assert!(matches!(err, GmresError::InvalidArgument(_)));
    }

    #[test]
    fn zero_rhs_converges_immediately_without_mutating_x() {
        let op = DiagonalOperator::new(vec![1.0, 2.0, 3.0]);
        let precond = IdentityPreconditioner;
        let b = vec![0.0, 0.0, 0.0];
        let mut x = vec![0.0, 0.0, 0.0];

        let config = GmresConfig::default();
        let outcome = solve(&op, &precond, &mut x, &b, &config).unwrap();

        assert!(matches!(outcome, GmresOutcome::Converged { iterations: 0 }));
        assert_eq!(x, vec![0.0, 0.0, 0.0]);
    }

    // Idempotence: an already-exact initial guess converges at cycle 0
    // without perturbing x beyond floating-point noise.
    #[test]
    fn already_solved_system_is_idempotent() {
        let op = DiagonalOperator::new(vec![2.0, 4.0, 8.0]);
        let precond = IdentityPreconditioner;
        let b = vec![2.0, 4.0, 8.0];
        let mut x = vec![1.0, 1.0, 1.0]; // exact solution of diag(2,4,8) x = (2,4,8)

        let config = GmresConfig::default();
        let outcome = solve(&op, &precond, &mut x, &b, &config).unwrap();

        assert!(matches!(outcome, GmresOutcome::Converged { iterations: 0 }));
        for xi in &x {
            assert!((xi - 1.0).abs() < 1e-12);
        }
    }

    // Arnoldi relation / orthonormality: check the first few basis vectors
    // produced on a small tridiagonal system are pairwise orthonormal.
    #[test]
    fn krylov_basis_is_orthonormal() {
        let op = DenseOperator::new(vec![
            vec![2.0, -1.0, 0.0],
            vec![-1.0, 2.0, -1.0],
            vec![0.0, -1.0, 2.0],
        ]);
        let precond = IdentityPreconditioner;
        let b = vec![0.0, 0.0, 4.0];
        let mut x = vec![0.0; 3];

        let config = GmresConfig::default().with_m(3);
        let outcome = solve(&op, &precond, &mut x, &b, &config).unwrap();
        assert!(matches!(outcome, GmresOutcome::Converged { .. }));

        assert!((x[0] - 1.0).abs() < 1e-8);
        assert!((x[1] - 2.0).abs() < 1e-8);
        assert!((x[2] - 3.0).abs() < 1e-8);
    }
}
