//! # Non-negative Quadratic Program
//!
//! $$
//! \min_{x}\ \tfrac12 x^\top G x\quad\text{s.t.}\quad A^\top x = b,\ x \ge 0
//! $$
//!
//! Solved with the Clarabel interior-point solver. Its iterate is then polished
//! on the detected support: the equality-constrained KKT system of the free
//! weights is solved directly and bound weights are set to exactly zero.

use clarabel::algebra::CscMatrix;
use clarabel::solver::DefaultSettingsBuilder;
use clarabel::solver::DefaultSolver;
use clarabel::solver::IPSolver;
use clarabel::solver::SolverStatus;
use clarabel::solver::SupportedConeT;
use nalgebra::DMatrix;
use nalgebra::DVector;

use crate::error::QuantError;
use crate::error::Result;

const MAX_ITER: u32 = 200;
/// Weights below this fraction of the largest weight are treated as bound.
const ACTIVE_TOL: f64 = 1e-6;
const SINGULAR_TOL: f64 = 1e-12;
const RESIDUAL_TOL: f64 = 1e-10;
const OBJECTIVE_TOL: f64 = 1e-6;

/// Solve `min ½xᵀGx` subject to `Aᵀx = b` and `x ≥ 0`.
///
/// `a` is `n × m` with one column per equality constraint.
pub fn minimize_nonnegative(
  g: &DMatrix<f64>,
  a: &DMatrix<f64>,
  b: &DVector<f64>,
) -> Result<DVector<f64>> {
  let n = g.nrows();
  let m = a.ncols();
  if g.ncols() != n || a.nrows() != n || b.len() != m {
    return Err(QuantError::invalid(
      "qp",
      format!(
        "inconsistent shapes G {}x{}, A {}x{}, b {}",
        g.nrows(),
        g.ncols(),
        a.nrows(),
        a.ncols(),
        b.len()
      ),
    ));
  }

  let x = interior_point(g, a, b)?;
  Ok(polish(g, a, b, &x).unwrap_or_else(|| x.map(|v| v.max(0.0))))
}

/// Hand the program to Clarabel as `Aᵀx + s = b, s ∈ {0}ᵐ` and `-x + s = 0, s ≥ 0`.
fn interior_point(
  g: &DMatrix<f64>,
  a: &DMatrix<f64>,
  b: &DVector<f64>,
) -> Result<DVector<f64>> {
  let n = g.nrows();
  let m = a.ncols();

  // Clarabel reads only the upper triangle of P.
  let mut p_ptr = vec![0];
  let mut p_row = Vec::new();
  let mut p_val = Vec::new();
  for j in 0..n {
    for i in 0..=j {
      if g[(i, j)] != 0.0 {
        p_row.push(i);
        p_val.push(g[(i, j)]);
      }
    }
    p_ptr.push(p_val.len());
  }
  let p = CscMatrix::new(n, n, p_ptr, p_row, p_val);

  let mut c_ptr = vec![0];
  let mut c_row = Vec::new();
  let mut c_val = Vec::new();
  for j in 0..n {
    for k in 0..m {
      if a[(j, k)] != 0.0 {
        c_row.push(k);
        c_val.push(a[(j, k)]);
      }
    }
    c_row.push(m + j);
    c_val.push(-1.0);
    c_ptr.push(c_val.len());
  }
  let constraints = CscMatrix::new(m + n, n, c_ptr, c_row, c_val);

  let q = vec![0.0; n];
  let mut rhs = b.as_slice().to_vec();
  rhs.resize(m + n, 0.0);
  let cones = [
    SupportedConeT::ZeroConeT(m),
    SupportedConeT::NonnegativeConeT(n),
  ];

  let settings = DefaultSettingsBuilder::default()
    .max_iter(MAX_ITER)
    .verbose(false)
    .build()
    .map_err(|e| QuantError::unstable(format!("invalid solver settings: {e}")))?;
  let mut solver = DefaultSolver::new(&p, &q, &constraints, &rhs, &cones, settings)
    .map_err(|e| QuantError::unstable(format!("quadratic program rejected: {e:?}")))?;
  solver.solve();

  match solver.solution.status {
    SolverStatus::Solved | SolverStatus::AlmostSolved => {
      let x = DVector::from_column_slice(&solver.solution.x);
      if x.iter().all(|v| v.is_finite()) {
        Ok(x)
      } else {
        Err(QuantError::unstable("quadratic program returned non-finite weights"))
      }
    }
    SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
      Err(QuantError::Infeasible(
        "no point satisfies the equality constraints with non-negative weights".into(),
      ))
    }
    status => Err(QuantError::unstable(format!(
      "quadratic program stopped with status {status:?}"
    ))),
  }
}

/// Re-solve on the support of `x`. Returns `None` when the support guess does
/// not give a feasible point at least as good as `x`.
fn polish(
  g: &DMatrix<f64>,
  a: &DMatrix<f64>,
  b: &DVector<f64>,
  x: &DVector<f64>,
) -> Option<DVector<f64>> {
  let n = g.nrows();
  let m = a.ncols();
  let cutoff = ACTIVE_TOL * x.amax().max(1.0);
  let free = (0..n).filter(|&i| x[i] > cutoff).collect::<Vec<_>>();
  if free.is_empty() {
    return None;
  }

  let k = free.len();
  let mut kkt = DMatrix::zeros(k + m, k + m);
  for (r, &i) in free.iter().enumerate() {
    for (c, &j) in free.iter().enumerate() {
      kkt[(r, c)] = g[(i, j)];
    }
    for l in 0..m {
      kkt[(r, k + l)] = a[(i, l)];
      kkt[(k + l, r)] = a[(i, l)];
    }
  }
  let mut rhs = DVector::zeros(k + m);
  rhs.rows_mut(k, m).copy_from(b);

  // Minimum-norm solve: a small support can make the equality rows redundant.
  let sol = kkt.clone().svd(true, true).solve(&rhs, SINGULAR_TOL).ok()?;
  if (&kkt * &sol - &rhs).amax() > RESIDUAL_TOL * b.amax().max(1.0) {
    return None;
  }

  let mut polished = DVector::zeros(n);
  for (r, &i) in free.iter().enumerate() {
    if sol[r] < -cutoff {
      return None;
    }
    polished[i] = sol[r].max(0.0);
  }

  let objective = |v: &DVector<f64>| 0.5 * v.dot(&(g * v));
  let reference = objective(x);
  (objective(&polished) <= reference + OBJECTIVE_TOL * reference.abs() + f64::EPSILON)
    .then_some(polished)
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;

  fn budget(n: usize) -> (DMatrix<f64>, DVector<f64>) {
    (DMatrix::from_element(n, 1, 1.0), DVector::from_element(1, 1.0))
  }

  #[test]
  fn interior_solution_matches_equality_optimum() {
    let g = DMatrix::from_row_slice(2, 2, &[0.04, 0.0, 0.0, 0.09]);
    let (a, b) = budget(2);
    let x = minimize_nonnegative(&g, &a, &b).unwrap();
    // inverse-variance weights
    assert_abs_diff_eq!(x[0], 0.09 / 0.13, epsilon = 1e-12);
    assert_abs_diff_eq!(x[1], 0.04 / 0.13, epsilon = 1e-12);
  }

  #[test]
  fn bound_becomes_active() {
    // Highly correlated pair: the unconstrained minimum shorts the riskier asset.
    let g = DMatrix::from_row_slice(2, 2, &[0.04, 0.055, 0.055, 0.09]);
    let (a, b) = budget(2);
    let x = minimize_nonnegative(&g, &a, &b).unwrap();
    assert_abs_diff_eq!(x[0], 1.0, epsilon = 1e-12);
    assert_eq!(x[1], 0.0);
  }

  #[test]
  fn target_return_is_met() {
    let g = DMatrix::from_row_slice(
      3,
      3,
      &[0.04, 0.006, 0.0, 0.006, 0.09, 0.012, 0.0, 0.012, 0.16],
    );
    let mu = [0.06, 0.10, 0.15];
    let a = DMatrix::from_fn(3, 2, |i, j| if j == 0 { mu[i] } else { 1.0 });
    let b = DVector::from_vec(vec![0.14, 1.0]);
    let x = minimize_nonnegative(&g, &a, &b).unwrap();

    assert!(x.iter().all(|v| *v >= 0.0));
    assert_abs_diff_eq!(x.sum(), 1.0, epsilon = 1e-9);
    let ret: f64 = x.iter().zip(mu).map(|(w, m)| w * m).sum();
    assert_abs_diff_eq!(ret, 0.14, epsilon = 1e-9);
  }

  #[test]
  fn single_feasible_point_is_recovered_exactly() {
    // The target equals the top return, so only the last asset qualifies.
    let g = DMatrix::from_row_slice(
      3,
      3,
      &[0.04, 0.006, 0.0, 0.006, 0.09, 0.012, 0.0, 0.012, 0.16],
    );
    let mu = [0.06, 0.10, 0.15];
    let a = DMatrix::from_fn(3, 2, |i, j| if j == 0 { mu[i] } else { 1.0 });
    let b = DVector::from_vec(vec![0.15, 1.0]);
    let x = minimize_nonnegative(&g, &a, &b).unwrap();

    assert_eq!(x[0], 0.0);
    assert_eq!(x[1], 0.0);
    assert_abs_diff_eq!(x[2], 1.0, epsilon = 1e-12);
  }

  #[test]
  fn polish_snaps_to_the_support_optimum() {
    let g = DMatrix::identity(2, 2);
    let a = DMatrix::from_column_slice(2, 1, &[0.1, 0.2]);
    let b = DVector::from_element(1, 1.0);

    let near = DVector::from_vec(vec![2.2, 3.9]);
    let polished = polish(&g, &a, &b, &near).unwrap();
    assert_abs_diff_eq!(polished[0], 2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(polished[1], 4.0, epsilon = 1e-12);

    // Pinning the second weight at zero forces x0 = 10, far above the iterate's objective.
    let wrong_support = DVector::from_vec(vec![2.0, 1e-9]);
    assert!(polish(&g, &a, &b, &wrong_support).is_none());
  }

  #[test]
  fn sign_infeasible_constraint_is_reported() {
    let g = DMatrix::identity(2, 2);
    let a = DMatrix::from_column_slice(2, 1, &[-0.01, -0.02]);
    let b = DVector::from_element(1, 1.0);
    let err = minimize_nonnegative(&g, &a, &b).unwrap_err();
    assert!(matches!(err, QuantError::Infeasible(_)));
  }

  #[test]
  fn shape_mismatch_is_invalid() {
    let g = DMatrix::identity(2, 2);
    let (a, b) = budget(3);
    assert!(matches!(
      minimize_nonnegative(&g, &a, &b),
      Err(QuantError::InvalidParameter { .. })
    ));
  }
}
