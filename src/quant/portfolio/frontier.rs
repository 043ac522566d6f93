//! # Efficient Frontier
//!
//! $$
//! \sigma_p^2(R)=\frac{fR^2-2cR+a}{af-c^2},\quad
//! a=\mu^\top\Sigma^{-1}\mu,\ c=\mu^\top\Sigma^{-1}\mathbf 1,\ f=\mathbf 1^\top\Sigma^{-1}\mathbf 1
//! $$
//!
//! Minimum-variance portfolios over a grid of target returns, either in closed
//! form (short selling allowed) or by one quadratic program per target
//! (long-only).

use nalgebra::DMatrix;
use nalgebra::DVector;
use rayon::prelude::*;

use super::moments::MomentEstimate;
use super::qp::minimize_nonnegative;
use super::types::FrontierPoint;
use crate::error::QuantError;
use crate::error::Result;

/// Below this spread of expected returns the return constraint is dropped.
const FLAT_RETURNS_TOL: f64 = 1e-12;

/// `n` evenly spaced values from `start` to `end`, both included.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
  match n {
    0 => Vec::new(),
    1 => vec![start],
    _ => {
      let step = (end - start) / (n - 1) as f64;
      (0..n)
        .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
        .collect()
    }
  }
}

/// Closed-form frontier when weights may be negative.
pub fn efficient_frontier_analytic(
  moments: &MomentEstimate,
  targets: &[f64],
) -> Result<Vec<FrontierPoint>> {
  let inv = moments.inverse()?;
  let ones = DVector::from_element(moments.n_assets(), 1.0);
  let inv_mu = &inv * &moments.mu;
  let inv_ones = &inv * &ones;

  let a = moments.mu.dot(&inv_mu);
  let c = moments.mu.dot(&inv_ones);
  let f = ones.dot(&inv_ones);
  let d = a * f - c * c;
  if !(d.abs() > FLAT_RETURNS_TOL * (a * f).abs()) {
    return Err(QuantError::unstable(format!(
      "degenerate frontier (a·f - c² = {d:e}); expected returns are not distinguishable"
    )));
  }

  let points = targets
    .iter()
    .map(|&r| {
      let lambda_1 = (f * r - c) / d;
      let lambda_2 = (a - c * r) / d;
      let weights = &inv_mu * lambda_1 + &inv_ones * lambda_2;
      let variance = ((f * r * r - 2.0 * c * r + a) / d).max(0.0);
      FrontierPoint {
        expected_return: r,
        risk: variance.sqrt(),
        weights: weights.iter().copied().collect(),
      }
    })
    .collect();

  Ok(points)
}

/// Long-only frontier; one QP per target, solved in parallel and returned in
/// target order.
pub fn efficient_frontier_long_only(
  moments: &MomentEstimate,
  targets: &[f64],
) -> Result<Vec<FrontierPoint>> {
  let n = moments.n_assets();
  let spread = moments.mu.max() - moments.mu.min();
  let flat = spread <= FLAT_RETURNS_TOL * moments.mu.amax().max(1.0);

  let a = if flat {
    DMatrix::from_element(n, 1, 1.0)
  } else {
    DMatrix::from_fn(n, 2, |i, j| if j == 0 { moments.mu[i] } else { 1.0 })
  };

  targets
    .par_iter()
    .map(|&r| -> Result<FrontierPoint> {
      let b = if flat {
        DVector::from_element(1, 1.0)
      } else {
        DVector::from_vec(vec![r, 1.0])
      };
      let weights = minimize_nonnegative(&moments.sigma, &a, &b)?;
      Ok(FrontierPoint {
        expected_return: r,
        risk: moments.portfolio_risk(&weights),
        weights: weights.iter().copied().collect(),
      })
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;

  fn three_assets(invert: bool) -> MomentEstimate {
    MomentEstimate::from_parts(
      DVector::from_vec(vec![0.06, 0.10, 0.15]),
      DMatrix::from_row_slice(
        3,
        3,
        &[0.04, 0.006, 0.0, 0.006, 0.09, 0.012, 0.0, 0.012, 0.16],
      ),
      invert,
    )
    .unwrap()
  }

  fn two_anticorrelated(rho: f64) -> MomentEstimate {
    let v = 0.04;
    MomentEstimate::from_parts(
      DVector::from_vec(vec![0.08, 0.12]),
      DMatrix::from_row_slice(2, 2, &[v, rho * v, rho * v, v]),
      true,
    )
    .unwrap()
  }

  #[test]
  fn linspace_includes_both_ends() {
    let xs = linspace(-0.2, 1.0, 60);
    assert_eq!(xs.len(), 60);
    assert_eq!(xs[0], -0.2);
    assert_eq!(xs[59], 1.0);
    assert!(xs.windows(2).all(|w| w[1] > w[0]));
    assert!(linspace(0.0, 1.0, 0).is_empty());
  }

  #[test]
  fn analytic_weights_sum_to_one_and_hit_target() {
    let m = three_assets(true);
    let points = efficient_frontier_analytic(&m, &linspace(-0.2, 1.0, 60)).unwrap();
    for p in &points {
      let w = DVector::from_vec(p.weights.clone());
      assert_abs_diff_eq!(w.sum(), 1.0, epsilon = 1e-9);
      assert_abs_diff_eq!(m.portfolio_return(&w), p.expected_return, epsilon = 1e-9);
      assert_abs_diff_eq!(m.portfolio_risk(&w), p.risk, epsilon = 1e-9);
    }
  }

  #[test]
  fn analytic_minimum_is_global_minimum_variance() {
    let m = three_assets(true);
    let inv = m.inverse().unwrap();
    let ones = DVector::from_element(3, 1.0);
    let f = ones.dot(&(&inv * &ones));
    let c = m.mu.dot(&(&inv * &ones));
    let gmv = efficient_frontier_analytic(&m, &[c / f]).unwrap();
    assert_abs_diff_eq!(gmv[0].risk, (1.0 / f).sqrt(), epsilon = 1e-12);
  }

  #[test]
  fn identical_returns_are_degenerate() {
    let m = MomentEstimate::from_parts(
      DVector::from_vec(vec![0.1, 0.1]),
      DMatrix::from_row_slice(2, 2, &[0.04, 0.0, 0.0, 0.09]),
      true,
    )
    .unwrap();
    let err = efficient_frontier_analytic(&m, &[0.1]).unwrap_err();
    assert!(matches!(err, QuantError::NumericalInstability(_)));
  }

  #[test]
  fn anticorrelation_drives_minimum_risk_to_zero() {
    let mut previous = f64::INFINITY;
    for rho in [-0.5, -0.9, -0.99, -0.999] {
      let m = two_anticorrelated(rho);
      // equal volatilities: the minimum-variance mix is 50/50
      let p = efficient_frontier_analytic(&m, &[0.10]).unwrap();
      assert!(p[0].risk < previous);
      previous = p[0].risk;
    }
    assert!(previous < 0.01);
  }

  #[test]
  fn long_only_weights_are_feasible() {
    let m = three_assets(false);
    let targets = linspace(m.mu.min(), m.mu.max(), 60);
    let points = efficient_frontier_long_only(&m, &targets).unwrap();

    assert_eq!(points.len(), 60);
    for (p, &r) in points.iter().zip(&targets) {
      assert_eq!(p.expected_return, r);
      let w = DVector::from_vec(p.weights.clone());
      assert!(w.iter().all(|x| *x >= -1e-9));
      assert_abs_diff_eq!(w.sum(), 1.0, epsilon = 1e-9);
      assert_abs_diff_eq!(m.portfolio_return(&w), r, epsilon = 1e-9);
    }
    // endpoints are single-asset portfolios
    assert_abs_diff_eq!(points[0].weights[0], 1.0, epsilon = 1e-9);
    assert_abs_diff_eq!(points[59].weights[2], 1.0, epsilon = 1e-9);
  }

  #[test]
  fn long_only_never_beats_unconstrained() {
    let m = three_assets(true);
    let targets = linspace(m.mu.min(), m.mu.max(), 20);
    let free = efficient_frontier_analytic(&m, &targets).unwrap();
    let long = efficient_frontier_long_only(&m, &targets).unwrap();
    for (f, l) in free.iter().zip(&long) {
      assert!(l.risk >= f.risk - 1e-12);
    }
  }

  #[test]
  fn flat_returns_fall_back_to_budget_constraint() {
    let m = MomentEstimate::from_parts(
      DVector::from_vec(vec![0.1, 0.1]),
      DMatrix::from_row_slice(2, 2, &[0.04, 0.0, 0.0, 0.09]),
      false,
    )
    .unwrap();
    let points = efficient_frontier_long_only(&m, &linspace(0.1, 0.1, 3)).unwrap();
    for p in points {
      assert_abs_diff_eq!(p.weights[0], 0.09 / 0.13, epsilon = 1e-12);
    }
  }
}
