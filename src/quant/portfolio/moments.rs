//! # Moment Estimation
//!
//! $$
//! \mu_i = P\,\bar r_i,\qquad
//! \Sigma = \frac{P}{T-1}\,(R-\bar R)^\top (R-\bar R)
//! $$
//!
//! Annualized mean vector and sample covariance of a complete returns matrix.

use nalgebra::DMatrix;
use nalgebra::DVector;
use ndarray::Axis;
use ndarray_stats::CorrelationExt;

use super::data::ReturnsMatrix;
use crate::error::ensure_positive;
use crate::error::QuantError;
use crate::error::Result;

/// Smallest admissible squared Cholesky pivot relative to the largest variance.
const PIVOT_TOL: f64 = 1e-12;

/// Annualized first and second moments of asset returns.
#[derive(Clone, Debug, PartialEq)]
pub struct MomentEstimate {
  pub mu: DVector<f64>,
  pub sigma: DMatrix<f64>,
  /// Present when requested at construction.
  pub inv_sigma: Option<DMatrix<f64>>,
}

impl MomentEstimate {
  /// Estimate from a matrix with no missing values.
  pub fn estimate(
    returns: &ReturnsMatrix,
    periods_per_year: f64,
    invert: bool,
  ) -> Result<Self> {
    ensure_positive("periods_per_year", periods_per_year)?;
    let values = returns.values();
    let (t, n) = values.dim();
    if n == 0 {
      return Err(QuantError::EmptyPortfolio);
    }
    if t < 2 {
      return Err(QuantError::invalid(
        "returns",
        format!("need at least 2 periods, got {t}"),
      ));
    }
    if values.iter().any(|v| !v.is_finite()) {
      return Err(QuantError::invalid(
        "returns",
        "moment estimation requires a complete matrix",
      ));
    }

    let mean = values
      .mean_axis(Axis(0))
      .ok_or_else(|| QuantError::invalid("returns", "empty matrix"))?;
    // rows of the transpose are assets
    let cov = values
      .t()
      .cov(1.0)
      .map_err(|_| QuantError::invalid("returns", "empty matrix"))?
      * periods_per_year;

    let mu = DVector::from_iterator(n, mean.iter().map(|m| m * periods_per_year));
    let sigma = DMatrix::from_fn(n, n, |i, j| 0.5 * (cov[[i, j]] + cov[[j, i]]));

    Self::from_parts(mu, sigma, invert)
  }

  /// Wrap externally supplied moments, checking that `sigma` is positive definite.
  pub fn from_parts(mu: DVector<f64>, sigma: DMatrix<f64>, invert: bool) -> Result<Self> {
    let n = mu.len();
    if sigma.nrows() != n || sigma.ncols() != n {
      return Err(QuantError::invalid(
        "sigma",
        format!(
          "expected {n}x{n}, got {}x{}",
          sigma.nrows(),
          sigma.ncols()
        ),
      ));
    }
    if n == 0 {
      return Err(QuantError::EmptyPortfolio);
    }

    let chol = sigma
      .clone()
      .cholesky()
      .ok_or_else(|| QuantError::unstable("covariance matrix is not positive definite"))?;
    let scale = sigma.diagonal().max();
    let min_pivot = chol.l().diagonal().map(|l| l * l).min();
    if !(min_pivot > PIVOT_TOL * scale) {
      return Err(QuantError::unstable(format!(
        "covariance matrix is singular (pivot {min_pivot:e})"
      )));
    }

    let inv_sigma = invert.then(|| chol.inverse());

    Ok(Self {
      mu,
      sigma,
      inv_sigma,
    })
  }

  pub fn n_assets(&self) -> usize {
    self.mu.len()
  }

  /// `inv_sigma`, computed on demand when it was not requested up front.
  pub fn inverse(&self) -> Result<DMatrix<f64>> {
    match &self.inv_sigma {
      Some(inv) => Ok(inv.clone()),
      None => self
        .sigma
        .clone()
        .cholesky()
        .map(|c| c.inverse())
        .ok_or_else(|| QuantError::unstable("covariance matrix is not positive definite")),
    }
  }

  /// Annualized volatility per asset, `sqrt(diag Σ)`.
  pub fn asset_risks(&self) -> DVector<f64> {
    self.sigma.diagonal().map(|v| v.max(0.0).sqrt())
  }

  pub fn portfolio_return(&self, weights: &DVector<f64>) -> f64 {
    self.mu.dot(weights)
  }

  pub fn portfolio_risk(&self, weights: &DVector<f64>) -> f64 {
    (weights.dot(&(&self.sigma * weights))).max(0.0).sqrt()
  }
}
