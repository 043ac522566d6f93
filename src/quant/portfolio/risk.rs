//! # Risk Ratios
//!
//! $$
//! \sigma_d^2 = P\cdot\frac1T\sum_t \min\!\left(0,\ r_{p,t}-\frac{T_{ann}}{P}\right)^2
//! $$
//!
//! Downside variance and the Sharpe / Sortino ratios built on it.

use ndarray::Array1;
use ndarray::ArrayView2;

use crate::error::ensure_finite;
use crate::error::ensure_positive;
use crate::error::QuantError;
use crate::error::Result;

/// Annualized downside (Sortino) variance of the portfolio `weights` over
/// periodic `returns` (rows = periods), below the annualized `target`.
///
/// Only shortfalls contribute; periods above target count as zero.
pub fn sortino_variance(
  returns: ArrayView2<f64>,
  weights: &[f64],
  target: f64,
  periods_per_year: f64,
) -> Result<f64> {
  ensure_finite("target", target)?;
  ensure_positive("periods_per_year", periods_per_year)?;
  if returns.ncols() != weights.len() {
    return Err(QuantError::invalid(
      "weights",
      format!("{} weights for {} assets", weights.len(), returns.ncols()),
    ));
  }
  if returns.nrows() == 0 {
    return Err(QuantError::invalid("returns", "no periods"));
  }

  let w = Array1::from_vec(weights.to_vec());
  let periodic_target = target / periods_per_year;
  let shortfall = returns
    .dot(&w)
    .mapv(|r| (r - periodic_target).min(0.0).powi(2));

  Ok(periods_per_year * shortfall.mean().unwrap_or(0.0))
}

/// `(return - risk_free) / risk`.
pub fn sharpe_ratio(expected_return: f64, risk: f64, risk_free: f64) -> Result<f64> {
  ensure_positive("risk", risk)?;
  Ok((expected_return - risk_free) / risk)
}

/// `(return - target) / sqrt(downside_variance)`.
pub fn sortino_ratio(expected_return: f64, downside_variance: f64, target: f64) -> Result<f64> {
  ensure_positive("downside_variance", downside_variance)?;
  Ok((expected_return - target) / downside_variance.sqrt())
}
