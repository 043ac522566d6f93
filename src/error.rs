//! # Errors
//!
//! Failure taxonomy shared by the portfolio optimizer and the option pricers.

use thiserror::Error;

/// Errors raised by the numerical core.
///
/// Invalid inputs, numerical breakdowns and solver non-convergence are kept
/// apart so callers can map them to different responses.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuantError {
  /// A caller-supplied value is out of its domain (non-positive volatility,
  /// unknown method literal, ragged returns matrix, ...).
  #[error("invalid parameter `{name}`: {reason}")]
  InvalidParameter { name: &'static str, reason: String },

  /// The inputs are valid but the computation broke down numerically
  /// (singular covariance, binomial probability outside `[0, 1]`, ...).
  #[error("numerical instability: {0}")]
  NumericalInstability(String),

  /// An iterative solver ran out of iterations.
  #[error(
    "{method} did not converge after {iterations} iterations \
     (last iterate {last_iterate}, residual {tolerance:e})"
  )]
  NonConvergence {
    method: &'static str,
    iterations: usize,
    last_iterate: f64,
    tolerance: f64,
  },

  /// Every asset was dropped before moment estimation.
  #[error("no assets left after dropping columns with missing returns")]
  EmptyPortfolio,

  /// The optimization problem has no feasible point.
  #[error("infeasible problem: {0}")]
  Infeasible(String),
}

impl QuantError {
  pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
    Self::InvalidParameter {
      name,
      reason: reason.into(),
    }
  }

  pub(crate) fn unstable(reason: impl Into<String>) -> Self {
    Self::NumericalInstability(reason.into())
  }

  /// `true` for numerical breakdowns, as opposed to bad inputs.
  pub fn is_numerical(&self) -> bool {
    matches!(
      self,
      Self::NumericalInstability(_) | Self::NonConvergence { .. }
    )
  }
}

pub type Result<T> = std::result::Result<T, QuantError>;

/// Reject non-finite or non-positive values.
pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<f64> {
  if value.is_finite() && value > 0.0 {
    Ok(value)
  } else {
    Err(QuantError::invalid(
      name,
      format!("must be finite and positive, got {value}"),
    ))
  }
}

/// Reject non-finite values.
pub(crate) fn ensure_finite(name: &'static str, value: f64) -> Result<f64> {
  if value.is_finite() {
    Ok(value)
  } else {
    Err(QuantError::invalid(name, format!("must be finite, got {value}")))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn positive_guard_rejects_zero_and_nan() {
    assert!(ensure_positive("sigma", 0.2).is_ok());
    assert!(matches!(
      ensure_positive("sigma", 0.0),
      Err(QuantError::InvalidParameter { name: "sigma", .. })
    ));
    assert!(ensure_positive("tau", f64::NAN).is_err());
    assert!(ensure_finite("r", -0.01).is_ok());
    assert!(ensure_finite("r", f64::INFINITY).is_err());
  }

  #[test]
  fn numerical_errors_are_distinguished_from_invalid_input() {
    assert!(QuantError::unstable("singular").is_numerical());
    assert!(!QuantError::invalid("k", "negative").is_numerical());
    assert!(!QuantError::EmptyPortfolio.is_numerical());
  }
}
