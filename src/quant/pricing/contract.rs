//! # Option Contract
//!
//! $$
//! \mathcal C=(\text{call}\mid\text{put},\ S_0,\ K,\ \tau,\ \sigma,\ r)
//! $$
//!
use chrono::NaiveDate;
use impl_new_derive::ImplNew;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ensure_finite;
use crate::error::ensure_positive;
use crate::error::Result;
use crate::quant::OptionType;
use crate::traits::TimeExt;

/// Immutable description of a vanilla option and its market inputs.
#[derive(ImplNew, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
  /// Option direction
  pub option_type: OptionType,
  /// Underlying price
  pub s: f64,
  /// Strike price
  pub k: f64,
  /// Volatility
  pub v: f64,
  /// Risk-free rate
  pub r: f64,
  /// Time to maturity in years
  pub tau: Option<f64>,
  /// Evaluation date
  pub eval: Option<NaiveDate>,
  /// Expiration date
  pub expiration: Option<NaiveDate>,
}

/// Validated inputs with maturity resolved to a year fraction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContractTerms {
  pub option_type: OptionType,
  pub s: f64,
  pub k: f64,
  pub v: f64,
  pub r: f64,
  pub tau: f64,
}

impl OptionContract {
  /// Contract with maturity given directly in years.
  pub fn with_tau(option_type: OptionType, s: f64, k: f64, tau: f64, r: f64, v: f64) -> Self {
    Self::new(option_type, s, k, v, r, Some(tau), None, None)
  }

  /// Contract with maturity derived from calendar dates.
  pub fn with_dates(
    option_type: OptionType,
    s: f64,
    k: f64,
    eval: NaiveDate,
    expiration: NaiveDate,
    r: f64,
    v: f64,
  ) -> Self {
    Self::new(option_type, s, k, v, r, None, Some(eval), Some(expiration))
  }

  /// Same contract, opposite direction.
  pub fn with_option_type(&self, option_type: OptionType) -> Self {
    Self {
      option_type,
      ..*self
    }
  }

  /// Same contract, different volatility.
  pub fn with_volatility(&self, v: f64) -> Self {
    Self { v, ..*self }
  }

  /// Validate every field and resolve tau.
  pub fn terms(&self) -> Result<ContractTerms> {
    Ok(ContractTerms {
      option_type: self.option_type,
      s: ensure_positive("s", self.s)?,
      k: ensure_positive("k", self.k)?,
      v: ensure_positive("sigma", self.v)?,
      r: ensure_finite("r", self.r)?,
      tau: self.tau_or_from_dates()?,
    })
  }
}

impl TimeExt for OptionContract {
  fn tau(&self) -> Option<f64> {
    self.tau
  }

  fn eval(&self) -> Option<NaiveDate> {
    self.eval
  }

  fn expiration(&self) -> Option<NaiveDate> {
    self.expiration
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::QuantError;

  #[test]
  fn terms_rejects_non_positive_volatility() {
    let c = OptionContract::with_tau(OptionType::Call, 100.0, 100.0, 1.0, 0.05, 0.0);
    assert!(matches!(
      c.terms(),
      Err(QuantError::InvalidParameter { name: "sigma", .. })
    ));
  }

  #[test]
  fn terms_rejects_non_positive_tau() {
    let c = OptionContract::with_tau(OptionType::Put, 100.0, 100.0, -0.5, 0.05, 0.2);
    assert!(matches!(
      c.terms(),
      Err(QuantError::InvalidParameter { name: "tau", .. })
    ));
  }

  #[test]
  fn dated_contract_resolves_tau() {
    let c = OptionContract::with_dates(
      OptionType::Call,
      100.0,
      95.0,
      NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
      NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
      0.03,
      0.25,
    );
    let terms = c.terms().unwrap();
    assert!((terms.tau - 1.0).abs() < 1e-12);
    assert_eq!(terms.k, 95.0);
  }

  #[test]
  fn negative_rate_is_allowed() {
    let c = OptionContract::with_tau(OptionType::Call, 100.0, 100.0, 1.0, -0.01, 0.2);
    assert!(c.terms().is_ok());
  }
}
