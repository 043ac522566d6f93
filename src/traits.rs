//! # Traits
//!
//! $$
//! \text{Trait contracts: }\mathcal{P}:(S_0,K,\sigma,r,\tau)\to\text{price}
//! $$
//!
use chrono::NaiveDate;

use crate::error::QuantError;
use crate::error::Result;

/// Days per year used when maturity is derived from calendar dates (ACT/365).
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Pricer trait.
pub trait PricerExt: TimeExt {
  /// Calculate the call and put price for the same inputs.
  fn calculate_call_put(&self) -> Result<(f64, f64)>;

  /// Calculate the price of the configured instrument.
  fn calculate_price(&self) -> Result<f64>;

  /// Derivatives (greeks), empty when the method has no closed form for them.
  fn derivatives(&self) -> Result<Vec<f64>> {
    Ok(vec![])
  }
}

pub trait TimeExt {
  fn tau(&self) -> Option<f64>;

  fn eval(&self) -> Option<NaiveDate> {
    None
  }

  fn expiration(&self) -> Option<NaiveDate> {
    None
  }

  /// Return tau directly, or compute it from eval/expiration dates.
  fn tau_or_from_dates(&self) -> Result<f64> {
    let tau = match (self.tau(), self.eval(), self.expiration()) {
      (Some(tau), ..) => tau,
      (None, Some(e), Some(x)) => x.signed_duration_since(e).num_days() as f64 / DAYS_PER_YEAR,
      _ => {
        return Err(QuantError::invalid(
          "tau",
          "either tau or both eval and expiration must be set",
        ))
      }
    };

    crate::error::ensure_positive("tau", tau)
  }

  /// Calculate tau in days.
  fn calculate_tau_in_days(&self) -> Result<f64> {
    Ok(self.tau_or_from_dates()? * DAYS_PER_YEAR)
  }

  /// Calculate tau in years.
  fn calculate_tau_in_years(&self) -> Result<f64> {
    self.tau_or_from_dates()
  }
}
