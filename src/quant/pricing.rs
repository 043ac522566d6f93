//! # Pricing
//!
//! $$
//! V_0=\mathbb E^{\mathbb Q}\!\left[e^{-r\tau}\,\Pi(S_\tau)\right]
//! $$
//!
//! Four pricers over a shared [`OptionContract`]. [`price_option`] dispatches on
//! a `(method, style)` pair; pairs without an algorithm yield
//! [`PriceOutcome::Unsupported`] rather than an error.
use std::fmt::Display;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::Deserialize;
use serde::Serialize;
use serde::Serializer;
use tracing::debug;

use crate::error::QuantError;
use crate::error::Result;
use crate::quant::OptionStyle;
use crate::traits::PricerExt;

pub mod binomial;
pub mod bsm;
pub mod contract;
pub mod longstaff_schwartz;
pub mod monte_carlo;
pub mod payoff;

pub use binomial::BinomialPricer;
pub use bsm::BlackScholesPricer;
pub use bsm::Greeks;
pub use bsm::ImpliedVolConfig;
pub use contract::OptionContract;
pub use longstaff_schwartz::LongstaffSchwartzPricer;
pub use monte_carlo::MonteCarloPricer;

/// Supported pricing algorithms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PricingMethod {
  /// Recombining binomial tree (European and American).
  Binomial,
  /// Closed form (European).
  BlackScholes,
  /// Terminal-price simulation (European).
  MonteCarlo,
  /// Least-squares Monte Carlo (American).
  LongstaffSchwartz,
}

impl Display for PricingMethod {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      PricingMethod::Binomial => write!(f, "binomial"),
      PricingMethod::BlackScholes => write!(f, "black-scholes"),
      PricingMethod::MonteCarlo => write!(f, "monte-carlo"),
      PricingMethod::LongstaffSchwartz => write!(f, "longstaff-schwartz"),
    }
  }
}

impl FromStr for PricingMethod {
  type Err = QuantError;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "binomial" => Ok(Self::Binomial),
      "black-scholes" | "bsm" | "blackscholes" => Ok(Self::BlackScholes),
      "monte-carlo" | "mc" | "montecarlo" => Ok(Self::MonteCarlo),
      "longstaff-schwartz" | "lsm" | "longstaffschwartz" => Ok(Self::LongstaffSchwartz),
      other => Err(QuantError::invalid(
        "method",
        format!(
          "expected one of binomial, black-scholes, monte-carlo, longstaff-schwartz; got `{other}`"
        ),
      )),
    }
  }
}

/// Discretization settings for the tree and simulation pricers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
  /// Binomial tree steps.
  pub num_steps: usize,
  /// Monte Carlo / Longstaff-Schwartz paths.
  pub num_trials: usize,
  /// Monte Carlo / Longstaff-Schwartz time increments.
  pub num_timesteps: usize,
  /// Generator seed.
  pub seed: u64,
}

impl Default for SimulationConfig {
  fn default() -> Self {
    Self {
      num_steps: 1_000,
      num_trials: 1_000,
      num_timesteps: 100,
      seed: 1234,
    }
  }
}

/// Result of a pricing request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PriceOutcome {
  /// Present value of the contract.
  Price(f64),
  /// No algorithm exists for this method/style pair.
  Unsupported {
    method: PricingMethod,
    style: OptionStyle,
  },
}

impl PriceOutcome {
  pub fn price(&self) -> Option<f64> {
    match self {
      PriceOutcome::Price(p) => Some(*p),
      PriceOutcome::Unsupported { .. } => None,
    }
  }

  pub fn is_unsupported(&self) -> bool {
    matches!(self, PriceOutcome::Unsupported { .. })
  }

  /// Human-readable reason for an unsupported pair.
  pub fn message(&self) -> Option<String> {
    match self {
      PriceOutcome::Price(_) => None,
      PriceOutcome::Unsupported { method, style } => Some(format!(
        "{style} options are not supported by the {method} method"
      )),
    }
  }
}

/// A price serializes as a bare number, an unsupported pair as `{"error": ..}`.
impl Serialize for PriceOutcome {
  fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    match self {
      PriceOutcome::Price(p) => serializer.serialize_f64(*p),
      PriceOutcome::Unsupported { .. } => {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("error", &self.message())?;
        map.end()
      }
    }
  }
}

/// Price `contract` with `method` under `style` exercise.
pub fn price_option(
  method: PricingMethod,
  style: OptionStyle,
  contract: &OptionContract,
  config: &SimulationConfig,
) -> Result<PriceOutcome> {
  contract.terms()?;
  debug!(%method, %style, instrument = %contract.option_type, "pricing option");

  let price = match (method, style) {
    (PricingMethod::Binomial, style) => {
      BinomialPricer::new(*contract, config.num_steps, style).calculate_price()?
    }
    (PricingMethod::BlackScholes, OptionStyle::European) => {
      BlackScholesPricer::new(*contract).calculate_price()?
    }
    (PricingMethod::MonteCarlo, OptionStyle::European) => MonteCarloPricer::new(
      *contract,
      config.num_trials,
      config.num_timesteps,
      config.seed,
    )
    .calculate_price()?,
    (PricingMethod::LongstaffSchwartz, OptionStyle::American) => LongstaffSchwartzPricer::new(
      *contract,
      config.num_trials,
      config.num_timesteps,
      config.seed,
    )
    .calculate_price()?,
    (PricingMethod::BlackScholes, OptionStyle::American)
    | (PricingMethod::MonteCarlo, OptionStyle::American)
    | (PricingMethod::LongstaffSchwartz, OptionStyle::European) => {
      debug!(%method, %style, "unsupported method/style pair");
      return Ok(PriceOutcome::Unsupported { method, style });
    }
  };

  Ok(PriceOutcome::Price(price))
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use tracing_test::traced_test;

  use super::*;
  use crate::quant::OptionType;

  fn contract(option_type: OptionType) -> OptionContract {
    OptionContract::with_tau(option_type, 100.0, 100.0, 1.0, 0.05, 0.2)
  }

  fn fast() -> SimulationConfig {
    SimulationConfig {
      num_steps: 500,
      num_trials: 4_000,
      num_timesteps: 20,
      seed: 1234,
    }
  }

  #[test]
  fn unsupported_pairs_are_not_errors() {
    for (method, style) in [
      (PricingMethod::BlackScholes, OptionStyle::American),
      (PricingMethod::MonteCarlo, OptionStyle::American),
      (PricingMethod::LongstaffSchwartz, OptionStyle::European),
    ] {
      let outcome = price_option(method, style, &contract(OptionType::Call), &fast()).unwrap();
      assert!(outcome.is_unsupported());
      assert_eq!(outcome.price(), None);
    }
  }

  #[test]
  fn supported_pairs_price() {
    let call = contract(OptionType::Call);
    let put = contract(OptionType::Put);
    for (method, style, c) in [
      (PricingMethod::Binomial, OptionStyle::European, call),
      (PricingMethod::Binomial, OptionStyle::American, put),
      (PricingMethod::BlackScholes, OptionStyle::European, call),
      (PricingMethod::MonteCarlo, OptionStyle::European, call),
      (PricingMethod::LongstaffSchwartz, OptionStyle::American, put),
    ] {
      let price = price_option(method, style, &c, &fast())
        .unwrap()
        .price()
        .unwrap();
      assert!(price > 0.0, "{method} {style}: {price}");
    }
  }

  #[test]
  fn dispatch_matches_direct_black_scholes() {
    let outcome = price_option(
      PricingMethod::BlackScholes,
      OptionStyle::European,
      &contract(OptionType::Call),
      &SimulationConfig::default(),
    )
    .unwrap();
    assert_abs_diff_eq!(outcome.price().unwrap(), 10.4506, epsilon = 1e-4);
  }

  #[test]
  fn invalid_contract_fails_even_for_unsupported_pair() {
    let bad = OptionContract::with_tau(OptionType::Call, 100.0, 100.0, 1.0, 0.05, -0.2);
    let err = price_option(
      PricingMethod::BlackScholes,
      OptionStyle::American,
      &bad,
      &fast(),
    )
    .unwrap_err();
    assert!(matches!(err, QuantError::InvalidParameter { name: "sigma", .. }));
  }

  #[test]
  fn outcome_serializes_like_the_wire_format() {
    let price = serde_json::to_value(PriceOutcome::Price(1.5)).unwrap();
    assert_eq!(price, serde_json::json!(1.5));

    let unsupported = serde_json::to_value(PriceOutcome::Unsupported {
      method: PricingMethod::BlackScholes,
      style: OptionStyle::American,
    })
    .unwrap();
    assert_eq!(
      unsupported,
      serde_json::json!({"error": "american options are not supported by the black-scholes method"})
    );
  }

  #[test]
  fn method_literals_round_trip() {
    for method in [
      PricingMethod::Binomial,
      PricingMethod::BlackScholes,
      PricingMethod::MonteCarlo,
      PricingMethod::LongstaffSchwartz,
    ] {
      assert_eq!(method.to_string().parse::<PricingMethod>().unwrap(), method);
    }
    assert!("finite-difference".parse::<PricingMethod>().is_err());
  }

  #[traced_test]
  #[test]
  fn unsupported_pair_is_logged() {
    price_option(
      PricingMethod::MonteCarlo,
      OptionStyle::American,
      &contract(OptionType::Put),
      &fast(),
    )
    .unwrap();
    assert!(logs_contain("unsupported method/style pair"));
  }
}
