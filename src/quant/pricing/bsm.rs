//! # Black-Scholes
//!
//! $$
//! d_1=\frac{\ln(S/K)+(r+\tfrac12\sigma^2)\tau}{\sigma\sqrt\tau},\quad d_2=d_1-\sigma\sqrt\tau
//! $$
//! $$
//! C=S\Phi(d_1)-Ke^{-r\tau}\Phi(d_2),\qquad P=-S\Phi(-d_1)+Ke^{-r\tau}\Phi(-d_2)
//! $$
//!
//! European exercise only.
use serde::Deserialize;
use serde::Serialize;
use statrs::distribution::Continuous;
use statrs::distribution::ContinuousCDF;
use statrs::distribution::Normal;

use crate::error::ensure_positive;
use crate::error::QuantError;
use crate::error::Result;
use crate::quant::pricing::contract::ContractTerms;
use crate::quant::pricing::contract::OptionContract;
use crate::quant::OptionType;
use crate::traits::PricerExt;
use crate::traits::TimeExt;

pub struct BlackScholesPricer {
  /// Option terms
  pub contract: OptionContract,
}

/// Closed-form sensitivities of a European option.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Greeks {
  pub delta: f64,
  pub gamma: f64,
  pub theta: f64,
  pub vega: f64,
  pub rho: f64,
}

/// Newton-Raphson settings for [`BlackScholesPricer::implied_volatility`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpliedVolConfig {
  /// Starting volatility; the contract volatility when `None`.
  pub initial_guess: Option<f64>,
  /// Absolute price tolerance.
  pub tolerance: f64,
  pub max_iterations: usize,
}

impl Default for ImpliedVolConfig {
  fn default() -> Self {
    Self {
      initial_guess: None,
      tolerance: 1e-6,
      max_iterations: 10_000,
    }
  }
}

impl BlackScholesPricer {
  pub fn new(contract: OptionContract) -> Self {
    Self { contract }
  }

  fn d1_d2(t: &ContractTerms) -> (f64, f64) {
    let v_sqrt_tau = t.v * t.tau.sqrt();
    let d1 = ((t.s / t.k).ln() + (t.r + 0.5 * t.v.powi(2)) * t.tau) / v_sqrt_tau;
    (d1, d1 - v_sqrt_tau)
  }

  fn call_put(t: &ContractTerms) -> (f64, f64) {
    let (d1, d2) = Self::d1_d2(t);
    let n = Normal::default();
    let k_disc = t.k * (-t.r * t.tau).exp();

    let call = t.s * n.cdf(d1) - k_disc * n.cdf(d2);
    let put = -t.s * n.cdf(-d1) + k_disc * n.cdf(-d2);

    (call, put)
  }

  /// Calculate the delta
  pub fn delta(&self) -> Result<f64> {
    let t = self.contract.terms()?;
    let (d1, _) = Self::d1_d2(&t);
    let n = Normal::default();

    Ok(match t.option_type {
      OptionType::Call => n.cdf(d1),
      OptionType::Put => n.cdf(d1) - 1.0,
    })
  }

  /// Calculate the gamma
  pub fn gamma(&self) -> Result<f64> {
    let t = self.contract.terms()?;
    let (d1, _) = Self::d1_d2(&t);

    Ok(Normal::default().pdf(d1) / (t.s * t.v * t.tau.sqrt()))
  }

  /// Calculate the theta (per year)
  pub fn theta(&self) -> Result<f64> {
    let t = self.contract.terms()?;
    let (d1, d2) = Self::d1_d2(&t);
    let n = Normal::default();

    let decay = -t.s * n.pdf(d1) * t.v / (2.0 * t.tau.sqrt());
    let carry = t.r * t.k * (-t.r * t.tau).exp();

    Ok(match t.option_type {
      OptionType::Call => decay - carry * n.cdf(d2),
      OptionType::Put => decay + carry * n.cdf(-d2),
    })
  }

  /// Calculate the vega
  pub fn vega(&self) -> Result<f64> {
    let t = self.contract.terms()?;
    Ok(Self::vega_of(&t))
  }

  fn vega_of(t: &ContractTerms) -> f64 {
    let (d1, _) = Self::d1_d2(t);
    t.s * Normal::default().pdf(d1) * t.tau.sqrt()
  }

  /// Calculate the rho
  pub fn rho(&self) -> Result<f64> {
    let t = self.contract.terms()?;
    let (_, d2) = Self::d1_d2(&t);
    let n = Normal::default();
    let k_tau_disc = t.k * t.tau * (-t.r * t.tau).exp();

    Ok(match t.option_type {
      OptionType::Call => k_tau_disc * n.cdf(d2),
      OptionType::Put => -k_tau_disc * n.cdf(-d2),
    })
  }

  pub fn greeks(&self) -> Result<Greeks> {
    Ok(Greeks {
      delta: self.delta()?,
      gamma: self.gamma()?,
      theta: self.theta()?,
      vega: self.vega()?,
      rho: self.rho()?,
    })
  }

  /// Volatility that reproduces `market_price` for the contract's instrument,
  /// found by Newton-Raphson with vega as the derivative.
  pub fn implied_volatility(&self, market_price: f64, config: &ImpliedVolConfig) -> Result<f64> {
    let market_price = ensure_positive("market_price", market_price)?;
    let terms = self.contract.terms()?;
    let mut sigma = ensure_positive("initial_guess", config.initial_guess.unwrap_or(terms.v))?;
    let mut last = (sigma, f64::INFINITY);

    for _ in 0..config.max_iterations {
      let t = ContractTerms { v: sigma, ..terms };
      let (call, put) = Self::call_put(&t);
      let price = match t.option_type {
        OptionType::Call => call,
        OptionType::Put => put,
      };
      let residual = price - market_price;
      last = (sigma, residual.abs());
      if residual.abs() < config.tolerance {
        return Ok(sigma);
      }

      let vega = Self::vega_of(&t);
      if !vega.is_normal() {
        return Err(QuantError::unstable(format!(
          "vega vanished at sigma={sigma}; price {market_price} is outside the attainable range"
        )));
      }

      let next = sigma - residual / vega;
      // Newton can overshoot below zero on deep out-of-the-money quotes.
      sigma = if next > 0.0 { next } else { sigma / 2.0 };
    }

    Err(QuantError::NonConvergence {
      method: "implied volatility (Newton-Raphson)",
      iterations: config.max_iterations,
      last_iterate: last.0,
      tolerance: last.1,
    })
  }
}

impl PricerExt for BlackScholesPricer {
  fn calculate_call_put(&self) -> Result<(f64, f64)> {
    Ok(Self::call_put(&self.contract.terms()?))
  }

  fn calculate_price(&self) -> Result<f64> {
    let (call, put) = self.calculate_call_put()?;
    Ok(match self.contract.option_type {
      OptionType::Call => call,
      OptionType::Put => put,
    })
  }

  fn derivatives(&self) -> Result<Vec<f64>> {
    let g = self.greeks()?;
    Ok(vec![g.delta, g.gamma, g.theta, g.vega, g.rho])
  }
}

impl TimeExt for BlackScholesPricer {
  fn tau(&self) -> Option<f64> {
    self.contract.tau
  }

  fn eval(&self) -> Option<chrono::NaiveDate> {
    self.contract.eval
  }

  fn expiration(&self) -> Option<chrono::NaiveDate> {
    self.contract.expiration
  }
}
