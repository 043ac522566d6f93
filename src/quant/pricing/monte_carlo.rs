//! # Monte Carlo
//!
//! $$
//! \ln S_T=\ln S_0+\sum_{i=1}^{N}\left[\left(r-\tfrac12\sigma^2\right)\Delta t+\sigma\sqrt{\Delta t}\,Z_i\right],
//! \qquad V_0=e^{-r\tau}\,\frac1M\sum_{m=1}^{M}\Pi\!\left(S_T^{(m)}\right)
//! $$
//!
//! European exercise only. The generator is seeded per call, so identical
//! inputs reproduce the same price bit for bit.
use ndarray::Array1;
use ndarray::Array2;
use ndarray::Axis;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::StandardNormal;

use crate::error::QuantError;
use crate::error::Result;
use crate::quant::pricing::contract::ContractTerms;
use crate::quant::pricing::contract::OptionContract;
use crate::traits::PricerExt;
use crate::traits::TimeExt;

pub struct MonteCarloPricer {
  /// Option terms
  pub contract: OptionContract,
  /// Number of simulated paths
  pub num_trials: usize,
  /// Number of time increments per path
  pub num_timesteps: usize,
  /// Generator seed
  pub seed: u64,
}

impl MonteCarloPricer {
  pub fn new(contract: OptionContract, num_trials: usize, num_timesteps: usize, seed: u64) -> Self {
    Self {
      contract,
      num_trials,
      num_timesteps,
      seed,
    }
  }

  fn terms(&self) -> Result<ContractTerms> {
    if self.num_trials == 0 {
      return Err(QuantError::invalid("num_trials", "must be > 0"));
    }
    if self.num_timesteps == 0 {
      return Err(QuantError::invalid("num_timesteps", "must be > 0"));
    }
    self.contract.terms()
  }

  /// Simulated terminal prices, one per trial.
  pub fn terminal_prices(&self) -> Result<Array1<f64>> {
    let t = self.terms()?;
    Ok(self.simulate(&t))
  }

  fn simulate(&self, t: &ContractTerms) -> Array1<f64> {
    let dt = t.tau / self.num_timesteps as f64;
    let nudt = (t.r - 0.5 * t.v.powi(2)) * dt;
    let volsdt = t.v * dt.sqrt();

    let mut rng = StdRng::seed_from_u64(self.seed);
    let z = Array2::<f64>::random_using(
      (self.num_timesteps, self.num_trials),
      StandardNormal,
      &mut rng,
    );

    let drift = t.s.ln() + nudt * self.num_timesteps as f64;
    z.sum_axis(Axis(0)).mapv(|w| (drift + volsdt * w).exp())
  }
}

impl PricerExt for MonteCarloPricer {
  fn calculate_call_put(&self) -> Result<(f64, f64)> {
    let t = self.terms()?;
    let s_t = self.simulate(&t);
    let disc = (-t.r * t.tau).exp();
    let n = s_t.len() as f64;

    let call = s_t.iter().map(|&s| (s - t.k).max(0.0)).sum::<f64>() / n;
    let put = s_t.iter().map(|&s| (t.k - s).max(0.0)).sum::<f64>() / n;

    Ok((disc * call, disc * put))
  }

  fn calculate_price(&self) -> Result<f64> {
    let t = self.terms()?;
    let s_t = self.simulate(&t);
    let payoff = t.option_type.payoff_array(s_t.view(), t.k);
    let mean = payoff.mean().unwrap_or(0.0);

    Ok((-t.r * t.tau).exp() * mean)
  }
}

impl TimeExt for MonteCarloPricer {
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

#[cfg(test)]
mod tests {
  use super::*;
  use crate::quant::pricing::bsm::BlackScholesPricer;
  use crate::quant::OptionType;

  fn contract() -> OptionContract {
    OptionContract::with_tau(OptionType::Call, 100.0, 100.0, 1.0, 0.05, 0.2)
  }

  #[test]
  fn fixed_seed_is_bit_reproducible() {
    let a = MonteCarloPricer::new(contract(), 2_000, 50, 1234)
      .calculate_price()
      .unwrap();
    let b = MonteCarloPricer::new(contract(), 2_000, 50, 1234)
      .calculate_price()
      .unwrap();
    assert_eq!(a.to_bits(), b.to_bits());

    let c = MonteCarloPricer::new(contract(), 2_000, 50, 4321)
      .calculate_price()
      .unwrap();
    assert_ne!(a.to_bits(), c.to_bits());
  }

  #[test]
  fn converges_to_black_scholes() {
    let bs = BlackScholesPricer::new(contract()).calculate_price().unwrap();
    let mc = MonteCarloPricer::new(contract(), 200_000, 4, 7)
      .calculate_price()
      .unwrap();
    // Standard error is about 0.033 at this trial count.
    assert!((mc - bs).abs() < 0.15, "mc={mc} bs={bs}");
  }

  #[test]
  fn seed_dispersion_shrinks_with_trials() {
    let bs = BlackScholesPricer::new(contract()).calculate_price().unwrap();
    let mean_abs_error = |trials: usize| {
      (0..8u64)
        .map(|seed| {
          let p = MonteCarloPricer::new(contract(), trials, 5, seed)
            .calculate_price()
            .unwrap();
          (p - bs).abs()
        })
        .sum::<f64>()
        / 8.0
    };

    let coarse = mean_abs_error(400);
    let fine = mean_abs_error(40_000);
    assert!(fine < coarse, "fine={fine} coarse={coarse}");
    assert!(fine < 0.3);
  }

  #[test]
  fn call_put_share_draws_and_respect_parity_loosely() {
    let (call, put) = MonteCarloPricer::new(contract(), 50_000, 10, 99)
      .calculate_call_put()
      .unwrap();
    let parity = 100.0 - 100.0 * (-0.05f64).exp();
    assert!((call - put - parity).abs() < 0.5);

    let single = MonteCarloPricer::new(contract(), 50_000, 10, 99)
      .calculate_price()
      .unwrap();
    assert!((single - call).abs() < 1e-9);
  }

  #[test]
  fn zero_trials_is_invalid() {
    let err = MonteCarloPricer::new(contract(), 0, 10, 1)
      .calculate_price()
      .unwrap_err();
    assert!(matches!(
      err,
      QuantError::InvalidParameter {
        name: "num_trials",
        ..
      }
    ));
  }
}
