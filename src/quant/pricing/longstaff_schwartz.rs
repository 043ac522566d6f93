//! # Longstaff-Schwartz
//!
//! Least-squares Monte Carlo for American exercise. Working backwards from
//! maturity, the discounted continuation value of in-the-money paths is
//! regressed on the spot with a quadratic basis,
//! $$
//! \hat C_t(S)=\beta_0+\beta_1\frac{S}{K}+\beta_2\left(\frac{S}{K}\right)^2,
//! $$
//! and a path exercises when $g(S_t) > \hat C_t(S_t)$. The regression is
//! refit at every exercise date.
//!
//! Source:
//! - Longstaff, F. A. & Schwartz, E. S. (2001), Valuing American Options by Simulation
use nalgebra::DMatrix;
use nalgebra::DVector;
use ndarray::Array1;
use ndarray::Array2;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::StandardNormal;

use crate::error::QuantError;
use crate::error::Result;
use crate::quant::pricing::contract::ContractTerms;
use crate::quant::pricing::contract::OptionContract;
use crate::quant::OptionType;
use crate::traits::PricerExt;
use crate::traits::TimeExt;

/// Number of regression coefficients (degree-2 polynomial).
const BASIS: usize = 3;

pub struct LongstaffSchwartzPricer {
  /// Option terms
  pub contract: OptionContract,
  /// Number of simulated paths
  pub num_trials: usize,
  /// Number of exercise dates (time steps) per path
  pub num_timesteps: usize,
  /// Generator seed
  pub seed: u64,
}

impl LongstaffSchwartzPricer {
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

  /// Risk-neutral GBM paths, shape `(num_timesteps + 1, num_trials)`, row 0 is spot.
  pub fn paths(&self) -> Result<Array2<f64>> {
    let t = self.terms()?;
    Ok(self.simulate(&t))
  }

  fn simulate(&self, t: &ContractTerms) -> Array2<f64> {
    let dt = t.tau / self.num_timesteps as f64;
    let nudt = (t.r - 0.5 * t.v.powi(2)) * dt;
    let volsdt = t.v * dt.sqrt();

    let mut rng = StdRng::seed_from_u64(self.seed);
    let z = Array2::<f64>::random_using(
      (self.num_timesteps, self.num_trials),
      StandardNormal,
      &mut rng,
    );

    let mut paths = Array2::<f64>::zeros((self.num_timesteps + 1, self.num_trials));
    paths.row_mut(0).fill(t.s);
    for step in 1..=self.num_timesteps {
      let prev = paths.row(step - 1).to_owned();
      let growth = z.row(step - 1).mapv(|w| (nudt + volsdt * w).exp());
      paths.row_mut(step).assign(&(prev * growth));
    }

    paths
  }

  fn price_paths(
    &self,
    paths: &Array2<f64>,
    t: &ContractTerms,
    option_type: OptionType,
  ) -> Result<f64> {
    let dt = t.tau / self.num_timesteps as f64;
    let df = (-t.r * dt).exp();

    let mut cashflow: Array1<f64> =
      option_type.payoff_array(paths.row(self.num_timesteps), t.k);

    for step in (1..self.num_timesteps).rev() {
      let prices = paths.row(step);
      let mut carried = cashflow.mapv(|v| v * df);

      let itm: Vec<usize> = prices
        .iter()
        .enumerate()
        .filter(|&(_, &s)| option_type.payoff(s, t.k) > 0.0)
        .map(|(i, _)| i)
        .collect();

      if itm.len() > BASIS {
        let x: Vec<f64> = itm.iter().map(|&i| prices[i] / t.k).collect();
        let y: Vec<f64> = itm.iter().map(|&i| carried[i]).collect();
        let beta = fit_continuation(&x, &y)?;

        for (&i, &xi) in itm.iter().zip(x.iter()) {
          let continuation = beta[0] + beta[1] * xi + beta[2] * xi * xi;
          let exercise = option_type.payoff(prices[i], t.k);
          if exercise > continuation {
            carried[i] = exercise;
          }
        }
      }

      cashflow = carried;
    }

    Ok(df * cashflow.mean().unwrap_or(0.0))
  }
}

/// Ordinary least squares of `y` on `[1, x, x^2]` via the normal equations.
fn fit_continuation(x: &[f64], y: &[f64]) -> Result<[f64; BASIS]> {
  let design = DMatrix::from_fn(x.len(), BASIS, |i, j| x[i].powi(j as i32));
  let rhs = design.transpose() * DVector::from_column_slice(y);
  let gram = design.transpose() * &design;

  let beta = gram
    .cholesky()
    .map(|chol| chol.solve(&rhs))
    .ok_or_else(|| QuantError::unstable("singular normal equations in continuation regression"))?;

  if beta.iter().any(|b| !b.is_finite()) {
    return Err(QuantError::unstable(
      "non-finite continuation regression coefficients",
    ));
  }

  Ok([beta[0], beta[1], beta[2]])
}

impl PricerExt for LongstaffSchwartzPricer {
  fn calculate_call_put(&self) -> Result<(f64, f64)> {
    let t = self.terms()?;
    let paths = self.simulate(&t);
    Ok((
      self.price_paths(&paths, &t, OptionType::Call)?,
      self.price_paths(&paths, &t, OptionType::Put)?,
    ))
  }

  fn calculate_price(&self) -> Result<f64> {
    let t = self.terms()?;
    let paths = self.simulate(&t);
    self.price_paths(&paths, &t, t.option_type)
  }
}

impl TimeExt for LongstaffSchwartzPricer {
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
