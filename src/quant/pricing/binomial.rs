//! # Binomial Tree
//!
//! Recombining tree with moment-matched factors:
//! $$
//! m=\tfrac12\left(e^{-r\Delta t}+e^{(r+\sigma^2)\Delta t}\right),\quad
//! u=m+\sqrt{m^2-1},\quad d=u^{-1},\quad
//! p=\frac{e^{r\Delta t}-d}{u-d}.
//! $$
//!
//! European values follow plain backward induction. American values take the
//! Snell envelope at every node:
//! $$
//! V_{j,n}=\max\left(g(S_{j,n}),\ e^{-r\Delta t}\left[pV_{j+1,n+1}+(1-p)V_{j,n+1}\right]\right).
//! $$
//!
use crate::error::QuantError;
use crate::error::Result;
use crate::quant::pricing::contract::ContractTerms;
use crate::quant::pricing::contract::OptionContract;
use crate::quant::OptionStyle;
use crate::quant::OptionType;
use crate::traits::PricerExt;
use crate::traits::TimeExt;

/// Node prices are capped at e^700 so upper-tail nodes stay finite.
const MAX_LN_NODE: f64 = 700.0;

pub struct BinomialPricer {
  /// Option terms
  pub contract: OptionContract,
  /// Number of binomial time steps.
  pub steps: usize,
  /// European or American exercise.
  pub style: OptionStyle,
}

/// Per-step tree parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeCalibration {
  pub u: f64,
  pub d: f64,
  pub p: f64,
  pub disc: f64,
}

impl TreeCalibration {
  /// Match the first two moments of the risk-neutral lognormal step.
  pub fn new(r: f64, v: f64, dt: f64) -> Result<Self> {
    let disc = (-r * dt).exp();
    let m = 0.5 * (disc + ((r + v * v) * dt).exp());
    let u = m + (m * m - 1.0).sqrt();
    let d = 1.0 / u;
    let p = ((r * dt).exp() - d) / (u - d);

    if !(u - d).is_normal() || !p.is_finite() {
      return Err(QuantError::unstable(format!(
        "degenerate binomial factors (u={u}, d={d})"
      )));
    }
    if !(0.0..=1.0).contains(&p) {
      return Err(QuantError::unstable(format!(
        "risk-neutral probability out of range: p={p}; increase steps or adjust parameters"
      )));
    }

    Ok(Self { u, d, p, disc })
  }
}

impl BinomialPricer {
  pub fn new(contract: OptionContract, steps: usize, style: OptionStyle) -> Self {
    Self {
      contract,
      steps,
      style,
    }
  }

  fn terms(&self) -> Result<ContractTerms> {
    if self.steps == 0 {
      return Err(QuantError::invalid("num_steps", "must be > 0"));
    }
    self.contract.terms()
  }

  fn price(&self, terms: &ContractTerms, option_type: OptionType) -> Result<f64> {
    let dt = terms.tau / self.steps as f64;
    let TreeCalibration { u, p, disc, .. } = TreeCalibration::new(terms.r, terms.v, dt)?;
    let american = self.style == OptionStyle::American;

    // Node (i, j) sits at s * u^(2j - i); prices come from log space so deep
    // trees never pass through a subnormal d^n.
    let n = self.steps as i64;
    let (ln_s, ln_u) = (terms.s.ln(), u.ln());
    let ladder = (-n..=n)
      .map(|k| (ln_s + k as f64 * ln_u).min(MAX_LN_NODE).exp())
      .collect::<Vec<_>>();
    let node = |i: usize, j: usize| ladder[2 * j + self.steps - i];

    let mut values = (0..=self.steps)
      .map(|j| option_type.payoff(node(self.steps, j), terms.k))
      .collect::<Vec<_>>();

    for i in (0..self.steps).rev() {
      for j in 0..=i {
        let continuation = disc * (p * values[j + 1] + (1.0 - p) * values[j]);
        values[j] = if american {
          continuation.max(option_type.payoff(node(i, j), terms.k))
        } else {
          continuation
        };
      }
    }

    if !values[0].is_finite() {
      return Err(QuantError::unstable(format!(
        "binomial value is not finite: {}",
        values[0]
      )));
    }
  }
}

impl PricerExt for BinomialPricer {
  fn calculate_call_put(&self) -> Result<(f64, f64)> {
    let terms = self.terms()?;
    Ok((
      self.price(&terms, OptionType::Call)?,
      self.price(&terms, OptionType::Put)?,
    ))
  }

  fn calculate_price(&self) -> Result<f64> {
    let terms = self.terms()?;
    self.price(&terms, terms.option_type)
  }
}

impl TimeExt for BinomialPricer {
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
