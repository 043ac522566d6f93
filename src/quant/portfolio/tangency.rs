//! # Tangency Portfolio
//!
//! $$
//! \mathbf w_T=\frac{\Sigma^{-1}(\mu-r_f\mathbf 1)}{\mathbf 1^\top\Sigma^{-1}(\mu-r_f\mathbf 1)}
//! $$
//!
//! Maximum-Sharpe portfolio. The long-only variant solves
//! `min wᵀΣw` s.t. `wᵀ(μ - r_f) = 1`, `w ≥ 0` and rescales to unit budget.

use nalgebra::DMatrix;
use nalgebra::DVector;

use super::moments::MomentEstimate;
use super::qp::minimize_nonnegative;
use super::risk::sharpe_ratio;
use super::types::TangencyPortfolio;
use crate::error::ensure_finite;
use crate::error::QuantError;
use crate::error::Result;

pub fn tangency_portfolio(
  moments: &MomentEstimate,
  risk_free: f64,
  allow_short: bool,
) -> Result<TangencyPortfolio> {
  ensure_finite("risk_free", risk_free)?;
  let excess = moments.mu.add_scalar(-risk_free);

  let weights = if allow_short {
    let raw = moments.inverse()? * &excess;
    let total = raw.sum();
    if !(total.abs() > f64::EPSILON) {
      return Err(QuantError::unstable(
        "tangency weights do not normalize; risk-free rate equals the minimum-variance return",
      ));
    }
    raw / total
  } else {
    if excess.iter().all(|e| *e <= 0.0) {
      return Err(QuantError::Infeasible(format!(
        "no asset has an expected return above the risk-free rate {risk_free}"
      )));
    }
    let a = DMatrix::from_column_slice(moments.n_assets(), 1, excess.as_slice());
    let raw = minimize_nonnegative(&moments.sigma, &a, &DVector::from_element(1, 1.0))?;
    let total = raw.sum();
    raw / total
  };

  let expected_return = moments.portfolio_return(&weights);
  let risk = moments.portfolio_risk(&weights);

  Ok(TangencyPortfolio {
    expected_return,
    risk,
    sharpe: sharpe_ratio(expected_return, risk, risk_free)?,
    weights: weights.iter().copied().collect(),
  })
}
