//! # Portfolio Engine
//!
//! $$
//! (\mu,\Sigma) \mapsto \{\text{frontier},\ \mathbf w_T,\ \sigma_d^2\}
//! $$
//!
//! High-level orchestration: missing-data filtering, moment estimation, frontier
//! scan, tangency portfolio and downside variance.

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

use super::data::ReturnsMatrix;
use super::frontier::efficient_frontier_analytic;
use super::frontier::efficient_frontier_long_only;
use super::frontier::linspace;
use super::moments::MomentEstimate;
use super::risk::sortino_variance;
use super::tangency::tangency_portfolio;
use super::types::AssetDatapoint;
use super::types::PortfolioReport;
use crate::error::ensure_finite;
use crate::error::ensure_positive;
use crate::error::QuantError;
use crate::error::Result;

/// Runtime configuration for [`PortfolioEngine`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioEngineConfig {
  /// Number of target returns on the frontier scan.
  pub frontier_points: usize,
  /// Lowest target return of the short-selling scan.
  pub short_min_return: f64,
  /// Highest target return of the short-selling scan.
  pub short_max_return: f64,
  /// Return periods per year used to annualize moments.
  pub periods_per_year: f64,
}

impl Default for PortfolioEngineConfig {
  fn default() -> Self {
    Self {
      frontier_points: 60,
      short_min_return: -0.2,
      short_max_return: 1.0,
      periods_per_year: 252.0,
    }
  }
}

/// Single entry point for portfolio optimization.
#[derive(Clone, Debug, Default)]
pub struct PortfolioEngine {
  config: PortfolioEngineConfig,
}

impl PortfolioEngine {
  /// Construct a new engine with explicit configuration.
  pub fn new(config: PortfolioEngineConfig) -> Self {
    Self { config }
  }

  /// Borrow engine configuration.
  pub fn config(&self) -> &PortfolioEngineConfig {
    &self.config
  }

  /// Frontier, asset datapoints, tangency portfolio and its downside variance
  /// below `risk_free`.
  ///
  /// Tickers with any missing return are dropped and listed in the report.
  pub fn optimize(
    &self,
    returns: &ReturnsMatrix,
    allow_short: bool,
    risk_free: f64,
  ) -> Result<PortfolioReport> {
    ensure_finite("risk_free", risk_free)?;
    ensure_positive("periods_per_year", self.config.periods_per_year)?;
    if self.config.frontier_points == 0 {
      return Err(QuantError::invalid("frontier_points", "must be at least 1"));
    }

    let (clean, dropped) = returns.drop_incomplete();
    if !dropped.is_empty() {
      warn!(?dropped, "dropping tickers with missing returns");
    }
    if clean.n_assets() == 0 {
      return Err(QuantError::EmptyPortfolio);
    }
    debug!(
      assets = clean.n_assets(),
      periods = clean.n_periods(),
      allow_short,
      risk_free,
      "optimizing portfolio"
    );

    let moments = MomentEstimate::estimate(&clean, self.config.periods_per_year, allow_short)?;

    let efficient_frontier = if allow_short {
      let targets = linspace(
        self.config.short_min_return,
        self.config.short_max_return,
        self.config.frontier_points,
      );
      efficient_frontier_analytic(&moments, &targets)?
    } else {
      let targets = linspace(
        moments.mu.min(),
        moments.mu.max(),
        self.config.frontier_points,
      );
      efficient_frontier_long_only(&moments, &targets)?
    };

    let tangency = tangency_portfolio(&moments, risk_free, allow_short)?;
    let sortino = sortino_variance(
      clean.values(),
      &tangency.weights,
      risk_free,
      self.config.periods_per_year,
    )?;
    debug!(
      sharpe = tangency.sharpe,
      sortino_variance = sortino,
      "tangency portfolio found"
    );

    let asset_datapoints = clean
      .tickers()
      .iter()
      .zip(moments.mu.iter().zip(moments.asset_risks().iter()))
      .map(|(ticker, (&ret, &risk))| AssetDatapoint {
        ticker: ticker.clone(),
        expected_return: ret,
        risk,
      })
      .collect();

    Ok(PortfolioReport {
      tickers: clean.tickers().to_vec(),
      efficient_frontier,
      asset_datapoints,
      tangency_portfolio: tangency,
      sortino_variance: sortino,
      dropped_tickers: dropped,
    })
  }
}
