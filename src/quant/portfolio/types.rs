//! # Portfolio Types
//!
//! $$
//! \mathbf{w}^\*=\arg\max_{\mathbf{w}} \frac{\mathbb E[R_p]-r_f}{\sigma_p}
//! $$
//!
//! Result containers for portfolio optimization. Field names follow the JSON
//! shape consumed by the charting front end (`return`, `risk`, `weights`).

use serde::Deserialize;
use serde::Serialize;

/// A point on the efficient frontier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrontierPoint {
  /// Target (annualized) portfolio return.
  #[serde(rename = "return")]
  pub expected_return: f64,
  /// Minimum achievable volatility for the target.
  pub risk: f64,
  pub weights: Vec<f64>,
}

/// Annualized return and volatility of a single asset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetDatapoint {
  pub ticker: String,
  #[serde(rename = "return")]
  pub expected_return: f64,
  pub risk: f64,
}

/// Maximum-Sharpe portfolio against a risk-free rate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TangencyPortfolio {
  #[serde(rename = "return")]
  pub expected_return: f64,
  pub risk: f64,
  pub weights: Vec<f64>,
  /// `(return - r_f) / risk`.
  pub sharpe: f64,
}

/// Output of a full optimization run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReport {
  /// Tickers that survived the missing-data filter, in column order.
  pub tickers: Vec<String>,
  pub efficient_frontier: Vec<FrontierPoint>,
  pub asset_datapoints: Vec<AssetDatapoint>,
  pub tangency_portfolio: TangencyPortfolio,
  /// Annualized downside variance of the tangency portfolio below `r_f`.
  pub sortino_variance: f64,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub dropped_tickers: Vec<String>,
}
