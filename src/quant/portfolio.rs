//! # Portfolio
//!
//! $$
//! \sigma_p^2 = \mathbf{w}^\top \Sigma \mathbf{w}
//! $$
//!
//! Mean-variance optimization: efficient frontier, tangency portfolio and
//! downside risk.

pub mod data;
pub mod engine;
pub mod frontier;
pub mod moments;
pub mod qp;
pub mod risk;
pub mod tangency;
pub mod types;

pub use data::realized_volatility;
pub use data::simple_returns;
pub use data::ReturnsMatrix;
pub use data::ReturnsMatrixRecord;
pub use engine::PortfolioEngine;
pub use engine::PortfolioEngineConfig;
pub use frontier::efficient_frontier_analytic;
pub use frontier::efficient_frontier_long_only;
pub use moments::MomentEstimate;
pub use risk::sharpe_ratio;
pub use risk::sortino_ratio;
pub use risk::sortino_variance;
pub use tangency::tangency_portfolio;
pub use types::AssetDatapoint;
pub use types::FrontierPoint;
pub use types::PortfolioReport;
pub use types::TangencyPortfolio;

use crate::error::Result;

/// Optimize with the default [`PortfolioEngineConfig`].
pub fn optimize_portfolio(
  returns: &ReturnsMatrix,
  allow_short_selling: bool,
  risk_free_rate: f64,
) -> Result<PortfolioReport> {
  PortfolioEngine::default().optimize(returns, allow_short_selling, risk_free_rate)
}
