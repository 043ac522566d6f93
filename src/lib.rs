//! # quant-engine
//!
//! $$
//! \mathbf{w}^\*=\arg\min_{\mathbf{w}}\ \mathbf{w}^\top\Sigma\mathbf{w},\qquad
//! V_0=\mathbb E^{\mathbb Q}\!\left[e^{-r\tau}\,\Pi(S_\tau)\right]
//! $$
//!
//! Two independent engines:
//! - [`quant::portfolio`]: Markowitz efficient frontier, tangency portfolio and
//!   downside (Sortino) risk from a matrix of daily returns.
//! - [`quant::pricing`]: binomial tree, Black-Scholes, Monte Carlo and
//!   Longstaff-Schwartz option pricers sharing a call/put payoff.
//!
//! Every entry point is a pure function of its inputs. Failures surface as
//! [`QuantError`]; pricing requests for a method/style pair that has no
//! algorithm return [`quant::pricing::PriceOutcome::Unsupported`] instead.

pub mod error;
pub mod quant;
pub mod traits;

pub use error::QuantError;
pub use error::Result;
pub use quant::portfolio::optimize_portfolio;
pub use quant::pricing::price_option;
