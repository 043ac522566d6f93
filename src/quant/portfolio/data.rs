//! # Portfolio Data
//!
//! $$
//! r_{t,i} = \frac{P_{t,i}}{P_{t-1,i}} - 1
//! $$
//!
//! Returns matrix container (dates × assets) plus the realized-volatility helpers
//! used to feed the pricers.

use chrono::NaiveDate;
use ndarray::Array2;
use ndarray::ArrayView2;
use ndarray::Axis;
use serde::Deserialize;
use serde::Serialize;
use statrs::statistics::Statistics;

use crate::error::QuantError;
use crate::error::Result;

/// Periodic asset returns, one row per date and one column per ticker.
///
/// Missing observations are stored as `NaN`.
#[derive(Clone, Debug, PartialEq)]
pub struct ReturnsMatrix {
  dates: Vec<NaiveDate>,
  tickers: Vec<String>,
  values: Array2<f64>,
}

impl ReturnsMatrix {
  /// `dates` may be empty; otherwise it must have one entry per row.
  pub fn new(dates: Vec<NaiveDate>, tickers: Vec<String>, values: Array2<f64>) -> Result<Self> {
    if values.ncols() != tickers.len() {
      return Err(QuantError::invalid(
        "returns",
        format!(
          "{} columns for {} tickers",
          values.ncols(),
          tickers.len()
        ),
      ));
    }
    if !dates.is_empty() && dates.len() != values.nrows() {
      return Err(QuantError::invalid(
        "dates",
        format!("{} dates for {} rows", dates.len(), values.nrows()),
      ));
    }
    for (i, ticker) in tickers.iter().enumerate() {
      if tickers[..i].contains(ticker) {
        return Err(QuantError::invalid(
          "tickers",
          format!("duplicate ticker `{ticker}`"),
        ));
      }
    }

    Ok(Self {
      dates,
      tickers,
      values,
    })
  }

  /// Percentage-change returns from aligned price columns.
  ///
  /// The first date is consumed. A return is `NaN` when either price is missing
  /// or the earlier price is not positive.
  pub fn from_prices(
    dates: Vec<NaiveDate>,
    tickers: Vec<String>,
    prices: ArrayView2<f64>,
  ) -> Result<Self> {
    if !dates.is_empty() && dates.len() != prices.nrows() {
      return Err(QuantError::invalid(
        "dates",
        format!("{} dates for {} price rows", dates.len(), prices.nrows()),
      ));
    }
    let rows = prices.nrows().saturating_sub(1);
    let values = Array2::from_shape_fn((rows, prices.ncols()), |(t, i)| {
      let prev = prices[[t, i]];
      let next = prices[[t + 1, i]];
      if prev.is_finite() && next.is_finite() && prev > 0.0 {
        next / prev - 1.0
      } else {
        f64::NAN
      }
    });
    let dates = dates.into_iter().skip(1).collect();

    Self::new(dates, tickers, values)
  }

  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  pub fn tickers(&self) -> &[String] {
    &self.tickers
  }

  pub fn values(&self) -> ArrayView2<'_, f64> {
    self.values.view()
  }

  pub fn n_assets(&self) -> usize {
    self.tickers.len()
  }

  pub fn n_periods(&self) -> usize {
    self.values.nrows()
  }

  /// Split off every column holding a non-finite value.
  ///
  /// Returns the complete matrix and the dropped tickers in column order.
  pub fn drop_incomplete(&self) -> (ReturnsMatrix, Vec<String>) {
    let (keep, dropped): (Vec<usize>, Vec<usize>) = (0..self.n_assets())
      .partition(|&i| self.values.column(i).iter().all(|v| v.is_finite()));

    let clean = ReturnsMatrix {
      dates: self.dates.clone(),
      tickers: keep.iter().map(|&i| self.tickers[i].clone()).collect(),
      values: self.values.select(Axis(1), &keep),
    };
    let dropped = dropped
      .into_iter()
      .map(|i| self.tickers[i].clone())
      .collect();

    (clean, dropped)
  }
}

/// Serialized form of a [`ReturnsMatrix`]; `null` entries become `NaN`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReturnsMatrixRecord {
  #[serde(default)]
  pub dates: Vec<NaiveDate>,
  pub tickers: Vec<String>,
  /// Row-major, one row per date.
  pub returns: Vec<Vec<Option<f64>>>,
}

impl TryFrom<ReturnsMatrixRecord> for ReturnsMatrix {
  type Error = QuantError;

  fn try_from(record: ReturnsMatrixRecord) -> Result<Self> {
    let rows = record.returns.len();
    let cols = record.tickers.len();
    if let Some(bad) = record.returns.iter().position(|row| row.len() != cols) {
      return Err(QuantError::invalid(
        "returns",
        format!(
          "row {bad} has {} values for {cols} tickers",
          record.returns[bad].len()
        ),
      ));
    }

    let flat = record
      .returns
      .into_iter()
      .flatten()
      .map(|v| v.unwrap_or(f64::NAN))
      .collect();
    let values = Array2::from_shape_vec((rows, cols), flat)
      .map_err(|e| QuantError::invalid("returns", e.to_string()))?;

    ReturnsMatrix::new(record.dates, record.tickers, values)
  }
}

/// Simple returns of a price series, skipping pairs with a non-positive or
/// non-finite price.
pub fn simple_returns(prices: &[f64]) -> Vec<f64> {
  prices
    .windows(2)
    .filter(|w| w[0] > 0.0 && w[0].is_finite() && w[1].is_finite())
    .map(|w| w[1] / w[0] - 1.0)
    .collect()
}

/// Annualized sample (ddof = 1) volatility of the simple returns of `prices`.
pub fn realized_volatility(prices: &[f64], periods_per_year: f64) -> Result<f64> {
  crate::error::ensure_positive("periods_per_year", periods_per_year)?;
  let returns = simple_returns(prices);
  if returns.len() < 2 {
    return Err(QuantError::invalid(
      "prices",
      format!("need at least 3 valid prices, got {} returns", returns.len()),
    ));
  }

  Ok(returns.iter().std_dev() * periods_per_year.sqrt())
}
