//! # Payoff
//!
//! $$
//! \Pi_{\text{call}}(S)=(S-K)^+,\qquad \Pi_{\text{put}}(S)=(K-S)^+
//! $$
//!
use ndarray::Array1;
use ndarray::ArrayView1;

use crate::quant::OptionType;

impl OptionType {
  /// Intrinsic value at spot `s` for strike `k`.
  #[inline]
  pub fn payoff(self, s: f64, k: f64) -> f64 {
    match self {
      OptionType::Call => (s - k).max(0.0),
      OptionType::Put => (k - s).max(0.0),
    }
  }

  /// Element-wise intrinsic value over a slice of spots.
  pub fn payoff_array(self, s: ArrayView1<f64>, k: f64) -> Array1<f64> {
    s.mapv(|s| self.payoff(s, k))
  }

  /// Flip call <-> put.
  pub fn opposite(self) -> Self {
    match self {
      OptionType::Call => OptionType::Put,
      OptionType::Put => OptionType::Call,
    }
  }
}

#[cfg(test)]
mod tests {
  use ndarray::array;

  use super::*;

  #[test]
  fn payoffs_are_hockey_sticks() {
    assert_eq!(OptionType::Call.payoff(110.0, 100.0), 10.0);
    assert_eq!(OptionType::Call.payoff(90.0, 100.0), 0.0);
    assert_eq!(OptionType::Put.payoff(90.0, 100.0), 10.0);
    assert_eq!(OptionType::Put.payoff(110.0, 100.0), 0.0);
  }

  #[test]
  fn payoff_array_matches_scalar() {
    let spots = array![80.0, 100.0, 120.0];
    let puts = OptionType::Put.payoff_array(spots.view(), 100.0);
    assert_eq!(puts, array![20.0, 0.0, 0.0]);
    assert_eq!(OptionType::Put.opposite(), OptionType::Call);
  }
}
