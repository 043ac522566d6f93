use std::fmt::Display;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::error::QuantError;

pub mod portfolio;
pub mod pricing;

/// Option type.
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
  #[default]
  Call,
  Put,
}

/// Option style.
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionStyle {
  American,
  #[default]
  European,
}

impl Display for OptionType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      OptionType::Call => write!(f, "call"),
      OptionType::Put => write!(f, "put"),
    }
  }
}

impl Display for OptionStyle {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      OptionStyle::American => write!(f, "american"),
      OptionStyle::European => write!(f, "european"),
    }
  }
}

impl FromStr for OptionType {
  type Err = QuantError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "call" | "c" => Ok(Self::Call),
      "put" | "p" => Ok(Self::Put),
      other => Err(QuantError::invalid(
        "instrument",
        format!("expected `call` or `put`, got `{other}`"),
      )),
    }
  }
}

impl FromStr for OptionStyle {
  type Err = QuantError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "european" | "eu" => Ok(Self::European),
      "american" | "us" => Ok(Self::American),
      other => Err(QuantError::invalid(
        "option_type",
        format!("expected `european` or `american`, got `{other}`"),
      )),
    }
  }
}
