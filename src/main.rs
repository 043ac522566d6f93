//! Command-line front end for the portfolio optimizer and option pricers.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use prettytable::row;
use prettytable::Table;
use quant_engine::quant::portfolio::PortfolioEngine;
use quant_engine::quant::portfolio::PortfolioEngineConfig;
use quant_engine::quant::portfolio::ReturnsMatrix;
use quant_engine::quant::portfolio::ReturnsMatrixRecord;
use quant_engine::quant::pricing::price_option;
use quant_engine::quant::pricing::BlackScholesPricer;
use quant_engine::quant::pricing::ImpliedVolConfig;
use quant_engine::quant::pricing::OptionContract;
use quant_engine::quant::pricing::PriceOutcome;
use quant_engine::quant::pricing::PricingMethod;
use quant_engine::quant::pricing::SimulationConfig;
use quant_engine::quant::OptionStyle;
use quant_engine::quant::OptionType;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "quant-engine")]
#[command(about = "Mean-variance portfolio optimization and option pricing")]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Price a single option
  Price(PriceArgs),
  /// Build the efficient frontier and tangency portfolio from a returns file
  Optimize(OptimizeArgs),
}

#[derive(Args)]
struct PriceArgs {
  /// binomial, black-scholes, monte-carlo or longstaff-schwartz
  #[arg(short, long, default_value = "black-scholes")]
  method: PricingMethod,
  /// european or american
  #[arg(long, default_value = "european")]
  style: OptionStyle,
  /// call or put
  #[arg(short = 't', long = "type", default_value = "call")]
  option_type: OptionType,
  #[arg(long)]
  spot: f64,
  #[arg(long)]
  strike: f64,
  /// Time to maturity in years; overrides the dates
  #[arg(long)]
  tau: Option<f64>,
  /// Evaluation date (YYYY-MM-DD)
  #[arg(long, requires = "expiration")]
  eval_date: Option<NaiveDate>,
  /// Expiration date (YYYY-MM-DD)
  #[arg(long)]
  expiration: Option<NaiveDate>,
  /// Continuously compounded risk-free rate
  #[arg(short, long)]
  rate: f64,
  /// Annualized volatility
  #[arg(long)]
  sigma: f64,
  /// Binomial steps
  #[arg(long, default_value_t = 1_000)]
  steps: usize,
  /// Simulated paths
  #[arg(long, default_value_t = 1_000)]
  trials: usize,
  /// Time increments per path
  #[arg(long, default_value_t = 100)]
  timesteps: usize,
  #[arg(long, default_value_t = 1234)]
  seed: u64,
  /// Print Black-Scholes Greeks
  #[arg(long)]
  greeks: bool,
  /// Back out the implied volatility of this market price
  #[arg(long)]
  market_price: Option<f64>,
}

#[derive(Args)]
struct OptimizeArgs {
  /// JSON file with `tickers`, `returns` (rows of daily returns) and optional `dates`
  #[arg(short, long)]
  input: PathBuf,
  #[arg(long)]
  allow_short: bool,
  #[arg(long, default_value_t = 0.0)]
  risk_free: f64,
  /// Optional JSON engine configuration
  #[arg(long)]
  config: Option<PathBuf>,
  #[arg(long)]
  pretty: bool,
}

fn main() -> anyhow::Result<()> {
  tracing_subscriber::registry()
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .with(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let cli = Cli::parse();
  match cli.command {
    Commands::Price(args) => price(args),
    Commands::Optimize(args) => optimize(args),
  }
}

fn price(args: PriceArgs) -> anyhow::Result<()> {
  let contract = match (args.tau, args.eval_date, args.expiration) {
    (Some(tau), _, _) => OptionContract::with_tau(
      args.option_type,
      args.spot,
      args.strike,
      tau,
      args.rate,
      args.sigma,
    ),
    (None, Some(eval), Some(expiration)) => OptionContract::with_dates(
      args.option_type,
      args.spot,
      args.strike,
      eval,
      expiration,
      args.rate,
      args.sigma,
    ),
    _ => anyhow::bail!("either --tau or both --eval-date and --expiration are required"),
  };
  let config = SimulationConfig {
    num_steps: args.steps,
    num_trials: args.trials,
    num_timesteps: args.timesteps,
    seed: args.seed,
  };

  let outcome = price_option(args.method, args.style, &contract, &config)
    .with_context(|| format!("pricing with {}", args.method))?;
  match outcome {
    PriceOutcome::Price(p) => println!("{p:.6}"),
    PriceOutcome::Unsupported { .. } => {
      println!("{}", serde_json::to_string(&outcome)?);
    }
  }

  if args.greeks || args.market_price.is_some() {
    let bsm = BlackScholesPricer::new(contract);
    let mut table = Table::new();
    table.add_row(row!["measure", "value"]);
    if args.greeks {
      let g = bsm.greeks().context("computing Greeks")?;
      table.add_row(row!["delta", format!("{:.6}", g.delta)]);
      table.add_row(row!["gamma", format!("{:.6}", g.gamma)]);
      table.add_row(row!["theta", format!("{:.6}", g.theta)]);
      table.add_row(row!["vega", format!("{:.6}", g.vega)]);
      table.add_row(row!["rho", format!("{:.6}", g.rho)]);
    }
    if let Some(market_price) = args.market_price {
      let iv = bsm
        .implied_volatility(market_price, &ImpliedVolConfig::default())
        .context("solving for implied volatility")?;
      table.add_row(row!["implied vol", format!("{iv:.6}")]);
    }
    table.printstd();
  }

  Ok(())
}

fn optimize(args: OptimizeArgs) -> anyhow::Result<()> {
  let raw = fs::read_to_string(&args.input)
    .with_context(|| format!("reading {}", args.input.display()))?;
  let record: ReturnsMatrixRecord =
    serde_json::from_str(&raw).context("parsing returns matrix")?;
  let returns = ReturnsMatrix::try_from(record)?;

  let config = match &args.config {
    Some(path) => {
      let raw =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
      serde_json::from_str::<PortfolioEngineConfig>(&raw).context("parsing engine config")?
    }
    None => PortfolioEngineConfig::default(),
  };

  let report = PortfolioEngine::new(config).optimize(&returns, args.allow_short, args.risk_free)?;
  let out = if args.pretty {
    serde_json::to_string_pretty(&report)?
  } else {
    serde_json::to_string(&report)?
  };
  println!("{out}");

  Ok(())
}
