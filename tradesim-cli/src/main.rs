//! TradeSim CLI: run and optimize commands.
//!
//! Commands:
//! - `run`: execute one backtest from a TOML config or ad-hoc flags
//! - `optimize`: sweep the parameter grid of `ma_crossover` or `roc`
//!
//! Logging goes to stderr through `tracing`; set `RUST_LOG` to change the level.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tradesim_core::engine::EngineConfig;
use tradesim_core::fingerprint::StrategyConfig;
use tradesim_runner::config::{parse_param, BacktestSection, OptimizeSection};
use tradesim_runner::{
    format_summary, load_config_bars, run_single_backtest, run_sweep, save_artifacts,
    BacktestConfig, BacktestResult, OnError, ParamGrid, SweepOptions,
};

#[derive(Parser)]
#[command(
    name = "tradesim",
    about = "TradeSim CLI: single-position crypto strategy backtester"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file or ad-hoc flags.
    Run {
        #[command(flatten)]
        source: RunSource,
    },
    /// Search the parameter grid for the highest final balance.
    Optimize {
        #[command(flatten)]
        source: RunSource,

        /// Stop-loss fraction applied to every combination.
        #[arg(long)]
        stop_loss_pct: Option<f64>,

        /// Take-profit fraction applied to every combination.
        #[arg(long)]
        take_profit_pct: Option<f64>,

        /// Evaluate combinations one at a time.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Log and skip failing combinations instead of aborting.
        #[arg(long, default_value_t = false)]
        skip_errors: bool,
    },
}

#[derive(Args)]
struct RunSource {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bar CSV (required without --config).
    #[arg(long)]
    data: Option<PathBuf>,

    /// Strategy type: ma_crossover, rsi, ichimoku, roc.
    #[arg(long)]
    strategy: Option<String>,

    /// Strategy parameter, repeatable (e.g. --param short_window=11).
    #[arg(long = "param", value_parser = parse_param)]
    params: Vec<(String, f64)>,

    /// Trading pair label.
    #[arg(long)]
    symbol: Option<String>,

    /// Expected bar spacing, e.g. 1h.
    #[arg(long)]
    interval: Option<String>,

    /// First date to include (YYYY-MM-DD).
    #[arg(long)]
    start: Option<String>,

    /// Last date to include (YYYY-MM-DD).
    #[arg(long)]
    end: Option<String>,

    /// Taker fee rate, e.g. 0.001.
    #[arg(long)]
    fee: Option<f64>,

    /// Initial balance.
    #[arg(long)]
    balance: Option<f64>,

    /// Output directory for artifacts.
    #[arg(long, default_value = "results")]
    output_dir: PathBuf,

    /// Print the summary without writing artifacts.
    #[arg(long, default_value_t = false)]
    no_save: bool,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { source } => {
            let config = build_config(&source)?;
            if config.optimize.enabled {
                info!("optimize.enabled is set; running the parameter sweep");
                run_optimize_cmd(&config, &source)
            } else {
                run_backtest_cmd(&config, &source)
            }
        }
        Commands::Optimize {
            source,
            stop_loss_pct,
            take_profit_pct,
            sequential,
            skip_errors,
        } => {
            let mut config = build_config(&source)?;
            if stop_loss_pct.is_some() {
                config.optimize.stop_loss_pct = stop_loss_pct;
            }
            if take_profit_pct.is_some() {
                config.optimize.take_profit_pct = take_profit_pct;
            }
            if sequential {
                config.optimize.parallel = false;
            }
            if skip_errors {
                config.optimize.on_error = OnError::Skip;
            }
            run_optimize_cmd(&config, &source)
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Config file first, then command-line overrides on top.
fn build_config(source: &RunSource) -> Result<BacktestConfig> {
    let mut config = match &source.config {
        Some(path) => BacktestConfig::from_file(path)?,
        None => {
            let Some(data) = source.data.clone() else {
                bail!("one of --config or --data is required");
            };
            let Some(strategy) = source.strategy.clone() else {
                bail!("--strategy is required without --config");
            };
            let defaults = EngineConfig::default();
            BacktestConfig {
                backtest: BacktestSection {
                    symbol: String::new(),
                    interval: None,
                    data,
                    start_date: None,
                    end_date: None,
                    initial_balance: defaults.initial_balance,
                    taker_fee: defaults.taker_fee,
                },
                strategy: StrategyConfig::new(strategy),
                optimize: OptimizeSection::default(),
            }
        }
    };

    if source.config.is_some() {
        if let Some(data) = &source.data {
            config.backtest.data = data.clone();
        }
        if let Some(strategy) = &source.strategy {
            if *strategy != config.strategy.strategy_type {
                config.strategy = StrategyConfig::new(strategy.clone());
            }
        }
    }
    for (key, value) in &source.params {
        config.strategy.params.insert(key.clone(), *value);
    }
    if let Some(symbol) = &source.symbol {
        config.backtest.symbol = symbol.clone();
    }
    if let Some(interval) = &source.interval {
        config.backtest.interval = Some(interval.clone());
    }
    if let Some(start) = &source.start {
        config.backtest.start_date = Some(parse_date(start)?);
    }
    if let Some(end) = &source.end {
        config.backtest.end_date = Some(parse_date(end)?);
    }
    if let Some(fee) = source.fee {
        config.backtest.taker_fee = fee;
    }
    if let Some(balance) = source.balance {
        config.backtest.initial_balance = balance;
    }

    config.validate()?;
    Ok(config)
}

fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{text}', expected YYYY-MM-DD"))
}

fn run_backtest_cmd(config: &BacktestConfig, source: &RunSource) -> Result<()> {
    let result = run_single_backtest(config)?;
    finish(&result, source)
}

fn run_optimize_cmd(config: &BacktestConfig, source: &RunSource) -> Result<()> {
    let exits = match (config.optimize.stop_loss_pct, config.optimize.take_profit_pct) {
        (Some(sl), Some(tp)) => Some((sl, tp)),
        (None, None) => None,
        _ => bail!("stop_loss_pct and take_profit_pct must be given together"),
    };
    let grid = ParamGrid::for_strategy(&config.strategy.strategy_type, exits)?;
    let bars = load_config_bars(config)?;
    info!(
        strategy = %config.strategy.strategy_type,
        combinations = grid.size(),
        bars = bars.len(),
        "starting sweep"
    );

    let opts = SweepOptions {
        parallel: config.optimize.parallel,
        on_error: config.optimize.on_error,
    };
    let outcome = run_sweep(
        &grid,
        &bars,
        &config.engine_config(),
        &config.backtest.symbol,
        &opts,
    )?;

    println!("Best parameters: {}", outcome.best_config.describe());
    println!(
        "Evaluated: {}  Skipped: {}",
        outcome.evaluated, outcome.skipped
    );
    finish(&outcome.best, source)
}

fn finish(result: &BacktestResult, source: &RunSource) -> Result<()> {
    print!("{}", format_summary(result));
    if !source.no_save {
        let run_dir = save_artifacts(result, &source.output_dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}
