//! Eventide CLI: run and validate event-driven backtests.
//!
//! Commands:
//! - `run`: execute a backtest from a TOML config file, or from flags alone
//!   over synthetic data
//! - `validate`: parse and validate a config without running it

mod obs;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use eventide_core::risk::Period;
use eventide_runner::{generate_report, run_backtest, ConfigOverrides, RunConfig};

/// Equity rows shown at the end of a run.
const REPORT_TAIL: usize = 10;

#[derive(Parser)]
#[command(name = "eventide", about = "Eventide: event-driven backtesting engine")]
struct Cli {
    /// Log filter used when EVENTIDE_LOG is unset (e.g. info, eventide_core=debug).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest.
    Run {
        /// Path to a TOML config file. Without one, runs buy-and-hold over
        /// synthetic bars for --symbols.
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        overrides: OverrideArgs,

        /// Synthetic bars per symbol (only without --config).
        #[arg(long, default_value_t = 252)]
        bars: usize,

        /// Synthetic data seed (only without --config).
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Parse and validate a config file, then print its run id.
    Validate {
        #[arg(long)]
        config: PathBuf,

        #[command(flatten)]
        overrides: OverrideArgs,
    },
}

/// Flags that override fields of the config file.
#[derive(clap::Args)]
struct OverrideArgs {
    /// Initial capital.
    #[arg(long)]
    capital: Option<f64>,

    /// Comma-separated symbol universe (e.g. SPY,QQQ).
    #[arg(long, value_delimiter = ',')]
    symbols: Option<Vec<String>>,

    /// Pause between bars, in milliseconds.
    #[arg(long)]
    heartbeat_ms: Option<u64>,

    /// Annualization period: day, hour or minute.
    #[arg(long)]
    period: Option<Period>,

    /// Directory for equity.csv and summary.json.
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

impl OverrideArgs {
    fn into_overrides(self) -> ConfigOverrides {
        ConfigOverrides {
            capital: self.capital,
            symbols: self.symbols,
            heartbeat_ms: self.heartbeat_ms,
            period: self.period.map(|p| p.to_string()),
            output_dir: self.output_dir,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    obs::init_tracing(&cli.log_level, cli.log_format.as_str())?;

    match cli.command {
        Commands::Run {
            config,
            overrides,
            bars,
            seed,
        } => run_cmd(config.as_deref(), overrides.into_overrides(), bars, seed),
        Commands::Validate { config, overrides } => {
            validate_cmd(&config, overrides.into_overrides())
        }
    }
}

fn load_config(
    path: Option<&Path>,
    overrides: &ConfigOverrides,
    bars: usize,
    seed: u64,
) -> Result<RunConfig> {
    let mut config = match path {
        Some(path) => RunConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => synthetic_config(overrides, bars, seed)?,
    };
    config.apply(overrides);
    config.validate()?;
    Ok(config)
}

fn synthetic_config(overrides: &ConfigOverrides, bars: usize, seed: u64) -> Result<RunConfig> {
    let Some(symbols) = &overrides.symbols else {
        bail!("--symbols is required without --config");
    };
    Ok(RunConfig::synthetic(symbols.clone(), bars, seed))
}

fn run_cmd(path: Option<&Path>, overrides: ConfigOverrides, bars: usize, seed: u64) -> Result<()> {
    let config = load_config(path, &overrides, bars, seed)?;
    let outcome = run_backtest(&config, None)?;

    print!(
        "{}",
        generate_report(&outcome.summary, &outcome.report.equity_curve, REPORT_TAIL)
    );
    if let Some(dir) = &outcome.artifacts {
        println!("Artifacts saved to: {}", dir.display());
    }
    Ok(())
}

fn validate_cmd(path: &Path, overrides: ConfigOverrides) -> Result<()> {
    let config = load_config(Some(path), &overrides, 0, 0)?;
    println!("Config OK");
    println!("Run id {}", config.run_id());
    println!("Symbols {}", config.run.symbols.join(", "));
    Ok(())
}
