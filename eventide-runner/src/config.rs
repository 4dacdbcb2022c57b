//! Serializable run configuration.
//!
//! A run is described by one TOML document:
//!
//! ```toml
//! [run]
//! symbols = ["SPY", "QQQ"]
//! initial_capital = 100000.0
//! heartbeat_ms = 0
//! period = "day"
//!
//! [data]
//! source = "synthetic"
//! bars = 504
//! seed = 42
//!
//! [strategy]
//! kind = "ma_cross"
//! short_window = 20
//! long_window = 100
//!
//! [portfolio]
//! sizing = "fixed"
//! quantity = 100
//!
//! [execution]
//! venue = "SIM"
//! slippage_bps = 0.0
//!
//! [execution.fees]
//! model = "tiered"
//!
//! [output]
//! dir = "results"
//! ```
//!
//! Every section except `[run]` and `[data]` has defaults.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use eventide_core::data::parse_timestamp;
use eventide_core::engine::DEFAULT_FILL_TIMEOUT;
use eventide_core::execution::TieredFees;
use eventide_core::risk::Period;
use eventide_core::{BacktestConfig, ConfigurationError};

/// Unique identifier for a run (content-addressable hash of its configuration).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Invalid(#[from] ConfigurationError),
}

/// Everything needed to reproduce a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub run: RunSection,
    pub data: DataConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub portfolio: PortfolioConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSection {
    pub symbols: Vec<String>,
    #[serde(default = "default_capital")]
    pub initial_capital: f64,
    /// Pause between steps, in milliseconds.
    #[serde(default)]
    pub heartbeat_ms: u64,
    /// Bars before this timestamp are dropped.
    #[serde(default)]
    pub start: Option<String>,
    /// Annualization period: day, hour or minute.
    #[serde(default = "default_period")]
    pub period: String,
    /// How long to wait for fills from an asynchronous venue.
    #[serde(default)]
    pub fill_timeout_ms: Option<u64>,
}

fn default_capital() -> f64 {
    100_000.0
}

fn default_period() -> String {
    Period::Day.to_string()
}

/// Where bars come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum DataConfig {
    /// One `<SYMBOL>.csv` per symbol under `dir`.
    Csv { dir: PathBuf },
    /// Seeded random walk.
    Synthetic {
        bars: usize,
        seed: u64,
        #[serde(default)]
        start_price: Option<f64>,
    },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyConfig {
    #[default]
    BuyAndHold,
    MaCross {
        short_window: usize,
        long_window: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "sizing", rename_all = "snake_case")]
pub enum PortfolioConfig {
    Fixed { quantity: u64 },
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self::Fixed {
            quantity: eventide_core::engine::DEFAULT_ORDER_QUANTITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_venue")]
    pub venue: String,
    #[serde(default)]
    pub slippage_bps: f64,
    #[serde(default)]
    pub fees: FeesConfig,
}

fn default_venue() -> String {
    "SIM".into()
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            venue: default_venue(),
            slippage_bps: 0.0,
            fees: FeesConfig::default(),
        }
    }
}

/// Commission schedule. Unset tiered fields take the broker defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum FeesConfig {
    #[default]
    Zero,
    PerShare {
        rate: f64,
        #[serde(default)]
        floor: f64,
    },
    Tiered {
        #[serde(default)]
        share_threshold: Option<u64>,
        #[serde(default)]
        small_order_rate: Option<f64>,
        #[serde(default)]
        large_order_rate: Option<f64>,
        #[serde(default)]
        floor: Option<f64>,
    },
}

impl FeesConfig {
    /// Tiered schedule with unset fields filled from [`TieredFees::default`].
    pub fn tiered(&self) -> Option<TieredFees> {
        let Self::Tiered {
            share_threshold,
            small_order_rate,
            large_order_rate,
            floor,
        } = self
        else {
            return None;
        };
        let defaults = TieredFees::default();
        Some(TieredFees {
            share_threshold: share_threshold.unwrap_or(defaults.share_threshold),
            small_order_rate: small_order_rate.unwrap_or(defaults.small_order_rate),
            large_order_rate: large_order_rate.unwrap_or(defaults.large_order_rate),
            floor: floor.unwrap_or(defaults.floor),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for `equity.csv` and `summary.json`. Nothing is written when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub capital: Option<f64>,
    pub symbols: Option<Vec<String>>,
    pub heartbeat_ms: Option<u64>,
    pub period: Option<String>,
    pub output_dir: Option<PathBuf>,
}

impl RunConfig {
    /// Load a configuration from a TOML file. Does not validate.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a configuration from a TOML string. Does not validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Buy-and-hold over seeded synthetic bars, every other section at its default.
    pub fn synthetic(symbols: Vec<String>, bars: usize, seed: u64) -> Self {
        Self {
            run: RunSection {
                symbols,
                initial_capital: default_capital(),
                heartbeat_ms: 0,
                start: None,
                period: default_period(),
                fill_timeout_ms: None,
            },
            data: DataConfig::Synthetic {
                bars,
                seed,
                start_price: None,
            },
            strategy: StrategyConfig::default(),
            portfolio: PortfolioConfig::default(),
            execution: ExecutionConfig::default(),
            output: OutputConfig::default(),
        }
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(capital) = overrides.capital {
            self.run.initial_capital = capital;
        }
        if let Some(symbols) = &overrides.symbols {
            self.run.symbols = symbols.clone();
        }
        if let Some(heartbeat_ms) = overrides.heartbeat_ms {
            self.run.heartbeat_ms = heartbeat_ms;
        }
        if let Some(period) = &overrides.period {
            self.run.period = period.clone();
        }
        if let Some(dir) = &overrides.output_dir {
            self.output.dir = Some(dir.clone());
        }
    }

    /// Check every setting that would otherwise fail once the loop has started.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let run = &self.run;
        if run.symbols.is_empty() {
            return Err(ConfigurationError::EmptyUniverse);
        }
        let mut seen = HashSet::new();
        if let Some(dup) = run.symbols.iter().find(|s| !seen.insert(s.as_str())) {
            return Err(ConfigurationError::DuplicateSymbol(dup.clone()));
        }
        if !(run.initial_capital.is_finite() && run.initial_capital > 0.0) {
            return Err(ConfigurationError::NonPositiveCapital(run.initial_capital));
        }
        self.period()?;
        self.start()?;

        if let DataConfig::Synthetic {
            bars, start_price, ..
        } = &self.data
        {
            if *bars == 0 {
                return Err(invalid("data.bars must be at least 1"));
            }
            if start_price.is_some_and(|p| !(p.is_finite() && p > 0.0)) {
                return Err(invalid("data.start_price must be positive"));
            }
        }

        if let StrategyConfig::MaCross {
            short_window,
            long_window,
        } = self.strategy
        {
            if short_window == 0 || long_window <= short_window {
                return Err(ConfigurationError::InvalidParameter(format!(
                    "ma_cross windows must satisfy 0 < short_window < long_window, \
                     got {short_window} and {long_window}"
                )));
            }
        }

        let PortfolioConfig::Fixed { quantity } = self.portfolio;
        if quantity == 0 {
            return Err(ConfigurationError::ZeroQuantity);
        }

        let execution = &self.execution;
        if execution.venue.trim().is_empty() {
            return Err(invalid("execution.venue must not be empty"));
        }
        if !(execution.slippage_bps.is_finite() && execution.slippage_bps >= 0.0) {
            return Err(invalid("execution.slippage_bps must be non-negative"));
        }
        let fee_values: Vec<f64> = match &execution.fees {
            FeesConfig::Zero => Vec::new(),
            FeesConfig::PerShare { rate, floor } => vec![*rate, *floor],
            FeesConfig::Tiered { .. } => execution
                .fees
                .tiered()
                .map(|t| vec![t.small_order_rate, t.large_order_rate, t.floor])
                .unwrap_or_default(),
        };
        if fee_values.iter().any(|v| !(v.is_finite() && *v >= 0.0)) {
            return Err(invalid("execution.fees values must be non-negative"));
        }
        Ok(())
    }

    pub fn period(&self) -> Result<Period, ConfigurationError> {
        self.run
            .period
            .parse()
            .map_err(|_| ConfigurationError::UnsupportedPeriod(self.run.period.clone()))
    }

    pub fn start(&self) -> Result<Option<NaiveDateTime>, ConfigurationError> {
        self.run
            .start
            .as_deref()
            .map(|raw| {
                parse_timestamp(raw).ok_or_else(|| {
                    ConfigurationError::InvalidParameter(format!("run.start '{raw}' is not a timestamp"))
                })
            })
            .transpose()
    }

    /// Driver settings derived from `[run]`.
    pub fn backtest_config(&self) -> Result<BacktestConfig, ConfigurationError> {
        Ok(BacktestConfig {
            initial_capital: self.run.initial_capital,
            heartbeat: Duration::from_millis(self.run.heartbeat_ms),
            fill_timeout: self
                .run
                .fill_timeout_ms
                .map_or(DEFAULT_FILL_TIMEOUT, Duration::from_millis),
            period: self.period()?,
        })
    }

    /// Deterministic hash of the configuration.
    ///
    /// Two runs with identical configurations share a run id.
    pub fn run_id(&self) -> RunId {
        // Plain data with string keys always serializes.
        let json = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&json).to_hex().to_string()
    }
}

fn invalid(message: &str) -> ConfigurationError {
    ConfigurationError::InvalidParameter(message.to_string())
}
