//! Risk and performance functions over a realized equity series.
//!
//! All functions are pure. Undefined returns (NaN) are skipped, never
//! treated as zero.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Trading days per year.
const TRADING_DAYS: f64 = 252.0;
/// Trading hours per day.
const TRADING_HOURS: f64 = 6.5;
/// Below this the standard deviation is treated as zero.
const MIN_STDEV: f64 = 1e-15;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RiskError {
    #[error("unsupported annualization period '{0}' (expected day, hour or minute)")]
    UnsupportedPeriod(String),

    #[error("returns have zero variance; Sharpe ratio is undefined")]
    ZeroVariance,

    #[error("need at least {needed} defined returns, got {got}")]
    InsufficientData { needed: usize, got: usize },
}

/// Sampling period of the return series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Day,
    Hour,
    Minute,
}

impl Period {
    /// Periods per year.
    pub fn annualization_factor(self) -> f64 {
        match self {
            Self::Day => TRADING_DAYS,
            Self::Hour => TRADING_DAYS * TRADING_HOURS,
            Self::Minute => TRADING_DAYS * TRADING_HOURS * 60.0,
        }
    }
}

impl FromStr for Period {
    type Err = RiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "daily" => Ok(Self::Day),
            "hour" | "hourly" => Ok(Self::Hour),
            "minute" => Ok(Self::Minute),
            _ => Err(RiskError::UnsupportedPeriod(s.to_string())),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Day => "day",
            Self::Hour => "hour",
            Self::Minute => "minute",
        })
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
fn population_std(values: &[f64]) -> f64 {
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Annualized Sharpe ratio with a zero risk-free rate.
///
/// `sqrt(periods_per_year) * mean(returns) / std(returns)` over the defined
/// (non-NaN) returns, using the population standard deviation.
pub fn sharpe_ratio(returns: &[f64], period: Period) -> Result<f64, RiskError> {
    let defined: Vec<f64> = returns.iter().copied().filter(|r| !r.is_nan()).collect();
    if defined.len() < 2 {
        return Err(RiskError::InsufficientData {
            needed: 2,
            got: defined.len(),
        });
    }
    let std = population_std(&defined);
    if std < MIN_STDEV {
        return Err(RiskError::ZeroVariance);
    }
    Ok(period.annualization_factor().sqrt() * mean(&defined) / std)
}

/// Drawdown series of an equity curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawdowns {
    /// `hwm_t - equity_t` at each step.
    pub series: Vec<f64>,
    /// Consecutive steps spent below the high-water mark.
    pub durations: Vec<usize>,
    pub max_drawdown: f64,
    pub max_duration: usize,
}

/// Single left-to-right pass over `equity` with a running high-water mark.
pub fn drawdowns(equity: &[f64]) -> Drawdowns {
    let mut series = Vec::with_capacity(equity.len());
    let mut durations = Vec::with_capacity(equity.len());
    let mut hwm = f64::NEG_INFINITY;
    let mut duration = 0usize;

    for &value in equity {
        hwm = hwm.max(value);
        let drawdown = hwm - value;
        duration = if drawdown > 0.0 { duration + 1 } else { 0 };
        series.push(drawdown);
        durations.push(duration);
    }

    Drawdowns {
        max_drawdown: series.iter().copied().fold(0.0, f64::max),
        max_duration: durations.iter().copied().max().unwrap_or(0),
        series,
        durations,
    }
}
