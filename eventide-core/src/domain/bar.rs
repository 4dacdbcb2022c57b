//! Bar: the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// OHLCV bar (plus adjusted close) for a single symbol at a single time step.
///
/// Bars are produced once per symbol per step by a market data source and are
/// never mutated afterwards. Portfolio valuation uses `adj_close`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub adj_close: f64,
}

impl Bar {
    /// Returns true if any price field is NaN (void bar).
    pub fn is_void(&self) -> bool {
        self.open.is_nan()
            || self.high.is_nan()
            || self.low.is_nan()
            || self.close.is_nan()
            || self.adj_close.is_nan()
    }

    /// Why this bar cannot be traded on, or `None` for a usable bar.
    pub fn defect(&self) -> Option<&'static str> {
        let range = self.low..=self.high;
        if self.is_void() {
            Some("price field is NaN")
        } else if self.high < self.low {
            Some("high is below low")
        } else if !range.contains(&self.open) || !range.contains(&self.close) {
            Some("open or close outside the high-low range")
        } else if self.close <= 0.0 || self.adj_close <= 0.0 {
            Some("close must be positive")
        } else if self.volume < 0.0 {
            Some("volume is negative")
        } else {
            None
        }
    }

    /// Read a single numeric field.
    pub fn field(&self, field: BarField) -> f64 {
        match field {
            BarField::Open => self.open,
            BarField::High => self.high,
            BarField::Low => self.low,
            BarField::Close => self.close,
            BarField::Volume => self.volume,
            BarField::AdjClose => self.adj_close,
        }
    }

    /// Copy of this bar re-stamped at a later step (forward fill).
    pub fn carried_to(&self, timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            ..self.clone()
        }
    }
}

/// Numeric bar fields addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarField {
    Open,
    High,
    Low,
    Close,
    Volume,
    AdjClose,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown bar field '{0}' (expected open, high, low, close, volume or adj_close)")]
pub struct UnknownBarField(pub String);

impl FromStr for BarField {
    type Err = UnknownBarField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "high" => Ok(Self::High),
            "low" => Ok(Self::Low),
            "close" => Ok(Self::Close),
            "volume" => Ok(Self::Volume),
            "adj_close" | "adjclose" | "adjusted_close" => Ok(Self::AdjClose),
            other => Err(UnknownBarField(other.to_string())),
        }
    }
}

impl fmt::Display for BarField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Open => "open",
            Self::High => "high",
            Self::Low => "low",
            Self::Close => "close",
            Self::Volume => "volume",
            Self::AdjClose => "adj_close",
        };
        f.write_str(name)
    }
}
