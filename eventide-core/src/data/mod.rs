//! Market data sources.
//!
//! A [`MarketDataSource`] replays bars one step at a time. Each successful
//! [`advance_step`](MarketDataSource::advance_step) makes one new bar visible
//! for every symbol and pushes exactly one Market event. Timestamps never go
//! backwards.

pub mod align;
pub mod csv;
pub mod memory;
pub mod synthetic;

pub use self::csv::{parse_timestamp, HistoricCsvDataSource};
pub use align::{align_forward_filled, AlignedBars, AlignedSeries};
pub use memory::InMemoryDataSource;
pub use synthetic::{SyntheticConfig, SyntheticDataSource};

use crate::domain::{Bar, BarField};
use crate::queue::EventQueue;
use chrono::NaiveDateTime;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by data sources.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("symbol '{0}' is not in the configured universe")]
    UnknownSymbol(String),

    #[error("no bar available yet for '{symbol}'")]
    NoData { symbol: String },

    #[error("symbol universe is empty")]
    EmptyUniverse,

    #[error("no bars for '{symbol}' on or after the start timestamp")]
    EmptySeries { symbol: String },

    #[error("invalid bar for '{symbol}' at {timestamp}: {reason}")]
    InvalidBar {
        symbol: String,
        timestamp: NaiveDateTime,
        reason: String,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: ::csv::Error,
    },

    #[error("{}:{line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error("invalid synthetic data parameter: {0}")]
    InvalidParameter(String),
}

impl DataError {
    /// True when the error means a caller asked about a symbol outside the universe.
    pub fn is_unknown_symbol(&self) -> bool {
        matches!(self, Self::UnknownSymbol(_))
    }
}

/// Bar-by-bar market data replay.
///
/// Lookups only ever see bars up to and including the current step, so a
/// strategy cannot peek ahead.
pub trait MarketDataSource: Send {
    /// The configured symbol universe, in a stable order.
    fn symbols(&self) -> &[String];

    /// Timestamp of the current step, `None` before the first step.
    fn current_time(&self) -> Option<NaiveDateTime>;

    /// Make the next bar visible for every symbol and push one Market event.
    ///
    /// Returns `Ok(false)` once the data is exhausted; nothing is pushed then.
    fn advance_step(&mut self, queue: &mut EventQueue) -> Result<bool, DataError>;

    /// Most recent bar for `symbol`.
    fn latest_bar(&self, symbol: &str) -> Result<&Bar, DataError>;

    /// Up to `n` most recent bars, oldest first. Shorter if fewer are available.
    fn latest_bars(&self, symbol: &str, n: usize) -> Result<&[Bar], DataError>;

    fn latest_field(&self, symbol: &str, field: BarField) -> Result<f64, DataError> {
        Ok(self.latest_bar(symbol)?.field(field))
    }

    /// Last `n` values of `field`, most recent last.
    fn latest_values(&self, symbol: &str, field: BarField, n: usize) -> Result<Vec<f64>, DataError> {
        Ok(self
            .latest_bars(symbol, n)?
            .iter()
            .map(|bar| bar.field(field))
            .collect())
    }

    fn latest_timestamp(&self, symbol: &str) -> Result<NaiveDateTime, DataError> {
        Ok(self.latest_bar(symbol)?.timestamp)
    }
}
