//! Driver configuration, event counters, and run result types.

use crate::domain::{CurrentHoldings, HoldingsSnapshot, PositionMap, PositionsSnapshot};
use crate::portfolio::{EquityCurve, SummaryStatistics};
use crate::risk::Period;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default time to wait for outstanding fills from an asynchronous backend.
pub const DEFAULT_FILL_TIMEOUT: Duration = Duration::from_secs(30);

/// Non-collaborator settings of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    /// Pause between steps. Zero runs as fast as possible.
    pub heartbeat: Duration,
    /// How long the drain phase waits for remote fills while orders are outstanding.
    pub fill_timeout: Duration,
    /// Annualization period for the summary statistics.
    pub period: Period,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            heartbeat: Duration::ZERO,
            fill_timeout: DEFAULT_FILL_TIMEOUT,
            period: Period::Day,
        }
    }
}

/// Events processed by the driver, by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCounts {
    pub markets: usize,
    pub signals: usize,
    pub orders: usize,
    pub fills: usize,
    /// Orders the execution backend refused.
    pub rejected: usize,
}

impl fmt::Display for EventCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} markets, {} signals, {} orders, {} fills, {} rejected",
            self.markets, self.signals, self.orders, self.fills, self.rejected
        )
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct BacktestReport {
    pub counts: EventCounts,
    pub equity_curve: EquityCurve,
    pub summary: SummaryStatistics,
    pub positions_history: Vec<PositionsSnapshot>,
    pub holdings_history: Vec<HoldingsSnapshot>,
    pub final_positions: PositionMap,
    pub final_holdings: CurrentHoldings,
}
