//! Holdings: the monetary state of the portfolio.
//!
//! Kept apart from [`PositionMap`](super::PositionMap): positions are share
//! quantities, holdings are money. A snapshot must satisfy
//! `total == cash + sum(market_values)` at the moment it is taken.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Running cash and commission totals, mutated only by fills.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrentHoldings {
    pub cash: f64,
    pub commission: f64,
}

impl CurrentHoldings {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            cash: initial_capital,
            commission: 0.0,
        }
    }
}

/// Per-step valuation record, appended once per Market event and never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingsSnapshot {
    pub timestamp: NaiveDateTime,
    pub cash: f64,
    /// Cumulative commission paid up to this step.
    pub commission: f64,
    /// Market value per symbol: `position * latest adjusted close`.
    pub market_values: BTreeMap<String, f64>,
    pub total: f64,
}

impl HoldingsSnapshot {
    /// Sum of per-symbol market values.
    pub fn positions_value(&self) -> f64 {
        self.market_values.values().sum()
    }

    /// Whether `total` matches `cash + positions_value()` within `tolerance`.
    pub fn is_balanced(&self, tolerance: f64) -> bool {
        (self.total - (self.cash + self.positions_value())).abs() <= tolerance
    }
}
