//! Equity curve and summary statistics built from the holdings history.

use crate::domain::HoldingsSnapshot;
use crate::risk::{self, Drawdowns, Period};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One row of the exported time series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityRow {
    pub timestamp: NaiveDateTime,
    pub cash: f64,
    pub commission: f64,
    pub market_values: BTreeMap<String, f64>,
    pub total: f64,
    /// Simple return versus the previous row. NaN on the first row.
    pub returns: f64,
    /// Running product of `1 + returns`, starting at 1.0.
    pub equity: f64,
    pub drawdown: f64,
}

/// Finalized, read-only equity history of a run.
#[derive(Debug, Clone, Serialize)]
pub struct EquityCurve {
    symbols: Vec<String>,
    rows: Vec<EquityRow>,
    drawdowns: Drawdowns,
}

impl EquityCurve {
    /// Build the curve from per-step holdings snapshots.
    ///
    /// A return is undefined (NaN) on the first row and whenever the previous
    /// total is zero; undefined returns carry cumulative equity forward.
    ///
    /// A step with a zero total therefore ends the compounding: cumulative
    /// equity is 0 from there on and `total_return` stays at -100% even if
    /// later totals recover. Returns resume as soon as two consecutive totals
    /// are non-zero, but they multiply a zero baseline.
    pub fn from_holdings(symbols: &[String], history: &[HoldingsSnapshot]) -> Self {
        let mut equity = Vec::with_capacity(history.len());
        let mut returns = Vec::with_capacity(history.len());
        let mut previous: Option<f64> = None;
        let mut cumulative = 1.0;

        for snapshot in history {
            let r = match previous {
                Some(prev) if prev != 0.0 => snapshot.total / prev - 1.0,
                _ => f64::NAN,
            };
            if !r.is_nan() {
                cumulative *= 1.0 + r;
            }
            returns.push(r);
            equity.push(cumulative);
            previous = Some(snapshot.total);
        }

        let drawdowns = risk::drawdowns(&equity);
        let rows = history
            .iter()
            .zip(returns)
            .zip(equity)
            .zip(&drawdowns.series)
            .map(|(((snapshot, returns), equity), &drawdown)| EquityRow {
                timestamp: snapshot.timestamp,
                cash: snapshot.cash,
                commission: snapshot.commission,
                market_values: snapshot.market_values.clone(),
                total: snapshot.total,
                returns,
                equity,
                drawdown,
            })
            .collect();

        Self {
            symbols: symbols.to_vec(),
            rows,
            drawdowns,
        }
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn rows(&self) -> &[EquityRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn returns(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.returns).collect()
    }

    pub fn totals(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.total).collect()
    }

    pub fn drawdowns(&self) -> &Drawdowns {
        &self.drawdowns
    }

    /// Cumulative equity on the last row, 1.0 for an empty curve.
    pub fn final_equity(&self) -> f64 {
        self.rows.last().map_or(1.0, |r| r.equity)
    }

    /// Statistics over the whole curve.
    pub fn summary(&self, period: Period) -> SummaryStatistics {
        let sharpe = match risk::sharpe_ratio(&self.returns(), period) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::debug!(%err, "Sharpe ratio unavailable");
                None
            }
        };
        SummaryStatistics {
            total_return: self.final_equity() - 1.0,
            sharpe_ratio: sharpe,
            max_drawdown: self.drawdowns.max_drawdown,
            drawdown_duration: self.drawdowns.max_duration,
            period,
        }
    }

    /// Deterministic BLAKE3 hash of the timestamps and totals, hex encoded.
    ///
    /// Two runs over the same bars with the same collaborators must produce
    /// the same fingerprint.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for row in &self.rows {
            hasher.update(row.timestamp.to_string().as_bytes());
            hasher.update(&row.total.to_le_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}

/// Headline statistics of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    /// Final cumulative equity minus one.
    pub total_return: f64,
    /// `None` when the return series is too short or has no variance.
    pub sharpe_ratio: Option<f64>,
    pub max_drawdown: f64,
    /// Longest stretch, in steps, spent below the high-water mark.
    pub drawdown_duration: usize,
    pub period: Period,
}

impl fmt::Display for SummaryStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Return {:.2}%", self.total_return * 100.0)?;
        match self.sharpe_ratio {
            Some(sharpe) => writeln!(f, "Sharpe Ratio {sharpe:.2}")?,
            None => writeln!(f, "Sharpe Ratio n/a")?,
        }
        writeln!(f, "Max Drawdown {:.2}%", self.max_drawdown * 100.0)?;
        write!(f, "Drawdown Duration {}", self.drawdown_duration)
    }
}
