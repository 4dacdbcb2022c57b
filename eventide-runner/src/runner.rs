//! Single-run orchestration: config in, report and artifacts out.

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, info_span};

use eventide_core::{BacktestError, BacktestReport, EventCounts};
use eventide_core::portfolio::SummaryStatistics;

use crate::config::{ConfigError, RunConfig, RunId};
use crate::export::save_artifacts;
use crate::factory::{create_backtest, FactoryError};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("composition error: {0}")]
    Composition(#[from] FactoryError),
    #[error(transparent)]
    Backtest(#[from] BacktestError),
    #[error(transparent)]
    Export(#[from] anyhow::Error),
}

impl RunError {
    /// Counts at the point of failure, when the loop had started.
    pub fn counts(&self) -> Option<&EventCounts> {
        match self {
            Self::Backtest(err) => err.counts(),
            _ => None,
        }
    }
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Headline numbers of a run, as persisted in `summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub symbols: Vec<String>,
    pub initial_capital: f64,
    pub final_total: f64,
    pub statistics: SummaryStatistics,
    pub counts: EventCounts,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub summary: RunSummary,
    pub report: BacktestReport,
    /// Directory holding `equity.csv` and `summary.json`, if output was requested.
    pub artifacts: Option<PathBuf>,
}

impl RunSummary {
    pub fn new(config: &RunConfig, report: &BacktestReport) -> Self {
        let final_total = report
            .holdings_history
            .last()
            .map_or(config.run.initial_capital, |h| h.total);
        Self {
            schema_version: SCHEMA_VERSION,
            run_id: config.run_id(),
            symbols: config.run.symbols.clone(),
            initial_capital: config.run.initial_capital,
            final_total,
            statistics: report.summary.clone(),
            counts: report.counts,
        }
    }
}

/// Validate, compose and run one backtest, then write artifacts if
/// `[output] dir` is set.
pub fn run_backtest(
    config: &RunConfig,
    cancel: Option<Arc<AtomicBool>>,
) -> Result<RunOutcome, RunError> {
    let run_id = config.run_id();
    let span = info_span!("run", run_id = %&run_id[..12]);
    let _guard = span.enter();

    let backtest = create_backtest(config, cancel)?;
    let report = backtest.run()?;
    let summary = RunSummary::new(config, &report);

    let artifacts = match &config.output.dir {
        Some(dir) => {
            let path = save_artifacts(&summary, &report.equity_curve, dir)?;
            info!(path = %path.display(), "artifacts saved");
            Some(path)
        }
        None => None,
    };

    Ok(RunOutcome {
        summary,
        report,
        artifacts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(extra: &str) -> RunConfig {
        RunConfig::from_toml(&format!(
            r#"
[run]
symbols = ["AAA"]
initial_capital = 10000.0

[data]
source = "synthetic"
bars = 40
seed = 5
{extra}
"#
        ))
        .unwrap()
    }

    #[test]
    fn run_without_output_writes_nothing() {
        let outcome = run_backtest(&config(""), None).unwrap();
        assert!(outcome.artifacts.is_none());
        assert_eq!(outcome.summary.counts.markets, 40);
        assert_eq!(outcome.summary.run_id, config("").run_id());
        assert_eq!(outcome.summary.initial_capital, 10_000.0);
    }

    #[test]
    fn invalid_config_is_a_composition_error() {
        let mut bad = config("");
        bad.run.period = "weekly".into();
        let err = run_backtest(&bad, None).unwrap_err();
        assert!(matches!(err, RunError::Composition(_)));
        assert!(err.counts().is_none());
    }

    #[test]
    fn cancelled_run_reports_counts() {
        let flag = Arc::new(AtomicBool::new(true));
        let err = run_backtest(&config(""), Some(flag)).unwrap_err();
        assert!(matches!(err, RunError::Backtest(_)));
        assert_eq!(err.counts().map(|c| c.markets), Some(0));
    }
}
