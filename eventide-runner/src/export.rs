//! Artifact export: equity curve CSV, summary JSON, and a plain-text report.
//!
//! Persisted summaries carry a `schema_version`. Unknown versions are
//! rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use eventide_core::portfolio::EquityCurve;

use crate::runner::{RunSummary, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_summary_json(summary: &RunSummary) -> Result<String> {
    serde_json::to_string_pretty(summary).context("failed to serialize run summary to JSON")
}

/// Deserialize a run summary, rejecting unknown schema versions.
pub fn import_summary_json(json: &str) -> Result<RunSummary> {
    let summary: RunSummary =
        serde_json::from_str(json).context("failed to deserialize run summary from JSON")?;
    if summary.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            summary.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(summary)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the equity curve, one row per snapshot.
///
/// Columns: timestamp, cash, commission, one market-value column per symbol,
/// total, returns, equity_curve, drawdown. An undefined return is an empty
/// cell.
pub fn export_equity_csv(curve: &EquityCurve) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["timestamp", "cash", "commission"];
    header.extend(curve.symbols().iter().map(String::as_str));
    header.extend(["total", "returns", "equity_curve", "drawdown"]);
    wtr.write_record(&header)?;

    for row in curve.rows() {
        let mut record = vec![
            row.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            format!("{:.6}", row.cash),
            format!("{:.6}", row.commission),
        ];
        record.extend(curve.symbols().iter().map(|symbol| {
            format!("{:.6}", row.market_values.get(symbol).copied().unwrap_or(0.0))
        }));
        record.push(format!("{:.6}", row.total));
        record.push(if row.returns.is_nan() {
            String::new()
        } else {
            format!("{:.10}", row.returns)
        });
        record.push(format!("{:.10}", row.equity));
        record.push(format!("{:.10}", row.drawdown));
        wtr.write_record(&record)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the artifact set for one run.
///
/// Creates `run_<id prefix>/` under `output_dir` containing:
/// - `summary.json`: run id, statistics and event counts
/// - `equity.csv`: the per-step equity curve
///
/// Returns the path to the created directory.
pub fn save_artifacts(summary: &RunSummary, curve: &EquityCurve, output_dir: &Path) -> Result<PathBuf> {
    let prefix = summary.run_id.get(..12).unwrap_or(&summary.run_id);
    let run_dir = output_dir.join(format!("run_{prefix}"));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = export_summary_json(summary)?;
    let summary_path = run_dir.join("summary.json");
    std::fs::write(&summary_path, json)
        .with_context(|| format!("failed to write {}", summary_path.display()))?;

    let csv = export_equity_csv(curve)?;
    let equity_path = run_dir.join("equity.csv");
    std::fs::write(&equity_path, csv)
        .with_context(|| format!("failed to write {}", equity_path.display()))?;

    Ok(run_dir)
}

/// Load a run summary from an artifact directory.
pub fn load_summary(dir: &Path) -> Result<RunSummary> {
    let path = dir.join("summary.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_summary_json(&json)
}

// ─── Text report ────────────────────────────────────────────────────

/// Human-readable report: statistics, the last `tail` equity rows, and counts.
pub fn generate_report(summary: &RunSummary, curve: &EquityCurve, tail: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!("Run {}\n", summary.run_id));
    out.push_str(&format!("Symbols {}\n\n", summary.symbols.join(", ")));
    out.push_str(&summary.statistics.to_string());
    out.push_str("\n\n");

    let start = curve.len().saturating_sub(tail);
    if start < curve.len() {
        out.push_str(&format!(
            "{:<20} {:>14} {:>10} {:>10}\n",
            "timestamp", "total", "equity", "drawdown"
        ));
        for row in &curve.rows()[start..] {
            out.push_str(&format!(
                "{:<20} {:>14.2} {:>10.4} {:>10.4}\n",
                row.timestamp.format("%Y-%m-%d %H:%M:%S"),
                row.total,
                row.equity,
                row.drawdown
            ));
        }
        out.push('\n');
    }

    out.push_str(&format!("Events: {}\n", summary.counts));
    out
}
