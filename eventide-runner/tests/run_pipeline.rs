//! Config-to-artifacts pipeline tests.
//!
//! Tests:
//! 1. CSV universe with a gap: forward fill, one equity row per timeline step
//! 2. Artifacts on disk match the in-memory report
//! 3. Same config twice gives the same run id and fingerprint
//! 4. Config file errors surface as `RunError::Config`

use std::path::Path;

use eventide_runner::{
    import_summary_json, run_backtest, ConfigError, ConfigOverrides, RunConfig, RunError,
};

fn write_csv(dir: &Path, symbol: &str, rows: &[(&str, f64)]) {
    let mut body = String::from("datetime,open,high,low,close,volume,adj_close\n");
    for (date, close) in rows {
        body.push_str(&format!(
            "{date},{close},{high},{low},{close},1000,{close}\n",
            high = close + 1.0,
            low = close - 1.0
        ));
    }
    std::fs::write(dir.join(format!("{symbol}.csv")), body).unwrap();
}

/// Two symbols; BBB has no bar on 2024-01-03.
fn fixture(dir: &Path) {
    write_csv(
        dir,
        "AAA",
        &[
            ("2024-01-02", 10.0),
            ("2024-01-03", 11.0),
            ("2024-01-04", 12.0),
            ("2024-01-05", 11.5),
        ],
    );
    write_csv(
        dir,
        "BBB",
        &[("2024-01-02", 50.0), ("2024-01-04", 48.0), ("2024-01-05", 49.0)],
    );
}

fn config(data_dir: &Path, output_dir: Option<&Path>) -> RunConfig {
    let mut config = RunConfig::from_toml(&format!(
        r#"
[run]
symbols = ["AAA", "BBB"]
initial_capital = 10000.0

[data]
source = "csv"
dir = "{}"

[portfolio]
sizing = "fixed"
quantity = 10

[execution.fees]
model = "per_share"
rate = 0.01
floor = 1.0
"#,
        data_dir.display().to_string().replace('\\', "/")
    ))
    .unwrap();
    config.apply(&ConfigOverrides {
        output_dir: output_dir.map(Path::to_path_buf),
        ..ConfigOverrides::default()
    });
    config
}

#[test]
fn csv_run_forward_fills_and_exports() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    fixture(data.path());

    let outcome = run_backtest(&config(data.path(), Some(out.path())), None).unwrap();
    let report = &outcome.report;

    assert_eq!(report.counts.markets, 4);
    assert_eq!(report.counts.fills, 2);
    assert_eq!(report.final_positions.get("AAA"), Some(10));
    assert_eq!(report.final_positions.get("BBB"), Some(10));
    // Two fills at the 1.00 floor.
    assert!((report.final_holdings.commission - 2.0).abs() < 1e-9);

    // BBB on 2024-01-03 is valued at the carried-forward 50.0.
    let gap_day = &report.holdings_history[1];
    assert!((gap_day.market_values["BBB"] - 500.0).abs() < 1e-9);
    assert!(gap_day.is_balanced(1e-9));

    let run_dir = outcome.artifacts.clone().unwrap();
    let csv = std::fs::read_to_string(run_dir.join("equity.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "timestamp,cash,commission,AAA,BBB,total,returns,equity_curve,drawdown"
    );
    assert_eq!(lines.len(), 1 + report.holdings_history.len());

    let json = std::fs::read_to_string(run_dir.join("summary.json")).unwrap();
    let summary = import_summary_json(&json).unwrap();
    assert_eq!(summary, outcome.summary);
    assert_eq!(summary.counts, report.counts);
}

#[test]
fn identical_configs_replay_identically() {
    let data = tempfile::tempdir().unwrap();
    fixture(data.path());
    let config = config(data.path(), None);

    let a = run_backtest(&config, None).unwrap();
    let b = run_backtest(&config, None).unwrap();
    assert_eq!(a.summary.run_id, b.summary.run_id);
    assert_eq!(
        a.report.equity_curve.fingerprint(),
        b.report.equity_curve.fingerprint()
    );
    assert!(a.artifacts.is_none());
}

#[test]
fn start_timestamp_drops_earlier_bars() {
    let data = tempfile::tempdir().unwrap();
    fixture(data.path());
    let mut config = config(data.path(), None);
    config.run.start = Some("2024-01-04".into());

    let outcome = run_backtest(&config, None).unwrap();
    assert_eq!(outcome.report.counts.markets, 2);
}

#[test]
fn missing_symbol_file_fails_before_the_loop() {
    let data = tempfile::tempdir().unwrap();
    fixture(data.path());
    let mut config = config(data.path(), None);
    config.run.symbols.push("CCC".into());

    let err = run_backtest(&config, None).unwrap_err();
    assert!(matches!(err, RunError::Composition(_)));
    assert!(err.counts().is_none());
}

#[test]
fn unreadable_config_file() {
    let err = RunConfig::from_file(Path::new("/no/such/config.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[run\nsymbols = ").unwrap();
    assert!(matches!(
        RunConfig::from_file(&path),
        Err(ConfigError::Parse(_))
    ));
}
