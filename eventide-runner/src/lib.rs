//! Eventide Runner: run configuration, collaborator wiring, artifacts.
//!
//! This crate builds on `eventide-core` to provide:
//! - A TOML run configuration with validation and a content-addressed run id
//! - Factories that turn configuration sections into collaborators
//! - Single-run orchestration
//! - Equity curve CSV and summary JSON export

pub mod config;
pub mod export;
pub mod factory;
pub mod runner;

pub use config::{
    ConfigError, ConfigOverrides, DataConfig, ExecutionConfig, FeesConfig, OutputConfig,
    PortfolioConfig, RunConfig, RunId, RunSection, StrategyConfig,
};
pub use export::{
    export_equity_csv, export_summary_json, generate_report, import_summary_json, load_summary,
    save_artifacts,
};
pub use factory::{create_backtest, FactoryError};
pub use runner::{run_backtest, RunError, RunOutcome, RunSummary, SCHEMA_VERSION};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
        assert_send::<ConfigOverrides>();
        assert_sync::<ConfigOverrides>();
    }

    #[test]
    fn run_outcome_is_send_sync() {
        assert_send::<RunOutcome>();
        assert_sync::<RunOutcome>();
        assert_send::<RunSummary>();
        assert_sync::<RunSummary>();
    }

    #[test]
    fn run_error_is_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
    }
}
