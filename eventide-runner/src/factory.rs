//! Factory functions: turn configuration sections into collaborator trait objects.
//!
//! Four factories (`create_data_source`, `create_strategy`, `create_execution`,
//! `create_sizing`) plus `create_backtest`, which wires all four into a driver.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use eventide_core::data::{
    DataError, HistoricCsvDataSource, MarketDataSource, SyntheticConfig, SyntheticDataSource,
};
use eventide_core::execution::{
    ExecutionHandler, FeeSchedule, PerShareFees, SimulatedExecutionHandler, ZeroFees,
};
use eventide_core::portfolio::{FixedQuantitySizing, SizingPolicy};
use eventide_core::strategy::{
    BuyAndHoldStrategy, MovingAverageCrossStrategy, Strategy, StrategyError,
};
use eventide_core::{Backtest, BacktestError, ConfigurationError};
use thiserror::Error;

use crate::config::{
    DataConfig, ExecutionConfig, FeesConfig, PortfolioConfig, RunConfig, StrategyConfig,
};

// ─── Error type ──────────────────────────────────────────────────────

/// Errors that can occur while constructing collaborators.
#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("data source: {0}")]
    Data(#[from] DataError),
    #[error("strategy: {0}")]
    Strategy(#[from] StrategyError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Backtest(#[from] BacktestError),
}

// ─── Data source factory ─────────────────────────────────────────────

/// Load or generate bars for the configured universe.
pub fn create_data_source(config: &RunConfig) -> Result<Box<dyn MarketDataSource>, FactoryError> {
    let symbols = config.run.symbols.clone();
    let start = config.start()?;
    match &config.data {
        DataConfig::Csv { dir } => Ok(Box::new(HistoricCsvDataSource::open(
            dir.clone(),
            symbols,
            start,
        )?)),
        DataConfig::Synthetic {
            bars,
            seed,
            start_price,
        } => {
            let mut synthetic = SyntheticConfig {
                bars: *bars,
                seed: *seed,
                ..SyntheticConfig::default()
            };
            if let Some(price) = start_price {
                synthetic.start_price = *price;
            }
            Ok(Box::new(SyntheticDataSource::generate(
                symbols, synthetic, start,
            )?))
        }
    }
}

// ─── Strategy factory ────────────────────────────────────────────────

pub fn create_strategy(config: &StrategyConfig) -> Result<Box<dyn Strategy>, FactoryError> {
    match *config {
        StrategyConfig::BuyAndHold => Ok(Box::new(BuyAndHoldStrategy::new())),
        StrategyConfig::MaCross {
            short_window,
            long_window,
        } => Ok(Box::new(MovingAverageCrossStrategy::new(
            short_window,
            long_window,
        )?)),
    }
}

// ─── Execution factory ───────────────────────────────────────────────

pub fn create_fees(config: &FeesConfig) -> Box<dyn FeeSchedule> {
    match config {
        FeesConfig::Zero => Box::new(ZeroFees),
        FeesConfig::PerShare { rate, floor } => Box::new(PerShareFees {
            rate: *rate,
            floor: *floor,
        }),
        FeesConfig::Tiered { .. } => match config.tiered() {
            Some(fees) => Box::new(fees),
            None => Box::new(ZeroFees),
        },
    }
}

pub fn create_execution(config: &ExecutionConfig) -> Box<dyn ExecutionHandler> {
    Box::new(
        SimulatedExecutionHandler::new(config.venue.clone(), create_fees(&config.fees))
            .with_slippage_bps(config.slippage_bps),
    )
}

// ─── Sizing factory ──────────────────────────────────────────────────

pub fn create_sizing(config: &PortfolioConfig) -> Result<Box<dyn SizingPolicy>, FactoryError> {
    match *config {
        PortfolioConfig::Fixed { quantity } => FixedQuantitySizing::new(quantity)
            .map(|sizing| Box::new(sizing) as Box<dyn SizingPolicy>)
            .ok_or(FactoryError::Configuration(ConfigurationError::ZeroQuantity)),
    }
}

// ─── Composition ─────────────────────────────────────────────────────

/// Validate `config` and compose a ready-to-run backtest.
pub fn create_backtest(
    config: &RunConfig,
    cancel: Option<Arc<AtomicBool>>,
) -> Result<Backtest, FactoryError> {
    config.validate()?;
    let mut builder = Backtest::builder()
        .boxed_data_source(create_data_source(config)?)
        .boxed_strategy(create_strategy(&config.strategy)?)
        .boxed_execution(create_execution(&config.execution))
        .boxed_sizing(create_sizing(&config.portfolio)?)
        .config(config.backtest_config()?);
    if let Some(flag) = cancel {
        builder = builder.cancel_flag(flag);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventide_core::execution::TieredFees;

    fn synthetic_config() -> RunConfig {
        RunConfig::from_toml(
            r#"
[run]
symbols = ["AAA", "BBB"]

[data]
source = "synthetic"
bars = 30
seed = 3
"#,
        )
        .unwrap()
    }

    #[test]
    fn synthetic_source_covers_universe() {
        let data = create_data_source(&synthetic_config()).unwrap();
        assert_eq!(data.symbols(), ["AAA", "BBB"]);
        assert!(data.current_time().is_none());
    }

    #[test]
    fn missing_csv_directory_is_a_data_error() {
        let mut config = synthetic_config();
        config.data = DataConfig::Csv {
            dir: "/definitely/not/here".into(),
        };
        assert!(matches!(
            create_data_source(&config),
            Err(FactoryError::Data(_))
        ));
    }

    #[test]
    fn strategy_factory_checks_windows() {
        assert_eq!(
            create_strategy(&StrategyConfig::BuyAndHold).unwrap().id(),
            "BUY_AND_HOLD"
        );
        let strategy = create_strategy(&StrategyConfig::MaCross {
            short_window: 5,
            long_window: 20,
        })
        .unwrap();
        assert_eq!(strategy.id(), "MAC");
        assert!(create_strategy(&StrategyConfig::MaCross {
            short_window: 20,
            long_window: 5,
        })
        .is_err());
    }

    #[test]
    fn fee_factory() {
        assert_eq!(create_fees(&FeesConfig::Zero).commission(100, 10.0), 0.0);
        let per_share = create_fees(&FeesConfig::PerShare {
            rate: 0.01,
            floor: 2.0,
        });
        assert_eq!(per_share.commission(10, 10.0), 2.0);
        let tiered = create_fees(&FeesConfig::Tiered {
            share_threshold: None,
            small_order_rate: None,
            large_order_rate: None,
            floor: None,
        });
        assert_eq!(
            tiered.commission(1_000, 10.0),
            TieredFees::default().commission(1_000, 10.0)
        );
    }

    #[test]
    fn execution_factory_uses_venue() {
        let execution = create_execution(&ExecutionConfig {
            venue: "PAPER".into(),
            ..ExecutionConfig::default()
        });
        assert_eq!(execution.venue(), "PAPER");
    }

    #[test]
    fn zero_quantity_sizing_is_rejected() {
        assert!(matches!(
            create_sizing(&PortfolioConfig::Fixed { quantity: 0 }),
            Err(FactoryError::Configuration(ConfigurationError::ZeroQuantity))
        ));
        assert_eq!(
            create_sizing(&PortfolioConfig::default()).unwrap().name(),
            "fixed"
        );
    }

    #[test]
    fn backtest_composes_and_runs() {
        let report = create_backtest(&synthetic_config(), None)
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(report.counts.markets, 30);
        assert_eq!(report.counts.fills, 2);
    }

    #[test]
    fn invalid_config_never_builds() {
        let mut config = synthetic_config();
        config.run.initial_capital = -1.0;
        assert!(matches!(
            create_backtest(&config, None),
            Err(FactoryError::Configuration(
                ConfigurationError::NonPositiveCapital(_)
            ))
        ));
    }
}
