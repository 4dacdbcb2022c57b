//! Error taxonomy shared by the portfolio and the driver.

use crate::data::DataError;
use crate::domain::{Event, FillEvent, OrderEvent};
use crate::engine::EventCounts;
use crate::execution::ExecutionError;
use crate::portfolio::PortfolioError;
use crate::strategy::StrategyError;
use std::time::Duration;
use thiserror::Error;

/// Invalid settings detected before the loop starts.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("symbol universe is empty")]
    EmptyUniverse,

    #[error("symbol '{0}' appears more than once in the universe")]
    DuplicateSymbol(String),

    #[error("initial capital must be positive, got {0}")]
    NonPositiveCapital(f64),

    #[error("unsupported annualization period '{0}' (expected day, hour or minute)")]
    UnsupportedPeriod(String),

    #[error("fixed order quantity must be at least 1")]
    ZeroQuantity,

    #[error("no {0} configured")]
    MissingComponent(&'static str),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// A collaborator broke its side of the pipeline contract.
#[derive(Debug, Error)]
pub enum ContractViolation {
    #[error("symbol '{0}' is outside the configured universe")]
    UnknownSymbol(String),

    #[error("fill has no matching outstanding order: {0}")]
    UnmatchedFill(FillEvent),

    #[error("rejected order was not outstanding: {0}")]
    UntrackedRejection(OrderEvent),

    #[error("fill would overflow the position: {0}")]
    PositionOverflow(FillEvent),

    #[error("{outstanding} order(s) still awaiting fills after {waited:?}")]
    MissingFill { outstanding: usize, waited: Duration },

    #[error("data source pushed {0} market events for one step (expected exactly 1)")]
    MarketEventCount(usize),

    #[error("market event timestamp went backwards: {previous} then {current}")]
    TimestampRegression {
        previous: chrono::NaiveDateTime,
        current: chrono::NaiveDateTime,
    },
}

/// Why a run stopped early.
#[derive(Debug, Error)]
pub enum AbortCause {
    #[error(transparent)]
    Contract(#[from] ContractViolation),

    #[error("data source: {0}")]
    Data(#[source] DataError),

    #[error("strategy: {0}")]
    Strategy(#[source] StrategyError),

    #[error("execution backend: {0}")]
    Execution(#[source] ExecutionError),

    #[error("portfolio: {0}")]
    Portfolio(#[source] PortfolioError),

    #[error("run cancelled")]
    Cancelled,
}

impl From<DataError> for AbortCause {
    fn from(err: DataError) -> Self {
        match err {
            DataError::UnknownSymbol(symbol) => ContractViolation::UnknownSymbol(symbol).into(),
            other => Self::Data(other),
        }
    }
}

impl From<StrategyError> for AbortCause {
    fn from(err: StrategyError) -> Self {
        match err {
            StrategyError::Data(data) => data.into(),
            other => Self::Strategy(other),
        }
    }
}

impl From<ExecutionError> for AbortCause {
    fn from(err: ExecutionError) -> Self {
        match err {
            ExecutionError::Data(data) => data.into(),
            other => Self::Execution(other),
        }
    }
}

impl From<PortfolioError> for AbortCause {
    fn from(err: PortfolioError) -> Self {
        match err {
            PortfolioError::UnknownSymbol(symbol) => ContractViolation::UnknownSymbol(symbol).into(),
            PortfolioError::Data(data) => data.into(),
            PortfolioError::PositionOverflow(fill) => ContractViolation::PositionOverflow(fill).into(),
            other => Self::Portfolio(other),
        }
    }
}

/// Error returned by a backtest run.
#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The loop stopped on a fatal condition. Carries the event being
    /// handled, if any, and the counts accumulated so far.
    #[error("backtest aborted after {counts}{}: {cause}", handling(.event))]
    Aborted {
        event: Option<Box<Event>>,
        counts: EventCounts,
        #[source]
        cause: AbortCause,
    },
}

fn handling(event: &Option<Box<Event>>) -> String {
    event
        .as_ref()
        .map(|e| format!(" while handling {e}"))
        .unwrap_or_default()
}

impl BacktestError {
    pub fn counts(&self) -> Option<&EventCounts> {
        match self {
            Self::Aborted { counts, .. } => Some(counts),
            Self::Configuration(_) => None,
        }
    }

    pub fn event(&self) -> Option<&Event> {
        match self {
            Self::Aborted { event, .. } => event.as_deref(),
            Self::Configuration(_) => None,
        }
    }

    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::Aborted {
                cause: AbortCause::Contract(_),
                ..
            }
        )
    }
}
