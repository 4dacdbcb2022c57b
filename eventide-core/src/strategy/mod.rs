//! Strategies: turn Market events into Signal events.
//!
//! A strategy sees the data source and the queue, nothing else. It has no
//! handle on the portfolio, so it cannot change positions or cash.

pub mod buy_and_hold;
pub mod ma_cross;

pub use buy_and_hold::BuyAndHoldStrategy;
pub use ma_cross::MovingAverageCrossStrategy;

use crate::data::{DataError, MarketDataSource};
use crate::domain::MarketEvent;
use crate::queue::EventQueue;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("invalid strategy parameter: {0}")]
    InvalidParameter(String),

    #[error("data lookup failed: {0}")]
    Data(#[from] DataError),

    #[error("strategy failed: {0}")]
    Failed(String),
}

/// Signal generator invoked once per Market event.
pub trait Strategy: Send {
    /// Identifier stamped on every emitted signal.
    fn id(&self) -> &str;

    /// Inspect the bars visible at `market` and push zero or more Signal events.
    fn calculate_signals(
        &mut self,
        market: &MarketEvent,
        data: &dyn MarketDataSource,
        queue: &mut EventQueue,
    ) -> Result<(), StrategyError>;
}
