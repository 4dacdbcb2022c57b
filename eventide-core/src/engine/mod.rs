//! Backtest engine: the event-dispatch loop and its bookkeeping.

pub mod driver;
pub mod ledger;
pub mod state;

pub use driver::{Backtest, BacktestBuilder, DEFAULT_ORDER_QUANTITY};
pub use ledger::OrderLedger;
pub use state::{BacktestConfig, BacktestReport, EventCounts, DEFAULT_FILL_TIMEOUT};
