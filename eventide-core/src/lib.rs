//! Eventide Core: event model, queue, portfolio state machine, risk metrics, backtest driver.
//!
//! This crate contains the heart of the event-driven backtester:
//! - Domain types (bars, the four event kinds, positions, holdings)
//! - A single FIFO event queue, with a thread-safe sender for async producers
//! - Collaborator contracts: market data source, strategy, execution backend, sizing policy
//! - The portfolio state machine and its equity curve
//! - Pure risk functions (Sharpe ratio, drawdown and duration)
//! - The driver that advances one bar at a time and drains the queue between bars

pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod execution;
pub mod portfolio;
pub mod queue;
pub mod risk;
pub mod strategy;

pub use engine::{Backtest, BacktestBuilder, BacktestConfig, BacktestReport, EventCounts};
pub use error::{AbortCause, BacktestError, ConfigurationError, ContractViolation};
pub use queue::{EventQueue, EventSender};
