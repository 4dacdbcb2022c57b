//! The backtest driver: one FIFO queue, strict two-phase steps.
//!
//! Each step:
//! 1. Ask the data source to advance. Exhaustion ends the run.
//! 2. Drain the queue, routing every event to exactly one handler, until it
//!    is empty and no order is waiting for a fill.
//!
//! Routing:
//! - Market: `Strategy::calculate_signals`, then `Portfolio::update_time_index`
//! - Signal: `Portfolio::update_signal`
//! - Order: `ExecutionHandler::execute_order`
//! - Fill: `Portfolio::update_fill`

use super::ledger::OrderLedger;
use super::state::{BacktestConfig, BacktestReport, EventCounts};
use crate::data::MarketDataSource;
use crate::domain::{Event, MarketEvent};
use crate::error::{AbortCause, BacktestError, ConfigurationError, ContractViolation};
use crate::execution::{ExecutionError, ExecutionHandler, SimulatedExecutionHandler};
use crate::portfolio::{FixedQuantitySizing, Portfolio, PortfolioError, SizingPolicy};
use crate::queue::{EventQueue, EventSender};
use crate::risk::Period;
use crate::strategy::Strategy;
use chrono::NaiveDateTime;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, info_span, warn};

/// Order size used when no sizing policy is configured.
pub const DEFAULT_ORDER_QUANTITY: u64 = 100;

/// Composes the collaborators of a run.
///
/// The data source and strategy are required. Execution defaults to
/// [`SimulatedExecutionHandler::default`], sizing to a fixed quantity of
/// [`DEFAULT_ORDER_QUANTITY`].
#[derive(Default)]
pub struct BacktestBuilder {
    data: Option<Box<dyn MarketDataSource>>,
    strategy: Option<Box<dyn Strategy>>,
    execution: Option<Box<dyn ExecutionHandler>>,
    sizing: Option<Box<dyn SizingPolicy>>,
    config: BacktestConfig,
    cancel: Option<Arc<AtomicBool>>,
}

impl BacktestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data_source(mut self, data: impl MarketDataSource + 'static) -> Self {
        self.data = Some(Box::new(data));
        self
    }

    pub fn boxed_data_source(mut self, data: Box<dyn MarketDataSource>) -> Self {
        self.data = Some(data);
        self
    }

    pub fn strategy(mut self, strategy: impl Strategy + 'static) -> Self {
        self.strategy = Some(Box::new(strategy));
        self
    }

    pub fn boxed_strategy(mut self, strategy: Box<dyn Strategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn execution(mut self, execution: impl ExecutionHandler + 'static) -> Self {
        self.execution = Some(Box::new(execution));
        self
    }

    pub fn boxed_execution(mut self, execution: Box<dyn ExecutionHandler>) -> Self {
        self.execution = Some(execution);
        self
    }

    pub fn sizing(mut self, sizing: impl SizingPolicy + 'static) -> Self {
        self.sizing = Some(Box::new(sizing));
        self
    }

    pub fn boxed_sizing(mut self, sizing: Box<dyn SizingPolicy>) -> Self {
        self.sizing = Some(sizing);
        self
    }

    pub fn config(mut self, config: BacktestConfig) -> Self {
        self.config = config;
        self
    }

    pub fn initial_capital(mut self, capital: f64) -> Self {
        self.config.initial_capital = capital;
        self
    }

    pub fn heartbeat(mut self, heartbeat: Duration) -> Self {
        self.config.heartbeat = heartbeat;
        self
    }

    pub fn fill_timeout(mut self, timeout: Duration) -> Self {
        self.config.fill_timeout = timeout;
        self
    }

    pub fn period(mut self, period: Period) -> Self {
        self.config.period = period;
        self
    }

    /// Flag checked between steps; setting it stops the run with
    /// [`AbortCause::Cancelled`].
    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn build(self) -> Result<Backtest, BacktestError> {
        let data = self
            .data
            .ok_or(ConfigurationError::MissingComponent("data source"))?;
        let strategy = self
            .strategy
            .ok_or(ConfigurationError::MissingComponent("strategy"))?;
        let execution = self
            .execution
            .unwrap_or_else(|| Box::new(SimulatedExecutionHandler::default()));
        let sizing = match self.sizing {
            Some(sizing) => sizing,
            None => Box::new(
                FixedQuantitySizing::new(DEFAULT_ORDER_QUANTITY)
                    .ok_or(ConfigurationError::ZeroQuantity)?,
            ),
        };

        let portfolio = Portfolio::new(data.symbols().to_vec(), self.config.initial_capital, sizing)
            .map_err(|err| match err {
                PortfolioError::Configuration(config) => BacktestError::Configuration(config),
                other => BacktestError::Configuration(ConfigurationError::InvalidParameter(
                    other.to_string(),
                )),
            })?;

        Ok(Backtest {
            data,
            strategy,
            execution,
            portfolio,
            queue: EventQueue::new(),
            ledger: OrderLedger::new(),
            counts: EventCounts::default(),
            last_timestamp: None,
            config: self.config,
            cancel: self.cancel,
        })
    }
}

/// A composed, runnable backtest.
pub struct Backtest {
    data: Box<dyn MarketDataSource>,
    strategy: Box<dyn Strategy>,
    execution: Box<dyn ExecutionHandler>,
    portfolio: Portfolio,
    queue: EventQueue,
    ledger: OrderLedger,
    counts: EventCounts,
    last_timestamp: Option<NaiveDateTime>,
    config: BacktestConfig,
    cancel: Option<Arc<AtomicBool>>,
}

impl Backtest {
    pub fn builder() -> BacktestBuilder {
        BacktestBuilder::new()
    }

    /// Handle for producers that deliver events from other threads.
    pub fn event_sender(&self) -> EventSender {
        self.queue.sender()
    }

    pub fn counts(&self) -> EventCounts {
        self.counts
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Run to data exhaustion and compute the summary statistics once.
    pub fn run(mut self) -> Result<BacktestReport, BacktestError> {
        let span = info_span!(
            "backtest",
            symbols = ?self.portfolio.symbols(),
            capital = self.config.initial_capital
        );
        let _guard = span.enter();
        info!(
            strategy = self.strategy.id(),
            venue = self.execution.venue(),
            sizing = self.portfolio.sizing().name(),
            "starting backtest"
        );

        loop {
            if self.is_cancelled() {
                return Err(self.abort(None, AbortCause::Cancelled));
            }
            if !self.step()? {
                break;
            }
            if !self.config.heartbeat.is_zero() {
                std::thread::sleep(self.config.heartbeat);
            }
        }

        info!(counts = %self.counts, "backtest complete");
        Ok(self.into_report())
    }

    /// Admit one bar and drain everything it causes.
    ///
    /// Returns `Ok(false)` once the data source is exhausted.
    pub fn step(&mut self) -> Result<bool, BacktestError> {
        match self.data.advance_step(&mut self.queue) {
            Ok(true) => {}
            Ok(false) => return Ok(false),
            Err(err) => return Err(self.abort(None, err.into())),
        }
        self.drain()?;
        Ok(true)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn drain(&mut self) -> Result<(), BacktestError> {
        let mut markets = 0usize;
        loop {
            while let Some(event) = self.queue.pop() {
                if matches!(event, Event::Market(_)) {
                    markets += 1;
                    if markets > 1 {
                        let cause = ContractViolation::MarketEventCount(markets).into();
                        return Err(self.abort(Some(&event), cause));
                    }
                }
                if let Err(cause) = self.dispatch(&event) {
                    return Err(self.abort(Some(&event), cause));
                }
            }

            if self.ledger.is_empty() {
                break;
            }
            debug!(outstanding = self.ledger.len(), "waiting for remote fills");
            if !self.queue.wait_remote(self.config.fill_timeout) {
                let cause = ContractViolation::MissingFill {
                    outstanding: self.ledger.len(),
                    waited: self.config.fill_timeout,
                }
                .into();
                return Err(self.abort(None, cause));
            }
        }

        if markets != 1 {
            let cause = ContractViolation::MarketEventCount(markets).into();
            return Err(self.abort(None, cause));
        }
        Ok(())
    }

    fn dispatch(&mut self, event: &Event) -> Result<(), AbortCause> {
        debug!(kind = event.kind(), %event, "dispatch");
        match event {
            Event::Market(market) => {
                self.check_timestamp(market)?;
                self.counts.markets += 1;
                self.strategy
                    .calculate_signals(market, self.data.as_ref(), &mut self.queue)?;
                self.portfolio
                    .update_time_index(market, self.data.as_ref())?;
            }
            Event::Signal(signal) => {
                self.counts.signals += 1;
                self.portfolio.update_signal(signal, &mut self.queue)?;
            }
            Event::Order(order) => {
                self.counts.orders += 1;
                self.ledger.record(order.clone());
                match self
                    .execution
                    .execute_order(order, self.data.as_ref(), &mut self.queue)
                {
                    Ok(()) => {}
                    Err(ExecutionError::Rejected {
                        order: echoed,
                        reason,
                    }) => {
                        warn!(order = %echoed, %reason, "order rejected");
                        if !self.ledger.retire(order) {
                            return Err(ContractViolation::UntrackedRejection(order.clone()).into());
                        }
                        self.counts.rejected += 1;
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            Event::Fill(fill) => {
                self.ledger.settle(fill)?;
                self.counts.fills += 1;
                self.portfolio.update_fill(fill)?;
            }
        }
        Ok(())
    }

    fn check_timestamp(&mut self, market: &MarketEvent) -> Result<(), ContractViolation> {
        if let Some(previous) = self.last_timestamp {
            if market.timestamp < previous {
                return Err(ContractViolation::TimestampRegression {
                    previous,
                    current: market.timestamp,
                });
            }
        }
        self.last_timestamp = Some(market.timestamp);
        Ok(())
    }

    fn abort(&self, event: Option<&Event>, cause: AbortCause) -> BacktestError {
        error!(
            counts = %self.counts,
            event = event.map(|e| e.kind()),
            %cause,
            "backtest aborted"
        );
        BacktestError::Aborted {
            event: event.cloned().map(Box::new),
            counts: self.counts,
            cause,
        }
    }

    fn into_report(self) -> BacktestReport {
        let equity_curve = self.portfolio.finalize();
        let summary = equity_curve.summary(self.config.period);
        info!(
            total_return = summary.total_return,
            sharpe = ?summary.sharpe_ratio,
            max_drawdown = summary.max_drawdown,
            "performance summary"
        );
        BacktestReport {
            counts: self.counts,
            summary,
            equity_curve,
            positions_history: self.portfolio.positions_history().to_vec(),
            holdings_history: self.portfolio.holdings_history().to_vec(),
            final_positions: self.portfolio.positions().clone(),
            final_holdings: *self.portfolio.current_holdings(),
        }
    }
}
