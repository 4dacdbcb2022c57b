//! Portfolio state machine.
//!
//! Three entry points, each driven by one event kind:
//! - [`Portfolio::update_time_index`] (Market): snapshot positions and mark holdings to market
//! - [`Portfolio::update_signal`] (Signal): ask the sizing policy for an order
//! - [`Portfolio::update_fill`] (Fill): apply the fill to positions and cash
//!
//! Positions change only in `update_fill`. Prices enter holdings only in
//! `update_time_index`. Histories are append-only.

pub mod equity;
pub mod sizing;

pub use equity::{EquityCurve, EquityRow, SummaryStatistics};
pub use sizing::{FixedQuantitySizing, SizingPolicy};

use crate::data::{DataError, MarketDataSource};
use crate::domain::{
    BarField, CurrentHoldings, FillEvent, HoldingsSnapshot, MarketEvent, OrderEvent, PositionMap,
    PositionsSnapshot, SignalEvent,
};
use crate::error::ConfigurationError;
use crate::queue::EventQueue;
use crate::risk::Period;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error("symbol '{0}' is not held by this portfolio")]
    UnknownSymbol(String),

    #[error("signal strength must be finite and positive: {0}")]
    InvalidStrength(SignalEvent),

    #[error("fill would overflow the position: {0}")]
    PositionOverflow(FillEvent),

    #[error("price lookup failed: {0}")]
    Data(#[from] DataError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

#[derive(Debug)]
pub struct Portfolio {
    symbols: Vec<String>,
    initial_capital: f64,
    sizing: Box<dyn SizingPolicy>,
    positions: PositionMap,
    holdings: CurrentHoldings,
    positions_history: Vec<PositionsSnapshot>,
    holdings_history: Vec<HoldingsSnapshot>,
}

impl Portfolio {
    /// Flat portfolio holding `initial_capital` in cash.
    pub fn new(
        symbols: Vec<String>,
        initial_capital: f64,
        sizing: Box<dyn SizingPolicy>,
    ) -> Result<Self, PortfolioError> {
        if symbols.is_empty() {
            return Err(ConfigurationError::EmptyUniverse.into());
        }
        let mut seen = HashSet::new();
        if let Some(dup) = symbols.iter().find(|s| !seen.insert(s.as_str())) {
            return Err(ConfigurationError::DuplicateSymbol(dup.clone()).into());
        }
        if !(initial_capital.is_finite() && initial_capital > 0.0) {
            return Err(ConfigurationError::NonPositiveCapital(initial_capital).into());
        }

        Ok(Self {
            positions: PositionMap::flat(&symbols),
            holdings: CurrentHoldings::new(initial_capital),
            symbols,
            initial_capital,
            sizing,
            positions_history: Vec::new(),
            holdings_history: Vec::new(),
        })
    }

    /// Record one step: copy positions and value every holding at the latest
    /// adjusted close. Cash and commission carry forward unchanged.
    ///
    /// Flat symbols are valued at zero without a price lookup, so a symbol
    /// that has not started trading yet does not fail the step.
    pub fn update_time_index(
        &mut self,
        market: &MarketEvent,
        data: &dyn MarketDataSource,
    ) -> Result<(), PortfolioError> {
        let mut market_values = BTreeMap::new();
        for (symbol, quantity) in self.positions.iter() {
            let value = if quantity == 0 {
                0.0
            } else {
                quantity as f64 * data.latest_field(symbol, BarField::AdjClose)?
            };
            market_values.insert(symbol.to_string(), value);
        }
        let total = self.holdings.cash + market_values.values().sum::<f64>();

        self.positions_history.push(PositionsSnapshot {
            timestamp: market.timestamp,
            positions: self.positions.clone(),
        });
        self.holdings_history.push(HoldingsSnapshot {
            timestamp: market.timestamp,
            cash: self.holdings.cash,
            commission: self.holdings.commission,
            market_values,
            total,
        });
        Ok(())
    }

    /// The order the sizing policy would place for `signal`, if any. Pure.
    pub fn generate_order(&self, signal: &SignalEvent) -> Result<Option<OrderEvent>, PortfolioError> {
        if !signal.has_valid_strength() {
            return Err(PortfolioError::InvalidStrength(signal.clone()));
        }
        let current = self
            .positions
            .get(&signal.symbol)
            .ok_or_else(|| PortfolioError::UnknownSymbol(signal.symbol.clone()))?;
        Ok(self.sizing.size_order(signal, current))
    }

    /// Apply the sizing policy and push the resulting order, if any.
    ///
    /// Returns whether an order was pushed.
    pub fn update_signal(
        &mut self,
        signal: &SignalEvent,
        queue: &mut EventQueue,
    ) -> Result<bool, PortfolioError> {
        match self.generate_order(signal)? {
            Some(order) => {
                queue.push(order);
                Ok(true)
            }
            None => {
                tracing::debug!(%signal, "signal produced no order");
                Ok(false)
            }
        }
    }

    /// Apply a fill unconditionally.
    ///
    /// The portfolio does not deduplicate fills; one fill per order is the
    /// execution backend's guarantee.
    pub fn update_fill(&mut self, fill: &FillEvent) -> Result<(), PortfolioError> {
        if self.positions.get(&fill.symbol).is_none() {
            return Err(PortfolioError::UnknownSymbol(fill.symbol.clone()));
        }
        fill.side
            .signed(fill.quantity)
            .and_then(|delta| self.positions.adjust(&fill.symbol, delta))
            .ok_or_else(|| PortfolioError::PositionOverflow(fill.clone()))?;
        self.holdings.cash += fill.cash_delta();
        self.holdings.commission += fill.commission;
        Ok(())
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn sizing(&self) -> &dyn SizingPolicy {
        self.sizing.as_ref()
    }

    pub fn positions(&self) -> &PositionMap {
        &self.positions
    }

    pub fn position(&self, symbol: &str) -> Option<i64> {
        self.positions.get(symbol)
    }

    pub fn current_holdings(&self) -> &CurrentHoldings {
        &self.holdings
    }

    pub fn positions_history(&self) -> &[PositionsSnapshot] {
        &self.positions_history
    }

    pub fn holdings_history(&self) -> &[HoldingsSnapshot] {
        &self.holdings_history
    }

    /// Build the equity curve from the holdings history.
    pub fn finalize(&self) -> EquityCurve {
        EquityCurve::from_holdings(&self.symbols, &self.holdings_history)
    }

    pub fn summary_statistics(&self, period: Period) -> SummaryStatistics {
        self.finalize().summary(period)
    }
}
