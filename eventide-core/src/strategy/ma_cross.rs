//! Moving average crossover on adjusted closes.
//!
//! - LONG when the short SMA moves above the long SMA while flat
//! - EXIT when the short SMA moves below the long SMA while long
//!
//! The strategy tracks its own view of whether it is in the market; it never
//! looks at the portfolio.

use super::{Strategy, StrategyError};
use crate::data::MarketDataSource;
use crate::domain::{BarField, Direction, MarketEvent, SignalEvent};
use crate::queue::EventQueue;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct MovingAverageCrossStrategy {
    short_window: usize,
    long_window: usize,
    invested: BTreeSet<String>,
}

impl MovingAverageCrossStrategy {
    pub fn new(short_window: usize, long_window: usize) -> Result<Self, StrategyError> {
        if short_window == 0 {
            return Err(StrategyError::InvalidParameter(
                "short_window must be > 0".into(),
            ));
        }
        if long_window <= short_window {
            return Err(StrategyError::InvalidParameter(format!(
                "long_window ({long_window}) must be greater than short_window ({short_window})"
            )));
        }
        Ok(Self {
            short_window,
            long_window,
            invested: BTreeSet::new(),
        })
    }

    pub fn windows(&self) -> (usize, usize) {
        (self.short_window, self.long_window)
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

impl Strategy for MovingAverageCrossStrategy {
    fn id(&self) -> &str {
        "MAC"
    }

    fn calculate_signals(
        &mut self,
        market: &MarketEvent,
        data: &dyn MarketDataSource,
        queue: &mut EventQueue,
    ) -> Result<(), StrategyError> {
        for symbol in data.symbols() {
            let closes = data.latest_values(symbol, BarField::AdjClose, self.long_window)?;
            if closes.len() < self.long_window {
                continue; // warmup
            }
            let long_ma = mean(&closes);
            let short_ma = mean(&closes[closes.len() - self.short_window..]);

            let invested = self.invested.contains(symbol);
            let direction = if short_ma > long_ma && !invested {
                self.invested.insert(symbol.clone());
                Direction::Long
            } else if short_ma < long_ma && invested {
                self.invested.remove(symbol);
                Direction::Exit
            } else {
                continue;
            };

            tracing::debug!(
                symbol = %symbol,
                short_ma,
                long_ma,
                %direction,
                "moving average cross"
            );
            queue.push(SignalEvent::new(
                self.id(),
                symbol.clone(),
                market.timestamp,
                direction,
                1.0,
            ));
        }
        Ok(())
    }
}
