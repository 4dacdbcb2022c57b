//! Go long every symbol on its first available bar and hold to the end.

use super::{Strategy, StrategyError};
use crate::data::{DataError, MarketDataSource};
use crate::domain::{Direction, MarketEvent, SignalEvent};
use crate::queue::EventQueue;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default)]
pub struct BuyAndHoldStrategy {
    bought: BTreeSet<String>,
}

impl BuyAndHoldStrategy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Strategy for BuyAndHoldStrategy {
    fn id(&self) -> &str {
        "BUY_AND_HOLD"
    }

    fn calculate_signals(
        &mut self,
        market: &MarketEvent,
        data: &dyn MarketDataSource,
        queue: &mut EventQueue,
    ) -> Result<(), StrategyError> {
        for symbol in data.symbols() {
            if self.bought.contains(symbol) {
                continue;
            }
            match data.latest_bar(symbol) {
                Ok(_) => {}
                // Symbol has not started trading yet.
                Err(DataError::NoData { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
            queue.push(SignalEvent::new(
                self.id(),
                symbol.clone(),
                market.timestamp,
                Direction::Long,
                1.0,
            ));
            self.bought.insert(symbol.clone());
        }
        Ok(())
    }
}
