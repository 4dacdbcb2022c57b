//! Immediate-fill simulator.
//!
//! Market orders fill at the latest bar's close. Limit orders fill at their
//! limit price when the latest bar traded through it, and are rejected
//! otherwise. Slippage is directional: buyers pay more, sellers receive less.

use super::fees::{FeeSchedule, ZeroFees};
use super::{ExecutionError, ExecutionHandler};
use crate::data::MarketDataSource;
use crate::domain::{FillEvent, OrderEvent, OrderKind, OrderSide};
use crate::queue::EventQueue;

#[derive(Debug)]
pub struct SimulatedExecutionHandler {
    venue: String,
    fees: Box<dyn FeeSchedule>,
    /// Slippage in basis points, applied to market orders only.
    slippage_bps: f64,
}

impl Default for SimulatedExecutionHandler {
    fn default() -> Self {
        Self::new("SIM", Box::new(ZeroFees))
    }
}

impl SimulatedExecutionHandler {
    pub fn new(venue: impl Into<String>, fees: Box<dyn FeeSchedule>) -> Self {
        Self {
            venue: venue.into(),
            fees,
            slippage_bps: 0.0,
        }
    }

    pub fn with_slippage_bps(mut self, slippage_bps: f64) -> Self {
        self.slippage_bps = slippage_bps;
        self
    }

    /// Move `price` against the order by `slippage_bps`.
    fn slipped(&self, price: f64, side: OrderSide) -> f64 {
        if self.slippage_bps == 0.0 {
            return price;
        }
        let fraction = self.slippage_bps / 10_000.0;
        match side {
            OrderSide::Buy => price * (1.0 + fraction),
            OrderSide::Sell => price * (1.0 - fraction),
        }
    }
}

impl ExecutionHandler for SimulatedExecutionHandler {
    fn venue(&self) -> &str {
        &self.venue
    }

    fn execute_order(
        &mut self,
        order: &OrderEvent,
        data: &dyn MarketDataSource,
        queue: &mut EventQueue,
    ) -> Result<(), ExecutionError> {
        if order.quantity == 0 {
            return Err(ExecutionError::Rejected {
                order: order.clone(),
                reason: "zero quantity".into(),
            });
        }

        let bar = data.latest_bar(&order.symbol)?;
        let fill_price = match order.kind {
            OrderKind::Market => self.slipped(bar.close, order.side),
            OrderKind::Limit { price } if bar.low <= price && price <= bar.high => price,
            OrderKind::Limit { price } => {
                return Err(ExecutionError::Rejected {
                    order: order.clone(),
                    reason: format!(
                        "limit {price} outside bar range [{}, {}]",
                        bar.low, bar.high
                    ),
                });
            }
        };

        let commission = self.fees.commission(order.quantity, fill_price);
        queue.push(FillEvent {
            timestamp: bar.timestamp,
            symbol: order.symbol.clone(),
            venue: self.venue.clone(),
            quantity: order.quantity,
            side: order.side,
            fill_price,
            commission,
        });
        Ok(())
    }
}
