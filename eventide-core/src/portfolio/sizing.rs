//! Sizing policies: decide whether a signal becomes an order, and how big.

use crate::domain::{Direction, OrderEvent, OrderSide, SignalEvent};
use std::fmt::Debug;

/// Translates a signal plus the current position into at most one order.
///
/// Implementations must be pure: the same signal and position always give
/// the same answer.
pub trait SizingPolicy: Send + Sync + Debug {
    fn size_order(&self, signal: &SignalEvent, current_quantity: i64) -> Option<OrderEvent>;

    /// Name for logs and run summaries.
    fn name(&self) -> &str;
}

/// Constant quantity per entry; exits flatten the whole position.
///
/// Signal strength is ignored. Rules, first match wins:
/// - LONG while flat: buy `quantity`
/// - SHORT while flat: sell `quantity`
/// - EXIT while long: sell the whole position
/// - EXIT while short: buy back the whole position
/// - anything else (LONG while long, LONG while short, EXIT while flat, ...): no order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedQuantitySizing {
    quantity: u64,
}

impl FixedQuantitySizing {
    /// Returns `None` for a zero quantity.
    pub fn new(quantity: u64) -> Option<Self> {
        (quantity > 0).then_some(Self { quantity })
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }
}

impl SizingPolicy for FixedQuantitySizing {
    fn size_order(&self, signal: &SignalEvent, current_quantity: i64) -> Option<OrderEvent> {
        let (side, quantity) = match (signal.direction, current_quantity) {
            (Direction::Long, 0) => (OrderSide::Buy, self.quantity),
            (Direction::Short, 0) => (OrderSide::Sell, self.quantity),
            (Direction::Exit, q) if q > 0 => (OrderSide::Sell, q.unsigned_abs()),
            (Direction::Exit, q) if q < 0 => (OrderSide::Buy, q.unsigned_abs()),
            _ => return None,
        };
        Some(OrderEvent::market(signal.symbol.clone(), quantity, side))
    }

    fn name(&self) -> &str {
        "fixed"
    }
}
