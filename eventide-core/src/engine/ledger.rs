//! Outstanding-order ledger.
//!
//! Every dispatched order is recorded until exactly one fill or a rejection
//! retires it. A fill that matches nothing is a contract violation.

use crate::domain::{FillEvent, OrderEvent};
use crate::error::ContractViolation;
use std::collections::VecDeque;

#[derive(Debug, Default, Clone)]
pub struct OrderLedger {
    outstanding: VecDeque<OrderEvent>,
}

impl OrderLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, order: OrderEvent) {
        self.outstanding.push_back(order);
    }

    /// Retire the oldest outstanding order with the fill's symbol and side.
    pub fn settle(&mut self, fill: &FillEvent) -> Result<OrderEvent, ContractViolation> {
        let order = self
            .outstanding
            .iter()
            .position(|o| o.symbol == fill.symbol && o.side == fill.side)
            .and_then(|index| self.outstanding.remove(index))
            .ok_or_else(|| ContractViolation::UnmatchedFill(fill.clone()))?;
        if order.quantity != fill.quantity {
            tracing::warn!(%order, %fill, "fill quantity differs from order quantity");
        }
        Ok(order)
    }

    /// Retire a rejected order. Returns false if it was not outstanding.
    pub fn retire(&mut self, order: &OrderEvent) -> bool {
        match self.outstanding.iter().position(|o| o == order) {
            Some(index) => {
                self.outstanding.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.outstanding.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outstanding.is_empty()
    }
}
