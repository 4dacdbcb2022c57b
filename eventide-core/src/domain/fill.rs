use crate::domain::order::OrderSide;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Confirmation that an order executed, as returned by an execution backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillEvent {
    pub timestamp: NaiveDateTime,
    pub symbol: String,
    pub venue: String,
    pub quantity: u64,
    pub side: OrderSide,
    pub fill_price: f64,
    pub commission: f64,
}

impl FillEvent {
    /// Gross traded notional, signed by side (positive for buys).
    pub fn signed_notional(&self) -> f64 {
        self.side.sign() as f64 * self.fill_price * self.quantity as f64
    }

    /// Cash change caused by this fill: `-(side_sign * price * qty) - commission`.
    pub fn cash_delta(&self) -> f64 {
        -self.signed_notional() - self.commission
    }
}

impl fmt::Display for FillEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Fill[{} {} {} x{} @ {} on {} comm={}]",
            self.timestamp,
            self.symbol,
            self.side,
            self.quantity,
            self.fill_price,
            self.venue,
            self.commission
        )
    }
}
