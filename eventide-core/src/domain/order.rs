//! Order events sent from the portfolio to the execution backend.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// +1 for buys (cash leaves, position grows), -1 for sells.
    pub fn sign(self) -> i64 {
        match self {
            Self::Buy => 1,
            Self::Sell => -1,
        }
    }

    /// Signed position delta for a fill of `quantity` on this side, or `None`
    /// when the quantity does not fit a position.
    pub fn signed(self, quantity: u64) -> Option<i64> {
        i64::try_from(quantity).ok().map(|q| self.sign() * q)
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        })
    }
}

/// What kind of order and its price parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderKind {
    /// Fill at the prevailing price.
    Market,
    /// Fill at `price` or better.
    Limit { price: f64 },
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Market => f.write_str("MKT"),
            Self::Limit { price } => write!(f, "LMT@{price}"),
        }
    }
}

/// An order for a non-negative whole quantity of one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderEvent {
    pub symbol: String,
    pub kind: OrderKind,
    pub quantity: u64,
    pub side: OrderSide,
}

impl OrderEvent {
    pub fn market(symbol: impl Into<String>, quantity: u64, side: OrderSide) -> Self {
        Self {
            symbol: symbol.into(),
            kind: OrderKind::Market,
            quantity,
            side,
        }
    }

    pub fn limit(symbol: impl Into<String>, quantity: u64, side: OrderSide, price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            kind: OrderKind::Limit { price },
            quantity,
            side,
        }
    }
}

impl fmt::Display for OrderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Order[{} {} {} x{}]",
            self.symbol, self.kind, self.side, self.quantity
        )
    }
}
