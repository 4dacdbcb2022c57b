//! The closed set of messages exchanged between pipeline stages.
//!
//! Dispatch is an exhaustive `match` over [`Event`]; there is no way to build
//! an event the driver does not know how to route.

use super::fill::FillEvent;
use super::order::OrderEvent;
use super::signal::SignalEvent;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A new bar became available for every symbol in the universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketEvent {
    /// Zero-based step index assigned by the data source.
    pub step: usize,
    pub timestamp: NaiveDateTime,
}

/// Tagged union of all pipeline messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    Market(MarketEvent),
    Signal(SignalEvent),
    Order(OrderEvent),
    Fill(FillEvent),
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Market(_) => "MARKET",
            Self::Signal(_) => "SIGNAL",
            Self::Order(_) => "ORDER",
            Self::Fill(_) => "FILL",
        }
    }
}

impl From<MarketEvent> for Event {
    fn from(event: MarketEvent) -> Self {
        Self::Market(event)
    }
}

impl From<SignalEvent> for Event {
    fn from(event: SignalEvent) -> Self {
        Self::Signal(event)
    }
}

impl From<OrderEvent> for Event {
    fn from(event: OrderEvent) -> Self {
        Self::Order(event)
    }
}

impl From<FillEvent> for Event {
    fn from(event: FillEvent) -> Self {
        Self::Fill(event)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Market(m) => write!(f, "Market[step {} @ {}]", m.step, m.timestamp),
            Self::Signal(s) => s.fmt(f),
            Self::Order(o) => o.fmt(f),
            Self::Fill(fill) => fill.fmt(f),
        }
    }
}
