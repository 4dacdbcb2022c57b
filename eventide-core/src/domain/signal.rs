//! Signal events: directional intent emitted by a strategy.
//!
//! Signals never touch positions. The portfolio's sizing policy decides whether
//! a signal turns into an order.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Directional intent of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Long,
    Short,
    /// Flatten whatever is currently held.
    Exit,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Long => "LONG",
            Self::Short => "SHORT",
            Self::Exit => "EXIT",
        };
        f.write_str(label)
    }
}

/// An immutable signal emitted by a strategy for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub strategy_id: String,
    pub symbol: String,
    pub timestamp: NaiveDateTime,
    pub direction: Direction,
    /// Dimensionless sizing hint in (0, inf). Not a probability.
    pub strength: f64,
}

impl SignalEvent {
    pub fn new(
        strategy_id: impl Into<String>,
        symbol: impl Into<String>,
        timestamp: NaiveDateTime,
        direction: Direction,
        strength: f64,
    ) -> Self {
        Self {
            strategy_id: strategy_id.into(),
            symbol: symbol.into(),
            timestamp,
            direction,
            strength,
        }
    }

    /// Strength must be a finite positive number.
    pub fn has_valid_strength(&self) -> bool {
        self.strength.is_finite() && self.strength > 0.0
    }
}

impl fmt::Display for SignalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Signal[{} {} {} strength={} by {}]",
            self.timestamp, self.symbol, self.direction, self.strength, self.strategy_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn strength_validation() {
        let mut signal = SignalEvent::new("test", "SPY", ts(), Direction::Long, 1.0);
        assert!(signal.has_valid_strength());
        signal.strength = 0.0;
        assert!(!signal.has_valid_strength());
        signal.strength = f64::INFINITY;
        assert!(!signal.has_valid_strength());
        signal.strength = 2.5;
        assert!(signal.has_valid_strength());
    }

    #[test]
    fn direction_serializes_upper_case() {
        let json = serde_json::to_string(&Direction::Exit).unwrap();
        assert_eq!(json, "\"EXIT\"");
    }
}
