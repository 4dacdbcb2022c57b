use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Signed quantity held per symbol. Negative quantities are shorts.
///
/// Every symbol in the universe has an entry, starting at zero.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PositionMap {
    quantities: BTreeMap<String, i64>,
}

impl PositionMap {
    /// Flat positions for every symbol in the universe.
    pub fn flat<S: AsRef<str>>(symbols: &[S]) -> Self {
        Self {
            quantities: symbols
                .iter()
                .map(|s| (s.as_ref().to_string(), 0))
                .collect(),
        }
    }

    /// Quantity held, or `None` if the symbol is outside the universe.
    pub fn get(&self, symbol: &str) -> Option<i64> {
        self.quantities.get(symbol).copied()
    }

    /// Apply a signed delta. Returns the new quantity, or `None` for unknown
    /// symbols and for results outside `i64`. A `None` leaves the map unchanged.
    pub(crate) fn adjust(&mut self, symbol: &str, delta: i64) -> Option<i64> {
        let qty = self.quantities.get_mut(symbol)?;
        *qty = qty.checked_add(delta)?;
        Some(*qty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.quantities.iter().map(|(s, q)| (s.as_str(), *q))
    }

    pub fn is_flat(&self) -> bool {
        self.quantities.values().all(|q| *q == 0)
    }
}

/// Positions as they stood at one Market event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionsSnapshot {
    pub timestamp: NaiveDateTime,
    pub positions: PositionMap,
}
