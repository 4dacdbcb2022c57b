//! Multi-symbol time alignment.
//!
//! The union of every symbol's timestamps becomes the step index. Once a
//! symbol has produced its first bar, a missing bar at a later step is padded
//! with the previous bar re-stamped at that step (forward fill). Before its
//! first bar a symbol is simply not available yet.

use super::DataError;
use crate::domain::Bar;
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// One symbol's bars on the common timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSeries {
    /// Step index of the symbol's first real bar.
    pub first: usize,
    /// One bar per step from `first` to the end of the timeline.
    pub bars: Vec<Bar>,
    /// Steps that were padded by forward fill.
    pub filled: usize,
}

impl AlignedSeries {
    /// Bars visible once `steps` steps have been emitted, oldest first.
    pub fn visible(&self, steps: usize) -> &[Bar] {
        let end = steps.saturating_sub(self.first).min(self.bars.len());
        &self.bars[..end]
    }
}

/// Bar data for the whole universe on a common timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedBars {
    /// The common timestamp axis (sorted ascending, no duplicates).
    pub timeline: Vec<NaiveDateTime>,
    pub series: BTreeMap<String, AlignedSeries>,
}

/// Align bars for `symbols` onto the union of their timestamps.
///
/// Bars earlier than `start` are dropped. When a symbol has two bars with the
/// same timestamp the later one in input order wins. Every symbol must keep at
/// least one bar, and every bar must belong to the universe.
pub fn align_forward_filled(
    symbols: &[String],
    bars: Vec<Bar>,
    start: Option<NaiveDateTime>,
) -> Result<AlignedBars, DataError> {
    if symbols.is_empty() {
        return Err(DataError::EmptyUniverse);
    }

    let mut by_symbol: HashMap<&str, BTreeMap<NaiveDateTime, Bar>> = symbols
        .iter()
        .map(|s| (s.as_str(), BTreeMap::new()))
        .collect();

    for bar in bars {
        if start.is_some_and(|start| bar.timestamp < start) {
            continue;
        }
        if let Some(reason) = bar.defect() {
            return Err(DataError::InvalidBar {
                symbol: bar.symbol.clone(),
                timestamp: bar.timestamp,
                reason: reason.into(),
            });
        }
        let Some(series) = by_symbol.get_mut(bar.symbol.as_str()) else {
            return Err(DataError::UnknownSymbol(bar.symbol));
        };
        series.insert(bar.timestamp, bar);
    }

    let timeline: Vec<NaiveDateTime> = by_symbol
        .values()
        .flat_map(|s| s.keys().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut series = BTreeMap::new();
    for symbol in symbols {
        let own = &by_symbol[symbol.as_str()];
        let Some(first_ts) = own.keys().next() else {
            return Err(DataError::EmptySeries {
                symbol: symbol.clone(),
            });
        };
        let first = timeline.partition_point(|ts| ts < first_ts);

        let mut aligned: Vec<Bar> = Vec::with_capacity(timeline.len() - first);
        let mut filled = 0;
        for ts in &timeline[first..] {
            match own.get(ts) {
                Some(bar) => aligned.push(bar.clone()),
                None => {
                    // `first` points at a real bar, so there is always a predecessor.
                    if let Some(prev) = aligned.last() {
                        let padded = prev.carried_to(*ts);
                        aligned.push(padded);
                        filled += 1;
                    }
                }
            }
        }

        if filled > 0 {
            tracing::warn!(symbol = %symbol, filled, "forward-filled missing bars");
        }

        series.insert(
            symbol.clone(),
            AlignedSeries {
                first,
                bars: aligned,
                filled,
            },
        );
    }

    Ok(AlignedBars { timeline, series })
}
