//! In-memory replay of pre-loaded bars.

use super::align::{align_forward_filled, AlignedBars};
use super::{DataError, MarketDataSource};
use crate::domain::{Bar, MarketEvent};
use crate::queue::EventQueue;
use chrono::NaiveDateTime;

/// Replays a fixed set of bars aligned onto a common timeline.
#[derive(Debug, Clone)]
pub struct InMemoryDataSource {
    symbols: Vec<String>,
    aligned: AlignedBars,
    /// Number of steps emitted so far.
    cursor: usize,
}

impl InMemoryDataSource {
    /// Build a source for `symbols` from bars in any order.
    pub fn new(symbols: Vec<String>, bars: Vec<Bar>) -> Result<Self, DataError> {
        Self::starting_at(symbols, bars, None)
    }

    /// Like [`new`](Self::new), dropping bars earlier than `start`.
    pub fn starting_at(
        symbols: Vec<String>,
        bars: Vec<Bar>,
        start: Option<NaiveDateTime>,
    ) -> Result<Self, DataError> {
        let aligned = align_forward_filled(&symbols, bars, start)?;
        Ok(Self {
            symbols,
            aligned,
            cursor: 0,
        })
    }

    /// Total number of steps this source will emit.
    pub fn len(&self) -> usize {
        self.aligned.timeline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aligned.timeline.is_empty()
    }

    /// Steps emitted so far.
    pub fn steps_emitted(&self) -> usize {
        self.cursor
    }

    /// Rewind to before the first step.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    pub fn timeline(&self) -> &[NaiveDateTime] {
        &self.aligned.timeline
    }

    fn visible(&self, symbol: &str) -> Result<&[Bar], DataError> {
        self.aligned
            .series
            .get(symbol)
            .map(|series| series.visible(self.cursor))
            .ok_or_else(|| DataError::UnknownSymbol(symbol.to_string()))
    }
}

impl MarketDataSource for InMemoryDataSource {
    fn symbols(&self) -> &[String] {
        &self.symbols
    }

    fn current_time(&self) -> Option<NaiveDateTime> {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.aligned.timeline.get(i))
            .copied()
    }

    fn advance_step(&mut self, queue: &mut EventQueue) -> Result<bool, DataError> {
        let Some(&timestamp) = self.aligned.timeline.get(self.cursor) else {
            return Ok(false);
        };
        queue.push(MarketEvent {
            step: self.cursor,
            timestamp,
        });
        self.cursor += 1;
        Ok(true)
    }

    fn latest_bar(&self, symbol: &str) -> Result<&Bar, DataError> {
        self.visible(symbol)?.last().ok_or_else(|| DataError::NoData {
            symbol: symbol.to_string(),
        })
    }

    fn latest_bars(&self, symbol: &str, n: usize) -> Result<&[Bar], DataError> {
        let visible = self.visible(symbol)?;
        Ok(&visible[visible.len().saturating_sub(n)..])
    }
}
