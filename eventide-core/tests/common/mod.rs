//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use eventide_core::data::{DataError, InMemoryDataSource, MarketDataSource};
use eventide_core::domain::{Bar, Direction, MarketEvent, SignalEvent};
use eventide_core::queue::EventQueue;
use eventide_core::strategy::{Strategy, StrategyError};

pub fn day(offset: usize) -> NaiveDateTime {
    let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (base + chrono::Duration::days(offset as i64))
        .and_hms_opt(16, 0, 0)
        .unwrap()
}

/// Flat-range bars whose close and adjusted close are both `closes[i]`.
pub fn bars(symbol: &str, closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            symbol: symbol.to_string(),
            timestamp: day(i),
            open: close,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume: 1_000.0,
            adj_close: close,
        })
        .collect()
}

pub fn source(symbol: &str, closes: &[f64]) -> InMemoryDataSource {
    InMemoryDataSource::new(vec![symbol.to_string()], bars(symbol, closes)).unwrap()
}

/// Emits pre-recorded signals at given step indices.
#[derive(Debug, Clone, Default)]
pub struct ScriptedStrategy {
    script: Vec<(usize, String, Direction)>,
}

impl ScriptedStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, step: usize, symbol: &str, direction: Direction) -> Self {
        self.script.push((step, symbol.to_string(), direction));
        self
    }

    /// One optional direction per step for a single symbol.
    pub fn from_steps(symbol: &str, steps: &[Option<Direction>]) -> Self {
        let script = steps
            .iter()
            .enumerate()
            .filter_map(|(i, d)| d.map(|d| (i, symbol.to_string(), d)))
            .collect();
        Self { script }
    }
}

impl Strategy for ScriptedStrategy {
    fn id(&self) -> &str {
        "SCRIPTED"
    }

    fn calculate_signals(
        &mut self,
        market: &MarketEvent,
        _data: &dyn MarketDataSource,
        queue: &mut EventQueue,
    ) -> Result<(), StrategyError> {
        for (step, symbol, direction) in &self.script {
            if *step == market.step {
                queue.push(SignalEvent::new(
                    "SCRIPTED",
                    symbol.clone(),
                    market.timestamp,
                    *direction,
                    1.0,
                ));
            }
        }
        Ok(())
    }
}

/// Data source wrapper that misbehaves on purpose.
pub struct FaultyDataSource {
    pub inner: InMemoryDataSource,
    pub extra_market_at: Option<usize>,
    pub rewind_at: Option<usize>,
    steps: usize,
}

impl FaultyDataSource {
    pub fn new(inner: InMemoryDataSource) -> Self {
        Self {
            inner,
            extra_market_at: None,
            rewind_at: None,
            steps: 0,
        }
    }
}

impl MarketDataSource for FaultyDataSource {
    fn symbols(&self) -> &[String] {
        self.inner.symbols()
    }

    fn current_time(&self) -> Option<NaiveDateTime> {
        self.inner.current_time()
    }

    fn advance_step(&mut self, queue: &mut EventQueue) -> Result<bool, DataError> {
        let step = self.steps;
        self.steps += 1;
        if self.rewind_at == Some(step) {
            queue.push(MarketEvent {
                step,
                timestamp: day(0) - chrono::Duration::days(30),
            });
            return Ok(true);
        }
        let advanced = self.inner.advance_step(queue)?;
        if advanced && self.extra_market_at == Some(step) {
            queue.push(MarketEvent {
                step,
                timestamp: day(step),
            });
        }
        Ok(advanced)
    }

    fn latest_bar(&self, symbol: &str) -> Result<&Bar, DataError> {
        self.inner.latest_bar(symbol)
    }

    fn latest_bars(&self, symbol: &str, n: usize) -> Result<&[Bar], DataError> {
        self.inner.latest_bars(symbol, n)
    }
}
