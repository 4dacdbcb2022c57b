//! Seeded random-walk bars for tests, benches and dry runs.
//!
//! Each symbol gets its own `StdRng` whose seed is derived from the master
//! seed and the symbol name through BLAKE3, so a symbol's series does not
//! depend on which other symbols are in the universe or their order.

use super::memory::InMemoryDataSource;
use super::{DataError, MarketDataSource};
use crate::domain::Bar;
use crate::queue::EventQueue;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Parameters of the synthetic random walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticConfig {
    /// Number of bars per symbol (weekdays only).
    pub bars: usize,
    pub seed: u64,
    #[serde(default = "default_start_price")]
    pub start_price: f64,
    /// Largest absolute close-to-close move per bar, as a fraction.
    #[serde(default = "default_max_move")]
    pub max_move: f64,
    #[serde(default = "default_first_day")]
    pub first_day: NaiveDate,
}

fn default_start_price() -> f64 {
    100.0
}

fn default_max_move() -> f64 {
    0.03
}

fn default_first_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default()
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            bars: 252,
            seed: 42,
            start_price: default_start_price(),
            max_move: default_max_move(),
            first_day: default_first_day(),
        }
    }
}

impl SyntheticConfig {
    pub fn validate(&self) -> Result<(), DataError> {
        if self.bars == 0 {
            return Err(DataError::InvalidParameter("bars must be at least 1".into()));
        }
        if !(self.start_price.is_finite() && self.start_price > 0.0) {
            return Err(DataError::InvalidParameter(format!(
                "start_price must be positive, got {}",
                self.start_price
            )));
        }
        if !(0.0..1.0).contains(&self.max_move) {
            return Err(DataError::InvalidParameter(format!(
                "max_move must be in [0, 1), got {}",
                self.max_move
            )));
        }
        Ok(())
    }

    /// Deterministic per-symbol seed.
    pub fn symbol_seed(&self, symbol: &str) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(symbol.as_bytes());
        *hasher.finalize().as_bytes()
    }
}

/// Generate `config.bars` weekday bars for one symbol.
pub fn generate_bars(symbol: &str, config: &SyntheticConfig) -> Vec<Bar> {
    let mut rng = StdRng::from_seed(config.symbol_seed(symbol));
    let mut bars = Vec::with_capacity(config.bars);
    let mut price = config.start_price;
    let mut day = config.first_day;

    while bars.len() < config.bars {
        if matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            day += Duration::days(1);
            continue;
        }

        let change: f64 = if config.max_move > 0.0 {
            rng.gen_range(-config.max_move..config.max_move)
        } else {
            0.0
        };
        let open = price;
        let close = price * (1.0 + change);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..5_000_000u64) as f64;

        bars.push(Bar {
            symbol: symbol.to_string(),
            timestamp: day.and_time(chrono::NaiveTime::MIN),
            open,
            high,
            low,
            close,
            volume,
            adj_close: close,
        });

        price = close;
        day += Duration::days(1);
    }

    bars
}

/// Random-walk data source.
#[derive(Debug, Clone)]
pub struct SyntheticDataSource {
    config: SyntheticConfig,
    inner: InMemoryDataSource,
}

impl SyntheticDataSource {
    pub fn generate(
        symbols: Vec<String>,
        config: SyntheticConfig,
        start: Option<NaiveDateTime>,
    ) -> Result<Self, DataError> {
        config.validate()?;
        let bars = symbols
            .iter()
            .flat_map(|symbol| generate_bars(symbol, &config))
            .collect();
        let inner = InMemoryDataSource::starting_at(symbols, bars, start)?;
        Ok(Self { config, inner })
    }

    pub fn config(&self) -> &SyntheticConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl MarketDataSource for SyntheticDataSource {
    fn symbols(&self) -> &[String] {
        self.inner.symbols()
    }

    fn current_time(&self) -> Option<NaiveDateTime> {
        self.inner.current_time()
    }

    fn advance_step(&mut self, queue: &mut EventQueue) -> Result<bool, DataError> {
        self.inner.advance_step(queue)
    }

    fn latest_bar(&self, symbol: &str) -> Result<&Bar, DataError> {
        self.inner.latest_bar(symbol)
    }

    fn latest_bars(&self, symbol: &str, n: usize) -> Result<&[Bar], DataError> {
        self.inner.latest_bars(symbol, n)
    }
}
