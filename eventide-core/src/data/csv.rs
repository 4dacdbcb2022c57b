//! Historic bars from per-symbol CSV files.
//!
//! Each symbol is read from `<dir>/<SYMBOL>.csv` with the columns
//! `datetime,open,high,low,close,volume,adj_close`. The header row is optional
//! and a missing `adj_close` column falls back to `close`.

use super::memory::InMemoryDataSource;
use super::{DataError, MarketDataSource};
use crate::domain::Bar;
use crate::queue::EventQueue;
use chrono::{NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Data source backed by a directory of CSV files, one per symbol.
#[derive(Debug, Clone)]
pub struct HistoricCsvDataSource {
    dir: PathBuf,
    inner: InMemoryDataSource,
}

impl HistoricCsvDataSource {
    /// Load every symbol's file eagerly and align them.
    pub fn open(
        dir: impl Into<PathBuf>,
        symbols: Vec<String>,
        start: Option<NaiveDateTime>,
    ) -> Result<Self, DataError> {
        let dir = dir.into();
        let mut bars = Vec::new();
        for symbol in &symbols {
            let path = dir.join(format!("{symbol}.csv"));
            let loaded = read_bars(&path, symbol)?;
            tracing::debug!(symbol = %symbol, bars = loaded.len(), path = %path.display(), "loaded CSV");
            bars.extend(loaded);
        }
        let inner = InMemoryDataSource::starting_at(symbols, bars, start)?;
        Ok(Self { dir, inner })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Total number of steps on the aligned timeline.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl MarketDataSource for HistoricCsvDataSource {
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

/// Read one symbol's bars from a CSV file.
pub fn read_bars(path: &Path, symbol: &str) -> Result<Vec<Bar>, DataError> {
    let file = std::fs::File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(::csv::Trim::All)
        .flexible(true)
        .from_reader(file);

    let mut bars = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|source| DataError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let line = record.position().map_or(index as u64 + 1, |p| p.line());
        let parse_err = |message: String| DataError::Parse {
            path: path.to_path_buf(),
            line,
            message,
        };

        let first = record.get(0).unwrap_or_default();
        let is_header =
            first.eq_ignore_ascii_case("datetime") || first.eq_ignore_ascii_case("date");
        if index == 0 && is_header {
            continue;
        }
        if record.len() < 6 {
            return Err(parse_err(format!(
                "expected at least 6 columns, found {}",
                record.len()
            )));
        }

        let timestamp =
            parse_timestamp(first).ok_or_else(|| parse_err(format!("bad datetime '{first}'")))?;
        let number = |col: usize| -> Result<f64, DataError> {
            let raw = record.get(col).unwrap_or_default();
            raw.parse()
                .map_err(|_| parse_err(format!("column {}: bad number '{raw}'", col + 1)))
        };
        let close = number(4)?;
        let adj_close = if record.len() >= 7 { number(6)? } else { close };

        bars.push(Bar {
            symbol: symbol.to_string(),
            timestamp,
            open: number(1)?,
            high: number(2)?,
            low: number(3)?,
            close,
            volume: number(5)?,
            adj_close,
        });
    }
    Ok(bars)
}

/// Parse a timestamp in any of the accepted CSV formats. A bare date means midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BarField;
    use std::io::Write;

    fn write_csv(dir: &Path, symbol: &str, body: &str) {
        let mut file = std::fs::File::create(dir.join(format!("{symbol}.csv"))).unwrap();
        file.write_all(body.as_bytes()).unwrap();
    }

    #[test]
    fn reads_with_and_without_header() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(
            dir.path(),
            "SPY",
            "datetime,open,high,low,close,volume,adj_close\n\
             2024-01-02,100,101,99,100.5,1000,100.4\n\
             2024-01-03,100.5,102,100,101.5,1200,101.4\n",
        );
        write_csv(
            dir.path(),
            "QQQ",
            "2024-01-02 00:00:00,200,201,199,200.5,900,200.5\n\
             2024-01-03 00:00:00,200.5,202,200,201.5,800,201.5\n",
        );

        let mut data = HistoricCsvDataSource::open(
            dir.path(),
            vec!["SPY".into(), "QQQ".into()],
            None,
        )
        .unwrap();
        assert_eq!(data.len(), 2);

        let mut queue = EventQueue::new();
        data.advance_step(&mut queue).unwrap();
        assert_eq!(data.latest_field("SPY", BarField::AdjClose).unwrap(), 100.4);
        assert_eq!(data.latest_field("QQQ", BarField::Close).unwrap(), 200.5);
    }

    #[test]
    fn six_columns_fall_back_to_close() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "X", "2024-01-02,10,11,9,10.5,100\n");
        let bars = read_bars(&dir.path().join("X.csv"), "X").unwrap();
        assert_eq!(bars[0].adj_close, 10.5);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = HistoricCsvDataSource::open(dir.path(), vec!["NOPE".into()], None).unwrap_err();
        assert!(matches!(err, DataError::Io { .. }));
    }

    #[test]
    fn bad_number_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(
            dir.path(),
            "X",
            "2024-01-02,10,11,9,10.5,100,10.5\n2024-01-03,10,eleven,9,10.5,100,10.5\n",
        );
        let err = read_bars(&dir.path().join("X.csv"), "X").unwrap_err();
        match err {
            DataError::Parse { line, message, .. } => {
                assert_eq!(line, 2);
                assert!(message.contains("eleven"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn start_timestamp_drops_earlier_rows() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(
            dir.path(),
            "X",
            "2024-01-02,10,11,9,10,100,10\n2024-01-03,11,12,10,11,100,11\n",
        );
        let start = parse_timestamp("2024-01-03").unwrap();
        let data = HistoricCsvDataSource::open(dir.path(), vec!["X".into()], Some(start)).unwrap();
        assert_eq!(data.len(), 1);
    }
}
