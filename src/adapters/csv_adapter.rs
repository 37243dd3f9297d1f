//! CSV bar import.
//!
//! Reads `timestamp,open,high,low,close,volume` rows for one series and
//! returns them ascending, deduplicated by timestamp.

use crate::domain::bar::{Bar, IndicatorSnapshot, TIMESTAMP_FORMAT};
use crate::domain::error::BracketeerError;
use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse the file into bars of `symbol`/`timeframe` with empty indicator
    /// snapshots.
    pub fn load_bars(&self, symbol: &str, timeframe: &str) -> Result<Vec<Bar>, BracketeerError> {
        let content = fs::read_to_string(&self.path).map_err(|e| BracketeerError::Import {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;

        let mut bars = parse_bars(&content, symbol, timeframe)?;
        bars.sort_by_key(|b| b.timestamp);
        bars.dedup_by_key(|b| b.timestamp);
        Ok(bars)
    }

}

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, BracketeerError> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, ISO_FORMAT))
        .map_err(|e| BracketeerError::Import {
            reason: format!("invalid timestamp '{}': {}", raw, e),
        })
}

fn field(record: &csv::StringRecord, idx: usize, name: &str) -> Result<f64, BracketeerError> {
    record
        .get(idx)
        .ok_or_else(|| BracketeerError::Import {
            reason: format!("missing {} column", name),
        })?
        .trim()
        .parse()
        .map_err(|e| BracketeerError::Import {
            reason: format!("invalid {} value: {}", name, e),
        })
}

fn parse_bars(content: &str, symbol: &str, timeframe: &str) -> Result<Vec<Bar>, BracketeerError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut bars = Vec::new();

    for result in rdr.records() {
        let record = result.map_err(|e| BracketeerError::Import {
            reason: format!("CSV parse error: {}", e),
        })?;

        let timestamp = parse_timestamp(record.get(0).ok_or_else(|| BracketeerError::Import {
            reason: "missing timestamp column".into(),
        })?)?;

        let bar = Bar {
            id: 0,
            symbol: symbol.to_string(),
            timeframe: timeframe.to_string(),
            timestamp,
            open: field(&record, 1, "open")?,
            high: field(&record, 2, "high")?,
            low: field(&record, 3, "low")?,
            close: field(&record, 4, "close")?,
            volume: field(&record, 5, "volume")?,
            indicators: IndicatorSnapshot::default(),
        };
        if bar.high < bar.low {
            return Err(BracketeerError::Import {
                reason: format!("high below low at {}", bar.timestamp.format(TIMESTAMP_FORMAT)),
            });
        }
        bars.push(bar);
    }

    Ok(bars)
}
