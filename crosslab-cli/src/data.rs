//! Candle CSV loading.
//!
//! Accepts the collector's export format: one row per candle with columns
//! `open_time, open, high, low, close, volume`. The `open_time` cell may be
//! epoch milliseconds or a naive datetime; rows keep their file order and
//! the engine re-validates ordering.

use std::path::Path;

use chrono::{DateTime, NaiveDateTime};
use crosslab_core::indicators::Candle;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {path}: {source}")]
    Csv { path: String, source: csv::Error },
    #[error("row {row}: unrecognized open_time '{value}'")]
    Timestamp { row: usize, value: String },
}

#[derive(Debug, Deserialize)]
struct CandleRow {
    open_time: String,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: Decimal,
}

/// Parse an `open_time` cell: epoch milliseconds or a naive datetime
/// (`%Y-%m-%d %H:%M:%S`, T-separated accepted).
pub fn parse_open_time(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(ms) = raw.parse::<i64>() {
        return DateTime::from_timestamp_millis(ms).map(|dt| dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

/// Load candles from a CSV file, preserving row order.
pub fn load_candles(path: &Path) -> Result<Vec<Candle>, DataError> {
    let csv_err = |source| DataError::Csv {
        path: path.display().to_string(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(csv_err)?;

    let mut candles = Vec::new();
    for (i, row) in reader.deserialize::<CandleRow>().enumerate() {
        let row = row.map_err(csv_err)?;
        let open_time = parse_open_time(&row.open_time).ok_or_else(|| DataError::Timestamp {
            // Line number in the file: header plus 1-based data rows.
            row: i + 2,
            value: row.open_time.clone(),
        })?;
        candles.push(Candle {
            open_time,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }
    Ok(candles)
}
