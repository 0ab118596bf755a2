use breakout_domain::services::ohlcv::{canonicalize_bars, DataQualityReport};
use breakout_domain::value_objects::bar::{date_from_timestamp, format_timestamp_date, timestamp_from_date, Bar};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

pub const OHLCV_HEADER: [&str; 6] = ["timestamp_utc", "open", "high", "low", "close", "volume"];

#[derive(Debug, Deserialize)]
pub struct OhlcvRecord {
    #[serde(alias = "date", alias = "Date", alias = "timestamp")]
    pub timestamp_utc: String,
    #[serde(alias = "Open")]
    pub open: f64,
    #[serde(alias = "High")]
    pub high: f64,
    #[serde(alias = "Low")]
    pub low: f64,
    #[serde(alias = "Close")]
    pub close: f64,
    #[serde(alias = "Volume")]
    pub volume: f64,
}

/// Loads a daily OHLCV CSV. Timestamps are truncated to their UTC date, rows
/// are sorted, and duplicates/invalid closes are dropped and reported.
pub fn load_csv(path: &Path, symbol: &str) -> Result<(Vec<Bar>, DataQualityReport), String> {
    let file = File::open(path)
        .map_err(|err| format!("failed to open OHLCV CSV {}: {}", path.display(), err))?;
    let mut reader = csv::Reader::from_reader(file);

    let mut bars = Vec::new();
    for result in reader.deserialize::<OhlcvRecord>() {
        let record = result.map_err(|err| {
            format!("failed to parse CSV row in {}: {}", path.display(), err)
        })?;
        let timestamp = parse_timestamp(&record.timestamp_utc)?;
        let session = date_from_timestamp(timestamp)
            .map(timestamp_from_date)
            .unwrap_or(timestamp);
        bars.push(Bar {
            symbol: symbol.to_string(),
            timestamp: session,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume,
        });
    }

    Ok(canonicalize_bars(bars))
}

pub fn write_csv(path: &Path, bars: &[Bar]) -> Result<(), String> {
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|err| format!("failed to create OHLCV CSV {}: {}", path.display(), err))?;
    wtr.write_record(OHLCV_HEADER)
        .map_err(|err| format!("failed to write OHLCV CSV header: {}", err))?;

    for bar in bars {
        wtr.write_record([
            format_timestamp_date(bar.timestamp),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
        ])
        .map_err(|err| format!("failed to write OHLCV row: {}", err))?;
    }

    wtr.flush()
        .map_err(|err| format!("failed to flush OHLCV CSV {}: {}", path.display(), err))
}

fn parse_timestamp(value: &str) -> Result<i64, String> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.timestamp());
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%z") {
        return Ok(dt.timestamp());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        let dt: DateTime<Utc> = Utc.from_utc_datetime(&naive);
        return Ok(dt.timestamp());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(timestamp_from_date(date));
    }

    Err(format!("unsupported timestamp format: {}", value))
}
