use breakout_domain::repositories::artifacts::BreakoutTable;
use breakout_domain::services::breakout::BreakoutEvent;
use breakout_domain::services::summary::{round2, BreakoutSummary};
use breakout_domain::value_objects::bar::{format_timestamp_date, timestamp_from_date};
use breakout_domain::value_objects::breakout_params::{parse_days_label, BreakoutParams};
use breakout_domain::value_objects::date_range::parse_date;
use std::fs;
use std::io::Write;
use std::path::Path;

pub const BREAKOUT_COLUMN_COUNT: usize = 8;

/// Column labels of the breakout export, in order.
pub fn breakout_headers(params: &BreakoutParams) -> [String; BREAKOUT_COLUMN_COUNT] {
    [
        "Breakout Date".to_string(),
        "Volume".to_string(),
        params.avg_volume_column_label(),
        "Volume % Above Avg".to_string(),
        "Price Change %".to_string(),
        "Entry Price".to_string(),
        "Exit Price".to_string(),
        params.return_column_label(),
    ]
}

/// One export row: volumes truncated to whole shares, everything else to two
/// decimals with the same half-away-from-zero rule as the summary.
pub fn format_breakout_row(event: &BreakoutEvent) -> [String; BREAKOUT_COLUMN_COUNT] {
    [
        format_timestamp_date(event.timestamp),
        format!("{}", event.volume.trunc() as i64),
        format!("{}", event.avg_volume.trunc() as i64),
        format_2dp(event.volume_pct_above_avg),
        format_2dp(event.price_change_pct),
        format_2dp(event.entry_price),
        format_2dp(event.exit_price),
        format_2dp(event.holding_return_pct),
    ]
}

fn format_2dp(value: f64) -> String {
    format!("{:.2}", round2(value))
}

pub fn write_breakouts_csv(
    path: &Path,
    events: &[BreakoutEvent],
    params: &BreakoutParams,
) -> Result<(), String> {
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|err| format!("failed to create breakouts csv {}: {}", path.display(), err))?;
    wtr.write_record(breakout_headers(params))
        .map_err(|err| format!("failed to write breakouts csv header: {}", err))?;

    for event in events {
        wtr.write_record(format_breakout_row(event))
            .map_err(|err| format!("failed to write breakouts row: {}", err))?;
    }

    wtr.flush()
        .map_err(|err| format!("failed to flush breakouts csv: {}", err))
}

pub fn read_breakouts_csv(path: &Path) -> Result<BreakoutTable, String> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|err| format!("failed to open breakouts csv {}: {}", path.display(), err))?;
    let headers = reader
        .headers()
        .map_err(|err| format!("failed to read breakouts csv header: {}", err))?
        .clone();
    if headers.len() != BREAKOUT_COLUMN_COUNT {
        return Err(format!(
            "unexpected breakouts csv header in {}: expected {} columns, got {}",
            path.display(),
            BREAKOUT_COLUMN_COUNT,
            headers.len()
        ));
    }
    let volume_window = headers
        .get(2)
        .and_then(|label| parse_days_label(label, "Avg Volume"))
        .ok_or_else(|| format!("missing '{{N}}d Avg Volume' column in {}", path.display()))?;
    let holding_period = headers
        .get(7)
        .and_then(|label| parse_days_label(label, "Return %"))
        .ok_or_else(|| format!("missing '{{N}}d Return %' column in {}", path.display()))?;

    let mut events = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record =
            record.map_err(|err| format!("failed to read breakouts row {}: {}", idx + 1, err))?;
        let field = |col: usize| -> Result<f64, String> {
            let raw = record.get(col).unwrap_or_default().trim();
            raw.parse::<f64>().map_err(|err| {
                format!(
                    "invalid number '{}' in breakouts row {} column {}: {}",
                    raw,
                    idx + 1,
                    col + 1,
                    err
                )
            })
        };
        let date = parse_date(record.get(0).unwrap_or_default())?;
        events.push(BreakoutEvent {
            timestamp: timestamp_from_date(date),
            volume: field(1)?,
            avg_volume: field(2)?,
            volume_pct_above_avg: field(3)?,
            price_change_pct: field(4)?,
            entry_price: field(5)?,
            exit_price: field(6)?,
            holding_return_pct: field(7)?,
        });
    }

    Ok(BreakoutTable {
        volume_window,
        holding_period,
        events,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryMeta {
    pub symbol: String,
    pub start: String,
    pub end: String,
    pub params: BreakoutParams,
}

pub fn summary_json(summary: Option<&BreakoutSummary>, meta: Option<&SummaryMeta>) -> serde_json::Value {
    let meta_json = meta.map(|meta| {
        serde_json::json!({
            "symbol": meta.symbol,
            "start": meta.start,
            "end": meta.end,
            "volume_threshold_pct": meta.params.volume_threshold_pct,
            "price_change_threshold_pct": meta.params.price_change_threshold_pct,
            "holding_period": meta.params.holding_period,
            "volume_window": meta.params.volume_window,
        })
    });

    serde_json::json!({
        "meta": meta_json,
        "total_breakouts": summary.map(|s| s.total).unwrap_or(0),
        "average_return_pct": summary.map(|s| round2(s.average_return_pct)),
        "win_rate_pct": summary.map(|s| (s.win_rate_pct * 10.0).round() / 10.0),
        "best_return_pct": summary.map(|s| round2(s.best_return_pct)),
        "worst_return_pct": summary.map(|s| round2(s.worst_return_pct)),
    })
}

pub fn write_summary_json(
    path: &Path,
    summary: Option<&BreakoutSummary>,
    meta: Option<&SummaryMeta>,
) -> Result<(), String> {
    let json = serde_json::to_string_pretty(&summary_json(summary, meta))
        .map_err(|err| format!("failed to serialize summary: {}", err))?;
    let mut file = fs::File::create(path)
        .map_err(|err| format!("failed to create summary {}: {}", path.display(), err))?;
    file.write_all(json.as_bytes())
        .and_then(|_| file.write_all(b"\n"))
        .map_err(|err| format!("failed to write summary {}: {}", path.display(), err))
}
