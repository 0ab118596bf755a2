use crate::analysis::BreakoutAnalysis;
use breakout_domain::repositories::artifacts::{ArtifactReader, ArtifactWriter};
use breakout_domain::services::summary::BreakoutSummary;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info_span;

pub fn export_file_name(symbol: &str) -> String {
    format!("{symbol}_breakout_analysis.csv")
}

pub fn summary_file_name(symbol: &str) -> String {
    format!("{symbol}_breakout_summary.json")
}

/// Label/value pairs shown above a results table.
pub fn summary_metrics(summary: &BreakoutSummary, holding_period: usize) -> Vec<(String, String)> {
    vec![
        ("Total Breakouts".to_string(), summary.total.to_string()),
        (
            format!("Average {holding_period}-day Return"),
            format!("{:.2}%", summary.average_return_pct),
        ),
        ("Win Rate".to_string(), format!("{:.1}%", summary.win_rate_pct)),
        ("Best Return".to_string(), format!("{:.2}%", summary.best_return_pct)),
        ("Worst Return".to_string(), format!("{:.2}%", summary.worst_return_pct)),
    ]
}

pub fn summary_meta_json(analysis: &BreakoutAnalysis) -> serde_json::Value {
    serde_json::json!({
        "symbol": analysis.symbol,
        "start": analysis.range.start.to_string(),
        "end": analysis.range.end.to_string(),
        "volume_threshold_pct": analysis.params.volume_threshold_pct,
        "price_change_threshold_pct": analysis.params.price_change_threshold_pct,
        "holding_period": analysis.params.holding_period,
        "volume_window": analysis.params.volume_window,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportResult {
    pub csv_path: PathBuf,
    pub summary_path: Option<PathBuf>,
    pub rows: usize,
}

/// Writes `{SYMBOL}_breakout_analysis.csv` into `out_dir` and, with
/// `with_summary`, `{SYMBOL}_breakout_summary.json` next to it.
pub fn export_results(
    analysis: &BreakoutAnalysis,
    out_dir: &Path,
    writer: &dyn ArtifactWriter,
    with_summary: bool,
) -> Result<ExportResult, String> {
    let _span = info_span!(
        "export_results",
        symbol = %analysis.symbol,
        out_dir = %out_dir.display(),
        rows = analysis.events.len()
    )
    .entered();

    let stage_start = Instant::now();
    writer.ensure_dir(out_dir)?;

    let csv_path = out_dir.join(export_file_name(&analysis.symbol));
    writer.write_breakouts_csv(&csv_path, &analysis.events, &analysis.params)?;

    let summary_path = if with_summary {
        let path = out_dir.join(summary_file_name(&analysis.symbol));
        let meta = summary_meta_json(analysis);
        writer.write_summary_json(&path, analysis.summary.as_ref(), Some(&meta))?;
        Some(path)
    } else {
        None
    };

    metrics::histogram!("breakout.export.write_ms")
        .record(stage_start.elapsed().as_millis() as f64);
    tracing::info!(path = %csv_path.display(), "breakouts exported");

    Ok(ExportResult {
        csv_path,
        summary_path,
        rows: analysis.events.len(),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub holding_period: usize,
    pub volume_window: usize,
    pub breakouts: usize,
    pub summary: Option<BreakoutSummary>,
}

/// Recomputes summary statistics from a previously exported breakout CSV.
pub fn summarize_export(path: &Path, reader: &dyn ArtifactReader) -> Result<ExportSummary, String> {
    let _span = info_span!("summarize_export", path = %path.display()).entered();

    if !reader.exists(path) {
        return Err(format!("breakout export not found: {}", path.display()));
    }
    let table = reader.read_breakouts_csv(path)?;
    let returns: Vec<f64> = table
        .events
        .iter()
        .map(|event| event.holding_return_pct)
        .collect();
    let summary = BreakoutSummary::from_returns(&returns);
    metrics::gauge!("breakout.report.breakouts").set(table.events.len() as f64);

    Ok(ExportSummary {
        path: path.to_path_buf(),
        holding_period: table.holding_period,
        volume_window: table.volume_window,
        breakouts: table.events.len(),
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::{export_file_name, summary_metrics};
    use breakout_domain::services::summary::BreakoutSummary;

    #[test]
    fn summary_metrics_use_report_precision() {
        let summary = BreakoutSummary::from_returns(&[9.52, -1.0, 2.0]).expect("summary");
        let metrics = summary_metrics(&summary, 10);
        assert_eq!(metrics[0], ("Total Breakouts".to_string(), "3".to_string()));
        assert_eq!(metrics[1], ("Average 10-day Return".to_string(), "3.51%".to_string()));
        assert_eq!(metrics[2].1, "66.7%");
        assert_eq!(metrics[3].1, "9.52%");
        assert_eq!(metrics[4].1, "-1.00%");
    }

    #[test]
    fn export_name_uses_symbol() {
        assert_eq!(export_file_name("MSFT"), "MSFT_breakout_analysis.csv");
    }
}
