use crate::shared::normalize_symbol;
use breakout_domain::repositories::market_data::{MarketDataRepository, OhlcvQuery};
use breakout_domain::services::breakout::{scan, AnnotatedBar, BreakoutEvent};
use breakout_domain::services::ohlcv::DataQualityReport;
use breakout_domain::services::summary::BreakoutSummary;
use breakout_domain::value_objects::breakout_params::BreakoutParams;
use breakout_domain::value_objects::date_range::DateRange;
use chrono::NaiveDate;
use std::time::Instant;
use tracing::info_span;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeRequest {
    pub symbol: String,
    pub start: NaiveDate,
    /// Exclusive.
    pub end: NaiveDate,
    pub params: BreakoutParams,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BreakoutAnalysis {
    pub symbol: String,
    pub range: DateRange,
    pub params: BreakoutParams,
    pub rows: Vec<AnnotatedBar>,
    pub events: Vec<BreakoutEvent>,
    pub summary: Option<BreakoutSummary>,
    pub data_quality: DataQualityReport,
}

impl BreakoutAnalysis {
    pub fn sessions(&self) -> usize {
        self.rows.len()
    }

    pub fn flagged_sessions(&self) -> usize {
        self.rows.iter().filter(|row| row.is_breakout).count()
    }

    pub fn has_breakouts(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn no_breakouts_message(&self) -> String {
        format!("No breakout conditions met for {}", self.symbol)
    }
}

/// Checks the request, loads the daily series and scans it for breakouts.
///
/// A range with no sessions is an error; a series without qualifying
/// breakouts is not (the analysis simply has no events).
pub fn analyze_breakouts(
    request: &AnalyzeRequest,
    market_data: &dyn MarketDataRepository,
    today: NaiveDate,
) -> Result<BreakoutAnalysis, String> {
    let symbol = normalize_symbol(&request.symbol)?;
    let _span = info_span!(
        "analyze_breakouts",
        symbol = %symbol,
        start = %request.start,
        end = %request.end,
        volume_threshold_pct = request.params.volume_threshold_pct,
        price_change_threshold_pct = request.params.price_change_threshold_pct,
        holding_period = request.params.holding_period
    )
    .entered();

    let range = DateRange::new(request.start, request.end)?;
    range.ensure_not_future(today)?;
    request.params.validate()?;

    let stage_start = Instant::now();
    let query = OhlcvQuery {
        symbol: symbol.clone(),
        range,
    };
    let (bars, data_quality) = market_data.load_daily(&query).map_err(|err| {
        metrics::counter!("breakout.analyze.runs_total", "result" => "err").increment(1);
        err
    })?;
    metrics::histogram!("breakout.analyze.load_ms")
        .record(stage_start.elapsed().as_millis() as f64);

    if bars.is_empty() {
        metrics::counter!("breakout.analyze.runs_total", "result" => "no_data").increment(1);
        return Err(format!("No data found for {} between {}", symbol, range));
    }
    if !data_quality.is_clean() {
        tracing::warn!(
            duplicates = data_quality.duplicates,
            out_of_order = data_quality.out_of_order,
            invalid_close = data_quality.invalid_close,
            "series had defects; canonicalized before scanning"
        );
    }

    let scan_start = Instant::now();
    let result = scan(&bars, &request.params);
    let summary = BreakoutSummary::from_events(&result.events);
    metrics::histogram!("breakout.analyze.scan_ms")
        .record(scan_start.elapsed().as_secs_f64() * 1000.0);
    metrics::gauge!("breakout.analyze.sessions").set(result.rows.len() as f64);
    metrics::gauge!("breakout.analyze.breakouts").set(result.events.len() as f64);
    metrics::counter!("breakout.analyze.runs_total", "result" => "ok").increment(1);

    tracing::info!(
        sessions = result.rows.len(),
        flagged = result.flagged_sessions(),
        breakouts = result.events.len(),
        "analysis complete"
    );

    Ok(BreakoutAnalysis {
        symbol,
        range,
        params: request.params,
        rows: result.rows,
        events: result.events,
        summary,
        data_quality,
    })
}
