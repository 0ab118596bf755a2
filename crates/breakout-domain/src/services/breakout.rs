//! Breakout detection over a canonical daily series.
//!
//! A session is a breakout when its volume exceeds the trailing volume average
//! (which includes the session itself) by more than the volume threshold and
//! its close-to-close return exceeds the price threshold. Both comparisons are
//! strict; a missing operand (window not yet full, first session) never flags.

use crate::services::rolling::RollingSma;
use crate::value_objects::bar::Bar;
use crate::value_objects::breakout_params::BreakoutParams;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedBar {
    pub bar: Bar,
    pub volume_ma: Option<f64>,
    pub daily_return: Option<f64>,
    pub volume_ratio_pct: Option<f64>,
    pub is_breakout: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakoutEvent {
    pub timestamp: i64,
    pub volume: f64,
    pub avg_volume: f64,
    pub volume_pct_above_avg: f64,
    pub price_change_pct: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub holding_return_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakoutScan {
    pub rows: Vec<AnnotatedBar>,
    pub events: Vec<BreakoutEvent>,
}

impl BreakoutScan {
    pub fn flagged_sessions(&self) -> usize {
        self.rows.iter().filter(|row| row.is_breakout).count()
    }
}

pub fn annotate(bars: &[Bar], params: &BreakoutParams) -> Vec<AnnotatedBar> {
    let mut volume_sma = RollingSma::new(params.volume_window);
    let volume_factor = 1.0 + params.volume_threshold_pct / 100.0;
    let return_threshold = params.price_change_threshold_pct / 100.0;
    let mut prev_close: Option<f64> = None;

    bars.iter()
        .map(|bar| {
            let volume_ma = volume_sma.update(bar.volume);
            let daily_return = prev_close
                .filter(|prev| prev.is_finite() && *prev > 0.0)
                .map(|prev| bar.close / prev - 1.0)
                .filter(|ret| ret.is_finite());
            prev_close = Some(bar.close);

            let volume_ratio_pct = volume_ma
                .filter(|ma| *ma > 0.0)
                .map(|ma| (bar.volume / ma - 1.0) * 100.0);

            let is_breakout = match (volume_ma, daily_return) {
                (Some(ma), Some(ret)) => bar.volume > ma * volume_factor && ret > return_threshold,
                _ => false,
            };

            AnnotatedBar {
                bar: bar.clone(),
                volume_ma,
                daily_return,
                volume_ratio_pct,
                is_breakout,
            }
        })
        .collect()
}

/// Forward returns for every flagged session. Sessions whose exit would fall
/// past the end of the series are skipped.
pub fn detect_breakouts(rows: &[AnnotatedBar], holding_period: usize) -> Vec<BreakoutEvent> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| row.is_breakout)
        .filter_map(|(idx, row)| {
            let exit = rows.get(idx.checked_add(holding_period)?)?;
            let entry_price = row.bar.close;
            if !entry_price.is_finite() || entry_price <= 0.0 {
                return None;
            }
            let exit_price = exit.bar.close;
            Some(BreakoutEvent {
                timestamp: row.bar.timestamp,
                volume: row.bar.volume,
                avg_volume: row.volume_ma?,
                volume_pct_above_avg: row.volume_ratio_pct?,
                price_change_pct: row.daily_return? * 100.0,
                entry_price,
                exit_price,
                holding_return_pct: (exit_price - entry_price) / entry_price * 100.0,
            })
        })
        .collect()
}

pub fn scan(bars: &[Bar], params: &BreakoutParams) -> BreakoutScan {
    let rows = annotate(bars, params);
    let events = detect_breakouts(&rows, params.holding_period);
    BreakoutScan { rows, events }
}

#[cfg(test)]
mod tests {
    use super::{annotate, detect_breakouts, scan};
    use crate::value_objects::bar::Bar;
    use crate::value_objects::breakout_params::BreakoutParams;

    fn bar(day: i64, close: f64, volume: f64) -> Bar {
        Bar {
            symbol: "TEST".to_string(),
            timestamp: day * 86_400,
            open: close,
            high: close,
            low: close,
            close,
            volume,
        }
    }

    fn params(window: usize, holding_period: usize) -> BreakoutParams {
        BreakoutParams {
            volume_threshold_pct: 100.0,
            price_change_threshold_pct: 2.0,
            holding_period,
            volume_window: window,
        }
    }

    #[test]
    fn first_rows_are_never_flagged() {
        let bars: Vec<Bar> = (0..3).map(|i| bar(i, 10.0 + i as f64 * 5.0, 1e9)).collect();
        let rows = annotate(&bars, &params(3, 1));
        assert!(rows[0].daily_return.is_none());
        assert!(rows[0].volume_ma.is_none());
        assert!(rows[1].volume_ma.is_none());
        assert!(rows.iter().all(|row| !row.is_breakout));
    }

    #[test]
    fn flags_session_above_both_thresholds() {
        // window 3: avg at day 3 = (100 + 100 + 1000) / 3 = 400, factor 2 => needs > 800.
        let bars = vec![
            bar(0, 10.0, 100.0),
            bar(1, 10.0, 100.0),
            bar(2, 10.0, 100.0),
            bar(3, 10.5, 1000.0),
            bar(4, 11.0, 100.0),
            bar(5, 12.0, 100.0),
        ];
        let rows = annotate(&bars, &params(3, 2));
        let row = &rows[3];
        assert!((row.volume_ma.expect("ma") - 400.0).abs() < 1e-9);
        assert!((row.daily_return.expect("ret") - 0.05).abs() < 1e-12);
        assert!((row.volume_ratio_pct.expect("ratio") - 150.0).abs() < 1e-9);
        assert!(row.is_breakout);
        assert_eq!(rows.iter().filter(|r| r.is_breakout).count(), 1);

        let events = detect_breakouts(&rows, 2);
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.timestamp, 3 * 86_400);
        assert!((event.entry_price - 10.5).abs() < 1e-12);
        assert!((event.exit_price - 12.0).abs() < 1e-12);
        assert!((event.holding_return_pct - (12.0 - 10.5) / 10.5 * 100.0).abs() < 1e-9);
        assert!((event.price_change_pct - 5.0).abs() < 1e-9);
    }

    #[test]
    fn thresholds_are_strict() {
        let p = BreakoutParams {
            volume_threshold_pct: 50.0,
            price_change_threshold_pct: 5.0,
            holding_period: 1,
            volume_window: 2,
        };
        // avg = 200, so volume must be > 300.
        let at_threshold = vec![bar(0, 100.0, 100.0), bar(1, 110.0, 300.0)];
        assert!(!annotate(&at_threshold, &p)[1].is_breakout);

        let above = vec![bar(0, 100.0, 100.0), bar(1, 110.0, 301.0)];
        assert!(annotate(&above, &p)[1].is_breakout);

        let flat_price = vec![bar(0, 100.0, 100.0), bar(1, 104.0, 301.0)];
        assert!(!annotate(&flat_price, &p)[1].is_breakout);
    }

    #[test]
    fn breakout_without_full_holding_period_is_skipped() {
        let bars = vec![
            bar(0, 10.0, 100.0),
            bar(1, 10.0, 100.0),
            bar(2, 10.0, 100.0),
            bar(3, 10.5, 1000.0),
            bar(4, 11.0, 100.0),
        ];
        let result = scan(&bars, &params(3, 2));
        assert_eq!(result.flagged_sessions(), 1);
        assert!(result.events.is_empty());

        let result = scan(&bars, &params(3, 1));
        assert_eq!(result.events.len(), 1);
        assert!((result.events[0].exit_price - 11.0).abs() < 1e-12);
    }

    #[test]
    fn empty_series_yields_nothing() {
        let result = scan(&[], &BreakoutParams::default());
        assert!(result.rows.is_empty());
        assert!(result.events.is_empty());
    }
}
