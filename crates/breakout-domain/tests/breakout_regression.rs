use breakout_domain::services::breakout::scan;
use breakout_domain::services::ohlcv::canonicalize_bars;
use breakout_domain::services::summary::BreakoutSummary;
use breakout_domain::value_objects::bar::{format_timestamp_date, timestamp_from_date, Bar};
use breakout_domain::value_objects::breakout_params::BreakoutParams;
use chrono::{Duration, NaiveDate};

fn make_bar(day: i64, close: f64, volume: f64) -> Bar {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
    Bar {
        symbol: "ACME".to_string(),
        timestamp: timestamp_from_date(start + Duration::days(day)),
        open: close,
        high: close,
        low: close,
        close,
        volume,
    }
}

/// 45 sessions: flat until a volume spike on day 25, a steady climb after it,
/// and a second spike on day 40 too close to the end to be held 10 days.
fn fixture() -> Vec<Bar> {
    (0..45)
        .map(|day| {
            let close = if day < 25 {
                100.0
            } else if day == 40 {
                125.0
            } else {
                105.0 + (day - 25) as f64
            };
            let volume = match day {
                25 => 10_000.0,
                40 => 50_000.0,
                _ => 1_000.0,
            };
            make_bar(day, close, volume)
        })
        .collect()
}

#[test]
fn default_parameters_find_the_held_breakout() {
    let bars = fixture();
    let result = scan(&bars, &BreakoutParams::default());

    assert_eq!(result.flagged_sessions(), 2);
    assert_eq!(result.events.len(), 1);

    let event = &result.events[0];
    assert_eq!(format_timestamp_date(event.timestamp), "2024-01-26");
    assert!((event.avg_volume - 1_450.0).abs() < 1e-9);
    assert!((event.volume_pct_above_avg - (10_000.0 / 1_450.0 - 1.0) * 100.0).abs() < 1e-9);
    assert!((event.price_change_pct - 5.0).abs() < 1e-9);
    assert!((event.entry_price - 105.0).abs() < 1e-12);
    assert!((event.exit_price - 115.0).abs() < 1e-12);
    assert!((event.holding_return_pct - 10.0 / 105.0 * 100.0).abs() < 1e-9);

    let summary = BreakoutSummary::from_events(&result.events).expect("summary");
    assert_eq!(summary.total, 1);
    assert!((summary.average_return_pct - 9.52).abs() < 1e-9);
    assert!((summary.win_rate_pct - 100.0).abs() < 1e-9);
    assert_eq!(summary.best_return_pct, summary.worst_return_pct);
}

#[test]
fn shorter_holding_period_keeps_the_late_breakout() {
    let bars = fixture();
    let params = BreakoutParams {
        holding_period: 4,
        ..BreakoutParams::default()
    };
    let result = scan(&bars, &params);
    assert_eq!(result.events.len(), 2);
    let late = &result.events[1];
    assert_eq!(format_timestamp_date(late.timestamp), "2024-02-10");
    assert!((late.exit_price - 124.0).abs() < 1e-12);
    assert!(late.holding_return_pct < 0.0);

    let summary = BreakoutSummary::from_events(&result.events).expect("summary");
    assert!((summary.win_rate_pct - 50.0).abs() < 1e-9);
}

#[test]
fn raising_the_volume_threshold_filters_the_smaller_spike() {
    let bars = fixture();
    let params = BreakoutParams {
        volume_threshold_pct: 700.0,
        holding_period: 4,
        ..BreakoutParams::default()
    };
    let result = scan(&bars, &params);
    assert_eq!(result.flagged_sessions(), 1);
    assert_eq!(format_timestamp_date(result.events[0].timestamp), "2024-02-10");
}

#[test]
fn shuffled_input_is_canonicalized_before_scanning() {
    let mut bars = fixture();
    bars.reverse();
    bars.push(bars[0].clone());
    let (canonical, report) = canonicalize_bars(bars);
    assert_eq!(canonical.len(), 45);
    assert_eq!(report.duplicates, 1);
    assert!(report.out_of_order > 0);

    let result = scan(&canonical, &BreakoutParams::default());
    assert_eq!(result.events.len(), 1);
}
