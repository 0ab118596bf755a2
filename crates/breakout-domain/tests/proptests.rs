use breakout_domain::services::breakout::{annotate, scan};
use breakout_domain::services::rolling::rolling_mean;
use breakout_domain::services::summary::BreakoutSummary;
use breakout_domain::value_objects::bar::Bar;
use breakout_domain::value_objects::breakout_params::BreakoutParams;
use proptest::prelude::*;

fn bars_from(closes: &[f64], volumes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .zip(volumes.iter())
        .enumerate()
        .map(|(idx, (close, volume))| Bar {
            symbol: "PROP".to_string(),
            timestamp: idx as i64 * 86_400,
            open: *close,
            high: *close,
            low: *close,
            close: *close,
            volume: *volume,
        })
        .collect()
}

fn naive_mean(values: &[f64], end: usize, window: usize) -> Option<f64> {
    if end + 1 < window {
        return None;
    }
    let slice = &values[end + 1 - window..=end];
    Some(slice.iter().sum::<f64>() / window as f64)
}

fn series() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    (2usize..120).prop_flat_map(|len| {
        (
            prop::collection::vec(1.0f64..500.0, len),
            prop::collection::vec(0.0f64..5_000_000.0, len),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn rolling_mean_matches_reference(values in prop::collection::vec(0.0f64..1e7, 0..150), window in 1usize..30) {
        let fast = rolling_mean(&values, window);
        prop_assert_eq!(fast.len(), values.len());
        for (idx, got) in fast.iter().enumerate() {
            match (got, naive_mean(&values, idx, window)) {
                (Some(a), Some(b)) => prop_assert!((a - b).abs() <= 1e-3),
                (None, None) => {}
                (a, b) => prop_assert!(false, "mismatch at {}: {:?} vs {:?}", idx, a, b),
            }
        }
    }

    #[test]
    fn breakout_flag_is_monotonic_in_volume_threshold(
        (closes, volumes) in series(),
        low in 50.0f64..400.0,
        bump in 0.0f64..400.0,
    ) {
        let bars = bars_from(&closes, &volumes);
        let loose = BreakoutParams { volume_threshold_pct: low, price_change_threshold_pct: 0.1, holding_period: 1, volume_window: 5 };
        let strict = BreakoutParams { volume_threshold_pct: low + bump, ..loose };
        let loose_rows = annotate(&bars, &loose);
        let strict_rows = annotate(&bars, &strict);
        for (l, s) in loose_rows.iter().zip(strict_rows.iter()) {
            prop_assert!(!s.is_breakout || l.is_breakout);
        }
    }

    #[test]
    fn breakout_flag_is_monotonic_in_price_threshold(
        (closes, volumes) in series(),
        low in 0.1f64..10.0,
        bump in 0.0f64..10.0,
    ) {
        let bars = bars_from(&closes, &volumes);
        let loose = BreakoutParams { volume_threshold_pct: 50.0, price_change_threshold_pct: low, holding_period: 1, volume_window: 3 };
        let strict = BreakoutParams { price_change_threshold_pct: low + bump, ..loose };
        let loose_rows = annotate(&bars, &loose);
        let strict_rows = annotate(&bars, &strict);
        for (l, s) in loose_rows.iter().zip(strict_rows.iter()) {
            prop_assert!(!s.is_breakout || l.is_breakout);
        }
    }

    #[test]
    fn events_respect_window_and_holding_bounds(
        (closes, volumes) in series(),
        window in 1usize..25,
        holding_period in 1usize..15,
    ) {
        let bars = bars_from(&closes, &volumes);
        let params = BreakoutParams { volume_threshold_pct: 50.0, price_change_threshold_pct: 0.1, holding_period, volume_window: window };
        let result = scan(&bars, &params);

        prop_assert!(result.events.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        for event in &result.events {
            let idx = (event.timestamp / 86_400) as usize;
            prop_assert!(idx + 1 >= window);
            prop_assert!(idx >= 1);
            prop_assert!(idx + holding_period < bars.len());
            let expected = (bars[idx + holding_period].close - bars[idx].close) / bars[idx].close * 100.0;
            prop_assert!((event.holding_return_pct - expected).abs() < 1e-9);
            prop_assert!(event.volume > event.avg_volume * 1.5);
            prop_assert!(event.price_change_pct > 0.1 - 1e-9);
        }
    }

    #[test]
    fn summary_is_bounded(returns in prop::collection::vec(-100.0f64..500.0, 1..60)) {
        let summary = BreakoutSummary::from_returns(&returns).expect("non-empty");
        prop_assert_eq!(summary.total, returns.len());
        prop_assert!((0.0..=100.0).contains(&summary.win_rate_pct));
        prop_assert!(summary.worst_return_pct <= summary.average_return_pct + 1e-9);
        prop_assert!(summary.average_return_pct <= summary.best_return_pct + 1e-9);
    }
}
