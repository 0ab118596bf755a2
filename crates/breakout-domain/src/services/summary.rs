use crate::services::breakout::BreakoutEvent;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakoutSummary {
    pub total: usize,
    pub average_return_pct: f64,
    pub win_rate_pct: f64,
    pub best_return_pct: f64,
    pub worst_return_pct: f64,
}

impl BreakoutSummary {
    /// Statistics over the forward returns as reported (two decimals), so a
    /// printed table and its summary agree. `None` for an empty list.
    pub fn from_events(events: &[BreakoutEvent]) -> Option<Self> {
        let returns: Vec<f64> = events
            .iter()
            .map(|event| round2(event.holding_return_pct))
            .collect();
        Self::from_returns(&returns)
    }

    pub fn from_returns(returns_pct: &[f64]) -> Option<Self> {
        if returns_pct.is_empty() {
            return None;
        }
        let n = returns_pct.len() as f64;
        let wins = returns_pct.iter().filter(|r| **r > 0.0).count();
        Some(Self {
            total: returns_pct.len(),
            average_return_pct: returns_pct.iter().sum::<f64>() / n,
            win_rate_pct: wins as f64 / n * 100.0,
            best_return_pct: returns_pct.iter().copied().fold(f64::MIN, f64::max),
            worst_return_pct: returns_pct.iter().copied().fold(f64::MAX, f64::min),
        })
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::{round2, BreakoutSummary};
    use crate::services::breakout::BreakoutEvent;

    fn event(ret: f64) -> BreakoutEvent {
        BreakoutEvent {
            timestamp: 0,
            volume: 1.0,
            avg_volume: 1.0,
            volume_pct_above_avg: 0.0,
            price_change_pct: 0.0,
            entry_price: 1.0,
            exit_price: 1.0,
            holding_return_pct: ret,
        }
    }

    #[test]
    fn summary_matches_manual_calculation() {
        let events = vec![event(4.0), event(-2.0), event(1.0), event(0.0)];
        let summary = BreakoutSummary::from_events(&events).expect("summary");
        assert_eq!(summary.total, 4);
        assert!((summary.average_return_pct - 0.75).abs() < 1e-12);
        assert!((summary.win_rate_pct - 50.0).abs() < 1e-12);
        assert!((summary.best_return_pct - 4.0).abs() < 1e-12);
        assert!((summary.worst_return_pct + 2.0).abs() < 1e-12);
    }

    #[test]
    fn tiny_gains_round_to_flat_and_do_not_count_as_wins() {
        let summary = BreakoutSummary::from_events(&[event(0.004)]).expect("summary");
        assert_eq!(summary.win_rate_pct, 0.0);
        assert_eq!(summary.best_return_pct, 0.0);
    }

    #[test]
    fn empty_events_have_no_summary() {
        assert!(BreakoutSummary::from_events(&[]).is_none());
    }

    #[test]
    fn round2_rounds_half_away_from_zero() {
        assert_eq!(round2(1.005_000_1), 1.01);
        assert_eq!(round2(-2.346), -2.35);
        assert_eq!(round2(3.0), 3.0);
    }
}
