use crate::value_objects::bar::Bar;
use serde::Serialize;
use std::collections::BTreeMap;

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct DataQualityReport {
    pub rows: usize,
    pub duplicates: usize,
    pub out_of_order: usize,
    pub invalid_close: usize,
    pub first_timestamp: Option<i64>,
    pub last_timestamp: Option<i64>,
    pub first_duplicate: Option<i64>,
    pub first_out_of_order: Option<i64>,
    pub first_invalid_close: Option<i64>,
    pub max_gap_days: Option<i64>,
}

impl DataQualityReport {
    pub fn is_clean(&self) -> bool {
        self.duplicates == 0 && self.out_of_order == 0 && self.invalid_close == 0
    }

    /// Adds the defect counters of `other`; bounds are taken from `self`.
    pub fn absorb_defects(&mut self, other: &DataQualityReport) {
        self.duplicates += other.duplicates;
        self.out_of_order += other.out_of_order;
        self.invalid_close += other.invalid_close;
        self.first_duplicate = self.first_duplicate.or(other.first_duplicate);
        self.first_out_of_order = self.first_out_of_order.or(other.first_out_of_order);
        self.first_invalid_close = self.first_invalid_close.or(other.first_invalid_close);
    }
}

pub fn data_quality_from_bars(bars: &[Bar]) -> DataQualityReport {
    let mut report = DataQualityReport {
        rows: bars.len(),
        ..DataQualityReport::default()
    };
    if bars.is_empty() {
        return report;
    }

    report.first_timestamp = Some(bars[0].timestamp);

    let mut last_ts: Option<i64> = None;
    let mut max_gap: Option<i64> = None;

    for bar in bars {
        let ts = bar.timestamp;

        if !bar.close.is_finite() || bar.close <= 0.0 {
            report.invalid_close += 1;
            if report.first_invalid_close.is_none() {
                report.first_invalid_close = Some(ts);
            }
        }

        if let Some(prev) = last_ts {
            if ts == prev {
                report.duplicates += 1;
                if report.first_duplicate.is_none() {
                    report.first_duplicate = Some(ts);
                }
            } else if ts < prev {
                report.out_of_order += 1;
                if report.first_out_of_order.is_none() {
                    report.first_out_of_order = Some(ts);
                }
            } else {
                let days = (ts - prev) / SECONDS_PER_DAY;
                max_gap = Some(max_gap.map_or(days, |current| current.max(days)));
            }
        }

        last_ts = Some(ts);
        report.last_timestamp = Some(ts);
    }

    report.max_gap_days = max_gap;
    report
}

/// Sorts by timestamp, keeps the last row seen per timestamp and drops rows
/// with a non-positive close. Defect counters describe the input as received;
/// `rows` and the bounds describe the canonical output.
pub fn canonicalize_bars(bars: Vec<Bar>) -> (Vec<Bar>, DataQualityReport) {
    let mut report = data_quality_from_bars(&bars);
    let mut by_ts: BTreeMap<i64, Bar> = BTreeMap::new();
    let mut duplicates = 0usize;
    let mut first_duplicate: Option<i64> = None;
    for bar in bars {
        if !bar.close.is_finite() || bar.close <= 0.0 {
            continue;
        }
        let ts = bar.timestamp;
        if by_ts.insert(ts, bar).is_some() {
            duplicates += 1;
            first_duplicate.get_or_insert(ts);
        }
    }

    let canonical: Vec<Bar> = by_ts.into_values().collect();
    let clean = data_quality_from_bars(&canonical);
    report.duplicates = duplicates;
    report.first_duplicate = first_duplicate;
    report.rows = clean.rows;
    report.first_timestamp = clean.first_timestamp;
    report.last_timestamp = clean.last_timestamp;
    report.max_gap_days = clean.max_gap_days;
    (canonical, report)
}

#[cfg(test)]
mod tests {
    use super::{canonicalize_bars, data_quality_from_bars};
    use crate::value_objects::bar::Bar;

    fn bar(day: i64, close: f64) -> Bar {
        Bar {
            symbol: "AAPL".to_string(),
            timestamp: day * 86_400,
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000.0,
        }
    }

    #[test]
    fn report_counts_defects() {
        let bars = vec![bar(1, 10.0), bar(1, 11.0), bar(5, 0.0), bar(3, 12.0)];
        let report = data_quality_from_bars(&bars);
        assert_eq!(report.rows, 4);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.out_of_order, 1);
        assert_eq!(report.invalid_close, 1);
        assert_eq!(report.first_invalid_close, Some(5 * 86_400));
        assert_eq!(report.max_gap_days, Some(4));
        assert!(!report.is_clean());
    }

    #[test]
    fn canonicalize_sorts_dedups_and_drops_invalid() {
        let bars = vec![bar(3, 12.0), bar(1, 10.0), bar(2, -1.0), bar(1, 11.0)];
        let (canonical, report) = canonicalize_bars(bars);
        assert_eq!(canonical.len(), 2);
        assert_eq!(canonical[0].timestamp, 86_400);
        assert!((canonical[0].close - 11.0).abs() < 1e-9);
        assert_eq!(canonical[1].timestamp, 3 * 86_400);
        assert_eq!(report.rows, 2);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.first_duplicate, Some(86_400));
        assert_eq!(report.out_of_order, 2);
        assert_eq!(report.invalid_close, 1);
        assert_eq!(report.first_timestamp, Some(86_400));
        assert_eq!(report.last_timestamp, Some(3 * 86_400));
    }

    #[test]
    fn empty_input_yields_empty_report() {
        let (bars, report) = canonicalize_bars(Vec::new());
        assert!(bars.is_empty());
        assert_eq!(report.rows, 0);
        assert!(report.first_timestamp.is_none());
    }
}
