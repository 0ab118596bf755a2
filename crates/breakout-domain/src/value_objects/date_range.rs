use crate::value_objects::bar::timestamp_from_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_LOOKBACK_DAYS: i64 = 365;

/// Calendar date range with an exclusive end: `start <= date < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, String> {
        if start >= end {
            return Err(format!(
                "start date {start} must be before end date {end}"
            ));
        }
        Ok(Self { start, end })
    }

    /// Rejects ranges reaching past `today`.
    pub fn ensure_not_future(&self, today: NaiveDate) -> Result<(), String> {
        if self.start > today {
            return Err(format!(
                "start date {} is in the future (today is {today})",
                self.start
            ));
        }
        if self.end > today {
            return Err(format!(
                "end date {} is in the future (today is {today})",
                self.end
            ));
        }
        Ok(())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    pub fn contains_timestamp(&self, timestamp: i64) -> bool {
        timestamp >= self.start_timestamp() && timestamp < self.end_timestamp()
    }

    pub fn start_timestamp(&self) -> i64 {
        timestamp_from_date(self.start)
    }

    pub fn end_timestamp(&self) -> i64 {
        timestamp_from_date(self.end)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} and {}", self.start, self.end)
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|err| format!("invalid date '{value}' (expected YYYY-MM-DD): {err}"))
}
