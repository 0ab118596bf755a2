use serde::{Deserialize, Serialize};

pub const DEFAULT_VOLUME_THRESHOLD_PCT: f64 = 200.0;
pub const DEFAULT_PRICE_CHANGE_THRESHOLD_PCT: f64 = 2.0;
pub const DEFAULT_HOLDING_PERIOD: usize = 10;
pub const DEFAULT_VOLUME_WINDOW: usize = 20;

pub const MIN_VOLUME_THRESHOLD_PCT: f64 = 50.0;
pub const MIN_PRICE_CHANGE_THRESHOLD_PCT: f64 = 0.1;

/// Thresholds for flagging a breakout session.
///
/// `volume_threshold_pct = 200` means volume must exceed the trailing average
/// by 200 % (three times the average). `price_change_threshold_pct` is the
/// minimum close-to-close gain in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakoutParams {
    pub volume_threshold_pct: f64,
    pub price_change_threshold_pct: f64,
    pub holding_period: usize,
    pub volume_window: usize,
}

impl Default for BreakoutParams {
    fn default() -> Self {
        Self {
            volume_threshold_pct: DEFAULT_VOLUME_THRESHOLD_PCT,
            price_change_threshold_pct: DEFAULT_PRICE_CHANGE_THRESHOLD_PCT,
            holding_period: DEFAULT_HOLDING_PERIOD,
            volume_window: DEFAULT_VOLUME_WINDOW,
        }
    }
}

impl BreakoutParams {
    pub fn validate(&self) -> Result<(), String> {
        if !self.volume_threshold_pct.is_finite()
            || self.volume_threshold_pct < MIN_VOLUME_THRESHOLD_PCT
        {
            return Err(format!(
                "volume threshold must be a number >= {MIN_VOLUME_THRESHOLD_PCT} (got {})",
                self.volume_threshold_pct
            ));
        }
        if !self.price_change_threshold_pct.is_finite()
            || self.price_change_threshold_pct < MIN_PRICE_CHANGE_THRESHOLD_PCT
        {
            return Err(format!(
                "price change threshold must be a number >= {MIN_PRICE_CHANGE_THRESHOLD_PCT} (got {})",
                self.price_change_threshold_pct
            ));
        }
        if self.holding_period == 0 {
            return Err("holding period must be >= 1 day".to_string());
        }
        if self.volume_window == 0 {
            return Err("volume window must be >= 1 day".to_string());
        }
        Ok(())
    }

    /// Header label of the forward-return column, e.g. `10d Return %`.
    pub fn return_column_label(&self) -> String {
        return_column_label(self.holding_period)
    }

    pub fn avg_volume_column_label(&self) -> String {
        avg_volume_column_label(self.volume_window)
    }
}

pub fn return_column_label(holding_period: usize) -> String {
    format!("{holding_period}d Return %")
}

pub fn avg_volume_column_label(volume_window: usize) -> String {
    format!("{volume_window}d Avg Volume")
}

/// Inverse of the `{N}d ...` column labels.
pub fn parse_days_label(label: &str, suffix: &str) -> Option<usize> {
    label
        .trim()
        .strip_suffix(suffix)?
        .trim_end()
        .strip_suffix('d')?
        .parse()
        .ok()
}
