use breakout_domain::value_objects::breakout_params::{
    BreakoutParams, DEFAULT_HOLDING_PERIOD, DEFAULT_PRICE_CHANGE_THRESHOLD_PCT,
    DEFAULT_VOLUME_THRESHOLD_PCT, DEFAULT_VOLUME_WINDOW,
};
use breakout_domain::value_objects::date_range::DEFAULT_LOOKBACK_DAYS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_SYMBOL: &str = "AAPL";
pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_CACHE_DIR: &str = ".cache";

/// Every section and field has a default, so an empty file is a valid config.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub data: DataConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub symbol: String,
    /// `YYYY-MM-DD`; defaults to `end - lookback_days`.
    pub start: Option<String>,
    /// `YYYY-MM-DD`, exclusive; defaults to today.
    pub end: Option<String>,
    pub lookback_days: i64,
    pub volume_threshold_pct: f64,
    pub price_change_threshold_pct: f64,
    pub holding_period: usize,
    pub volume_window: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            symbol: DEFAULT_SYMBOL.to_string(),
            start: None,
            end: None,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            volume_threshold_pct: DEFAULT_VOLUME_THRESHOLD_PCT,
            price_change_threshold_pct: DEFAULT_PRICE_CHANGE_THRESHOLD_PCT,
            holding_period: DEFAULT_HOLDING_PERIOD,
            volume_window: DEFAULT_VOLUME_WINDOW,
        }
    }
}

impl AnalysisConfig {
    pub fn params(&self) -> BreakoutParams {
        BreakoutParams {
            volume_threshold_pct: self.volume_threshold_pct,
            price_change_threshold_pct: self.price_change_threshold_pct,
            holding_period: self.holding_period,
            volume_window: self.volume_window,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    #[default]
    Yahoo,
    Csv,
}

impl DataSource {
    pub fn label(&self) -> &'static str {
        match self {
            DataSource::Yahoo => "yahoo",
            DataSource::Csv => "csv",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    pub source: DataSource,
    pub base_url: String,
    pub csv_path: Option<String>,
    pub timeout_ms: u64,
    pub retries: u32,
    pub cache_dir: String,
    pub cache_ttl_hours: u64,
    pub cache_enabled: bool,
}

impl DataConfig {
    pub fn required_csv_path(&self) -> Result<&str, String> {
        self.csv_path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| "data.csv_path is required when data.source = \"csv\"".to_string())
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            source: DataSource::Yahoo,
            base_url: DEFAULT_BASE_URL.to_string(),
            csv_path: None,
            timeout_ms: 10_000,
            retries: 2,
            cache_dir: DEFAULT_CACHE_DIR.to_string(),
            cache_ttl_hours: 24,
            cache_enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub out_dir: String,
    pub summary_json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            out_dir: ".".to_string(),
            summary_json: false,
        }
    }
}

pub fn parse_config(contents: &str) -> Result<Config, String> {
    toml::from_str(contents).map_err(|err| format!("failed to parse TOML: {}", err))
}

pub fn load_config(path: &Path) -> Result<Config, String> {
    load_config_with_source(path).map(|(config, _)| config)
}

pub fn load_config_with_source(path: &Path) -> Result<(Config, String), String> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read config {}: {}", path.display(), err))?;
    let config = toml::from_str(&contents)
        .map_err(|err| format!("failed to parse TOML {}: {}", path.display(), err))?;
    Ok((config, contents))
}
