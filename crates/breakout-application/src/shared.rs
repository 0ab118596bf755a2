use crate::analysis::AnalyzeRequest;
use crate::config::{Config, DataSource};
use breakout_domain::repositories::market_data::{MarketDataSource, SeriesCacheSettings};
use breakout_domain::value_objects::breakout_params::BreakoutParams;
use breakout_domain::value_objects::date_range::parse_date;
use chrono::{Duration, NaiveDate};
use std::path::{Path, PathBuf};

pub const CACHE_DIR_ENV: &str = "BREAKOUT_CACHE_DIR";

/// Values supplied on top of a config file (command line or form input).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOverrides {
    pub symbol: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub volume_threshold_pct: Option<f64>,
    pub price_change_threshold_pct: Option<f64>,
    pub holding_period: Option<usize>,
}

/// Builds an analysis request from config values and overrides. The end date
/// defaults to `today`, the start date to `end - lookback_days`. Range and
/// parameter checks are left to the use case.
pub fn resolve_request(
    config: &Config,
    overrides: &RequestOverrides,
    today: NaiveDate,
) -> Result<AnalyzeRequest, String> {
    let analysis = &config.analysis;
    if analysis.lookback_days < 1 {
        return Err(format!(
            "analysis.lookback_days must be >= 1 (got {})",
            analysis.lookback_days
        ));
    }

    let end = match (overrides.end, analysis.end.as_deref()) {
        (Some(end), _) => end,
        (None, Some(raw)) => parse_date(raw).map_err(|err| format!("analysis.end: {err}"))?,
        (None, None) => today,
    };
    let start = match (overrides.start, analysis.start.as_deref()) {
        (Some(start), _) => start,
        (None, Some(raw)) => parse_date(raw).map_err(|err| format!("analysis.start: {err}"))?,
        (None, None) => lookback_start(end, analysis.lookback_days)?,
    };

    let defaults = analysis.params();
    Ok(AnalyzeRequest {
        symbol: overrides
            .symbol
            .clone()
            .unwrap_or_else(|| analysis.symbol.clone()),
        start,
        end,
        params: BreakoutParams {
            volume_threshold_pct: overrides
                .volume_threshold_pct
                .unwrap_or(defaults.volume_threshold_pct),
            price_change_threshold_pct: overrides
                .price_change_threshold_pct
                .unwrap_or(defaults.price_change_threshold_pct),
            holding_period: overrides.holding_period.unwrap_or(defaults.holding_period),
            volume_window: defaults.volume_window,
        },
    })
}

/// `end - days`, or an error when the span does not fit the calendar.
pub fn lookback_start(end: NaiveDate, days: i64) -> Result<NaiveDate, String> {
    Duration::try_days(days)
        .and_then(|span| end.checked_sub_signed(span))
        .ok_or_else(|| format!("analysis.lookback_days too large ({days})"))
}

pub fn normalize_symbol(symbol: &str) -> Result<String, String> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err("symbol must not be empty".to_string());
    }
    if symbol.chars().any(char::is_whitespace) {
        return Err(format!("symbol must not contain whitespace: '{symbol}'"));
    }
    Ok(symbol)
}

/// `data.cache_dir`, unless `BREAKOUT_CACHE_DIR` is set.
pub fn resolve_cache_dir(config: &Config) -> PathBuf {
    match std::env::var(CACHE_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(&config.data.cache_dir),
    }
}

/// `csv_override` wins over `data.source`; the Yahoo source is cached unless
/// `data.cache_enabled = false`.
pub fn market_data_source(
    config: &Config,
    csv_override: Option<&Path>,
    refresh: bool,
) -> Result<MarketDataSource, String> {
    if let Some(path) = csv_override {
        return Ok(MarketDataSource::Csv {
            path: path.to_path_buf(),
        });
    }
    match config.data.source {
        DataSource::Csv => Ok(MarketDataSource::Csv {
            path: PathBuf::from(config.data.required_csv_path()?),
        }),
        DataSource::Yahoo => Ok(MarketDataSource::Yahoo {
            base_url: config.data.base_url.clone(),
            timeout_ms: config.data.timeout_ms,
            retries: config.data.retries,
            cache: config.data.cache_enabled.then(|| SeriesCacheSettings {
                dir: resolve_cache_dir(config),
                ttl: cache_ttl(config),
            }),
            refresh,
        }),
    }
}

pub fn cache_ttl(config: &Config) -> Option<std::time::Duration> {
    match config.data.cache_ttl_hours {
        0 => None,
        hours => Some(std::time::Duration::from_secs(hours * 3600)),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        cache_ttl, lookback_start, market_data_source, normalize_symbol, resolve_request,
        RequestOverrides,
    };
    use breakout_domain::repositories::market_data::MarketDataSource;
    use std::path::{Path, PathBuf};
    use crate::config::{parse_config, Config};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("date")
    }

    #[test]
    fn defaults_cover_trailing_year() {
        let request = resolve_request(
            &Config::default(),
            &RequestOverrides::default(),
            date(2025, 3, 1),
        )
        .expect("request");
        assert_eq!(request.symbol, "AAPL");
        assert_eq!(request.end, date(2025, 3, 1));
        assert_eq!(request.start, date(2024, 3, 1));
        assert_eq!(request.params.holding_period, 10);
    }

    #[test]
    fn overrides_win_over_config() {
        let config = parse_config(
            "[analysis]\nsymbol = \"MSFT\"\nstart = \"2024-01-01\"\nend = \"2024-06-01\"\nholding_period = 5\n",
        )
        .expect("config");
        let overrides = RequestOverrides {
            symbol: Some("nvda".to_string()),
            end: Some(date(2024, 5, 1)),
            volume_threshold_pct: Some(300.0),
            ..RequestOverrides::default()
        };
        let request = resolve_request(&config, &overrides, date(2025, 1, 1)).expect("request");
        assert_eq!(request.symbol, "nvda");
        assert_eq!(request.start, date(2024, 1, 1));
        assert_eq!(request.end, date(2024, 5, 1));
        assert_eq!(request.params.holding_period, 5);
        assert!((request.params.volume_threshold_pct - 300.0).abs() < 1e-12);
    }

    #[test]
    fn config_dates_must_parse() {
        let config = parse_config("[analysis]\nstart = \"01/02/2024\"\n").expect("config");
        let err = resolve_request(&config, &RequestOverrides::default(), date(2025, 1, 1))
            .expect_err("bad date");
        assert!(err.starts_with("analysis.start"));
    }

    #[test]
    fn oversized_lookback_is_an_error() {
        let config = parse_config("[analysis]\nlookback_days = 100000000\n").expect("config");
        let err = resolve_request(&config, &RequestOverrides::default(), date(2025, 1, 1))
            .expect_err("lookback overflows the calendar");
        assert_eq!(err, "analysis.lookback_days too large (100000000)");

        assert!(lookback_start(date(2025, 1, 1), i64::MAX).is_err());
        assert_eq!(lookback_start(date(2025, 1, 1), 31).expect("start"), date(2024, 12, 1));
    }

    #[test]
    fn symbols_are_upper_cased() {
        assert_eq!(normalize_symbol(" aapl ").expect("symbol"), "AAPL");
        assert!(normalize_symbol("   ").is_err());
        assert!(normalize_symbol("BRK B").is_err());
    }

    #[test]
    fn csv_flag_overrides_configured_source() {
        let config = Config::default();
        let source =
            market_data_source(&config, Some(Path::new("data/acme.csv")), false).expect("source");
        assert_eq!(
            source,
            MarketDataSource::Csv {
                path: PathBuf::from("data/acme.csv")
            }
        );
    }

    #[test]
    fn csv_source_requires_a_path() {
        let config = parse_config("[data]\nsource = \"csv\"\ncsv_path = \"  \"\n").expect("config");
        let err = market_data_source(&config, None, false).expect_err("missing path");
        assert!(err.contains("data.csv_path is required"));
    }

    #[test]
    fn yahoo_source_carries_cache_settings() {
        let config = parse_config(
            "[data]\ncache_dir = \"/tmp/series\"\ncache_ttl_hours = 2\nretries = 4\n",
        )
        .expect("config");
        match market_data_source(&config, None, true).expect("source") {
            MarketDataSource::Yahoo {
                retries,
                cache,
                refresh,
                ..
            } => {
                assert_eq!(retries, 4);
                assert!(refresh);
                let cache = cache.expect("cache enabled");
                assert_eq!(cache.ttl.map(|d| d.as_secs()), Some(7_200));
            }
            other => panic!("unexpected source {other:?}"),
        }

        let uncached = parse_config("[data]\ncache_enabled = false\n").expect("config");
        assert!(matches!(
            market_data_source(&uncached, None, false).expect("source"),
            MarketDataSource::Yahoo { cache: None, .. }
        ));
    }

    #[test]
    fn zero_ttl_disables_expiry() {
        let mut config = Config::default();
        assert_eq!(cache_ttl(&config).map(|d| d.as_secs()), Some(86_400));
        config.data.cache_ttl_hours = 0;
        assert!(cache_ttl(&config).is_none());
    }
}
