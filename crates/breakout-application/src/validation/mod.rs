use crate::config::{Config, DataSource};
use crate::shared::{cache_ttl, normalize_symbol, resolve_cache_dir, resolve_request, RequestOverrides};
use breakout_domain::value_objects::date_range::DateRange;
use chrono::NaiveDate;
use std::path::Path;
use tracing::info_span;

/// Checks a config without fetching any data. Returns a JSON report of the
/// effective settings.
pub fn validate_config(config: &Config, today: NaiveDate) -> Result<serde_json::Value, String> {
    let _span = info_span!(
        "validate_config",
        symbol = %config.analysis.symbol,
        source = config.data.source.label()
    )
    .entered();

    let request = resolve_request(config, &RequestOverrides::default(), today)?;
    let symbol = normalize_symbol(&request.symbol)?;
    let range = DateRange::new(request.start, request.end)?;
    range.ensure_not_future(today)?;
    request.params.validate()?;

    match config.data.source {
        DataSource::Yahoo => {
            let base_url = config.data.base_url.trim();
            if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                return Err(format!(
                    "data.base_url must start with http:// or https:// (got '{base_url}')"
                ));
            }
            if config.data.timeout_ms == 0 {
                return Err("data.timeout_ms must be > 0".to_string());
            }
        }
        DataSource::Csv => {
            let csv_path = config.data.required_csv_path()?;
            if !Path::new(csv_path).is_file() {
                return Err(format!("data.csv_path not found: {csv_path}"));
            }
        }
    }

    tracing::info!("config ok");
    Ok(serde_json::json!({
        "symbol": symbol,
        "start": range.start.to_string(),
        "end": range.end.to_string(),
        "volume_threshold_pct": request.params.volume_threshold_pct,
        "price_change_threshold_pct": request.params.price_change_threshold_pct,
        "holding_period": request.params.holding_period,
        "volume_window": request.params.volume_window,
        "source": config.data.source.label(),
        "cache_dir": config.data.cache_enabled.then(|| resolve_cache_dir(config).display().to_string()),
        "cache_ttl_hours": cache_ttl(config).map(|ttl| ttl.as_secs() / 3600),
        "out_dir": config.output.out_dir,
    }))
}
