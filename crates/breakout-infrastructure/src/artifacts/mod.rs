use crate::reporting;
use breakout_domain::repositories::artifacts::{ArtifactReader, ArtifactWriter, BreakoutTable};
use breakout_domain::services::breakout::BreakoutEvent;
use breakout_domain::services::summary::BreakoutSummary;
use breakout_domain::value_objects::breakout_params::BreakoutParams;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Clone, Copy)]
pub struct FilesystemArtifactWriter;

impl FilesystemArtifactWriter {
    pub fn new() -> Self {
        Self
    }
}

fn parse_summary_meta(meta: &serde_json::Value) -> Option<reporting::SummaryMeta> {
    let defaults = BreakoutParams::default();
    let usize_field = |key: &str, fallback: usize| {
        meta.get(key)
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .unwrap_or(fallback)
    };
    Some(reporting::SummaryMeta {
        symbol: meta.get("symbol")?.as_str()?.to_string(),
        start: meta.get("start")?.as_str()?.to_string(),
        end: meta.get("end")?.as_str()?.to_string(),
        params: BreakoutParams {
            volume_threshold_pct: meta
                .get("volume_threshold_pct")
                .and_then(|v| v.as_f64())
                .unwrap_or(defaults.volume_threshold_pct),
            price_change_threshold_pct: meta
                .get("price_change_threshold_pct")
                .and_then(|v| v.as_f64())
                .unwrap_or(defaults.price_change_threshold_pct),
            holding_period: usize_field("holding_period", defaults.holding_period),
            volume_window: usize_field("volume_window", defaults.volume_window),
        },
    })
}

impl ArtifactWriter for FilesystemArtifactWriter {
    fn ensure_dir(&self, path: &Path) -> Result<(), String> {
        fs::create_dir_all(path)
            .map_err(|err| format!("failed to create dir {}: {}", path.display(), err))
    }

    fn write_breakouts_csv(
        &self,
        path: &Path,
        events: &[BreakoutEvent],
        params: &BreakoutParams,
    ) -> Result<(), String> {
        reporting::write_breakouts_csv(path, events, params)
    }

    fn write_summary_json(
        &self,
        path: &Path,
        summary: Option<&BreakoutSummary>,
        meta: Option<&serde_json::Value>,
    ) -> Result<(), String> {
        let parsed = meta.and_then(parse_summary_meta);
        reporting::write_summary_json(path, summary, parsed.as_ref())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FilesystemArtifactReader;

impl FilesystemArtifactReader {
    pub fn new() -> Self {
        Self
    }
}

impl ArtifactReader for FilesystemArtifactReader {
    fn read_breakouts_csv(&self, path: &Path) -> Result<BreakoutTable, String> {
        reporting::read_breakouts_csv(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::parse_summary_meta;

    #[test]
    fn summary_meta_falls_back_to_default_parameters() {
        let meta = serde_json::json!({
            "symbol": "MSFT",
            "start": "2024-01-01",
            "end": "2024-12-31",
            "holding_period": 5,
        });
        let parsed = parse_summary_meta(&meta).expect("meta");
        assert_eq!(parsed.symbol, "MSFT");
        assert_eq!(parsed.params.holding_period, 5);
        assert_eq!(parsed.params.volume_window, 20);
        assert!((parsed.params.volume_threshold_pct - 200.0).abs() < 1e-12);
    }

    #[test]
    fn summary_meta_requires_symbol_and_range() {
        assert!(parse_summary_meta(&serde_json::json!({ "symbol": "MSFT" })).is_none());
    }
}
