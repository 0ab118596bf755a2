use breakout_application::config::Config;
use breakout_application::shared::{cache_ttl, market_data_source, resolve_cache_dir};
use breakout_domain::repositories::artifacts::{ArtifactReader, ArtifactWriter};
use breakout_domain::repositories::market_data::MarketDataRepository;
use breakout_infrastructure::artifacts::{FilesystemArtifactReader, FilesystemArtifactWriter};
use breakout_infrastructure::market_data::cache::SeriesCache;
use breakout_infrastructure::market_data::open_market_data;
use std::path::{Path, PathBuf};

pub struct ReportingDeps {
    pub reader: Box<dyn ArtifactReader>,
    pub writer: Box<dyn ArtifactWriter>,
}

pub fn build_reporting_deps() -> ReportingDeps {
    ReportingDeps {
        reader: Box::new(FilesystemArtifactReader::new()),
        writer: Box::new(FilesystemArtifactWriter::new()),
    }
}

pub fn build_market_data_repo(
    config: &Config,
    csv_override: Option<&Path>,
    refresh: bool,
) -> Result<Box<dyn MarketDataRepository>, String> {
    open_market_data(&market_data_source(config, csv_override, refresh)?)
}

pub fn build_series_cache(config: &Config, dir_override: Option<PathBuf>) -> SeriesCache {
    let dir = dir_override.unwrap_or_else(|| resolve_cache_dir(config));
    SeriesCache::new(dir, cache_ttl(config))
}
