//! On-disk cache of downloaded daily series.
//!
//! One CSV per query under the cache directory, named
//! `{SYMBOL}_{start}_{end}_1d.csv`. Entries whose modification time is older
//! than the TTL are treated as misses. Empty series are never written.

use crate::market_data::ohlcv::{load_csv, write_csv};
use breakout_domain::repositories::market_data::{MarketDataRepository, OhlcvQuery};
use breakout_domain::services::ohlcv::DataQualityReport;
use breakout_domain::value_objects::bar::Bar;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub age: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct SeriesCache {
    dir: PathBuf,
    ttl: Option<Duration>,
}

impl SeriesCache {
    /// `ttl = None` keeps entries forever.
    pub fn new(dir: impl Into<PathBuf>, ttl: Option<Duration>) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure_dir(&self) -> Result<(), String> {
        fs::create_dir_all(&self.dir)
            .map_err(|err| format!("failed to create cache dir {}: {}", self.dir.display(), err))
    }

    pub fn entry_path(&self, query: &OhlcvQuery) -> PathBuf {
        self.dir.join(format!(
            "{}_{}_{}_1d.csv",
            sanitize_symbol(&query.symbol),
            query.range.start,
            query.range.end
        ))
    }

    /// Cached series for `query`, or `None` when absent, stale or unreadable.
    pub fn read(&self, query: &OhlcvQuery) -> Option<(Vec<Bar>, DataQualityReport)> {
        let path = self.entry_path(query);
        let meta = fs::metadata(&path).ok()?;
        if let (Some(ttl), Some(age)) = (self.ttl, file_age(&meta)) {
            if age >= ttl {
                tracing::info!(path = %path.display(), age_secs = age.as_secs(), "cache entry expired");
                return None;
            }
        }
        match load_csv(&path, &query.symbol) {
            Ok(loaded) => Some(loaded),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable cache entry");
                None
            }
        }
    }

    pub fn write(&self, query: &OhlcvQuery, bars: &[Bar]) -> Result<(), String> {
        if bars.is_empty() {
            return Ok(());
        }
        self.ensure_dir()?;
        write_csv(&self.entry_path(query), bars)
    }

    pub fn list_entries(&self) -> Result<Vec<CacheEntry>, String> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for path in self.csv_files()? {
            let meta = fs::metadata(&path)
                .map_err(|err| format!("failed to stat cache entry {}: {}", path.display(), err))?;
            entries.push(CacheEntry {
                size_bytes: meta.len(),
                age: file_age(&meta),
                path,
            });
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    /// Deletes cached series files and returns how many were removed. Other
    /// files in the directory are left alone.
    pub fn clear(&self) -> Result<usize, String> {
        if !self.dir.exists() {
            return Ok(0);
        }
        let mut removed = 0;
        for path in self.csv_files()? {
            fs::remove_file(&path)
                .map_err(|err| format!("failed to remove cache entry {}: {}", path.display(), err))?;
            removed += 1;
        }
        Ok(removed)
    }

    fn csv_files(&self) -> Result<Vec<PathBuf>, String> {
        let read_dir = fs::read_dir(&self.dir)
            .map_err(|err| format!("failed to read cache dir {}: {}", self.dir.display(), err))?;
        let mut files = Vec::new();
        for entry in read_dir {
            let entry = entry
                .map_err(|err| format!("failed to read cache dir {}: {}", self.dir.display(), err))?;
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "csv") {
                files.push(path);
            }
        }
        Ok(files)
    }
}

fn file_age(meta: &fs::Metadata) -> Option<Duration> {
    let modified = meta.modified().ok()?;
    Some(
        SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO),
    )
}

fn sanitize_symbol(symbol: &str) -> String {
    symbol
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '^' | '=') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Read-through cache in front of another repository.
pub struct CachedMarketDataRepository<R> {
    inner: R,
    cache: SeriesCache,
    refresh: bool,
}

impl<R: MarketDataRepository> CachedMarketDataRepository<R> {
    /// With `refresh` set, cached entries are ignored and overwritten.
    pub fn new(inner: R, cache: SeriesCache, refresh: bool) -> Self {
        Self {
            inner,
            cache,
            refresh,
        }
    }

    pub fn cache(&self) -> &SeriesCache {
        &self.cache
    }
}

impl<R: MarketDataRepository> MarketDataRepository for CachedMarketDataRepository<R> {
    fn load_daily(&self, query: &OhlcvQuery) -> Result<(Vec<Bar>, DataQualityReport), String> {
        self.cache.ensure_dir()?;

        if !self.refresh {
            if let Some(hit) = self.cache.read(query) {
                metrics::counter!("breakout.infra.cache.hits_total").increment(1);
                tracing::info!(symbol = %query.symbol, rows = hit.0.len(), "cache hit");
                return Ok(hit);
            }
        }

        metrics::counter!("breakout.infra.cache.misses_total").increment(1);
        tracing::info!(symbol = %query.symbol, refresh = self.refresh, "cache miss");
        let (bars, report) = self.inner.load_daily(query)?;
        if let Err(err) = self.cache.write(query, &bars) {
            tracing::warn!(error = %err, "failed to write cache entry");
        }
        Ok((bars, report))
    }
}
