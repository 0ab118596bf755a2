use crate::services::ohlcv::DataQualityReport;
use crate::value_objects::bar::Bar;
use crate::value_objects::date_range::DateRange;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OhlcvQuery {
    pub symbol: String,
    pub range: DateRange,
}

/// Source of daily sessions. Implementations return bars inside
/// `query.range`, sorted and unique by timestamp.
pub trait MarketDataRepository {
    fn load_daily(&self, query: &OhlcvQuery) -> Result<(Vec<Bar>, DataQualityReport), String>;
}

/// Which adapter serves daily sessions, resolved from config and flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketDataSource {
    Csv {
        path: PathBuf,
    },
    Yahoo {
        base_url: String,
        timeout_ms: u64,
        retries: u32,
        cache: Option<SeriesCacheSettings>,
        refresh: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesCacheSettings {
    pub dir: PathBuf,
    /// `None` keeps entries forever.
    pub ttl: Option<Duration>,
}
