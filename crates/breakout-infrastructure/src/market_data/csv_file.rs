use crate::market_data::ohlcv::load_csv;
use breakout_domain::repositories::market_data::{MarketDataRepository, OhlcvQuery};
use breakout_domain::services::ohlcv::{data_quality_from_bars, DataQualityReport};
use breakout_domain::value_objects::bar::Bar;
use std::path::PathBuf;

/// Offline source: a local daily OHLCV CSV, filtered to the requested range.
#[derive(Debug, Clone)]
pub struct CsvMarketDataRepository {
    path: PathBuf,
}

impl CsvMarketDataRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MarketDataRepository for CsvMarketDataRepository {
    fn load_daily(&self, query: &OhlcvQuery) -> Result<(Vec<Bar>, DataQualityReport), String> {
        let _span = tracing::info_span!(
            "infra.csv.load_daily",
            path = %self.path.display(),
            symbol = %query.symbol
        )
        .entered();

        let (bars, file_report) = load_csv(&self.path, &query.symbol)?;
        let bars: Vec<Bar> = bars
            .into_iter()
            .filter(|bar| query.range.contains_timestamp(bar.timestamp))
            .collect();

        let mut report = data_quality_from_bars(&bars);
        report.absorb_defects(&file_report);
        tracing::info!(rows = bars.len(), "csv series loaded");
        Ok((bars, report))
    }
}
