pub mod cache;
pub mod csv_file;
pub mod ohlcv;
pub mod yahoo;

use breakout_domain::repositories::market_data::{MarketDataRepository, MarketDataSource};
use cache::{CachedMarketDataRepository, SeriesCache};
use csv_file::CsvMarketDataRepository;
use yahoo::YahooChartClient;

pub fn open_market_data(source: &MarketDataSource) -> Result<Box<dyn MarketDataRepository>, String> {
    match source {
        MarketDataSource::Csv { path } => Ok(Box::new(CsvMarketDataRepository::new(path.clone()))),
        MarketDataSource::Yahoo {
            base_url,
            timeout_ms,
            retries,
            cache,
            refresh,
        } => {
            let client = YahooChartClient::new(base_url.clone(), *timeout_ms, *retries)
                .map_err(|err| format!("failed to init chart client (url={base_url}): {err}"))?;
            let Some(settings) = cache else {
                return Ok(Box::new(client));
            };
            let cache = SeriesCache::new(settings.dir.clone(), settings.ttl);
            Ok(Box::new(CachedMarketDataRepository::new(client, cache, *refresh)))
        }
    }
}
