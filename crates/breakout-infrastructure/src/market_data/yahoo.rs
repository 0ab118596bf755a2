use breakout_domain::repositories::market_data::{MarketDataRepository, OhlcvQuery};
use breakout_domain::services::ohlcv::{canonicalize_bars, DataQualityReport};
use breakout_domain::value_objects::bar::{date_from_timestamp, timestamp_from_date, Bar};
use breakout_domain::value_objects::date_range::DateRange;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::{Duration, Instant};

const USER_AGENT: &str = "Mozilla/5.0 (compatible; breakout-analyzer/0.1)";

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

/// Daily bars from the Yahoo Finance v8 chart endpoint.
pub struct YahooChartClient {
    pub base_url: String,
    pub retries: u32,
    pub retry_backoff: Duration,
    client: Client,
}

impl YahooChartClient {
    pub fn new(base_url: String, timeout_ms: u64, retries: u32) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| format!("failed to build http client: {err}"))?;
        Ok(Self {
            base_url,
            retries,
            retry_backoff: Duration::from_millis(500),
            client,
        })
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    fn endpoint(&self, symbol: &str, range: &DateRange) -> String {
        format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d&events=div%2Csplits",
            self.base_url.trim_end_matches('/'),
            symbol,
            range.start_timestamp(),
            range.end_timestamp()
        )
    }

    /// Raw sessions for `symbol` in `range`, in provider order. An unknown
    /// symbol yields an empty list.
    pub fn fetch_daily(&self, symbol: &str, range: &DateRange) -> Result<Vec<Bar>, String> {
        let endpoint = self.endpoint(symbol, range);
        let start = Instant::now();
        let mut attempts = 0u32;
        let mut last_error: Option<String> = None;

        while attempts <= self.retries {
            attempts += 1;
            if attempts > 1 && !self.retry_backoff.is_zero() {
                std::thread::sleep(self.retry_backoff * (attempts - 1));
            }

            let response = match self.client.get(&endpoint).send() {
                Ok(resp) => resp,
                Err(err) => {
                    tracing::warn!(attempt = attempts, error = %err, "chart request failed");
                    metrics::counter!("breakout.infra.yahoo.retries_total", "reason" => "transport")
                        .increment(1);
                    last_error = Some(format!("chart request failed: {err}"));
                    continue;
                }
            };

            let status = response.status();
            if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                tracing::warn!(attempt = attempts, status = status.as_u16(), "chart request rejected");
                metrics::counter!("breakout.infra.yahoo.retries_total", "reason" => "status")
                    .increment(1);
                last_error = Some(format!("chart http error: status {}", status.as_u16()));
                continue;
            }

            let body = response
                .text()
                .map_err(|err| format!("failed to read chart response: {err}"))?;
            metrics::histogram!("breakout.infra.yahoo.fetch_ms")
                .record(start.elapsed().as_secs_f64() * 1000.0);
            return parse_chart_response(symbol, status, &body);
        }

        metrics::counter!("breakout.infra.yahoo.errors_total").increment(1);
        Err(format!(
            "{} (symbol={symbol}, attempts={attempts})",
            last_error.unwrap_or_else(|| "chart request failed after retries".to_string())
        ))
    }
}

impl MarketDataRepository for YahooChartClient {
    fn load_daily(&self, query: &OhlcvQuery) -> Result<(Vec<Bar>, DataQualityReport), String> {
        let _span = tracing::info_span!(
            "infra.yahoo.load_daily",
            symbol = %query.symbol,
            start = %query.range.start,
            end = %query.range.end
        )
        .entered();

        let bars = self
            .fetch_daily(&query.symbol, &query.range)?
            .into_iter()
            .filter(|bar| query.range.contains_timestamp(bar.timestamp))
            .collect();
        let (bars, report) = canonicalize_bars(bars);
        tracing::info!(rows = bars.len(), "chart series loaded");
        Ok((bars, report))
    }
}

fn parse_chart_response(symbol: &str, status: StatusCode, body: &str) -> Result<Vec<Bar>, String> {
    let envelope: ChartEnvelope = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(err) if status.is_success() => {
            return Err(format!("failed to parse chart response for {symbol}: {err}"));
        }
        Err(_) => {
            return Err(format!("chart http error: status {}", status.as_u16()));
        }
    };

    if let Some(error) = envelope.chart.error {
        if status == StatusCode::NOT_FOUND || error.code.eq_ignore_ascii_case("not found") {
            tracing::info!(symbol = %symbol, code = %error.code, "symbol not found");
            return Ok(Vec::new());
        }
        return Err(format!(
            "chart error for {symbol}: {} - {}",
            error.code,
            error.description.unwrap_or_default()
        ));
    }
    if !status.is_success() {
        return Err(format!("chart http error: status {}", status.as_u16()));
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };
    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return Ok(Vec::new());
    };

    let gmtoffset = result.meta.gmtoffset;
    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (idx, ts) in result.timestamp.iter().enumerate() {
        let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = (
            value_at(&quote.open, idx),
            value_at(&quote.high, idx),
            value_at(&quote.low, idx),
            value_at(&quote.close, idx),
            value_at(&quote.volume, idx),
        ) else {
            continue;
        };
        let Some(session) = date_from_timestamp(ts + gmtoffset) else {
            continue;
        };
        bars.push(Bar {
            symbol: symbol.to_string(),
            timestamp: timestamp_from_date(session),
            open,
            high,
            low,
            close,
            volume,
        });
    }
    Ok(bars)
}

fn value_at(values: &[Option<f64>], idx: usize) -> Option<f64> {
    values.get(idx).copied().flatten().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::{parse_chart_response, YahooChartClient};
    use breakout_domain::repositories::market_data::{MarketDataRepository, OhlcvQuery};
    use breakout_domain::value_objects::bar::format_timestamp_date;
    use breakout_domain::value_objects::date_range::DateRange;
    use chrono::NaiveDate;
    use reqwest::StatusCode;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    struct MockChartServer {
        base_url: String,
        requests: Arc<Mutex<Vec<String>>>,
        handle: Option<thread::JoinHandle<()>>,
    }

    impl MockChartServer {
        /// Serves each `(status, body)` once, in order, then stops.
        fn start(responses: Vec<(u16, String)>) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock server");
            let addr = listener.local_addr().expect("local addr");
            let requests = Arc::new(Mutex::new(Vec::new()));
            let seen = requests.clone();
            let handle = thread::spawn(move || {
                for (status, body) in responses {
                    let Ok((mut stream, _)) = listener.accept() else {
                        return;
                    };
                    if let Ok(line) = handle_connection(&mut stream, status, &body) {
                        if let Ok(mut guard) = seen.lock() {
                            guard.push(line);
                        }
                    }
                }
            });
            Self {
                base_url: format!("http://{addr}"),
                requests,
                handle: Some(handle),
            }
        }

        fn requests(mut self) -> Vec<String> {
            if let Some(handle) = self.handle.take() {
                let _ = handle.join();
            }
            self.requests.lock().map(|g| g.clone()).unwrap_or_default()
        }
    }

    fn handle_connection(stream: &mut TcpStream, status: u16, body: &str) -> Result<String, String> {
        stream
            .set_read_timeout(Some(Duration::from_secs(2)))
            .map_err(|e| e.to_string())?;
        let mut buf = Vec::new();
        let mut tmp = [0u8; 1024];
        loop {
            let n = stream.read(&mut tmp).map_err(|e| e.to_string())?;
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&tmp[..n]);
            if buf.windows(4).any(|w| w == b"\r\n\r\n") || buf.len() > 8192 {
                break;
            }
        }
        let request_line = String::from_utf8_lossy(&buf)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string();

        let header = format!(
            "HTTP/1.1 {status} MOCK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        stream
            .write_all(header.as_bytes())
            .and_then(|_| stream.write_all(body.as_bytes()))
            .map_err(|e| e.to_string())?;
        Ok(request_line)
    }

    fn chart_payload() -> String {
        // 2024-01-02 .. 2024-01-05 sessions at 14:30 UTC; the third row has a null close.
        r#"{
  "chart": {
    "result": [{
      "meta": { "symbol": "AAPL", "gmtoffset": -18000 },
      "timestamp": [1704205800, 1704292200, 1704378600, 1704465000],
      "indicators": {
        "quote": [{
          "open":   [187.15, 184.22, 182.15, 181.99],
          "high":   [188.44, 185.88, 183.09, 182.76],
          "low":    [183.89, 183.43, 180.88, 180.17],
          "close":  [185.64, 184.25, null,   181.18],
          "volume": [82488700, 58414500, 71983600, 62303300]
        }]
      }
    }],
    "error": null
  }
}"#
        .to_string()
    }

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).expect("date"),
            NaiveDate::from_ymd_opt(2024, 1, 6).expect("date"),
        )
        .expect("range")
    }

    #[test]
    fn parses_sessions_and_skips_incomplete_rows() {
        let bars = parse_chart_response("AAPL", StatusCode::OK, &chart_payload()).expect("parse");
        assert_eq!(bars.len(), 3);
        let dates: Vec<String> = bars.iter().map(|b| format_timestamp_date(b.timestamp)).collect();
        assert_eq!(dates, vec!["2024-01-02", "2024-01-03", "2024-01-05"]);
        assert!((bars[0].volume - 82_488_700.0).abs() < 1e-6);
        assert!((bars[2].close - 181.18).abs() < 1e-9);
    }

    #[test]
    fn not_found_symbol_is_empty_not_an_error() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let bars = parse_chart_response("ZZZZ", StatusCode::NOT_FOUND, body).expect("empty");
        assert!(bars.is_empty());
    }

    #[test]
    fn other_chart_errors_are_reported() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"Invalid input"}}}"#;
        let err = parse_chart_response("AAPL", StatusCode::BAD_REQUEST, body).expect_err("error");
        assert!(err.contains("Bad Request"));
    }

    #[test]
    fn range_without_sessions_is_empty() {
        let body = r#"{"chart":{"result":[{"meta":{"gmtoffset":0},"indicators":{"quote":[{}]}}],"error":null}}"#;
        let bars = parse_chart_response("AAPL", StatusCode::OK, body).expect("parse");
        assert!(bars.is_empty());
    }

    #[test]
    fn load_daily_hits_chart_endpoint() {
        let server = MockChartServer::start(vec![(200, chart_payload())]);
        let client = YahooChartClient::new(server.base_url.clone(), 2_000, 0).expect("client");
        let (bars, report) = client
            .load_daily(&OhlcvQuery {
                symbol: "AAPL".to_string(),
                range: range(),
            })
            .expect("load");
        assert_eq!(bars.len(), 3);
        assert!(report.is_clean());

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].starts_with("GET /v8/finance/chart/AAPL?period1=1704067200&period2=1704499200&interval=1d"));
    }

    #[test]
    fn server_errors_are_retried() {
        let server = MockChartServer::start(vec![
            (503, "{}".to_string()),
            (200, chart_payload()),
        ]);
        let client = YahooChartClient::new(server.base_url.clone(), 2_000, 1)
            .expect("client")
            .with_retry_backoff(Duration::ZERO);
        let bars = client.fetch_daily("AAPL", &range()).expect("fetch");
        assert_eq!(bars.len(), 3);
        assert_eq!(server.requests().len(), 2);
    }

    #[test]
    fn gives_up_after_retries() {
        let server = MockChartServer::start(vec![
            (500, "{}".to_string()),
            (500, "{}".to_string()),
        ]);
        let client = YahooChartClient::new(server.base_url.clone(), 2_000, 1)
            .expect("client")
            .with_retry_backoff(Duration::ZERO);
        let err = client.fetch_daily("AAPL", &range()).expect_err("should fail");
        assert!(err.contains("status 500"));
        assert!(err.contains("attempts=2"));
        let _ = server.requests();
    }
}
