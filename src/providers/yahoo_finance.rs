use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use futures::future::join_all;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::price::{Bar, Interval, PriceHistory, PriceSource};

#[derive(Deserialize, Debug)]
struct YahooChartResponse {
    chart: ChartResult,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    result: Option<Vec<ChartItem>>,
}

#[derive(Deserialize, Debug)]
struct ChartItem {
    #[serde(default)]
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Deserialize, Debug, Default)]
struct ChartMeta {
    #[serde(alias = "gmtoffset")]
    gmt_offset: Option<i64>,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    quote: Vec<Quote>,
    #[serde(default)]
    adjclose: Vec<AdjClose>,
}

#[derive(Deserialize, Debug, Default)]
struct Quote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<f64>>>,
}

#[derive(Deserialize, Debug)]
struct AdjClose {
    adjclose: Option<Vec<Option<f64>>>,
}

fn value_at(values: &Option<Vec<Option<f64>>>, index: usize) -> Option<f64> {
    values.as_ref().and_then(|v| v.get(index).copied().flatten())
}

/// Converts a chart item into bars. Bars without a close are skipped and
/// timestamps are shifted to exchange time before taking the date.
fn extract_bars(item: &ChartItem) -> Vec<Bar> {
    let Some(timestamps) = item.timestamp.as_ref() else {
        return Vec::new();
    };
    let quote = match item.indicators.quote.first() {
        Some(q) => q,
        None => return Vec::new(),
    };
    let adjclose = item.indicators.adjclose.first().and_then(|a| a.adjclose.clone());
    let offset = item.meta.gmt_offset.unwrap_or(0);

    timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, ts)| {
            let close = value_at(&quote.close, i)?;
            let date = DateTime::from_timestamp(ts + offset, 0)?.date_naive();
            Some(Bar {
                date,
                open: value_at(&quote.open, i),
                high: value_at(&quote.high, i),
                low: value_at(&quote.low, i),
                close,
                adj_close: value_at(&adjclose, i),
                volume: value_at(&quote.volume, i),
            })
        })
        .collect()
}

fn unix_seconds(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map_or(0, |midnight| midnight.and_utc().timestamp())
}

/// Price history from the Yahoo Finance chart API.
pub struct YahooFinanceSource {
    base_url: String,
}

impl YahooFinanceSource {
    pub fn new(base_url: &str) -> Self {
        YahooFinanceSource {
            base_url: base_url.to_string(),
        }
    }

    #[instrument(name = "YahooHistoryFetch", skip(self), fields(symbol = %symbol))]
    async fn fetch_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<PriceHistory> {
        let url = format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval={}",
            self.base_url,
            symbol,
            unix_seconds(start),
            unix_seconds(end),
            interval
        );
        debug!("Requesting price history from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("fxstats/1.0")
            .build()?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for symbol: {} URL: {}", e, symbol, url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for symbol: {}",
                response.status(),
                symbol
            ));
        }

        let text = response.text().await?;
        let data: YahooChartResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", symbol, e))?;

        let item = data
            .chart
            .result
            .as_ref()
            .and_then(|items| items.first())
            .ok_or_else(|| anyhow!("No price data found for symbol: {}", symbol))?;

        let bars = extract_bars(item);
        debug!(bars = bars.len(), "Parsed Yahoo price history");

        Ok(PriceHistory {
            symbol: symbol.to_string(),
            interval,
            bars,
        })
    }
}

#[async_trait]
impl PriceSource for YahooFinanceSource {
    async fn fetch_prices(
        &self,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<Vec<PriceHistory>> {
        let futures = tickers
            .iter()
            .map(|ticker| self.fetch_history(ticker, start, end, interval));
        join_all(futures).await.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_mock_server(symbol: &str, mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        mount_chart(&mock_server, symbol, mock_response).await;
        mock_server
    }

    async fn mount_chart(mock_server: &MockServer, symbol: &str, mock_response: &str) {
        let request_path = format!("/v8/finance/chart/{symbol}");
        Mock::given(method("GET"))
            .and(path(request_path))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(mock_server)
            .await;
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    // 2020-01-05, 2020-01-12, 2020-01-19 and 2020-01-26 at midnight UTC
    const WEEKLY_RESPONSE: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"currency": "USD", "symbol": "EURUSD=X", "gmtoffset": 0},
                "timestamp": [1578182400, 1578787200, 1579392000, 1579996800],
                "indicators": {
                    "quote": [{
                        "open": [1.10, 1.11, null, 1.12],
                        "high": [1.12, 1.13, null, 1.14],
                        "low": [1.09, 1.10, null, 1.11],
                        "close": [1.11, 1.12, null, 1.10],
                        "volume": [0, 0, null, 0]
                    }],
                    "adjclose": [{"adjclose": [1.11, 1.12, null, 1.10]}]
                }
            }],
            "error": null
        }
    }"#;

    #[tokio::test]
    async fn test_successful_history_fetch() {
        let mock_server = create_mock_server("EURUSD=X", WEEKLY_RESPONSE).await;
        let source = YahooFinanceSource::new(&mock_server.uri());

        let histories = source
            .fetch_prices(
                &["EURUSD=X".to_string()],
                d(2020, 1, 1),
                d(2020, 2, 1),
                Interval::Weekly,
            )
            .await
            .unwrap();

        assert_eq!(histories.len(), 1);
        let history = &histories[0];
        assert_eq!(history.symbol, "EURUSD=X");
        assert_eq!(history.bars.len(), 3);
        assert_eq!(history.bars[0].date, d(2020, 1, 5));
        assert_eq!(history.bars[0].open, Some(1.10));
        assert_eq!(history.bars[1].close, 1.12);
        assert_eq!(history.bars[2].date, d(2020, 1, 26));
        assert_eq!(history.bars[2].adj_close, Some(1.10));
    }

    #[tokio::test]
    async fn test_request_carries_range_and_interval() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/EURUSD=X"))
            .and(query_param("period1", "1577836800"))
            .and(query_param("period2", "1580515200"))
            .and(query_param("interval", "1wk"))
            .respond_with(ResponseTemplate::new(200).set_body_string(WEEKLY_RESPONSE))
            .expect(1)
            .mount(&mock_server)
            .await;

        let source = YahooFinanceSource::new(&mock_server.uri());
        let result = source
            .fetch_prices(
                &["EURUSD=X".to_string()],
                d(2020, 1, 1),
                d(2020, 2, 1),
                Interval::Weekly,
            )
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_returns_from_two_tickers() {
        let gbp_response = WEEKLY_RESPONSE
            .replace("EURUSD=X", "GBPUSD=X")
            .replace("[1.11, 1.12, null, 1.10]", "[1.30, 1.20, null, 1.50]");
        let mock_server = MockServer::start().await;
        mount_chart(&mock_server, "EURUSD=X", WEEKLY_RESPONSE).await;
        mount_chart(&mock_server, "GBPUSD=X", &gbp_response).await;

        let source = YahooFinanceSource::new(&mock_server.uri());
        let tickers = vec!["EURUSD=X".to_string(), "GBPUSD=X".to_string()];
        let names = vec!["EURUSD".to_string(), "GBPUSD".to_string()];
        let returns = source
            .fetch_returns(&tickers, &names, d(2020, 1, 1), d(2020, 2, 1), Interval::Weekly)
            .await
            .unwrap();

        assert_eq!(returns.index, vec![d(2020, 1, 12), d(2020, 1, 26)]);
        let gbp = returns.column("GBPUSD").unwrap();
        assert!((gbp[0] - (1.20 / 1.30 - 1.0)).abs() < 1e-12);
        assert!((gbp[1] - 0.25).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_no_price_result_data() {
        let mock_response = r#"{"chart": {"result": []}}"#;
        let mock_server = create_mock_server("INVALID", mock_response).await;
        let source = YahooFinanceSource::new(&mock_server.uri());

        let result = source
            .fetch_prices(
                &["INVALID".to_string()],
                d(2020, 1, 1),
                d(2020, 2, 1),
                Interval::Weekly,
            )
            .await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "No price data found for symbol: INVALID"
        );
    }

    #[tokio::test]
    async fn test_yahoo_api_error_response() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/NOPE=X"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let source = YahooFinanceSource::new(&mock_server.uri());
        let result = source
            .fetch_prices(
                &["NOPE=X".to_string()],
                d(2020, 1, 1),
                d(2020, 2, 1),
                Interval::Weekly,
            )
            .await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 404 Not Found for symbol: NOPE=X"
        );
    }

    #[tokio::test]
    async fn test_yahoo_api_malformed_response() {
        let mock_response = r#"{"chart": {"results": []}}"#;
        let mock_server = create_mock_server("EURUSD=X", mock_response).await;
        let source = YahooFinanceSource::new(&mock_server.uri());

        let result = source
            .fetch_prices(
                &["EURUSD=X".to_string()],
                d(2020, 1, 1),
                d(2020, 2, 1),
                Interval::Weekly,
            )
            .await;
        // A missing "result" key reads as no data
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("No price data found for symbol: EURUSD=X")
        );
    }

    #[tokio::test]
    async fn test_yahoo_api_invalid_json() {
        let mock_server = create_mock_server("EURUSD=X", "not json").await;
        let source = YahooFinanceSource::new(&mock_server.uri());

        let result = source
            .fetch_prices(
                &["EURUSD=X".to_string()],
                d(2020, 1, 1),
                d(2020, 2, 1),
                Interval::Weekly,
            )
            .await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse JSON response for EURUSD=X")
        );
    }
}
