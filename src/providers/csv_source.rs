use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::price::{Bar, Interval, PriceHistory, PriceSource};
use crate::core::series::parse_date;

#[derive(Debug, Deserialize)]
struct CsvBar {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open", default)]
    open: Option<f64>,
    #[serde(rename = "High", default)]
    high: Option<f64>,
    #[serde(rename = "Low", default)]
    low: Option<f64>,
    #[serde(rename = "Close")]
    close: Option<f64>,
    #[serde(rename = "Adj Close", default)]
    adj_close: Option<f64>,
    #[serde(rename = "Volume", default)]
    volume: Option<f64>,
}

/// Price history stored as one `{ticker}.csv` export per instrument.
///
/// Files are expected at the requested interval already; rows are only
/// filtered by date.
pub struct CsvPriceSource {
    dir: PathBuf,
}

impl CsvPriceSource {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        CsvPriceSource { dir: dir.into() }
    }

    pub fn path_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{ticker}.csv"))
    }

    fn read_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<PriceHistory> {
        let path = self.path_for(ticker);
        let bars = read_bars(&path)?
            .into_iter()
            .filter(|bar| bar.date >= start && bar.date <= end)
            .collect::<Vec<_>>();
        debug!(ticker, bars = bars.len(), "Read local price history");

        Ok(PriceHistory {
            symbol: ticker.to_string(),
            interval,
            bars,
        })
    }
}

fn read_bars(path: &Path) -> Result<Vec<Bar>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open price file: {}", path.display()))?;

    let mut bars = Vec::new();
    for row in reader.deserialize::<CsvBar>() {
        let row = row.with_context(|| format!("Failed to parse price file: {}", path.display()))?;
        let Some(close) = row.close else {
            continue;
        };
        bars.push(Bar {
            date: parse_date(&row.date)?,
            open: row.open,
            high: row.high,
            low: row.low,
            close,
            adj_close: row.adj_close,
            volume: row.volume,
        });
    }
    bars.sort_by_key(|bar| bar.date);
    Ok(bars)
}

#[async_trait]
impl PriceSource for CsvPriceSource {
    async fn fetch_prices(
        &self,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<Vec<PriceHistory>> {
        tickers
            .iter()
            .map(|ticker| self.read_history(ticker, start, end, interval))
            .collect()
    }
}
