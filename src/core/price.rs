//! Price source abstractions and core types

use crate::core::series::{SeriesTable, TimeSeries};
use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use tracing::debug;

/// The seven major USD pairs in their canonical form.
pub const MAJOR_PAIRS: [&str; 7] = [
    "EURUSD", "GBPUSD", "NZDUSD", "USDCAD", "USDCHF", "USDJPY", "AUDUSD",
];

/// Sampling interval of a price request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1d")]
    Daily,
    #[serde(rename = "1wk")]
    Weekly,
    #[serde(rename = "1mo")]
    Monthly,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Daily => "1d",
            Interval::Weekly => "1wk",
            Interval::Monthly => "1mo",
        }
    }

    /// Conventional number of observations per year at this interval.
    pub fn periods_per_year(&self) -> u32 {
        match self {
            Interval::Daily => 252,
            Interval::Weekly => 52,
            Interval::Monthly => 12,
        }
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Interval {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1d" => Ok(Interval::Daily),
            "1wk" => Ok(Interval::Weekly),
            "1mo" => Ok(Interval::Monthly),
            _ => Err(anyhow::anyhow!("Invalid interval: {}", s)),
        }
    }
}

/// One OHLC observation. Only the close is guaranteed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub adj_close: Option<f64>,
    pub volume: Option<f64>,
}

/// Bars of a single instrument, ordered by date.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistory {
    pub symbol: String,
    pub interval: Interval,
    pub bars: Vec<Bar>,
}

impl PriceHistory {
    pub fn closes(&self) -> TimeSeries {
        TimeSeries::from_points(self.bars.iter().map(|b| (b.date, b.close)))
    }
}

/// Yahoo Finance ticker of a canonical pair, e.g. `EURUSD=X`.
pub fn yahoo_ticker(pair: &str) -> String {
    format!("{pair}=X")
}

#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetches the raw bars of every ticker over `[start, end]`, in ticker order.
    async fn fetch_prices(
        &self,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<Vec<PriceHistory>>;

    /// Close-to-close returns of every ticker on their common dates, labelled
    /// with `column_names`.
    async fn fetch_returns(
        &self,
        tickers: &[String],
        column_names: &[String],
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<SeriesTable> {
        if tickers.len() != column_names.len() {
            bail!(
                "Length mismatch: {} tickers but {} column names",
                tickers.len(),
                column_names.len()
            );
        }

        let histories = self.fetch_prices(tickers, start, end, interval).await?;
        let closes = histories
            .iter()
            .map(|h| (h.symbol.clone(), h.closes()))
            .collect();

        let mut returns = SeriesTable::align(closes).pct_change();
        returns.rename(column_names)?;
        debug!(
            rows = returns.len(),
            columns = returns.columns.len(),
            "Computed return table"
        );
        Ok(returns)
    }
}

fn major_tickers() -> Vec<String> {
    MAJOR_PAIRS.iter().map(|p| yahoo_ticker(p)).collect()
}

/// Raw bars of the major pairs.
pub async fn fetch_major_prices(
    source: &dyn PriceSource,
    start: NaiveDate,
    end: NaiveDate,
    interval: Interval,
) -> Result<Vec<PriceHistory>> {
    source
        .fetch_prices(&major_tickers(), start, end, interval)
        .await
}

/// Returns of the major pairs, labelled by canonical pair name.
pub async fn fetch_major_returns(
    source: &dyn PriceSource,
    start: NaiveDate,
    end: NaiveDate,
    interval: Interval,
) -> Result<SeriesTable> {
    let names: Vec<String> = MAJOR_PAIRS.iter().map(|p| p.to_string()).collect();
    source
        .fetch_returns(&major_tickers(), &names, start, end, interval)
        .await
}
