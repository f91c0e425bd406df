//! Short-term yield files: weekly resampling, loading and rate differentials.

use crate::core::series::{SeriesTable, TimeSeries, parse_date};
use anyhow::{Context, Result, anyhow, bail};
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Country codes with EconDB yield exports.
pub const COUNTRIES: [&str; 7] = ["AU", "CA", "EU", "JP", "NZ", "UK", "US"];

pub const DEFAULT_RAW_YIELD_FILE: &str = "EconDB {country} 3 Month Yield.csv";
pub const DEFAULT_WEEKLY_YIELD_FILE: &str = "EconDB {country} 3 Month Yield 2013 to 2023 Weekly.csv";

/// Country code used in yield file names for a currency.
pub fn country_for_currency(currency: &str) -> Result<&'static str> {
    match currency {
        "AUD" => Ok("AU"),
        "CAD" => Ok("CA"),
        "EUR" => Ok("EU"),
        "JPY" => Ok("JP"),
        "NZD" => Ok("NZ"),
        "GBP" => Ok("UK"),
        "USD" => Ok("US"),
        _ => Err(anyhow!("No yield country for currency: {}", currency)),
    }
}

/// Converts an annual rate to the equivalent compounded rate per period.
pub fn per_period_rate(annual_rate: f64, periods_per_year: f64) -> f64 {
    (1.0 + annual_rate).powf(1.0 / periods_per_year) - 1.0
}

/// Inclusive date range kept when resampling raw yield exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResampleWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ResampleWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

impl Default for ResampleWindow {
    fn default() -> Self {
        ResampleWindow {
            start: NaiveDate::from_ymd_opt(2012, 12, 31).expect("valid date"),
            end: NaiveDate::from_ymd_opt(2023, 12, 31).expect("valid date"),
        }
    }
}

/// The Sunday closing the week `date` falls in.
fn week_ending(date: NaiveDate) -> NaiveDate {
    let days_to_sunday = 6 - date.weekday().num_days_from_monday();
    date + Duration::days(days_to_sunday as i64)
}

/// Weekly series labelled by week-ending Sunday. Each week takes its last
/// observation; weeks without one repeat the previous week's value.
pub fn resample_weekly(series: &TimeSeries, window: ResampleWindow) -> TimeSeries {
    let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for (date, value) in series.iter().filter(|(date, _)| window.contains(*date)) {
        buckets.insert(week_ending(date), value);
    }

    let (Some(&first), Some(&last)) = (buckets.keys().next(), buckets.keys().next_back()) else {
        return TimeSeries::default();
    };

    let mut points = Vec::new();
    let mut carried = None;
    let mut week = first;
    while week <= last {
        if let Some(value) = buckets.get(&week) {
            carried = Some(*value);
        }
        if let Some(value) = carried {
            points.push((week, value));
        }
        week += Duration::weeks(1);
    }
    points.into_iter().collect()
}

/// Reads a two-column `date,value` file. Rows with an empty value are skipped.
pub fn read_yield_csv<P: AsRef<Path>>(path: P) -> Result<TimeSeries> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open yield file: {}", path.display()))?;

    let mut points = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record
            .with_context(|| format!("Failed to read row {} of {}", row + 1, path.display()))?;
        let (Some(raw_date), Some(raw_value)) = (record.get(0), record.get(1)) else {
            bail!("Expected two columns in row {} of {}", row + 1, path.display());
        };
        if raw_value.trim().is_empty() {
            continue;
        }
        let date = parse_date(raw_date)?;
        let value: f64 = raw_value
            .trim()
            .parse()
            .with_context(|| format!("Invalid yield value {raw_value:?} in {}", path.display()))?;
        points.push((date, value));
    }

    debug!(path = %path.display(), rows = points.len(), "Read yield file");
    Ok(TimeSeries::from_points(points))
}

pub fn write_yield_csv<P: AsRef<Path>>(path: P, series: &TimeSeries) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create yield file: {}", path.display()))?;
    writer.write_record(["Date", "Yield"])?;
    for (date, value) in series.iter() {
        writer.write_record([date.format("%Y-%m-%d").to_string(), value.to_string()])?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write yield file: {}", path.display()))?;
    Ok(())
}

/// Per-period basis and counter rates of a pair and their difference, on
/// the weeks both countries report.
#[derive(Debug, Clone, PartialEq)]
pub struct YieldDifferential {
    pub basis: TimeSeries,
    pub counter: TimeSeries,
    pub differential: TimeSeries,
}

/// A directory of per-country yield files named from `{country}` templates.
#[derive(Debug, Clone)]
pub struct YieldStore {
    dir: PathBuf,
    raw_file: String,
    weekly_file: String,
    window: ResampleWindow,
}

impl YieldStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        YieldStore {
            dir: dir.into(),
            raw_file: DEFAULT_RAW_YIELD_FILE.to_string(),
            weekly_file: DEFAULT_WEEKLY_YIELD_FILE.to_string(),
            window: ResampleWindow::default(),
        }
    }

    pub fn with_templates(mut self, raw_file: &str, weekly_file: &str) -> Self {
        self.raw_file = raw_file.to_string();
        self.weekly_file = weekly_file.to_string();
        self
    }

    pub fn with_window(mut self, window: ResampleWindow) -> Self {
        self.window = window;
        self
    }

    pub fn raw_path(&self, country: &str) -> PathBuf {
        self.dir.join(self.raw_file.replace("{country}", country))
    }

    pub fn weekly_path(&self, country: &str) -> PathBuf {
        self.dir.join(self.weekly_file.replace("{country}", country))
    }

    /// Turns the raw export of `country` into its weekly file and returns
    /// the written path.
    #[instrument(skip(self))]
    pub fn resample_yield_file(&self, country: &str) -> Result<PathBuf> {
        let raw = read_yield_csv(self.raw_path(country))?;
        let weekly = resample_weekly(&raw, self.window);
        let target = self.weekly_path(country);
        write_yield_csv(&target, &weekly)?;
        info!(weeks = weekly.len(), path = %target.display(), "Wrote weekly yields");
        Ok(target)
    }

    pub fn wrangle_all(&self) -> Result<Vec<PathBuf>> {
        COUNTRIES
            .iter()
            .map(|country| self.resample_yield_file(country))
            .collect()
    }

    /// Weekly yields of `country` as fractions.
    pub fn load_yield(&self, country: &str) -> Result<TimeSeries> {
        let series = read_yield_csv(self.weekly_path(country))?;
        Ok(series.map(|percent| percent / 100.0))
    }

    #[instrument(skip(self))]
    pub fn yield_differential(
        &self,
        pair: &str,
        start: NaiveDate,
        end: NaiveDate,
        periods_per_year: f64,
    ) -> Result<YieldDifferential> {
        if pair.len() != 6 || !pair.chars().all(|c| c.is_ascii_alphabetic()) {
            bail!("Invalid currency pair: {}", pair);
        }
        let pair = pair.to_ascii_uppercase();
        let (basis_currency, counter_currency) = pair.split_at(3);
        let (basis_country, counter_country) = (
            country_for_currency(basis_currency)?,
            country_for_currency(counter_currency)?,
        );

        let basis = self
            .load_yield(basis_country)?
            .between(start, end)
            .map(|y| per_period_rate(y, periods_per_year));
        let counter = self
            .load_yield(counter_country)?
            .between(start, end)
            .map(|y| per_period_rate(y, periods_per_year));

        let table = SeriesTable::align(vec![
            ("basis".to_string(), basis),
            ("counter".to_string(), counter),
        ]);
        let (Some(basis), Some(counter)) =
            (table.column_series("basis"), table.column_series("counter"))
        else {
            bail!("Missing aligned yield columns for {}", pair);
        };

        let differential = basis
            .iter()
            .zip(counter.values.iter())
            .map(|((date, b), c)| (date, b - c))
            .collect();
        debug!(weeks = table.len(), "Computed yield differential");

        Ok(YieldDifferential {
            basis,
            counter,
            differential,
        })
    }
}
