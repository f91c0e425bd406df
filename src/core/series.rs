//! Date-indexed series and column tables shared by the provider and statistics layers.

use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// A single dated sequence of values, ordered by date with unique dates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl TimeSeries {
    /// Builds a series from unordered points. Dates are sorted and a repeated
    /// date keeps the value seen last.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let ordered: BTreeMap<NaiveDate, f64> = points.into_iter().collect();
        let (dates, values) = ordered.into_iter().unzip();
        TimeSeries { dates, values }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    pub fn last(&self) -> Option<(NaiveDate, f64)> {
        self.dates.last().copied().zip(self.values.last().copied())
    }

    /// Observations with `start <= date <= end`.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> Self {
        self.iter()
            .filter(|(date, _)| *date >= start && *date <= end)
            .collect()
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        TimeSeries {
            dates: self.dates.clone(),
            values: self.values.iter().map(|v| f(*v)).collect(),
        }
    }

    /// Period-over-period percentage change. The first observation has no
    /// predecessor and is dropped.
    pub fn pct_change(&self) -> Self {
        TimeSeries {
            dates: self.dates.iter().skip(1).copied().collect(),
            values: pct_change(&self.values),
        }
    }
}

impl FromIterator<(NaiveDate, f64)> for TimeSeries {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, f64)>>(iter: I) -> Self {
        let (dates, values) = iter.into_iter().unzip();
        TimeSeries { dates, values }
    }
}

fn pct_change(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

/// Several named series sharing one date index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesTable {
    pub index: Vec<NaiveDate>,
    pub columns: Vec<Column>,
}

impl SeriesTable {
    /// Joins the series on the dates present in every one of them.
    pub fn align(series: Vec<(String, TimeSeries)>) -> Self {
        let lookups: Vec<BTreeMap<NaiveDate, f64>> =
            series.iter().map(|(_, s)| s.iter().collect()).collect();

        let index: Vec<NaiveDate> = match lookups.split_first() {
            Some((first, rest)) => first
                .keys()
                .filter(|date| rest.iter().all(|lookup| lookup.contains_key(*date)))
                .copied()
                .collect(),
            None => Vec::new(),
        };

        let columns = series
            .into_iter()
            .zip(&lookups)
            .map(|((name, _), lookup)| Column {
                name,
                values: index.iter().map(|date| lookup[date]).collect(),
            })
            .collect();

        SeriesTable { index, columns }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn column_series(&self, name: &str) -> Option<TimeSeries> {
        self.column(name).map(|values| TimeSeries {
            dates: self.index.clone(),
            values: values.to_vec(),
        })
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Percentage change of every column; the first row is dropped.
    pub fn pct_change(&self) -> Self {
        SeriesTable {
            index: self.index.iter().skip(1).copied().collect(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: pct_change(&c.values),
                })
                .collect(),
        }
    }

    /// Replaces the column labels positionally.
    pub fn rename<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        if names.len() != self.columns.len() {
            bail!(
                "Length mismatch: table has {} columns, {} names given",
                self.columns.len(),
                names.len()
            );
        }
        for (column, name) in self.columns.iter_mut().zip(names) {
            column.name = name.as_ref().to_string();
        }
        Ok(())
    }
}

/// Parses the date column of provider CSV exports. Accepts plain dates and
/// datetimes whose first token is a date.
pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .ok_or_else(|| anyhow!("Empty date field"))?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .with_context(|| format!("Invalid date: {trimmed}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_from_points_sorts_and_keeps_last_duplicate() {
        let series = TimeSeries::from_points(vec![
            (d(2020, 1, 3), 3.0),
            (d(2020, 1, 1), 1.0),
            (d(2020, 1, 3), 4.0),
        ]);
        assert_eq!(series.dates, vec![d(2020, 1, 1), d(2020, 1, 3)]);
        assert_eq!(series.values, vec![1.0, 4.0]);
    }

    #[test]
    fn test_pct_change_drops_first_observation() {
        let series = TimeSeries::from_points(vec![
            (d(2020, 1, 1), 100.0),
            (d(2020, 1, 8), 110.0),
            (d(2020, 1, 15), 99.0),
        ]);
        let returns = series.pct_change();
        assert_eq!(returns.dates, vec![d(2020, 1, 8), d(2020, 1, 15)]);
        assert!((returns.values[0] - 0.10).abs() < 1e-12);
        assert!((returns.values[1] + 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_align_keeps_common_dates_only() {
        let a = TimeSeries::from_points(vec![
            (d(2020, 1, 1), 1.0),
            (d(2020, 1, 2), 2.0),
            (d(2020, 1, 3), 3.0),
        ]);
        let b = TimeSeries::from_points(vec![(d(2020, 1, 2), 20.0), (d(2020, 1, 3), 30.0)]);
        let table = SeriesTable::align(vec![("a".to_string(), a), ("b".to_string(), b)]);

        assert_eq!(table.index, vec![d(2020, 1, 2), d(2020, 1, 3)]);
        assert_eq!(table.column("a"), Some(&[2.0, 3.0][..]));
        assert_eq!(table.column("b"), Some(&[20.0, 30.0][..]));
        assert_eq!(table.names(), vec!["a", "b"]);
    }

    #[test]
    fn test_rename_rejects_length_mismatch() {
        let a = TimeSeries::from_points(vec![(d(2020, 1, 1), 1.0)]);
        let mut table = SeriesTable::align(vec![("a".to_string(), a)]);

        let result = table.rename(&["x", "y"]);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Length mismatch"));

        table.rename(&["EURUSD"]).unwrap();
        assert!(table.column("EURUSD").is_some());
    }

    #[test]
    fn test_between_is_inclusive() {
        let series = TimeSeries::from_points((1..=5).map(|day| (d(2020, 1, day), day as f64)));
        let window = series.between(d(2020, 1, 2), d(2020, 1, 4));
        assert_eq!(window.values, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_parse_date_accepts_datetime_prefix() {
        assert_eq!(parse_date("2013-01-06").unwrap(), d(2013, 1, 6));
        assert_eq!(parse_date("2013-01-06 00:00:00").unwrap(), d(2013, 1, 6));
        assert!(parse_date("06/01/2013").is_err());
    }
}
