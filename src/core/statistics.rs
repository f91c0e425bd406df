//! Descriptive statistics of return series.
//!
//! Skewness and kurtosis divide the plain central moment by the population
//! standard deviation, which is also what the Jarque-Bera statistic expects.

use crate::core::series::SeriesTable;
use anyhow::{Result, anyhow};
use statrs::distribution::{ChiSquared, ContinuousCDF};
use statrs::statistics::Statistics;
use tracing::debug;

pub const DEFAULT_SIGNIFICANCE_LEVEL: f64 = 0.01;

/// Growth of one unit invested at the start of the series.
pub fn wealth_index(returns: &[f64]) -> Vec<f64> {
    returns
        .iter()
        .scan(1.0, |wealth, r| {
            *wealth *= 1.0 + r;
            Some(*wealth)
        })
        .collect()
}

/// Geometric mean return scaled to a year: `(Π(1+r))^(ppy/n) - 1`.
pub fn annualized_return(returns: &[f64], periods_per_year: f64) -> f64 {
    let compounded_growth: f64 = returns.iter().map(|r| 1.0 + r).product();
    compounded_growth.powf(periods_per_year / returns.len() as f64) - 1.0
}

/// Sample standard deviation scaled by `sqrt(ppy)`.
pub fn annualized_volatility(returns: &[f64], periods_per_year: f64) -> f64 {
    returns.iter().copied().std_dev() * periods_per_year.sqrt()
}

fn standardized_moment(returns: &[f64], order: i32) -> f64 {
    let mean = returns.iter().copied().mean();
    let sigma = returns.iter().copied().population_std_dev();
    let moment = returns.iter().map(|r| (r - mean).powi(order)).mean();
    moment / sigma.powi(order)
}

pub fn skewness(returns: &[f64]) -> f64 {
    standardized_moment(returns, 3)
}

/// Raw (not excess) kurtosis; a normal distribution scores 3.
pub fn kurtosis(returns: &[f64]) -> f64 {
    standardized_moment(returns, 4)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JarqueBera {
    pub statistic: f64,
    pub p_value: f64,
}

pub fn jarque_bera(returns: &[f64]) -> Result<JarqueBera> {
    let n = returns.len() as f64;
    let s = skewness(returns);
    let k = kurtosis(returns);
    let statistic = n / 6.0 * (s.powi(2) + (k - 3.0).powi(2) / 4.0);

    let chi2 = ChiSquared::new(2.0).map_err(|e| anyhow!("Chi-squared distribution: {e}"))?;
    Ok(JarqueBera {
        statistic,
        p_value: chi2.sf(statistic),
    })
}

/// True when Jarque-Bera fails to reject normality at `level`.
pub fn is_normally_distributed(returns: &[f64], level: f64) -> Result<bool> {
    let test = jarque_bera(returns)?;
    debug!(
        statistic = test.statistic,
        p_value = test.p_value,
        "Jarque-Bera test"
    );
    Ok(test.p_value > level)
}

/// Rounds to two decimals, ties to even.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[derive(Debug, Clone, PartialEq)]
pub struct DescriptiveStatistics {
    pub name: String,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    pub skewness: f64,
    pub kurtosis: f64,
    pub normal_distribution: bool,
}

impl DescriptiveStatistics {
    /// Column headers of a summary table, in field order.
    pub const HEADERS: [&'static str; 5] = [
        "Annualized Return",
        "Annualized Volatility",
        "Skewness",
        "Kurtosis",
        "Normal Distribution",
    ];

    pub fn from_returns(
        name: &str,
        returns: &[f64],
        periods_per_year: f64,
        level: f64,
    ) -> Result<Self> {
        Ok(DescriptiveStatistics {
            name: name.to_string(),
            annualized_return: round2(annualized_return(returns, periods_per_year)),
            annualized_volatility: round2(annualized_volatility(returns, periods_per_year)),
            skewness: round2(skewness(returns)),
            kurtosis: round2(kurtosis(returns)),
            normal_distribution: is_normally_distributed(returns, level)?,
        })
    }
}

/// One rounded record per column of `returns`, at the default significance level.
pub fn summarize(
    returns: &SeriesTable,
    periods_per_year: f64,
) -> Result<Vec<DescriptiveStatistics>> {
    summarize_at_level(returns, periods_per_year, DEFAULT_SIGNIFICANCE_LEVEL)
}

pub fn summarize_at_level(
    returns: &SeriesTable,
    periods_per_year: f64,
    level: f64,
) -> Result<Vec<DescriptiveStatistics>> {
    returns
        .columns
        .iter()
        .map(|column| {
            DescriptiveStatistics::from_returns(&column.name, &column.values, periods_per_year, level)
        })
        .collect()
}
