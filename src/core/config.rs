use crate::core::price::{Interval, MAJOR_PAIRS};
use crate::core::statistics::DEFAULT_SIGNIFICANCE_LEVEL;
use crate::core::yields::{DEFAULT_RAW_YIELD_FILE, DEFAULT_WEEKLY_YIELD_FILE, YieldStore};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub yahoo: Option<YahooProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            yahoo: Some(YahooProviderConfig {
                base_url: "https://query1.finance.yahoo.com".to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct DataConfig {
    pub pairs_file: PathBuf,
    pub yields_dir: PathBuf,
    pub raw_yield_file: String,
    pub weekly_yield_file: String,
    /// When set, prices are read from `{prices_dir}/{ticker}.csv` instead of Yahoo.
    pub prices_dir: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            pairs_file: PathBuf::from("pairs.json"),
            yields_dir: PathBuf::from("Data/Yields"),
            raw_yield_file: DEFAULT_RAW_YIELD_FILE.to_string(),
            weekly_yield_file: DEFAULT_WEEKLY_YIELD_FILE.to_string(),
            prices_dir: None,
        }
    }
}

impl DataConfig {
    pub fn yield_store(&self) -> YieldStore {
        YieldStore::new(&self.yields_dir)
            .with_templates(&self.raw_yield_file, &self.weekly_yield_file)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AnalysisConfig {
    pub pairs: Vec<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub interval: Interval,
    pub periods_per_year: Option<u32>,
    pub significance_level: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            pairs: MAJOR_PAIRS.iter().map(|p| p.to_string()).collect(),
            start: NaiveDate::from_ymd_opt(2003, 1, 1).expect("valid date"),
            end: NaiveDate::from_ymd_opt(2023, 12, 31).expect("valid date"),
            interval: Interval::Weekly,
            periods_per_year: None,
            significance_level: DEFAULT_SIGNIFICANCE_LEVEL,
        }
    }
}

impl AnalysisConfig {
    /// Explicit override, otherwise the convention of the sampling interval.
    pub fn periods_per_year(&self) -> f64 {
        self.periods_per_year
            .unwrap_or_else(|| self.interval.periods_per_year()) as f64
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "fxstats", "fxstats")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn yahoo_base_url(&self) -> &str {
        self.providers
            .yahoo
            .as_ref()
            .map_or("https://query1.finance.yahoo.com", |p| &p.base_url)
    }
}
