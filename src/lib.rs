pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::price::PriceSource;
use anyhow::Result;
use chrono::NaiveDate;
use tracing::{debug, info};

/// Commands that run against a loaded configuration.
#[derive(Debug, Clone)]
pub enum AppCommand {
    Pairs {
        provider: String,
    },
    Stats,
    Differential {
        pair: String,
        start: NaiveDate,
        end: NaiveDate,
    },
    Wrangle,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fxstats starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Pairs { provider } => cli::pairs::run(&config, &provider),
        AppCommand::Stats => {
            let source = price_source(&config);
            cli::stats::run(&config.analysis, source.as_ref()).await
        }
        AppCommand::Differential { pair, start, end } => {
            cli::differential::run(&config, &pair, start, end)
        }
        AppCommand::Wrangle => cli::wrangle::run(&config),
    }
}

/// Local CSV prices when a prices directory is configured, Yahoo otherwise.
fn price_source(config: &AppConfig) -> Box<dyn PriceSource> {
    match &config.data.prices_dir {
        Some(dir) => {
            debug!("Reading prices from {}", dir.display());
            Box::new(providers::CsvPriceSource::new(dir))
        }
        None => Box::new(providers::YahooFinanceSource::new(
            config.yahoo_base_url(),
        )),
    }
}
