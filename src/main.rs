use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use fxstats::core::log::init_logging;
use fxstats::core::pairs::INVESTING_DOT_COM;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for fxstats::AppCommand {
    fn from(cmd: Commands) -> fxstats::AppCommand {
        match cmd {
            Commands::Pairs { provider } => fxstats::AppCommand::Pairs { provider },
            Commands::Stats => fxstats::AppCommand::Stats,
            Commands::Differential { pair, start, end } => {
                fxstats::AppCommand::Differential { pair, start, end }
            }
            Commands::Wrangle => fxstats::AppCommand::Wrangle,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// List currency pairs from the metadata catalog
    Pairs {
        /// Provider whose pair notation to use
        #[arg(short, long, default_value = INVESTING_DOT_COM)]
        provider: String,
    },
    /// Display descriptive statistics of the configured pairs' returns
    Stats,
    /// Display the weekly yield differential of a pair, e.g. EURUSD
    Differential {
        pair: String,
        #[arg(long, default_value = "2013-01-01")]
        start: NaiveDate,
        #[arg(long, default_value = "2023-12-31")]
        end: NaiveDate,
    },
    /// Resample raw yield exports into weekly files
    Wrangle,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => fxstats::cli::setup::setup(),
        Some(cmd) => fxstats::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
