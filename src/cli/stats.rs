use super::ui;
use crate::core::config::AnalysisConfig;
use crate::core::price::{PriceSource, yahoo_ticker};
use crate::core::statistics::{self, DescriptiveStatistics};
use anyhow::{Result, bail};
use comfy_table::Cell;
use tracing::info;

/// Renders summary records as a table with one row per series.
pub fn display_as_table(rows: &[DescriptiveStatistics]) -> String {
    let mut table = ui::new_styled_table();

    let mut header = vec![ui::header_cell("Series")];
    header.extend(DescriptiveStatistics::HEADERS.iter().map(|h| ui::header_cell(h)));
    table.set_header(header);

    for row in rows {
        table.add_row(vec![
            Cell::new(&row.name),
            ui::signed_cell(row.annualized_return, 2),
            ui::number_cell(row.annualized_volatility, 2),
            ui::number_cell(row.skewness, 2),
            ui::number_cell(row.kurtosis, 2),
            ui::flag_cell(row.normal_distribution),
        ]);
    }

    table.to_string()
}

/// Fetches returns of the configured pairs and prints their statistics.
pub async fn run(analysis: &AnalysisConfig, source: &dyn PriceSource) -> Result<()> {
    if analysis.pairs.is_empty() {
        bail!("No currency pairs configured for analysis");
    }
    info!(pairs = ?analysis.pairs, interval = %analysis.interval, "Fetching returns");

    let tickers: Vec<String> = analysis.pairs.iter().map(|p| yahoo_ticker(p)).collect();

    let pb = ui::new_spinner("Fetching prices...");
    let returns = source
        .fetch_returns(
            &tickers,
            &analysis.pairs,
            analysis.start,
            analysis.end,
            analysis.interval,
        )
        .await;
    pb.finish_and_clear();
    let returns = returns?;

    if returns.is_empty() {
        println!("No overlapping observations for the configured pairs.");
        return Ok(());
    }

    let periods_per_year = analysis.periods_per_year();
    let rows = statistics::summarize_at_level(
        &returns,
        periods_per_year,
        analysis.significance_level,
    )?;

    println!(
        "{}",
        ui::style_text(
            &format!("Descriptive statistics ({} returns)", analysis.interval),
            ui::StyleType::Title
        )
    );
    println!("{}", display_as_table(&rows));
    println!(
        "{}",
        ui::style_text(
            &format!(
                "{} observations from {} to {}, {} periods per year, Jarque-Bera at {}",
                returns.len(),
                returns.index[0],
                returns.index[returns.len() - 1],
                periods_per_year,
                analysis.significance_level
            ),
            ui::StyleType::Subtle
        )
    );

    Ok(())
}
