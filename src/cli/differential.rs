use super::{stats, ui};
use crate::core::config::AppConfig;
use crate::core::price::Interval;
use crate::core::series::SeriesTable;
use crate::core::statistics;
use crate::core::yields::YieldDifferential;
use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::Cell;

const RECENT_WEEKS: usize = 10;

impl YieldDifferential {
    /// Latest weeks of the three series, rates in percent per period.
    pub fn display_recent(&self, weeks: usize) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Week"),
            ui::header_cell("Basis (%)"),
            ui::header_cell("Counter (%)"),
            ui::header_cell("Differential (%)"),
        ]);

        let skip = self.differential.len().saturating_sub(weeks);
        for (i, (date, diff)) in self.differential.iter().enumerate().skip(skip) {
            table.add_row(vec![
                Cell::new(date),
                ui::number_cell(self.basis.values[i] * 100.0, 4),
                ui::number_cell(self.counter.values[i] * 100.0, 4),
                ui::signed_cell(diff * 100.0, 4),
            ]);
        }
        table.to_string()
    }
}

pub fn run(config: &AppConfig, pair: &str, start: NaiveDate, end: NaiveDate) -> Result<()> {
    // Yield files are always weekly.
    let periods_per_year = Interval::Weekly.periods_per_year() as f64;
    let store = config.data.yield_store();
    let result = store.yield_differential(pair, start, end, periods_per_year)?;

    if result.differential.is_empty() {
        println!("No common yield observations for {pair} between {start} and {end}.");
        return Ok(());
    }

    println!(
        "{}",
        ui::style_text(
            &format!("Weekly yield differential {}", pair.to_ascii_uppercase()),
            ui::StyleType::Title
        )
    );
    println!("{}", result.display_recent(RECENT_WEEKS));

    let table = SeriesTable::align(vec![
        ("Basis".to_string(), result.basis.clone()),
        ("Counter".to_string(), result.counter.clone()),
        ("Differential".to_string(), result.differential.clone()),
    ]);
    let rows = statistics::summarize_at_level(
        &table,
        periods_per_year,
        config.analysis.significance_level,
    )?;
    println!("{}", stats::display_as_table(&rows));

    Ok(())
}
