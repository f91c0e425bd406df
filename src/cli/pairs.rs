use super::ui;
use crate::core::config::AppConfig;
use crate::core::pairs::{load_pair_metadata, pairs_from_metadata};
use anyhow::Result;
use comfy_table::Cell;

/// Prints the catalog's pairs in the notation of `provider`.
pub fn run(config: &AppConfig, provider: &str) -> Result<()> {
    let records = load_pair_metadata(&config.data.pairs_file)?;
    let codes = pairs_from_metadata(&records, provider)?;

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Pair"),
        ui::header_cell(&format!("Code ({provider})")),
    ]);
    for (record, code) in records.iter().zip(&codes) {
        table.add_row(vec![Cell::new(record.canonical()), Cell::new(code)]);
    }
    println!("{table}");
    Ok(())
}
