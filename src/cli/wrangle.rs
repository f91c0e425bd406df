use super::ui;
use crate::core::config::AppConfig;
use anyhow::Result;
use tracing::info;

/// Resamples every country's raw yield export into its weekly file.
pub fn run(config: &AppConfig) -> Result<()> {
    let store = config.data.yield_store();
    info!(dir = %config.data.yields_dir.display(), "Wrangling yield files");

    let written = store.wrangle_all()?;
    for path in &written {
        println!(
            "{} {}",
            ui::style_text("wrote", ui::StyleType::Subtle),
            path.display()
        );
    }
    Ok(())
}
