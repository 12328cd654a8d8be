//! Initialize command.

use console::style;

use super::open_database;
use crate::config::Config;

/// Create the review database.
pub async fn cmd_init(config: &Config) -> anyhow::Result<()> {
    open_database(config).await?;

    println!(
        "{} Initialized review database at {}",
        style("✓").green(),
        config.database_url()
    );
    if let Some(path) = &config.source_path {
        println!("  Using config {}", path.display());
    }

    Ok(())
}
