//! Stored review statistics.

use console::style;

use super::open_database;
use crate::config::Config;

/// Print how many reviews are stored, overall and per product.
pub async fn cmd_status(config: &Config) -> anyhow::Result<()> {
    let repo = open_database(config).await?.reviews();

    let total = repo.count().await?;
    if total == 0 {
        println!("{} No reviews stored", style("!").yellow());
        return Ok(());
    }

    println!("{}", style(format!("{} reviews stored", total)).bold());
    for (tag, count) in repo.count_by_tag().await? {
        println!("  {:>6}  {}", count, tag);
    }

    Ok(())
}
