//! The crawl command.

use std::sync::Arc;

use console::style;

use super::open_database;
use crate::config::Config;
use crate::scrapers::{CrawlOrchestrator, HttpClient, RetryPolicy};
use crate::state::{connect_backend, CrawlState};

/// Run one full crawl.
pub async fn cmd_parse(config: &Config) -> anyhow::Result<()> {
    let ctx = open_database(config).await?;
    let backend = connect_backend(config.state_backend.as_deref()).await?;
    let client = HttpClient::new(&config.storefront, RetryPolicy::from_config(&config.crawl))?;

    let orchestrator = CrawlOrchestrator::new(
        config,
        Arc::new(client),
        CrawlState::new(backend),
        ctx.reviews(),
    );

    let summary = match orchestrator.run().await {
        Ok(summary) => summary,
        Err(e) if e.is_forbidden() => {
            eprintln!(
                "{} The storefront blocked the crawler, stopping",
                style("✗").red()
            );
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    println!(
        "{} Crawled {} listing pages",
        style("✓").green(),
        summary.listing_pages
    );
    println!(
        "  {} products, {} review pages, {} reviews stored",
        summary.products, summary.review_pages, summary.reviews_stored
    );
    if summary.products_failed > 0 || summary.reviews_failed > 0 {
        println!(
            "  {} {} products failed, {} reviews skipped",
            style("!").yellow(),
            summary.products_failed,
            summary.reviews_failed
        );
    }

    Ok(())
}
