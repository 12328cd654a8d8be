//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod init;
mod parse;
mod status;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::repository::util::sqlite_path;
use crate::repository::DieselDbContext;

#[derive(Parser)]
#[command(name = "ozon-reviews")]
#[command(about = "Harvest product reviews from the storefront")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Create the review database
    Init,

    /// Crawl listing pages and store the reviews of every listed product
    Parse,

    /// Show stored review counts
    Status,
}

/// Load the config from `path`, or discover it when none is given.
async fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from_path(path)
            .await
            .with_context(|| format!("loading {}", path.display()))?
            .with_env_overrides(),
        None => Config::load().await,
    };
    config.validate()?;
    Ok(config)
}

/// Open the configured database, creating its directory and schema.
async fn open_database(config: &Config) -> anyhow::Result<DieselDbContext> {
    let url = config.database_url();
    if let Some(parent) = sqlite_path(&url).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }

    let ctx = DieselDbContext::new(&url);
    ctx.init_schema()
        .await
        .with_context(|| format!("initializing database {}", url))?;
    Ok(ctx)
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Init => init::cmd_init(&config).await,
        Commands::Parse => parse::cmd_parse(&config).await,
        Commands::Status => status::cmd_status(&config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_takes_no_arguments() {
        let cli = Cli::try_parse_from(["ozon-reviews", "parse"]).unwrap();
        assert!(matches!(cli.command, Commands::Parse));
        assert!(!cli.verbose);

        let cli =
            Cli::try_parse_from(["ozon-reviews", "-v", "status", "--config", "x.toml"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config.as_deref(), Some(Path::new("x.toml")));

        assert!(Cli::try_parse_from(["ozon-reviews", "parse", "--pages", "3"]).is_err());
    }

    #[tokio::test]
    async fn test_open_database_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("reviews.db");
        let config = Config {
            database: Some(format!("sqlite://{}", db.display())),
            ..Config::default()
        };

        let ctx = open_database(&config).await.unwrap();
        assert_eq!(ctx.reviews().count().await.unwrap(), 0);
        assert!(db.exists());
    }
}
