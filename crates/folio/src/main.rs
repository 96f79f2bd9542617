//! Folio - content version history from the command line.
//!
//! Reads the JSON version store of a site and lets an editor browse history,
//! compare versions and restore an earlier one.

mod commands;
mod render;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use folio_core::{Config, Stores};
use folio_snapshot::{ContentKey, ContentType};
use folio_store::{JsonEntityStore, JsonVersionStore};
use folio_util::log::{LogConfig, LogLevel};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "folio")]
#[command(author, version, about = "Content version history for folio sites", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding the version and entity stores
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Entity selector shared by most commands.
#[derive(Args, Clone)]
struct Target {
    /// Content type (blog, portfolio, roadmap)
    content_type: ContentType,

    /// Entity identifier
    id: String,
}

impl Target {
    fn key(&self) -> ContentKey {
        ContentKey::new(self.content_type, self.id.clone())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List entities of one content type
    List {
        /// Content type (blog, portfolio, roadmap)
        content_type: ContentType,
    },

    /// Show version history, newest first
    History {
        #[command(flatten)]
        target: Target,

        /// Hide auto-save versions
        #[arg(long)]
        manual_only: bool,

        /// Page number, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Versions per page (defaults to history.page_size)
        #[arg(long)]
        per_page: Option<u32>,

        /// Print the page as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print one version record as JSON
    Show {
        #[command(flatten)]
        target: Target,

        /// Version number
        version: u32,
    },

    /// Compare two versions, or a version with the live record
    Diff {
        #[command(flatten)]
        target: Target,

        /// Older version number
        from: u32,

        /// Newer version number (defaults to the live record)
        to: Option<u32>,
    },

    /// Restore the live record to an earlier version
    Restore {
        #[command(flatten)]
        target: Target,

        /// Version number to restore
        version: u32,

        /// Apply without asking; otherwise only the changes are shown
        #[arg(short, long)]
        yes: bool,

        /// Also record the restored state as a manual version
        #[arg(long)]
        record: bool,
    },

    /// Count stored versions of an entity
    Count {
        #[command(flatten)]
        target: Target,
    },

    /// Delete old auto-save versions
    Prune {
        #[command(flatten)]
        target: Target,

        /// Auto-saves to keep (defaults to autosave.max_auto_saves)
        #[arg(short, long)]
        keep: Option<usize>,
    },

    /// Show resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;

    let (config, sources) = Config::load(Some(&cwd)).await?;
    init_logging(cli.verbose, &config);
    tracing::debug!(sources = ?sources, "Loaded configuration");

    if let Commands::Config = cli.command {
        return commands::show_config(&config, &sources);
    }

    let data_dir = cli
        .data_dir
        .clone()
        .or_else(|| config.data_dir(Some(&cwd)))
        .context("could not determine a data directory; pass --data-dir")?;
    tracing::debug!(path = %data_dir.display(), "Using data directory");

    let stores = Stores::new(
        Arc::new(JsonVersionStore::new(&data_dir)),
        Arc::new(JsonEntityStore::new(&data_dir)),
    );

    match cli.command {
        Commands::List { content_type } => commands::list(&stores, content_type).await,
        Commands::History {
            target,
            manual_only,
            page,
            per_page,
            json,
        } => {
            let per_page = per_page.unwrap_or(config.history.page_size);
            let include_auto_saves = config.history.include_auto_saves && !manual_only;
            commands::history(&stores, &target.key(), include_auto_saves, page, per_page, json)
                .await
        }
        Commands::Show { target, version } => {
            commands::show(&stores, &target.key(), version).await
        }
        Commands::Diff { target, from, to } => {
            commands::diff(&stores, &config, target.key(), from, to).await
        }
        Commands::Restore {
            target,
            version,
            yes,
            record,
        } => commands::restore(&stores, &config, target.key(), version, yes, record).await,
        Commands::Count { target } => commands::count(&stores, &target.key()).await,
        Commands::Prune { target, keep } => {
            let keep = keep.unwrap_or(config.autosave.max_auto_saves);
            commands::prune(&stores, &target.key(), keep).await
        }
        Commands::Config => Ok(()),
    }
}

fn init_logging(verbose: bool, config: &Config) {
    let level = if verbose {
        LogLevel::Debug
    } else {
        config
            .log_level
            .as_deref()
            .and_then(LogLevel::parse)
            .unwrap_or(LogLevel::Warn)
    };

    folio_util::log::init(&LogConfig {
        level,
        include_location: verbose,
        ansi: std::io::stderr().is_terminal(),
    });
}
