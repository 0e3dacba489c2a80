//! # Inspiration List CLI (`insp`)
//!
//! Commands for initializing the store, adding and browsing inspirations,
//! previewing enrichment, and running the HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! insp --config ./config/insp.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `insp init` | Create the store |
//! | `insp serve` | Start the HTTP server |
//! | `insp add "<text>"` | Enrich and store a new inspiration |
//! | `insp list` | List stored inspirations, newest first |
//! | `insp get <id>` | Show one inspiration |
//! | `insp delete <id>` | Delete one inspiration |
//! | `insp enrich "<text>"` | Preview enrichment without storing |
//! | `insp reindex` | Rebuild the list index from stored records |
//! | `insp stats` | Show counts per category |
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`
//! (default `info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use inspiration_list::commands;
use inspiration_list::config;
use inspiration_list::records::{ListQuery, DEFAULT_PAGE_SIZE};
use inspiration_list::server;

/// Inspiration List: capture ideas, enrich them with AI, browse them later.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/insp.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "insp",
    about = "Inspiration List: capture ideas, enrich them with AI, browse them later",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/insp.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the store.
    ///
    /// Creates the SQLite database file and schema. Safe to run repeatedly.
    Init,

    /// Start the HTTP server on `[server].bind`.
    Serve,

    /// Enrich and store a new inspiration.
    Add {
        /// The transcribed text.
        text: String,

        /// Base64 audio payload (optionally a `data:` URL).
        #[arg(long)]
        audio: Option<String>,
    },

    /// List inspirations, newest first.
    List {
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Page size (capped at 100).
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: usize,

        /// Only show this category (`all` disables the filter).
        #[arg(long)]
        category: Option<String>,

        /// Case-insensitive substring over text, summary, and tags.
        #[arg(long)]
        search: Option<String>,
    },

    /// Show one inspiration by id.
    Get { id: String },

    /// Delete one inspiration by id.
    Delete { id: String },

    /// Preview enrichment for a text without storing it.
    ///
    /// Works without a config file (falls back to the local heuristic).
    Enrich { text: String },

    /// Rebuild the list index from stored records.
    Reindex,

    /// Show record counts per category.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Enrich { text } = &cli.command {
        let cfg = config::load_config(&cli.config).unwrap_or_else(|_| config::Config::minimal());
        commands::run_enrich(&cfg, text).await?;
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => commands::run_init(&cfg).await?,
        Commands::Serve => server::run_server(&cfg).await?,
        Commands::Add { text, audio } => commands::run_add(&cfg, &text, audio.as_deref()).await?,
        Commands::List {
            page,
            limit,
            category,
            search,
        } => {
            let query = ListQuery {
                page,
                limit,
                category,
                search,
            };
            commands::run_list(&cfg, query).await?;
        }
        Commands::Get { id } => commands::run_get(&cfg, &id).await?,
        Commands::Delete { id } => commands::run_delete(&cfg, &id).await?,
        Commands::Enrich { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
        Commands::Reindex => commands::run_reindex(&cfg).await?,
        Commands::Stats => commands::run_stats(&cfg).await?,
    }

    Ok(())
}
