//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `ingest`: Reconcile collection files into the library
//! - `sync`: Snapshot remote playlists to disk
//! - `library`: Statistics and collection listings
//! - `matching`: Look up manual tracks on the streaming service

mod ingest;
mod library;
mod matching;
mod sync;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::SqlitePool;

use crate::config::{self, Config};
use crate::db;
use crate::spotify::SpotifyClient;

pub use ingest::cmd_ingest;
pub use library::{cmd_list, cmd_stats};
pub use matching::cmd_match;
pub use sync::cmd_sync;

/// Music collection ingestion and statistics
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: the OS config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database path (overrides the config file)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Ingest manual collections and remote snapshots into the library
    Ingest {
        /// Collection keys, or `all`
        #[arg(required = true)]
        ids: Vec<String>,
        /// Delete every collection, track and artist first
        #[arg(long)]
        clear: bool,
        /// Skip malformed collections instead of stopping
        #[arg(long)]
        keep_going: bool,
    },
    /// Snapshot finished remote playlists to the snapshot directory
    Sync {
        /// Remove local snapshots first
        #[arg(long)]
        clear: bool,
        /// Access token (or set SPOTIFY_ACCESS_TOKEN env var)
        #[arg(long, env = "SPOTIFY_ACCESS_TOKEN")]
        token: Option<String>,
    },
    /// Recompute and print library statistics
    Stats {
        /// Number of artists to show
        #[arg(long, default_value = "10")]
        top: i64,
    },
    /// List collections in the library
    List,
    /// Look up the tracks of a manual collection on the streaming service
    Match {
        /// Collection key
        key: String,
        /// Access token (or set SPOTIFY_ACCESS_TOKEN env var)
        #[arg(long, env = "SPOTIFY_ACCESS_TOKEN")]
        token: Option<String>,
    },
    /// Print the effective configuration
    Config {
        /// Write it to the config file
        #[arg(long)]
        init: bool,
    },
}

/// Run the parsed command line.
pub fn run_command(cli: &Cli) -> anyhow::Result<ExitCode> {
    let mut config = match &cli.config {
        Some(path) => config::load_from(path),
        None => config::load(),
    };
    if let Some(db) = &cli.db {
        config.library.database = Some(db.clone());
    }
    config.validate()?;

    // Everything runs sequentially on this thread
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match &cli.command {
        Commands::Ingest {
            ids,
            clear,
            keep_going,
        } => cmd_ingest(&rt, &config, ids, *clear, *keep_going),
        Commands::Sync { clear, token } => {
            cmd_sync(&rt, &config, *clear, token.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Stats { top } => {
            cmd_stats(&rt, &config, *top)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::List => {
            cmd_list(&rt, &config)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Match { key, token } => {
            cmd_match(&rt, &config, key, token.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config { init } => {
            cmd_config(&config, cli.config.as_deref(), *init)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Print the effective configuration, optionally saving it.
fn cmd_config(config: &Config, path: Option<&Path>, init: bool) -> anyhow::Result<()> {
    if init {
        let written = match path {
            Some(path) => {
                config::save_to(config, path)?;
                path.to_path_buf()
            }
            None => config::save(config)?,
        };
        println!("Wrote {}", written.display());
    }
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Open (creating and migrating if needed) the configured database.
pub(crate) async fn open_library(config: &Config) -> anyhow::Result<SqlitePool> {
    let url = db::db_url(config.library.database.as_deref());
    db::init_db(&url)
        .await
        .with_context(|| format!("Failed to open database {url}"))
}

/// Build a streaming-service client; `token` overrides the config file.
pub(crate) fn spotify_client(config: &Config, token: Option<&str>) -> anyhow::Result<SpotifyClient> {
    let token = token
        .or(config.spotify.access_token.as_deref())
        .context("No access token: pass --token or set SPOTIFY_ACCESS_TOKEN")?;
    let client = SpotifyClient::with_base_url(token, config.spotify.base_url.as_str())?
        .with_page_limit(config.spotify.page_limit);
    Ok(client)
}

/// `M:SS`, or `H:MM:SS` from an hour up.
pub(crate) fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}
