//! Remote playlist snapshot command.

use tokio::runtime::Runtime;

use super::spotify_client;
use crate::config::Config;
use crate::sources::SnapshotStore;
use crate::spotify::{SyncOutcome, sync_playlists};

/// Write a snapshot for each finished remote playlist not stored yet.
pub fn cmd_sync(
    rt: &Runtime,
    config: &Config,
    clear: bool,
    token: Option<&str>,
) -> anyhow::Result<()> {
    let client = spotify_client(config, token)?;
    let store = SnapshotStore::new(&config.library.snapshot_dir);

    if clear {
        let removed = store.clear()?;
        println!("Removed {} local snapshot(s)", removed);
    }

    let report = rt.block_on(sync_playlists(
        &client,
        &store,
        &config.spotify.unfinished_prefixes,
    ))?;

    for outcome in &report.outcomes {
        match outcome {
            SyncOutcome::Written { name, tracks } => {
                println!("  ✓ {} ({} tracks)", name, tracks)
            }
            SyncOutcome::SkippedExisting { name } => println!("  = {} (already local)", name),
            SyncOutcome::SkippedEmpty { name } => println!("  - {} (empty)", name),
        }
    }
    println!(
        "\n{} written, {} skipped, {} ignored",
        report.written(),
        report.outcomes.len() - report.written(),
        report.ignored
    );
    Ok(())
}
