//! Library statistics and listing commands.

use tokio::runtime::Runtime;

use super::{format_duration, open_library};
use crate::config::Config;
use crate::db;
use crate::stats::{self, store};

/// Recompute statistics and print the top artists and duplicate tracks.
pub fn cmd_stats(rt: &Runtime, config: &Config, top: i64) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = open_library(config).await?;
        let library = config.library.scope();
        let summary = stats::recompute_stats(&pool, library).await?;

        let mut conn = pool.acquire().await?;
        let counts = db::library_counts(&mut conn).await?;
        let artists = store::library_artist_frequencies(&mut conn, library, Some(top)).await?;
        let duplicates = store::duplicate_tracks(&mut conn).await?;

        println!("Library Statistics");
        println!("==================");
        println!("Collections: {}", counts.collections);
        println!("Tracks:      {}", counts.tracks);
        println!("Artists:     {}", counts.artists);
        println!();

        if artists.is_empty() {
            println!("No artists yet. Run `ingest` first.");
            return Ok::<_, anyhow::Error>(());
        }

        println!("Top artists:");
        for (rank, artist) in artists.iter().enumerate() {
            println!("  {:>3}. {} ({})", rank + 1, artist.artist_name, artist.frequency);
        }

        println!();
        println!("Tracks in more than one collection: {}", summary.duplicates);
        for dup in duplicates.iter().take(top.max(0) as usize) {
            println!("  {} ({} collections)", dup.track_name, dup.occurrences);
        }
        if duplicates.len() as i64 > top {
            println!("  ... and {} more", duplicates.len() as i64 - top);
        }
        Ok(())
    })
}

/// List collections with their track counts and total durations.
pub fn cmd_list(rt: &Runtime, config: &Config) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = open_library(config).await?;
        let mut conn = pool.acquire().await?;
        let collections = db::list_collections(&mut conn).await?;

        if collections.is_empty() {
            println!("No collections in the library.");
            return Ok::<_, anyhow::Error>(());
        }

        for c in &collections {
            let ordinal = c.ordinal.map(|o| o.to_string()).unwrap_or_else(|| "-".into());
            println!(
                "{:>4}  {} [{}, {}] {} tracks, {}",
                ordinal,
                c.name,
                c.source,
                c.created_year,
                c.track_count,
                format_duration(c.duration())
            );
        }
        println!("\nTotal: {} collections", collections.len());
        Ok(())
    })
}
