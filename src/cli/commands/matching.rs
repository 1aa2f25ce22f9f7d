//! Remote track lookup for a manual collection.

use tokio::runtime::Runtime;

use super::spotify_client;
use crate::config::Config;
use crate::ingest::{RawTrack, resolve_selection};
use crate::sources::ManualIndex;
use crate::spotify::{TrackQuery, search_match};

fn query_for(track: &RawTrack) -> anyhow::Result<TrackQuery> {
    let duration = track
        .duration
        .parse()
        .map_err(|e| anyhow::anyhow!("track '{}': {}", track.name, e))?;
    let parsed = track.artist.parse();
    let artists: Vec<&str> = parsed.all().collect();
    Ok(TrackQuery {
        name: track.name.clone(),
        artist_field: artists.join(", "),
        duration,
    })
}

/// Report which tracks of one manual collection have a remote match.
///
/// Read-only: nothing is written to the library or the snapshot directory.
pub fn cmd_match(
    rt: &Runtime,
    config: &Config,
    key: &str,
    token: Option<&str>,
) -> anyhow::Result<()> {
    let index = ManualIndex::load(&config.library.manual_dir)?;
    let entries = resolve_selection(&index, &[key])?;
    let Some(entry) = entries.first() else {
        anyhow::bail!("No manual collection for '{}'", key);
    };
    let collection = entry.read()?.normalize()?;
    let client = spotify_client(config, token)?;

    println!("Matching '{}' ({} tracks)", collection.name, collection.tracks.len());

    let matched = rt.block_on(async {
        let mut matched = 0;
        for (i, track) in collection.tracks.iter().enumerate() {
            let query = query_for(track)?;
            match search_match(&client, &query).await? {
                Some(found) => {
                    matched += 1;
                    let id = found.spotify_id.as_deref().unwrap_or("-");
                    println!("  ✓ {:>3}. {} -> {}", i + 1, track.name, id);
                }
                None => println!("  ✗ {:>3}. {}", i + 1, track.name),
            }
        }
        Ok::<_, anyhow::Error>(matched)
    })?;

    println!("\n{} of {} tracks matched", matched, collection.tracks.len());
    Ok(())
}
