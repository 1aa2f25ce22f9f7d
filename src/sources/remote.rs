//! Normalize remote collection snapshots.

use crate::error::{Error, RecordLocation, Result};
use crate::ingest::raw::{ArtistCredit, DurationField, RawCollection, RawTrack, parse_year};
use crate::model::CollectionSource;
use crate::spotify::RemoteCollection;

/// Project a snapshot into a raw collection.
///
/// The collection's year comes from `created_date`, each track's from its
/// album release date. Artist names are taken as given, all as main artists.
pub fn normalize(collection: &RemoteCollection) -> Result<RawCollection> {
    let name = collection.name.trim();
    let label = if name.is_empty() {
        collection.spotify_id.as_str()
    } else {
        name
    };
    let location = RecordLocation::collection(label);
    if name.is_empty() {
        return Err(Error::malformed(location, "missing name"));
    }

    let created_date = collection
        .created_date
        .as_deref()
        .ok_or_else(|| Error::malformed(location.clone(), "missing created_date"))?;
    let created_year = parse_year(created_date).map_err(|r| Error::malformed(location, r))?;

    let mut tracks = Vec::with_capacity(collection.tracks.len());
    for (index, track) in collection.tracks.iter().enumerate() {
        let released_year = parse_year(&track.album.released)
            .map_err(|r| Error::malformed(RecordLocation::track(name, index + 1), r))?;
        tracks.push(RawTrack {
            name: track.name.clone(),
            artist: ArtistCredit::Names(track.artist_names().map(str::to_string).collect()),
            duration: DurationField::Millis(track.duration_ms),
            released_year,
        });
    }

    Ok(RawCollection {
        name: name.to_string(),
        nick_name: None,
        description: collection.description.clone().unwrap_or_default(),
        created_year,
        ordinal: None,
        source: CollectionSource::Remote,
        remote_id: Some(collection.spotify_id.clone()),
        tracks,
    })
}
