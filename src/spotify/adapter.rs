//! Adapter layer: Convert Web API DTOs to domain models
//!
//! This is the ONLY place where DTO types are converted to domain types.

use chrono::DateTime;

use super::domain::{
    PlaylistEntry, RemoteAlbum, RemoteArtist, RemoteCollection, RemotePlaylist, RemoteTrack,
    UserProfile,
};
use super::dto;

pub fn to_user(user: dto::PrivateUser) -> UserProfile {
    UserProfile {
        id: user.id,
        display_name: user.display_name,
    }
}

pub fn to_playlist(playlist: dto::SimplePlaylist) -> RemotePlaylist {
    RemotePlaylist {
        id: playlist.id,
        name: playlist.name,
        description: playlist.description,
        owner: playlist.owner.display_name,
        tracks_href: playlist.tracks.href,
    }
}

/// Convert a track object; episodes yield `None`.
pub fn to_track(track: dto::Track) -> Option<RemoteTrack> {
    if track.kind != "track" {
        return None;
    }

    Some(RemoteTrack {
        name: track.name,
        spotify_id: track.id,
        duration_ms: track.duration_ms,
        artist: track
            .artists
            .into_iter()
            .map(|a| RemoteArtist {
                name: a.name,
                id: a.id,
            })
            .collect(),
        uri: track.uri,
        album: RemoteAlbum {
            album_name: track.album.name,
            album_type: track.album.album_type,
            released: track.album.release_date.unwrap_or_default(),
            spotify_id: track.album.id,
        },
    })
}

/// Convert a playlist item; removed tracks and episodes yield `None`.
pub fn to_entry(item: dto::PlaylistItem) -> Option<PlaylistEntry> {
    let track = to_track(item.track?)?;
    Some(PlaylistEntry {
        added_at: item.added_at,
        track,
    })
}

/// Latest `added_at` among the entries, as `YYYY-MM-DD`.
pub fn latest_added_date(entries: &[PlaylistEntry]) -> Option<String> {
    entries
        .iter()
        .filter_map(|e| e.added_at.as_deref())
        .filter_map(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| ts.date_naive())
        .max()
        .map(|date| date.format("%Y-%m-%d").to_string())
}

/// Assemble a collection from a playlist and its entries in order.
pub fn to_collection(playlist: &RemotePlaylist, entries: Vec<PlaylistEntry>) -> RemoteCollection {
    let created_date = latest_added_date(&entries);
    RemoteCollection {
        name: playlist.name.clone(),
        spotify_id: playlist.id.clone(),
        created_date,
        description: playlist.description.clone(),
        tracks: entries.into_iter().map(|e| e.track).collect(),
    }
}
