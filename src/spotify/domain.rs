//! Internal domain models for the streaming-service integration.
//!
//! These types are OUR types - they don't change when the Web API changes.
//! [`RemoteCollection`] doubles as the on-disk snapshot format, so its
//! serde field names are part of the snapshot contract.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub display_name: Option<String>,
}

/// A playlist header as listed by the service, tracks not yet fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePlaylist {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Display name of the playlist owner
    pub owner: Option<String>,
    /// Endpoint listing the playlist's items
    pub tracks_href: String,
}

/// One playlist slot: when it was added and what it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    /// RFC 3339 timestamp
    pub added_at: Option<String>,
    pub track: RemoteTrack,
}

/// Album information kept with each remote track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAlbum {
    pub album_name: String,
    #[serde(default)]
    pub album_type: Option<String>,
    /// `YYYY`, `YYYY-MM` or `YYYY-MM-DD`
    pub released: String,
    #[serde(default)]
    pub spotify_id: Option<String>,
}

/// An artist credit on a remote track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteArtist {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
}

/// A track as the service describes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTrack {
    pub name: String,
    /// `None` for local files added to a playlist
    pub spotify_id: Option<String>,
    pub duration_ms: u64,
    /// Credited artists in service order
    pub artist: Vec<RemoteArtist>,
    #[serde(default)]
    pub uri: Option<String>,
    pub album: RemoteAlbum,
}

impl RemoteTrack {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn artist_names(&self) -> impl Iterator<Item = &str> {
        self.artist.iter().map(|a| a.name.as_str())
    }
}

/// A finished playlist with its tracks, as written to a local snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCollection {
    pub name: String,
    pub spotify_id: String,
    /// `YYYY-MM-DD` of the most recently added item
    pub created_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Tracks in playlist order
    pub tracks: Vec<RemoteTrack>,
}

/// Errors that can occur talking to the streaming service
#[derive(Debug, Clone, thiserror::Error)]
pub enum SpotifyError {
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Rate limited - try again later")]
    RateLimited,

    #[error("No access token configured")]
    MissingToken,

    #[error("API contract violation: {0}")]
    ContractViolation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_field_names() {
        let collection = RemoteCollection {
            name: "Mix".to_string(),
            spotify_id: "pl1".to_string(),
            created_date: Some("2021-03-04".to_string()),
            description: None,
            tracks: vec![RemoteTrack {
                name: "Song".to_string(),
                spotify_id: Some("t1".to_string()),
                duration_ms: 1000,
                artist: vec![RemoteArtist {
                    name: "A".to_string(),
                    id: None,
                }],
                uri: Some("spotify:track:t1".to_string()),
                album: RemoteAlbum {
                    album_name: "Record".to_string(),
                    album_type: Some("album".to_string()),
                    released: "1999-01-01".to_string(),
                    spotify_id: None,
                },
            }],
        };

        let json = serde_json::to_value(&collection).unwrap();
        assert_eq!(json["spotify_id"], "pl1");
        assert_eq!(json["created_date"], "2021-03-04");
        assert_eq!(json["tracks"][0]["artist"][0]["name"], "A");
        assert_eq!(json["tracks"][0]["album"]["released"], "1999-01-01");
    }
}
