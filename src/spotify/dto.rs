//! Spotify Web API Data Transfer Objects
//!
//! These types match what the Web API returns.
//! DO NOT use these types outside the spotify module - convert to domain types.
//!
//! API Reference: https://developer.spotify.com/documentation/web-api
//!
//! Endpoints used: `/me`, `/me/playlists`, `/playlists/{id}/tracks` and
//! `/search?type=track`.

use serde::{Deserialize, Serialize};

/// Paging object wrapping every list endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Paging<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    /// Absolute URL of the next page, `null` on the last one
    pub next: Option<String>,
    pub total: Option<u32>,
}

/// `/me` response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PrivateUser {
    pub id: String,
    pub display_name: Option<String>,
}

/// Playlist owner
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PublicUser {
    pub id: String,
    pub display_name: Option<String>,
}

/// Simplified playlist as listed by `/me/playlists`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimplePlaylist {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub owner: PublicUser,
    pub tracks: PlaylistTracksRef,
}

/// Reference to a playlist's items
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaylistTracksRef {
    pub href: String,
    pub total: Option<u32>,
}

/// One entry of `/playlists/{id}/tracks`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaylistItem {
    pub added_at: Option<String>,
    /// `null` when the track was removed from the catalog
    pub track: Option<Track>,
}

/// Full track object (episodes share the shape but carry `type: "episode"`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Track {
    pub id: Option<String>,
    pub name: String,
    pub duration_ms: u64,
    #[serde(default)]
    pub artists: Vec<SimpleArtist>,
    pub uri: Option<String>,
    pub album: SimpleAlbum,
    #[serde(rename = "type", default = "default_track_type")]
    pub kind: String,
}

fn default_track_type() -> String {
    "track".to_string()
}

/// Simplified artist
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimpleArtist {
    pub id: Option<String>,
    pub name: String,
}

/// Simplified album
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimpleAlbum {
    pub id: Option<String>,
    pub name: String,
    pub album_type: Option<String>,
    /// `YYYY`, `YYYY-MM` or `YYYY-MM-DD` depending on precision
    pub release_date: Option<String>,
}

/// `/search` response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchResponse {
    pub tracks: Option<Paging<Track>>,
}

/// Error envelope returned with non-2xx responses
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiError {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiErrorBody {
    pub status: u16,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_playlist_page() {
        let json = r#"{
            "href": "https://api.spotify.com/v1/me/playlists?offset=0&limit=2",
            "items": [{
                "collaborative": false,
                "description": "Songs for the road",
                "id": "pl1",
                "name": "Road Trip",
                "owner": {"id": "u1", "display_name": "ofer", "type": "user"},
                "public": true,
                "tracks": {"href": "https://api.spotify.com/v1/playlists/pl1/tracks", "total": 12}
            }],
            "limit": 2,
            "next": "https://api.spotify.com/v1/me/playlists?offset=2&limit=2",
            "offset": 0,
            "previous": null,
            "total": 3
        }"#;

        let page: Paging<SimplePlaylist> = serde_json::from_str(json).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].owner.display_name.as_deref(), Some("ofer"));
        assert!(page.next.is_some());
        assert_eq!(page.total, Some(3));
    }

    #[test]
    fn test_parse_playlist_item_with_removed_track() {
        let json = r#"{
            "items": [
                {"added_at": "2020-01-02T10:00:00Z", "track": null},
                {"added_at": "2020-01-03T10:00:00Z", "track": {
                    "id": "t1", "name": "Teardrop", "duration_ms": 330000,
                    "artists": [{"id": "a1", "name": "Massive Attack"}],
                    "uri": "spotify:track:t1",
                    "album": {"id": "al1", "name": "Mezzanine", "album_type": "album", "release_date": "1998-04-20"},
                    "type": "track"
                }}
            ],
            "next": null
        }"#;

        let page: Paging<PlaylistItem> = serde_json::from_str(json).unwrap();
        assert!(page.items[0].track.is_none());
        let track = page.items[1].track.as_ref().unwrap();
        assert_eq!(track.kind, "track");
        assert_eq!(track.album.release_date.as_deref(), Some("1998-04-20"));
        assert!(page.next.is_none());
    }

    #[test]
    fn test_parse_api_error() {
        let json = r#"{"error": {"status": 401, "message": "The access token expired"}}"#;
        let err: ApiError = serde_json::from_str(json).unwrap();
        assert_eq!(err.error.status, 401);
    }
}
