//! Streaming-service integration - lists playlists, snapshots them and
//! searches tracks.
//!
//! # Architecture
//!
//! - **Domain models** (`domain.rs`) - our types, also the snapshot format
//! - **API DTOs** (`dto.rs`) - exact Web API response shapes
//! - **Adapter** - converts DTOs to domain models
//! - **Client** - bearer-token HTTP client
//! - **Paging** - turns `next`-linked pages into one lazy stream
//! - **Api** - the [`SpotifyApi`] seam, with mocks for tests
//! - **Sync** / **Matching** - the flows built on top
//!
//! The rest of the crate only sees domain types.

pub mod api;
pub mod domain;
pub mod dto;
pub mod matching;
pub mod paging;
pub mod sync;
mod adapter;
mod client;

pub use api::SpotifyApi;
pub use client::{DEFAULT_BASE_URL, SpotifyClient};
pub use domain::{
    PlaylistEntry, RemoteAlbum, RemoteArtist, RemoteCollection, RemotePlaylist, RemoteTrack,
    SpotifyError, UserProfile,
};
pub use matching::{TrackQuery, find_match, search_match};
pub use sync::{DEFAULT_UNFINISHED_PREFIXES, SyncOutcome, SyncReport, sync_playlists};
