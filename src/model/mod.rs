//! Core data models for the music library.
//!
//! Defines the base entities ([`Artist`], [`Track`], [`Collection`]) and
//! the derived statistics rows
//! ([`ArtistFrequency`], [`DuplicateTrack`]).
//!
//! # Database Schema
//!
//! The models map to the following tables:
//! - `artists` - Artist records with unique names
//! - `tracks` - Recordings; artists attached through `track_artists`
//! - `collections` - Named playlists, unique by name
//! - `collection_tracks` - Ordered membership (collection, ordinal) -> track
//! - `*_stats`, `artist_frequency_*`, `duplicate_tracks` - derived cache

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use sqlx::FromRow;

/// Database id of an artist.
pub type ArtistId = i64;
/// Database id of a track.
pub type TrackId = i64;
/// Database id of a collection.
pub type CollectionId = i64;

/// The single library scope every collection belongs to.
///
/// There is exactly one library per store; the id only keys the
/// library-level stats rows and comes from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LibraryScope(pub i64);

impl LibraryScope {
    pub const DEFAULT: LibraryScope = LibraryScope(1);
}

impl Default for LibraryScope {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// An artist in the music library.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Artist {
    /// Database ID (auto-generated)
    pub id: ArtistId,
    /// Artist name (unique, case-sensitive)
    pub name: String,
}

/// How an artist is credited on a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtistRole {
    Main,
    Featured,
}

impl ArtistRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Featured => "featured",
        }
    }
}

/// A recording with its credited artists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    pub duration: Duration,
    pub released_year: i64,
    /// Main artists in credit order
    pub main_artists: Vec<ArtistId>,
    /// Featured artists in credit order
    pub featured_artists: Vec<ArtistId>,
}

impl Track {
    /// The identity set used for deduplication: main ∪ featured.
    pub fn artist_set(&self) -> BTreeSet<ArtistId> {
        self.main_artists
            .iter()
            .chain(self.featured_artists.iter())
            .copied()
            .collect()
    }
}

/// Which source a collection was last ingested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionSource {
    /// Hand-authored collection file
    Manual,
    /// Snapshot of a streaming-service playlist
    Remote,
}

impl CollectionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Remote => "remote",
        }
    }
}

impl fmt::Display for CollectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, ordered playlist.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Collection {
    pub id: CollectionId,
    /// Unique upsert key
    pub name: String,
    pub nick_name: Option<String>,
    pub description: String,
    pub created_year: i64,
    /// Position of the collection within the library (manual collections only)
    pub ordinal: Option<i64>,
    /// `manual` or `remote`
    pub source: String,
    /// Streaming-service playlist id, if any
    pub remote_id: Option<String>,
}

/// Artist frequency count, scoped to a collection or to the library.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ArtistFrequency {
    pub artist_id: ArtistId,
    pub artist_name: String,
    pub frequency: i64,
}

/// A track referenced by two or more collections.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct DuplicateTrack {
    pub track_id: TrackId,
    pub track_name: String,
    /// Number of distinct collections containing the track
    pub occurrences: i64,
}
