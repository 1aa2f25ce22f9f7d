//! Test utilities and fixtures for musik tests.
//!
//! This module provides a temporary database and raw record factories to
//! reduce boilerplate in tests.
//!
//! # Example
//!
//! ```ignore
//! use musik::test_utils::{raw_collection, raw_track, temp_db};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let (pool, _dir) = temp_db().await;
//!     let mix = raw_collection("Mix", vec![raw_track("Song", "A & B")]);
//!     // ... test logic
//! }
//! ```

use sqlx::sqlite::SqlitePool;
use tempfile::TempDir;

use crate::ingest::raw::{ArtistCredit, DurationField, RawCollection, RawTrack};
use crate::model::CollectionSource;

/// Creates a temporary database for testing.
///
/// The database is created in a temporary directory that is automatically
/// cleaned up when the returned `TempDir` is dropped. Migrations are run
/// automatically.
///
/// Keep the TempDir alive for the duration of your test.
pub async fn temp_db() -> (SqlitePool, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = dir.path().join("test.db");
    let db_url = format!("sqlite:{}", db_path.display());

    let pool = crate::db::init_db(&db_url)
        .await
        .expect("Failed to initialize test database");

    (pool, dir)
}

/// Creates a manual-style raw track with a free-text artist field.
///
/// Duration and year are valid defaults; customize with struct update
/// syntax:
///
/// ```ignore
/// let raw = RawTrack {
///     duration: DurationField::Text("abc".to_string()),
///     ..raw_track("Broken", "A")
/// };
/// ```
pub fn raw_track(name: &str, artist: &str) -> RawTrack {
    RawTrack {
        name: name.to_string(),
        artist: ArtistCredit::Field(artist.to_string()),
        duration: DurationField::Text("3:30".to_string()),
        released_year: 2000,
    }
}

/// Creates a manual raw collection holding `tracks` in order.
pub fn raw_collection(name: &str, tracks: Vec<RawTrack>) -> RawCollection {
    RawCollection {
        name: name.to_string(),
        nick_name: None,
        description: String::new(),
        created_year: 2010,
        ordinal: None,
        source: CollectionSource::Manual,
        remote_id: None,
        tracks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_temp_db_creates_working_database() {
        let (pool, _dir) = temp_db().await;
        let mut conn = pool.acquire().await.unwrap();

        let counts = crate::db::library_counts(&mut conn).await.unwrap();
        assert_eq!(counts.tracks, 0);
    }

    #[test]
    fn test_raw_track_defaults_are_valid() {
        let track = raw_track("Song", "A");
        assert!(track.duration.parse().is_ok());
        assert!(crate::ingest::raw::validate_year(track.released_year).is_ok());
    }
}
