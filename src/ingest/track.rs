//! Resolves raw track records to track entities.
//!
//! A track's identity is its trimmed name plus the *set* of its main and
//! featured artist ids, so credit order and source do not matter.

use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::SqliteConnection;

use crate::db;
use crate::error::{Error, RecordLocation, Result};
use crate::ingest::raw::{DurationField, RawTrack, validate_year};
use crate::ingest::registry::ArtistRegistry;
use crate::ingest::resolve::{KeyedEntity, Resolved, resolve_or_create};
use crate::model::{ArtistId, Track};

/// A raw track with its artists already resolved to ids.
#[derive(Debug, Clone)]
pub struct TrackDraft {
    pub name: String,
    pub main_artists: Vec<ArtistId>,
    pub featured_artists: Vec<ArtistId>,
    pub duration: DurationField,
    pub released_year: i64,
    /// Reported if the draft turns out to be malformed
    pub location: RecordLocation,
}

impl TrackDraft {
    pub fn artist_set(&self) -> BTreeSet<ArtistId> {
        self.main_artists
            .iter()
            .chain(self.featured_artists.iter())
            .copied()
            .collect()
    }
}

#[async_trait]
impl KeyedEntity for Track {
    type Key = TrackDraft;

    async fn find(conn: &mut SqliteConnection, draft: &TrackDraft) -> Result<Option<Self>> {
        let wanted = draft.artist_set();
        let candidates = db::find_tracks_by_name(conn, &draft.name).await?;
        Ok(candidates
            .into_iter()
            .find(|track| track.artist_set() == wanted))
    }

    async fn create(conn: &mut SqliteConnection, draft: &TrackDraft) -> Result<Self> {
        let duration = draft
            .duration
            .parse()
            .map_err(|reason| Error::malformed(draft.location.clone(), reason))?;
        let released_year = validate_year(draft.released_year)
            .map_err(|reason| Error::malformed(draft.location.clone(), reason))?;

        Ok(db::insert_track(
            conn,
            &draft.name,
            duration,
            released_year,
            &draft.main_artists,
            &draft.featured_artists,
        )
        .await?)
    }
}

/// Turns raw track records into deduplicated track entities.
#[derive(Debug, Default)]
pub struct TrackResolver {
    artists: ArtistRegistry,
}

impl TrackResolver {
    pub fn new(artists: ArtistRegistry) -> Self {
        Self { artists }
    }

    pub fn artists(&self) -> &ArtistRegistry {
        &self.artists
    }

    pub fn artists_mut(&mut self) -> &mut ArtistRegistry {
        &mut self.artists
    }

    /// Find the existing track matching `raw`, or create it.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedRecord`] when the name or artists are missing, or
    /// when a new track would need an unparseable duration or invalid year.
    pub async fn resolve(
        &mut self,
        conn: &mut SqliteConnection,
        raw: &RawTrack,
        location: RecordLocation,
    ) -> Result<Resolved<Track>> {
        let name = raw.name.trim();
        if name.is_empty() {
            return Err(Error::malformed(location, "missing track name"));
        }

        let parsed = raw.artist.parse();
        if parsed.is_empty() {
            return Err(Error::malformed(
                location,
                format!("no artists credited on '{name}'"),
            ));
        }

        let mut main_artists = Vec::with_capacity(parsed.main.len());
        for artist_name in &parsed.main {
            main_artists.push(self.artists.get_or_create(conn, artist_name).await?.id);
        }
        let mut featured_artists = Vec::with_capacity(parsed.featured.len());
        for artist_name in &parsed.featured {
            featured_artists.push(self.artists.get_or_create(conn, artist_name).await?.id);
        }

        let draft = TrackDraft {
            name: name.to_string(),
            main_artists,
            featured_artists,
            duration: raw.duration.clone(),
            released_year: raw.released_year,
            location,
        };
        let resolved = resolve_or_create::<Track>(conn, &draft).await?;
        if resolved.is_created() {
            tracing::debug!(
                target: "ingest::tracks",
                track_id = resolved.get().id,
                name = %draft.name,
                "Created track"
            );
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::raw::ArtistCredit;
    use crate::test_utils::{raw_track, temp_db};
    use std::time::Duration;

    fn here() -> RecordLocation {
        RecordLocation::track("Test Collection", 1)
    }

    #[tokio::test]
    async fn test_same_name_and_artist_set_resolves_to_same_track() {
        let (pool, _dir) = temp_db().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut resolver = TrackResolver::default();

        let first = resolver
            .resolve(&mut conn, &raw_track("X", "A & B"), here())
            .await
            .unwrap();
        let second = resolver
            .resolve(&mut conn, &raw_track("X", "B, A"), here())
            .await
            .unwrap();

        assert!(first.is_created());
        assert!(!second.is_created());
        assert_eq!(first.get().id, second.get().id);
    }

    #[tokio::test]
    async fn test_different_artist_set_is_a_different_track() {
        let (pool, _dir) = temp_db().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut resolver = TrackResolver::default();

        let both = resolver
            .resolve(&mut conn, &raw_track("X", "A & B"), here())
            .await
            .unwrap();
        let solo = resolver
            .resolve(&mut conn, &raw_track("X", "A"), here())
            .await
            .unwrap();

        assert!(solo.is_created());
        assert_ne!(both.get().id, solo.get().id);
    }

    #[tokio::test]
    async fn test_featured_artists_count_toward_identity() {
        let (pool, _dir) = temp_db().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut resolver = TrackResolver::default();

        let featured = resolver
            .resolve(&mut conn, &raw_track("X", "A feat. B"), here())
            .await
            .unwrap();
        let as_main = resolver
            .resolve(&mut conn, &raw_track("X", "B & A"), here())
            .await
            .unwrap();
        // Same set {A, B}, so the same track
        assert_eq!(featured.get().id, as_main.get().id);
        assert_eq!(featured.get().featured_artists.len(), 1);
    }

    #[tokio::test]
    async fn test_name_is_trimmed_and_remote_names_match_manual_field() {
        let (pool, _dir) = temp_db().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut resolver = TrackResolver::default();

        let manual = resolver
            .resolve(&mut conn, &raw_track("  Teardrop ", "Massive Attack"), here())
            .await
            .unwrap();
        let remote = RawTrack {
            name: "Teardrop".to_string(),
            artist: ArtistCredit::Names(vec!["Massive Attack".to_string()]),
            duration: DurationField::Millis(330_000),
            released_year: 1998,
        };
        let resolved = resolver.resolve(&mut conn, &remote, here()).await.unwrap();
        assert_eq!(manual.get().id, resolved.get().id);
        assert_eq!(manual.get().name, "Teardrop");
    }

    #[tokio::test]
    async fn test_malformed_duration_creates_no_track() {
        let (pool, _dir) = temp_db().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut resolver = TrackResolver::default();

        let raw = RawTrack {
            duration: DurationField::Text("abc".to_string()),
            ..raw_track("Broken", "A")
        };
        let err = resolver.resolve(&mut conn, &raw, here()).await.unwrap_err();
        assert!(err.is_malformed());
        assert!(err.to_string().contains("abc"));
        assert!(db::find_tracks_by_name(&mut conn, "Broken").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_name_or_artists_is_malformed() {
        let (pool, _dir) = temp_db().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut resolver = TrackResolver::default();

        let err = resolver
            .resolve(&mut conn, &raw_track("   ", "A"), here())
            .await
            .unwrap_err();
        assert!(err.is_malformed());

        let err = resolver
            .resolve(&mut conn, &raw_track("Song", " & "), here())
            .await
            .unwrap_err();
        assert!(err.is_malformed());
    }

    #[tokio::test]
    async fn test_created_track_carries_parsed_values() {
        let (pool, _dir) = temp_db().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut resolver = TrackResolver::default();

        let raw = RawTrack {
            duration: DurationField::Text("1:02:03".to_string()),
            released_year: 1971,
            ..raw_track("Long One", "A")
        };
        let track = resolver
            .resolve(&mut conn, &raw, here())
            .await
            .unwrap()
            .into_inner();
        assert_eq!(track.duration, Duration::from_secs(3723));
        assert_eq!(track.released_year, 1971);
        assert_eq!(resolver.artists().created(), 1);
    }
}
