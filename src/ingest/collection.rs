//! Builds a collection and its ordered membership from a raw record.
//!
//! Re-ingesting a collection replaces its membership: all slots are
//! cleared, then tracks are appended at ordinals 1..=N in input order.

use async_trait::async_trait;
use sqlx::SqliteConnection;

use crate::db::{self, CollectionFields};
use crate::error::{Error, RecordLocation, Result};
use crate::ingest::raw::{RawCollection, validate_year};
use crate::ingest::resolve::{KeyedEntity, resolve_or_create};
use crate::ingest::track::TrackResolver;
use crate::model::{Collection, TrackId};

fn fields(raw: &RawCollection) -> CollectionFields<'_> {
    CollectionFields {
        name: raw.name.trim(),
        nick_name: raw.nick_name.as_deref(),
        description: &raw.description,
        created_year: raw.created_year,
        ordinal: raw.ordinal,
        source: raw.source.as_str(),
        remote_id: raw.remote_id.as_deref(),
    }
}

#[async_trait]
impl KeyedEntity for Collection {
    type Key = RawCollection;

    async fn find(conn: &mut SqliteConnection, raw: &RawCollection) -> Result<Option<Self>> {
        Ok(db::find_collection_by_name(conn, raw.name.trim()).await?)
    }

    async fn create(conn: &mut SqliteConnection, raw: &RawCollection) -> Result<Self> {
        Ok(db::insert_collection(conn, &fields(raw)).await?)
    }
}

/// What ingesting one collection did.
#[derive(Debug, Clone)]
pub struct CollectionOutcome {
    pub collection: Collection,
    /// Whether the collection row itself was new
    pub created: bool,
    pub tracks_created: usize,
    pub tracks_reused: usize,
    /// Member track ids in ordinal order
    pub track_ids: Vec<TrackId>,
}

/// Get-or-creates collections and rebuilds their membership.
#[derive(Debug, Default)]
pub struct CollectionBuilder {
    tracks: TrackResolver,
}

impl CollectionBuilder {
    pub fn new(tracks: TrackResolver) -> Self {
        Self { tracks }
    }

    pub fn tracks(&self) -> &TrackResolver {
        &self.tracks
    }

    pub fn tracks_mut(&mut self) -> &mut TrackResolver {
        &mut self.tracks
    }

    /// Ingest one collection record.
    ///
    /// Stops at the first malformed track; run it inside a transaction to
    /// discard the partial work.
    pub async fn build(
        &mut self,
        conn: &mut SqliteConnection,
        raw: &RawCollection,
    ) -> Result<CollectionOutcome> {
        let name = raw.name.trim();
        if name.is_empty() {
            return Err(Error::malformed(
                RecordLocation::collection("<unnamed>"),
                "missing collection name",
            ));
        }
        validate_year(raw.created_year)
            .map_err(|reason| Error::malformed(RecordLocation::collection(name), reason))?;

        let resolved = resolve_or_create::<Collection>(conn, raw).await?;
        let created = resolved.is_created();
        let collection = if created {
            resolved.into_inner()
        } else {
            let existing = resolved.into_inner();
            let removed = db::clear_collection_tracks(conn, existing.id).await?;
            tracing::debug!(
                target: "ingest::collection",
                collection = name,
                removed,
                "Cleared existing membership"
            );
            db::update_collection(conn, existing.id, &fields(raw)).await?
        };

        let mut outcome = CollectionOutcome {
            collection,
            created,
            tracks_created: 0,
            tracks_reused: 0,
            track_ids: Vec::with_capacity(raw.tracks.len()),
        };

        for (index, raw_track) in raw.tracks.iter().enumerate() {
            let position = index + 1;
            let resolved = self
                .tracks
                .resolve(conn, raw_track, RecordLocation::track(name, position))
                .await?;
            if resolved.is_created() {
                outcome.tracks_created += 1;
            } else {
                outcome.tracks_reused += 1;
            }
            let track_id = resolved.get().id;
            db::insert_collection_track(conn, outcome.collection.id, track_id, position as i64)
                .await?;
            outcome.track_ids.push(track_id);
        }

        tracing::info!(
            target: "ingest::collection",
            collection = name,
            source = %raw.source,
            created = outcome.created,
            tracks_created = outcome.tracks_created,
            tracks_reused = outcome.tracks_reused,
            "Collection ingested"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{raw_collection, raw_track, temp_db};

    #[tokio::test]
    async fn test_membership_follows_input_order() {
        let (pool, _dir) = temp_db().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut builder = CollectionBuilder::default();

        let raw = raw_collection(
            "Mix",
            vec![raw_track("T1", "A"), raw_track("T2", "B"), raw_track("T3", "C")],
        );
        let outcome = builder.build(&mut conn, &raw).await.unwrap();
        assert!(outcome.created);
        assert_eq!(outcome.tracks_created, 3);

        let names = db::collection_track_names(&mut conn, outcome.collection.id)
            .await
            .unwrap();
        assert_eq!(names, vec!["T1", "T2", "T3"]);
    }

    #[tokio::test]
    async fn test_reingestion_replaces_membership() {
        let (pool, _dir) = temp_db().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut builder = CollectionBuilder::default();

        let first = raw_collection(
            "Mix",
            vec![raw_track("T1", "A"), raw_track("T2", "B"), raw_track("T3", "C")],
        );
        let original = builder.build(&mut conn, &first).await.unwrap();

        let second = raw_collection("Mix", vec![raw_track("T3", "C"), raw_track("T1", "A")]);
        let rebuilt = builder.build(&mut conn, &second).await.unwrap();

        assert!(!rebuilt.created);
        assert_eq!(rebuilt.collection.id, original.collection.id);
        assert_eq!(rebuilt.tracks_created, 0);
        assert_eq!(rebuilt.tracks_reused, 2);
        assert_eq!(
            db::collection_track_names(&mut conn, rebuilt.collection.id)
                .await
                .unwrap(),
            vec!["T3", "T1"]
        );
    }

    #[tokio::test]
    async fn test_same_input_twice_is_idempotent() {
        let (pool, _dir) = temp_db().await;
        let mut conn = pool.acquire().await.unwrap();

        let raw = raw_collection(
            "Mix",
            vec![raw_track("T1", "A & B"), raw_track("T2", "B feat. C")],
        );
        let first = CollectionBuilder::default().build(&mut conn, &raw).await.unwrap();
        let before = db::library_counts(&mut conn).await.unwrap();

        let mut next_run = CollectionBuilder::default();
        let second = next_run.build(&mut conn, &raw).await.unwrap();
        let after = db::library_counts(&mut conn).await.unwrap();

        assert_eq!(before, after);
        assert_eq!(first.track_ids, second.track_ids);
        assert_eq!(second.tracks_created, 0);
        assert_eq!(next_run.tracks().artists().created(), 0);
    }

    #[tokio::test]
    async fn test_repeated_track_takes_two_slots() {
        let (pool, _dir) = temp_db().await;
        let mut conn = pool.acquire().await.unwrap();

        let raw = raw_collection("Mix", vec![raw_track("T1", "A"), raw_track("T1", "A")]);
        let outcome = CollectionBuilder::default().build(&mut conn, &raw).await.unwrap();
        assert_eq!(outcome.tracks_created, 1);
        assert_eq!(outcome.tracks_reused, 1);
        assert_eq!(outcome.track_ids[0], outcome.track_ids[1]);
    }

    #[tokio::test]
    async fn test_metadata_updated_on_reingestion() {
        let (pool, _dir) = temp_db().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut builder = CollectionBuilder::default();

        let mut raw = raw_collection("Mix", vec![raw_track("T1", "A")]);
        builder.build(&mut conn, &raw).await.unwrap();

        raw.description = "second pass".to_string();
        raw.nick_name = Some("mx".to_string());
        let outcome = builder.build(&mut conn, &raw).await.unwrap();
        assert_eq!(outcome.collection.description, "second pass");
        assert_eq!(outcome.collection.nick_name.as_deref(), Some("mx"));
    }

    #[tokio::test]
    async fn test_missing_name_and_future_year_are_malformed() {
        let (pool, _dir) = temp_db().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut builder = CollectionBuilder::default();

        let unnamed = raw_collection("  ", vec![]);
        assert!(builder.build(&mut conn, &unnamed).await.unwrap_err().is_malformed());

        let mut future = raw_collection("Later", vec![]);
        future.created_year = 9999;
        assert!(builder.build(&mut conn, &future).await.unwrap_err().is_malformed());
        assert!(db::find_collection_by_name(&mut conn, "Later").await.unwrap().is_none());
    }
}
