//! Library statistics: artist frequencies and duplicate tracks.
//!
//! Statistics are derived data. Each run reloads the base entities,
//! recomputes everything with [`recompute`] and replaces the stored
//! snapshot, so rerunning on an unchanged library is a no-op.

mod engine;
pub mod store;

pub use engine::{
    CollectionStats, LibraryState, StatsEngine, StatsPhase, StatsSnapshot, StatsSummary,
    collection_frequencies, duplicate_tracks, library_frequencies, recompute,
};

use sqlx::SqlitePool;

use crate::error::Result;
use crate::model::LibraryScope;

/// Recompute the statistics of `library` in a single transaction.
pub async fn recompute_stats(pool: &SqlitePool, library: LibraryScope) -> Result<StatsSummary> {
    let mut tx = pool.begin().await?;
    let snapshot = StatsEngine::new(library).run(&mut *tx).await?;
    tx.commit().await?;
    Ok(StatsSummary::from(&snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::ingest::collection::CollectionBuilder;
    use crate::test_utils::{raw_collection, raw_track, temp_db};

    #[tokio::test]
    async fn test_stats_from_ingested_collections() {
        let (pool, _dir) = temp_db().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut builder = CollectionBuilder::default();

        let first = builder
            .build(
                &mut conn,
                &raw_collection("One", vec![raw_track("T1", "A"), raw_track("T2", "A & B")]),
            )
            .await
            .unwrap();
        builder
            .build(
                &mut conn,
                &raw_collection("Two", vec![raw_track("T1", "A"), raw_track("T3", "A feat. C")]),
            )
            .await
            .unwrap();
        drop(conn);

        let summary = recompute_stats(&pool, LibraryScope::DEFAULT).await.unwrap();
        assert_eq!(summary.collections, 2);
        assert_eq!(summary.duplicates, 1);

        let mut conn = pool.acquire().await.unwrap();
        let library = store::library_artist_frequencies(&mut conn, LibraryScope::DEFAULT, None)
            .await
            .unwrap();
        assert_eq!(library[0].artist_name, "A");
        assert_eq!(library[0].frequency, 4);
        let c = library.iter().find(|f| f.artist_name == "C").unwrap();
        assert_eq!(c.frequency, 1);

        let per_collection = store::collection_artist_frequencies(&mut conn, first.collection.id)
            .await
            .unwrap();
        assert_eq!(per_collection[0].artist_name, "A");
        assert_eq!(per_collection[0].frequency, 2);

        let duplicates = store::duplicate_tracks(&mut conn).await.unwrap();
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].track_name, "T1");
        assert_eq!(duplicates[0].occurrences, 2);
        assert_eq!(
            store::collection_duplicate_track_ids(&mut conn, first.collection.id)
                .await
                .unwrap(),
            vec![duplicates[0].track_id]
        );
        assert!(store::last_computed(&mut conn, LibraryScope::DEFAULT)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent_and_unflags_removed_duplicates() {
        let (pool, _dir) = temp_db().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut builder = CollectionBuilder::default();

        builder
            .build(&mut conn, &raw_collection("One", vec![raw_track("T1", "A")]))
            .await
            .unwrap();
        builder
            .build(&mut conn, &raw_collection("Two", vec![raw_track("T1", "A")]))
            .await
            .unwrap();
        drop(conn);

        let first = recompute_stats(&pool, LibraryScope::DEFAULT).await.unwrap();
        let second = recompute_stats(&pool, LibraryScope::DEFAULT).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(second.duplicates, 1);

        let mut conn = pool.acquire().await.unwrap();
        builder
            .build(&mut conn, &raw_collection("Two", vec![raw_track("T2", "B")]))
            .await
            .unwrap();
        drop(conn);

        recompute_stats(&pool, LibraryScope::DEFAULT).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        assert!(store::duplicate_tracks(&mut conn).await.unwrap().is_empty());
        let library = store::library_artist_frequencies(&mut conn, LibraryScope::DEFAULT, Some(1))
            .await
            .unwrap();
        assert_eq!(library.len(), 1);
    }

    #[tokio::test]
    async fn test_engine_returns_to_idle() {
        let (pool, _dir) = temp_db().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut engine = StatsEngine::new(LibraryScope::DEFAULT);

        let snapshot = engine.run(&mut conn).await.unwrap();
        assert_eq!(engine.phase(), StatsPhase::Idle);
        assert!(snapshot.collections.is_empty());
        assert_eq!(db::library_counts(&mut conn).await.unwrap().collections, 0);
    }
}
