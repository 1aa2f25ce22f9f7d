//! Persistence of derived statistics.
//!
//! The stats tables are a cache: [`replace_stats`] wipes them and writes a
//! fresh snapshot, the read queries join them back to names.

use sqlx::SqliteConnection;

use super::engine::StatsSnapshot;
use crate::model::{ArtistFrequency, CollectionId, DuplicateTrack, LibraryScope, TrackId};

/// Replace every stored statistic with `snapshot`.
pub async fn replace_stats(
    conn: &mut SqliteConnection,
    snapshot: &StatsSnapshot,
) -> sqlx::Result<()> {
    for table in [
        "collection_duplicate_tracks",
        "artist_frequency_collection",
        "collection_stats",
        "artist_frequency_library",
        "library_stats",
        "duplicate_tracks",
    ] {
        sqlx::query(&format!("DELETE FROM {table}"))
            .execute(&mut *conn)
            .await?;
    }

    let computed_at = chrono::Utc::now().to_rfc3339();
    let library_id = snapshot.library.0;

    sqlx::query("INSERT INTO library_stats (library_id, computed_at) VALUES (?, ?)")
        .bind(library_id)
        .bind(&computed_at)
        .execute(&mut *conn)
        .await?;

    for (artist_id, frequency) in &snapshot.library_frequency {
        sqlx::query(
            "INSERT INTO artist_frequency_library (artist_id, library_id, frequency) VALUES (?, ?, ?)",
        )
        .bind(*artist_id)
        .bind(library_id)
        .bind(*frequency)
        .execute(&mut *conn)
        .await?;
    }

    for (track_id, occurrences) in &snapshot.duplicates {
        sqlx::query("INSERT INTO duplicate_tracks (track_id, occurrences) VALUES (?, ?)")
            .bind(*track_id)
            .bind(*occurrences)
            .execute(&mut *conn)
            .await?;
    }

    for (collection_id, stats) in &snapshot.collections {
        sqlx::query(
            "INSERT INTO collection_stats (collection_id, library_id, computed_at) VALUES (?, ?, ?)",
        )
        .bind(*collection_id)
        .bind(library_id)
        .bind(&computed_at)
        .execute(&mut *conn)
        .await?;

        for (artist_id, frequency) in &stats.artist_frequency {
            sqlx::query(
                "INSERT INTO artist_frequency_collection (artist_id, collection_id, frequency) VALUES (?, ?, ?)",
            )
            .bind(*artist_id)
            .bind(*collection_id)
            .bind(*frequency)
            .execute(&mut *conn)
            .await?;
        }

        for track_id in &stats.duplicate_tracks {
            sqlx::query(
                "INSERT INTO collection_duplicate_tracks (collection_id, track_id) VALUES (?, ?)",
            )
            .bind(*collection_id)
            .bind(*track_id)
            .execute(&mut *conn)
            .await?;
        }
    }

    Ok(())
}

/// Library-wide artist frequencies, most frequent first.
pub async fn library_artist_frequencies(
    conn: &mut SqliteConnection,
    library: LibraryScope,
    limit: Option<i64>,
) -> sqlx::Result<Vec<ArtistFrequency>> {
    sqlx::query_as::<_, ArtistFrequency>(
        r#"
        SELECT f.artist_id, a.name AS artist_name, f.frequency
        FROM artist_frequency_library f
        JOIN artists a ON a.id = f.artist_id
        WHERE f.library_id = ?
        ORDER BY f.frequency DESC, a.name
        LIMIT ?
        "#,
    )
    .bind(library.0)
    .bind(limit.unwrap_or(-1))
    .fetch_all(conn)
    .await
}

/// Artist frequencies within one collection, most frequent first.
pub async fn collection_artist_frequencies(
    conn: &mut SqliteConnection,
    collection_id: CollectionId,
) -> sqlx::Result<Vec<ArtistFrequency>> {
    sqlx::query_as::<_, ArtistFrequency>(
        r#"
        SELECT f.artist_id, a.name AS artist_name, f.frequency
        FROM artist_frequency_collection f
        JOIN artists a ON a.id = f.artist_id
        WHERE f.collection_id = ?
        ORDER BY f.frequency DESC, a.name
        "#,
    )
    .bind(collection_id)
    .fetch_all(conn)
    .await
}

/// Tracks in more than one collection, most repeated first.
pub async fn duplicate_tracks(conn: &mut SqliteConnection) -> sqlx::Result<Vec<DuplicateTrack>> {
    sqlx::query_as::<_, DuplicateTrack>(
        r#"
        SELECT d.track_id, t.name AS track_name, d.occurrences
        FROM duplicate_tracks d
        JOIN tracks t ON t.id = d.track_id
        ORDER BY d.occurrences DESC, t.name
        "#,
    )
    .fetch_all(conn)
    .await
}

/// Member tracks of a collection flagged as library duplicates.
pub async fn collection_duplicate_track_ids(
    conn: &mut SqliteConnection,
    collection_id: CollectionId,
) -> sqlx::Result<Vec<TrackId>> {
    let rows: Vec<(i64,)> = sqlx::query_as(
        "SELECT track_id FROM collection_duplicate_tracks WHERE collection_id = ? ORDER BY track_id",
    )
    .bind(collection_id)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// When the library statistics were last computed (RFC 3339).
pub async fn last_computed(
    conn: &mut SqliteConnection,
    library: LibraryScope,
) -> sqlx::Result<Option<String>> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT computed_at FROM library_stats WHERE library_id = ?")
            .bind(library.0)
            .fetch_optional(conn)
            .await?;
    Ok(row.map(|(at,)| at))
}
