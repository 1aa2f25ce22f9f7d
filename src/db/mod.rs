//! Database module for artist, track, and collection persistence.
//!
//! Uses SQLx with SQLite for lightweight, embedded storage. Entity
//! operations take a `&mut SqliteConnection` so callers can run them
//! inside a transaction (`&mut *tx`) or on a pooled connection.
//!
//! # Example
//!
//! ```ignore
//! use musik::db::{init_db, library_counts};
//!
//! let pool = init_db("sqlite:musik.db").await?;
//! let mut conn = pool.acquire().await?;
//! let counts = library_counts(&mut conn).await?;
//! ```

use std::time::Duration;

use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqlitePoolOptions};

use crate::model::{Artist, ArtistId, ArtistRole, Collection, CollectionId, Track, TrackId};

/// Default database filename.
pub const DEFAULT_DB_NAME: &str = "musik.db";

/// Build a SQLite database URL from an optional path.
///
/// If no path is provided, uses [`DEFAULT_DB_NAME`] in the current directory.
pub fn db_url(path: Option<&std::path::Path>) -> String {
    match path {
        Some(p) => format!("sqlite:{}", p.display()),
        None => format!("sqlite:{}", DEFAULT_DB_NAME),
    }
}

/// Initialize the database connection pool and run migrations.
///
/// Creates the database file if it doesn't exist, establishes a connection
/// pool and runs all pending migrations.
///
/// # Errors
///
/// Returns an error if:
/// - Database creation fails
/// - Connection cannot be established
/// - Migration fails
pub async fn init_db(db_url: &str) -> Result<SqlitePool, sqlx::Error> {
    if !sqlx::Sqlite::database_exists(db_url).await.unwrap_or(false) {
        sqlx::Sqlite::create_database(db_url).await?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Delete every collection, track, artist and stats row.
pub async fn clear_library(conn: &mut SqliteConnection) -> sqlx::Result<()> {
    for table in [
        "collection_duplicate_tracks",
        "artist_frequency_collection",
        "collection_stats",
        "artist_frequency_library",
        "library_stats",
        "duplicate_tracks",
        "collection_tracks",
        "collections",
        "track_artists",
        "tracks",
        "artists",
    ] {
        sqlx::query(&format!("DELETE FROM {table}"))
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

// ============================================================================
// Artists
// ============================================================================

/// Look up an artist by exact (case-sensitive) name.
pub async fn find_artist_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> sqlx::Result<Option<Artist>> {
    sqlx::query_as::<_, Artist>("SELECT id, name FROM artists WHERE name = ?")
        .bind(name)
        .fetch_optional(conn)
        .await
}

/// Insert a new artist. Fails on a duplicate name.
pub async fn insert_artist(conn: &mut SqliteConnection, name: &str) -> sqlx::Result<Artist> {
    let result = sqlx::query("INSERT INTO artists (name) VALUES (?)")
        .bind(name)
        .execute(conn)
        .await?;
    Ok(Artist {
        id: result.last_insert_rowid(),
        name: name.to_string(),
    })
}

// ============================================================================
// Tracks
// ============================================================================

#[derive(sqlx::FromRow)]
struct TrackRow {
    id: i64,
    name: String,
    duration_ms: i64,
    released_year: i64,
}

/// Load all tracks with exactly this name, artists attached.
pub async fn find_tracks_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> sqlx::Result<Vec<Track>> {
    let rows: Vec<TrackRow> = sqlx::query_as(
        "SELECT id, name, duration_ms, released_year FROM tracks WHERE name = ? ORDER BY id",
    )
    .bind(name)
    .fetch_all(&mut *conn)
    .await?;

    let mut tracks = Vec::with_capacity(rows.len());
    for row in rows {
        tracks.push(with_artists(conn, row).await?);
    }
    Ok(tracks)
}

/// Get a track by its database ID.
pub async fn get_track_by_id(
    conn: &mut SqliteConnection,
    track_id: TrackId,
) -> sqlx::Result<Option<Track>> {
    let row: Option<TrackRow> = sqlx::query_as(
        "SELECT id, name, duration_ms, released_year FROM tracks WHERE id = ?",
    )
    .bind(track_id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => Ok(Some(with_artists(conn, row).await?)),
        None => Ok(None),
    }
}

async fn with_artists(conn: &mut SqliteConnection, row: TrackRow) -> sqlx::Result<Track> {
    let credits: Vec<(i64, String)> = sqlx::query_as(
        "SELECT artist_id, role FROM track_artists WHERE track_id = ? ORDER BY role, position",
    )
    .bind(row.id)
    .fetch_all(conn)
    .await?;

    let mut main_artists = Vec::new();
    let mut featured_artists = Vec::new();
    for (artist_id, role) in credits {
        if role == ArtistRole::Featured.as_str() {
            featured_artists.push(artist_id);
        } else {
            main_artists.push(artist_id);
        }
    }

    Ok(Track {
        id: row.id,
        name: row.name,
        duration: Duration::from_millis(row.duration_ms.max(0) as u64),
        released_year: row.released_year,
        main_artists,
        featured_artists,
    })
}

/// Insert a track and its artist credits.
pub async fn insert_track(
    conn: &mut SqliteConnection,
    name: &str,
    duration: Duration,
    released_year: i64,
    main_artists: &[ArtistId],
    featured_artists: &[ArtistId],
) -> sqlx::Result<Track> {
    let duration_ms = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
    let result =
        sqlx::query("INSERT INTO tracks (name, duration_ms, released_year) VALUES (?, ?, ?)")
            .bind(name)
            .bind(duration_ms)
            .bind(released_year)
            .execute(&mut *conn)
            .await?;
    let track_id = result.last_insert_rowid();

    let credits = main_artists
        .iter()
        .map(|id| (ArtistRole::Main, id))
        .enumerate()
        .chain(
            featured_artists
                .iter()
                .map(|id| (ArtistRole::Featured, id))
                .enumerate(),
        );
    for (position, (role, artist_id)) in credits {
        sqlx::query(
            "INSERT INTO track_artists (track_id, artist_id, role, position) VALUES (?, ?, ?, ?)",
        )
        .bind(track_id)
        .bind(*artist_id)
        .bind(role.as_str())
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }

    Ok(Track {
        id: track_id,
        name: name.to_string(),
        duration,
        released_year,
        main_artists: main_artists.to_vec(),
        featured_artists: featured_artists.to_vec(),
    })
}

// ============================================================================
// Collections
// ============================================================================

const COLLECTION_COLUMNS: &str =
    "id, name, nick_name, description, created_year, ordinal, source, remote_id";

/// Look up a collection by its unique name.
pub async fn find_collection_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> sqlx::Result<Option<Collection>> {
    sqlx::query_as::<_, Collection>(&format!(
        "SELECT {COLLECTION_COLUMNS} FROM collections WHERE name = ?"
    ))
    .bind(name)
    .fetch_optional(conn)
    .await
}

/// Collection attributes written on insert and on re-ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionFields<'a> {
    pub name: &'a str,
    pub nick_name: Option<&'a str>,
    pub description: &'a str,
    pub created_year: i64,
    pub ordinal: Option<i64>,
    pub source: &'a str,
    pub remote_id: Option<&'a str>,
}

/// Insert a new collection.
pub async fn insert_collection(
    conn: &mut SqliteConnection,
    fields: &CollectionFields<'_>,
) -> sqlx::Result<Collection> {
    sqlx::query_as::<_, Collection>(&format!(
        r#"
        INSERT INTO collections (name, nick_name, description, created_year, ordinal, source, remote_id)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING {COLLECTION_COLUMNS}
        "#
    ))
    .bind(fields.name)
    .bind(fields.nick_name)
    .bind(fields.description)
    .bind(fields.created_year)
    .bind(fields.ordinal)
    .bind(fields.source)
    .bind(fields.remote_id)
    .fetch_one(conn)
    .await
}

/// Overwrite the descriptive attributes of an existing collection.
pub async fn update_collection(
    conn: &mut SqliteConnection,
    collection_id: CollectionId,
    fields: &CollectionFields<'_>,
) -> sqlx::Result<Collection> {
    sqlx::query_as::<_, Collection>(&format!(
        r#"
        UPDATE collections SET
            nick_name = ?, description = ?, created_year = ?,
            ordinal = ?, source = ?, remote_id = ?
        WHERE id = ?
        RETURNING {COLLECTION_COLUMNS}
        "#
    ))
    .bind(fields.nick_name)
    .bind(fields.description)
    .bind(fields.created_year)
    .bind(fields.ordinal)
    .bind(fields.source)
    .bind(fields.remote_id)
    .bind(collection_id)
    .fetch_one(conn)
    .await
}

/// Remove every membership row of a collection.
pub async fn clear_collection_tracks(
    conn: &mut SqliteConnection,
    collection_id: CollectionId,
) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM collection_tracks WHERE collection_id = ?")
        .bind(collection_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// Put a track at `ordinal` within a collection.
pub async fn insert_collection_track(
    conn: &mut SqliteConnection,
    collection_id: CollectionId,
    track_id: TrackId,
    ordinal: i64,
) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO collection_tracks (collection_id, track_id, ordinal) VALUES (?, ?, ?)")
        .bind(collection_id)
        .bind(track_id)
        .bind(ordinal)
        .execute(conn)
        .await?;
    Ok(())
}

/// Track ids of a collection in membership order.
pub async fn collection_track_ids(
    conn: &mut SqliteConnection,
    collection_id: CollectionId,
) -> sqlx::Result<Vec<TrackId>> {
    let rows: Vec<(i64,)> = sqlx::query_as(
        "SELECT track_id FROM collection_tracks WHERE collection_id = ? ORDER BY ordinal",
    )
    .bind(collection_id)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Track names of a collection in membership order.
pub async fn collection_track_names(
    conn: &mut SqliteConnection,
    collection_id: CollectionId,
) -> sqlx::Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT t.name FROM collection_tracks ct
        JOIN tracks t ON t.id = ct.track_id
        WHERE ct.collection_id = ?
        ORDER BY ct.ordinal
        "#,
    )
    .bind(collection_id)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().map(|(name,)| name).collect())
}

// ============================================================================
// Read models
// ============================================================================

/// Row counts of the base entities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct LibraryCounts {
    pub collections: i64,
    pub tracks: i64,
    pub artists: i64,
}

/// Count collections, tracks and artists.
pub async fn library_counts(conn: &mut SqliteConnection) -> sqlx::Result<LibraryCounts> {
    sqlx::query_as::<_, LibraryCounts>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM collections) AS collections,
            (SELECT COUNT(*) FROM tracks) AS tracks,
            (SELECT COUNT(*) FROM artists) AS artists
        "#,
    )
    .fetch_one(conn)
    .await
}

/// Collection with its membership size and total playing time.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CollectionSummary {
    pub id: CollectionId,
    pub name: String,
    pub ordinal: Option<i64>,
    pub source: String,
    pub created_year: i64,
    pub track_count: i64,
    pub duration_ms: i64,
}

impl CollectionSummary {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms.max(0) as u64)
    }
}

/// All collections, manual ones by ordinal first, then by name.
pub async fn list_collections(
    conn: &mut SqliteConnection,
) -> sqlx::Result<Vec<CollectionSummary>> {
    sqlx::query_as::<_, CollectionSummary>(
        r#"
        SELECT
            c.id, c.name, c.ordinal, c.source, c.created_year,
            COUNT(ct.track_id) AS track_count,
            COALESCE(SUM(t.duration_ms), 0) AS duration_ms
        FROM collections c
        LEFT JOIN collection_tracks ct ON ct.collection_id = c.id
        LEFT JOIN tracks t ON t.id = ct.track_id
        GROUP BY c.id
        ORDER BY c.ordinal IS NULL, c.ordinal, c.name
        "#,
    )
    .fetch_all(conn)
    .await
}
