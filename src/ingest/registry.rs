//! Get-or-create cache of artists for one ingestion run.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::SqliteConnection;

use crate::db;
use crate::error::Result;
use crate::ingest::resolve::{KeyedEntity, resolve_or_create};
use crate::model::Artist;

#[async_trait]
impl KeyedEntity for Artist {
    type Key = str;

    async fn find(conn: &mut SqliteConnection, name: &str) -> Result<Option<Self>> {
        Ok(db::find_artist_by_name(conn, name).await?)
    }

    async fn create(conn: &mut SqliteConnection, name: &str) -> Result<Self> {
        Ok(db::insert_artist(conn, name).await?)
    }
}

/// Maps artist names to entities for the duration of one run.
///
/// Create a fresh registry per run; a registry that outlived a rolled-back
/// transaction would hand out ids that no longer exist.
#[derive(Debug, Default)]
pub struct ArtistRegistry {
    cache: HashMap<String, Artist>,
    created: usize,
}

impl ArtistRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the artist called `name`, creating it if the store has none.
    pub async fn get_or_create(
        &mut self,
        conn: &mut SqliteConnection,
        name: &str,
    ) -> Result<Artist> {
        if let Some(artist) = self.cache.get(name) {
            return Ok(artist.clone());
        }

        let resolved = resolve_or_create::<Artist>(conn, name).await?;
        if resolved.is_created() {
            self.created += 1;
            tracing::debug!(target: "ingest::artists", name, "Created artist");
        }
        let artist = resolved.into_inner();
        self.cache.insert(name.to_string(), artist.clone());
        Ok(artist)
    }

    /// Number of artists this registry has created so far.
    pub fn created(&self) -> usize {
        self.created
    }

    /// Drop cached entries, e.g. after the transaction they came from rolled back.
    pub fn forget(&mut self) {
        self.cache.clear();
    }
}
