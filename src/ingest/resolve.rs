//! Resolve-or-create by identity key.
//!
//! Artists, tracks and collections are all looked up by some key and
//! created when absent. [`KeyedEntity`] captures the two halves and
//! [`resolve_or_create`] sequences them, reporting which one happened.

use async_trait::async_trait;
use sqlx::SqliteConnection;

use crate::error::Result;

/// An entity that can be found by, or built from, a key.
#[async_trait]
pub trait KeyedEntity: Sized + Send {
    /// Everything needed to identify and, if needed, construct the entity.
    type Key: ?Sized + Sync;

    /// Look up an existing entity matching the key's identity.
    async fn find(conn: &mut SqliteConnection, key: &Self::Key) -> Result<Option<Self>>;

    /// Persist a new entity built from the key.
    async fn create(conn: &mut SqliteConnection, key: &Self::Key) -> Result<Self>;
}

/// Outcome of [`resolve_or_create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved<T> {
    Existing(T),
    Created(T),
}

impl<T> Resolved<T> {
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    pub fn get(&self) -> &T {
        match self {
            Self::Existing(t) | Self::Created(t) => t,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Self::Existing(t) | Self::Created(t) => t,
        }
    }
}

/// Return the entity matching `key`, creating it first if none exists.
pub async fn resolve_or_create<E: KeyedEntity>(
    conn: &mut SqliteConnection,
    key: &E::Key,
) -> Result<Resolved<E>> {
    if let Some(existing) = E::find(conn, key).await? {
        return Ok(Resolved::Existing(existing));
    }
    Ok(Resolved::Created(E::create(conn, key).await?))
}
