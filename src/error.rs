//! Application-wide error types.
//!
//! Library modules return [`Error`] (or a module-specific error such as
//! [`SpotifyError`](crate::spotify::SpotifyError) that converts into it),
//! while the CLI layer uses `anyhow` for convenient propagation.
//!
//! The ingestion taxonomy lives here:
//! - [`Error::MalformedRecord`] aborts the collection being ingested
//! - [`Error::AmbiguousSelection`] and [`Error::UnknownIdentifier`] are
//!   raised while resolving a selection, before anything is written

use std::fmt;
use std::path::PathBuf;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Where a malformed record was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLocation {
    /// Collection name (or source file when the name itself is missing)
    pub collection: String,
    /// 1-based position of the track record, `None` for collection-level fields
    pub position: Option<usize>,
}

impl RecordLocation {
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            position: None,
        }
    }

    pub fn track(name: impl Into<String>, position: usize) -> Self {
        Self {
            collection: name.into(),
            position: Some(position),
        }
    }
}

impl fmt::Display for RecordLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(pos) => write!(f, "collection '{}', track #{}", self.collection, pos),
            None => write!(f, "collection '{}'", self.collection),
        }
    }
}

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A raw record is missing a required field or has an unparseable value
    #[error("Malformed record in {location}: {reason}")]
    MalformedRecord {
        location: RecordLocation,
        reason: String,
    },

    /// A collection identifier matched more than one key, or the selection was empty
    #[error("Ambiguous selection: {0}")]
    AmbiguousSelection(String),

    /// Collection identifiers with no matching manual collection
    #[error("Unknown collection identifiers: {}", .0.join(", "))]
    UnknownIdentifier(Vec<String>),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// JSON document could not be read or written
    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Remote streaming service error
    #[error("Spotify error: {0}")]
    Spotify(#[from] crate::spotify::SpotifyError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a malformed record error.
    pub fn malformed(location: RecordLocation, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            location,
            reason: reason.into(),
        }
    }

    /// Create a JSON error for a document at `path`.
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error (or the error it wraps) is a malformed record.
    pub fn is_malformed(&self) -> bool {
        match self {
            Self::MalformedRecord { .. } => true,
            Self::WithContext { source, .. } => source.is_malformed(),
            _ => false,
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Database(e).context(ctx))
    }
}
