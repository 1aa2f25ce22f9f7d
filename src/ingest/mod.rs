//! Ingestion: raw collection records in, reconciled entities out.
//!
//! Layers, bottom-up:
//! - `raw` - source-independent records and field parsing
//! - `artist_parser` - splits free-text artist credits
//! - `resolve` - find-or-create over the [`KeyedEntity`] seam
//! - `registry` / `track` / `collection` - artist, track and collection builders
//! - `driver` - selection, planning and per-collection transactions

pub mod artist_parser;
pub mod collection;
pub mod driver;
pub mod raw;
pub mod registry;
pub mod resolve;
pub mod track;

pub use artist_parser::{ParsedArtists, parse_artist_field};
pub use collection::{CollectionBuilder, CollectionOutcome};
pub use driver::{
    CollectionReport, FailedCollection, FailurePolicy, IngestOptions, IngestReport,
    PlannedCollection, PlannedSource, ReconciliationDriver, Selection, plan, resolve_selection,
};
pub use raw::{ArtistCredit, DurationField, RawCollection, RawTrack};
pub use registry::ArtistRegistry;
pub use resolve::{KeyedEntity, Resolved, resolve_or_create};
pub use track::{TrackDraft, TrackResolver};
