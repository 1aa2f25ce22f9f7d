//! End-to-end ingestion runs.
//!
//! A run is planned first (selection resolved, sources partitioned, files
//! parsed) without touching the store. Execution then ingests each planned
//! collection in its own transaction and finally recomputes statistics.

use std::collections::{HashMap, HashSet};

use sqlx::SqlitePool;

use crate::db;
use crate::error::{Error, Result};
use crate::ingest::collection::CollectionBuilder;
use crate::ingest::raw::RawCollection;
use crate::model::{CollectionSource, LibraryScope};
use crate::sources::{ManualDocument, ManualEntry, ManualIndex, remote};
use crate::spotify::RemoteCollection;
use crate::stats::{self, StatsSummary};

/// Which manual collections a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    /// Identifiers in request order, without repeats
    Keys(Vec<String>),
}

impl Selection {
    /// Interpret command-line identifiers.
    ///
    /// # Errors
    ///
    /// [`Error::AmbiguousSelection`] for an empty list or `all` mixed with
    /// identifiers.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        let mut keys: Vec<String> = Vec::with_capacity(args.len());
        for arg in args {
            let arg = arg.as_ref().trim();
            if !arg.is_empty() && !keys.iter().any(|k| k == arg) {
                keys.push(arg.to_string());
            }
        }

        match keys.as_slice() {
            [] => Err(Error::AmbiguousSelection(
                "no collections selected".to_string(),
            )),
            [only] if only == "all" => Ok(Self::All),
            _ if keys.iter().any(|k| k == "all") => Err(Error::AmbiguousSelection(
                "'all' cannot be combined with collection identifiers".to_string(),
            )),
            _ => Ok(Self::Keys(keys)),
        }
    }
}

fn without_leading_zeros(key: &str) -> &str {
    let stripped = key.trim_start_matches('0');
    if stripped.is_empty() && !key.is_empty() {
        "0"
    } else {
        stripped
    }
}

/// Map identifiers to manual files.
///
/// An exact key match wins; otherwise keys equal once leading zeros are
/// dropped (`7` and `07`) are candidates. Every failing identifier is
/// reported at once.
pub fn resolve_selection<'a, S: AsRef<str>>(
    index: &'a ManualIndex,
    identifiers: &[S],
) -> Result<Vec<&'a ManualEntry>> {
    let mut selected: Vec<&ManualEntry> = Vec::new();
    let mut unknown = Vec::new();
    let mut ambiguous = Vec::new();

    for id in identifiers {
        let id = id.as_ref();
        let exact: Vec<&ManualEntry> = index.entries().iter().filter(|e| e.key == id).collect();
        let candidates = if exact.is_empty() {
            let wanted = without_leading_zeros(id);
            index
                .entries()
                .iter()
                .filter(|e| without_leading_zeros(&e.key) == wanted)
                .collect()
        } else {
            exact
        };

        match candidates.as_slice() {
            [] => unknown.push(id.to_string()),
            [entry] => {
                if !selected.iter().any(|s| s.path == entry.path) {
                    selected.push(entry);
                }
            }
            many => {
                let files: Vec<String> = many.iter().map(|e| e.file_name()).collect();
                ambiguous.push(format!("'{id}' matches {}", files.join(", ")));
            }
        }
    }

    if !unknown.is_empty() {
        return Err(Error::UnknownIdentifier(unknown));
    }
    if !ambiguous.is_empty() {
        return Err(Error::AmbiguousSelection(ambiguous.join("; ")));
    }
    Ok(selected)
}

/// Where a planned collection's record comes from.
#[derive(Debug, Clone)]
pub enum PlannedSource {
    Manual(ManualDocument),
    Remote(RemoteCollection),
}

/// One collection scheduled for ingestion.
#[derive(Debug, Clone)]
pub struct PlannedCollection {
    /// Collection name, or the file name when the record has none
    pub label: String,
    pub source: PlannedSource,
}

impl PlannedCollection {
    fn manual(document: ManualDocument) -> Self {
        Self {
            label: document.label().to_string(),
            source: PlannedSource::Manual(document),
        }
    }

    fn remote(collection: RemoteCollection) -> Self {
        Self {
            label: collection.name.trim().to_string(),
            source: PlannedSource::Remote(collection),
        }
    }

    pub fn kind(&self) -> CollectionSource {
        match self.source {
            PlannedSource::Manual(_) => CollectionSource::Manual,
            PlannedSource::Remote(_) => CollectionSource::Remote,
        }
    }

    pub fn normalize(&self) -> Result<RawCollection> {
        match &self.source {
            PlannedSource::Manual(document) => document.normalize(),
            PlannedSource::Remote(collection) => remote::normalize(collection),
        }
    }
}

/// Order the run: which collections, from which source.
///
/// With [`Selection::All`], manual collections that have no remote snapshot
/// of the same name come first (file order), then every snapshot (name
/// order). With explicit keys, a selected manual collection is replaced by
/// the snapshot of the same name when one exists.
pub fn plan(
    selection: &Selection,
    index: &ManualIndex,
    mut snapshots: Vec<RemoteCollection>,
) -> Result<Vec<PlannedCollection>> {
    snapshots.sort_by(|a, b| a.name.cmp(&b.name));

    match selection {
        Selection::All => {
            let remote_names: HashSet<&str> = snapshots.iter().map(|s| s.name.trim()).collect();
            let mut planned = Vec::new();
            for entry in index.entries() {
                let document = entry.read()?;
                if document.name().is_some_and(|n| remote_names.contains(n)) {
                    continue;
                }
                planned.push(PlannedCollection::manual(document));
            }
            planned.extend(snapshots.into_iter().map(PlannedCollection::remote));
            Ok(planned)
        }
        Selection::Keys(keys) => {
            let entries = resolve_selection(index, keys)?;
            let mut by_name: HashMap<String, RemoteCollection> = snapshots
                .into_iter()
                .map(|s| (s.name.trim().to_string(), s))
                .collect();

            let mut planned = Vec::with_capacity(entries.len());
            for entry in entries {
                let document = entry.read()?;
                let snapshot = document.name().and_then(|n| by_name.remove(n));
                planned.push(match snapshot {
                    Some(snapshot) => PlannedCollection::remote(snapshot),
                    None => PlannedCollection::manual(document),
                });
            }
            Ok(planned)
        }
    }
}

/// What to do when a collection fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop at the first failed collection
    #[default]
    Abort,
    /// Log it, skip it and continue
    KeepGoing,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOptions {
    /// Delete all collections, tracks, artists and stats before ingesting
    pub clear: bool,
    pub policy: FailurePolicy,
    pub library: LibraryScope,
}

/// Outcome of one committed collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionReport {
    pub name: String,
    pub source: CollectionSource,
    pub tracks_created: usize,
    pub tracks_reused: usize,
    pub artists_created: usize,
}

/// A collection that was rolled back.
#[derive(Debug)]
pub struct FailedCollection {
    pub name: String,
    pub error: Error,
}

/// Summary of a run.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub ingested: Vec<CollectionReport>,
    pub failed: Vec<FailedCollection>,
    /// Collections left out after an abort
    pub not_attempted: usize,
    /// Set when statistics were recomputed
    pub stats: Option<StatsSummary>,
}

impl IngestReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs a plan against the store.
pub struct ReconciliationDriver {
    pool: SqlitePool,
    options: IngestOptions,
}

impl ReconciliationDriver {
    pub fn new(pool: SqlitePool, options: IngestOptions) -> Self {
        Self { pool, options }
    }

    /// Ingest `planned` in order, then recompute statistics.
    ///
    /// Collection failures are recorded in the report according to the
    /// failure policy; only store-level failures outside a collection
    /// (clearing, transactions, stats) are returned as errors.
    pub async fn run(&self, planned: Vec<PlannedCollection>) -> Result<IngestReport> {
        if self.options.clear {
            let mut conn = self.pool.acquire().await?;
            db::clear_library(&mut conn).await?;
            tracing::info!(target: "ingest::driver", "Cleared library");
        }

        let total = planned.len();
        let mut report = IngestReport::default();
        // One builder per run so the artist cache never outlives it
        let mut builder = CollectionBuilder::default();

        for (index, collection) in planned.into_iter().enumerate() {
            tracing::info!(
                target: "ingest::driver",
                collection = %collection.label,
                source = %collection.kind(),
                position = index + 1,
                total,
                "Ingesting collection"
            );

            let artists_before = builder.tracks().artists().created();
            let mut tx = self.pool.begin().await?;
            let result = match collection.normalize() {
                Ok(raw) => builder.build(&mut *tx, &raw).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(outcome) => {
                    tx.commit().await?;
                    report.ingested.push(CollectionReport {
                        name: outcome.collection.name,
                        source: collection.kind(),
                        tracks_created: outcome.tracks_created,
                        tracks_reused: outcome.tracks_reused,
                        artists_created: builder.tracks().artists().created() - artists_before,
                    });
                }
                Err(error) => {
                    tx.rollback().await?;
                    builder.tracks_mut().artists_mut().forget();
                    tracing::error!(
                        target: "ingest::driver",
                        collection = %collection.label,
                        error = %error,
                        "Collection rolled back"
                    );
                    report.failed.push(FailedCollection {
                        name: collection.label,
                        error,
                    });
                    if self.options.policy == FailurePolicy::Abort {
                        report.not_attempted = total - index - 1;
                        break;
                    }
                }
            }
        }

        if !report.ingested.is_empty() {
            report.stats = Some(stats::recompute_stats(&self.pool, self.options.library).await?);
        }

        tracing::info!(
            target: "ingest::driver",
            ingested = report.ingested.len(),
            failed = report.failed.len(),
            not_attempted = report.not_attempted,
            "Ingestion finished"
        );
        Ok(report)
    }
}
