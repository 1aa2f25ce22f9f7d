//! Pure statistics recomputation.
//!
//! [`recompute`] is a function of the library's base entities only: the
//! same [`LibraryState`] always yields the same [`StatsSnapshot`], which
//! then replaces whatever was stored before.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use sqlx::SqliteConnection;

use crate::error::Result;
use crate::model::{ArtistId, CollectionId, LibraryScope, TrackId};

/// Base-entity facts the statistics are derived from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryState {
    /// Member track ids of every collection, in ordinal order
    pub collections: BTreeMap<CollectionId, Vec<TrackId>>,
    /// Main and featured artists of every track
    pub track_artists: BTreeMap<TrackId, BTreeSet<ArtistId>>,
}

impl LibraryState {
    /// Read the current collections, memberships and credits.
    pub async fn load(conn: &mut SqliteConnection) -> Result<Self> {
        let mut state = Self::default();

        let collection_ids: Vec<(i64,)> = sqlx::query_as("SELECT id FROM collections")
            .fetch_all(&mut *conn)
            .await?;
        for (id,) in collection_ids {
            state.collections.insert(id, Vec::new());
        }

        let memberships: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT collection_id, track_id FROM collection_tracks ORDER BY collection_id, ordinal",
        )
        .fetch_all(&mut *conn)
        .await?;
        for (collection_id, track_id) in memberships {
            state
                .collections
                .entry(collection_id)
                .or_default()
                .push(track_id);
        }

        let credits: Vec<(i64, i64)> =
            sqlx::query_as("SELECT track_id, artist_id FROM track_artists")
                .fetch_all(&mut *conn)
                .await?;
        for (track_id, artist_id) in credits {
            state
                .track_artists
                .entry(track_id)
                .or_default()
                .insert(artist_id);
        }

        Ok(state)
    }

    fn artists_of(&self, track_id: TrackId) -> impl Iterator<Item = ArtistId> + '_ {
        self.track_artists
            .get(&track_id)
            .into_iter()
            .flat_map(|artists| artists.iter().copied())
    }
}

/// Derived statistics of one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionStats {
    /// Tracks of the collection crediting each artist
    pub artist_frequency: BTreeMap<ArtistId, i64>,
    /// Member tracks that are library-wide duplicates
    pub duplicate_tracks: BTreeSet<TrackId>,
}

/// Everything the stats tables hold, computed in one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub library: LibraryScope,
    pub collections: BTreeMap<CollectionId, CollectionStats>,
    /// Sum of the per-collection frequencies
    pub library_frequency: BTreeMap<ArtistId, i64>,
    /// Tracks in two or more distinct collections, with that count
    pub duplicates: BTreeMap<TrackId, i64>,
}

/// Count, per collection, the distinct member tracks crediting each artist.
///
/// A track listed twice in one collection, or crediting an artist in both
/// roles, still counts once.
pub fn collection_frequencies(
    state: &LibraryState,
) -> BTreeMap<CollectionId, BTreeMap<ArtistId, i64>> {
    state
        .collections
        .iter()
        .map(|(&collection_id, tracks)| {
            let distinct: BTreeSet<TrackId> = tracks.iter().copied().collect();
            let mut frequency = BTreeMap::new();
            for track_id in distinct {
                for artist_id in state.artists_of(track_id) {
                    *frequency.entry(artist_id).or_insert(0) += 1;
                }
            }
            (collection_id, frequency)
        })
        .collect()
}

/// Sum per-collection frequencies across the library.
pub fn library_frequencies<'a>(
    per_collection: impl IntoIterator<Item = &'a BTreeMap<ArtistId, i64>>,
) -> BTreeMap<ArtistId, i64> {
    let mut totals = BTreeMap::new();
    for frequencies in per_collection {
        for (&artist_id, &count) in frequencies {
            *totals.entry(artist_id).or_insert(0) += count;
        }
    }
    totals
}

/// Tracks referenced by more than one distinct collection.
pub fn duplicate_tracks(state: &LibraryState) -> BTreeMap<TrackId, i64> {
    let mut occurrences: BTreeMap<TrackId, i64> = BTreeMap::new();
    for tracks in state.collections.values() {
        let distinct: BTreeSet<TrackId> = tracks.iter().copied().collect();
        for track_id in distinct {
            *occurrences.entry(track_id).or_insert(0) += 1;
        }
    }
    occurrences.retain(|_, count| *count > 1);
    occurrences
}

/// Recompute every statistic from scratch.
pub fn recompute(state: &LibraryState, library: LibraryScope) -> StatsSnapshot {
    let per_collection = collection_frequencies(state);
    let library_frequency = library_frequencies(per_collection.values());
    let duplicates = duplicate_tracks(state);
    assemble(state, library, per_collection, library_frequency, duplicates)
}

fn assemble(
    state: &LibraryState,
    library: LibraryScope,
    per_collection: BTreeMap<CollectionId, BTreeMap<ArtistId, i64>>,
    library_frequency: BTreeMap<ArtistId, i64>,
    duplicates: BTreeMap<TrackId, i64>,
) -> StatsSnapshot {
    let collections = per_collection
        .into_iter()
        .map(|(collection_id, artist_frequency)| {
            let duplicate_tracks = state
                .collections
                .get(&collection_id)
                .into_iter()
                .flatten()
                .copied()
                .filter(|track_id| duplicates.contains_key(track_id))
                .collect();
            (
                collection_id,
                CollectionStats {
                    artist_frequency,
                    duplicate_tracks,
                },
            )
        })
        .collect();

    StatsSnapshot {
        library,
        collections,
        library_frequency,
        duplicates,
    }
}

/// Where a stats run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatsPhase {
    #[default]
    Idle,
    ComputingCollectionStats,
    ComputingLibraryFrequencies,
    ComputingDuplicates,
}

impl fmt::Display for StatsPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::ComputingCollectionStats => "computing collection stats",
            Self::ComputingLibraryFrequencies => "computing library frequencies",
            Self::ComputingDuplicates => "computing duplicates",
        };
        f.write_str(name)
    }
}

/// Counts describing a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSummary {
    pub collections: usize,
    pub artists: usize,
    pub duplicates: usize,
}

impl From<&StatsSnapshot> for StatsSummary {
    fn from(snapshot: &StatsSnapshot) -> Self {
        Self {
            collections: snapshot.collections.len(),
            artists: snapshot.library_frequency.len(),
            duplicates: snapshot.duplicates.len(),
        }
    }
}

/// Drives a recomputation through its phases and stores the result.
#[derive(Debug, Default)]
pub struct StatsEngine {
    library: LibraryScope,
    phase: StatsPhase,
}

impl StatsEngine {
    pub fn new(library: LibraryScope) -> Self {
        Self {
            library,
            phase: StatsPhase::Idle,
        }
    }

    pub fn phase(&self) -> StatsPhase {
        self.phase
    }

    fn enter(&mut self, phase: StatsPhase) {
        tracing::debug!(target: "stats::engine", from = %self.phase, to = %phase, "Phase change");
        self.phase = phase;
    }

    /// Recompute and replace the stored statistics.
    ///
    /// Run inside a transaction so the previous snapshot survives a failure.
    /// The engine is back to [`StatsPhase::Idle`] afterwards, also on error.
    pub async fn run(&mut self, conn: &mut SqliteConnection) -> Result<StatsSnapshot> {
        let result = self.run_phases(conn).await;
        self.enter(StatsPhase::Idle);
        result
    }

    async fn run_phases(&mut self, conn: &mut SqliteConnection) -> Result<StatsSnapshot> {
        let state = LibraryState::load(conn).await?;

        self.enter(StatsPhase::ComputingCollectionStats);
        let per_collection = collection_frequencies(&state);

        self.enter(StatsPhase::ComputingLibraryFrequencies);
        let library_frequency = library_frequencies(per_collection.values());

        self.enter(StatsPhase::ComputingDuplicates);
        let duplicates = duplicate_tracks(&state);

        let snapshot = assemble(
            &state,
            self.library,
            per_collection,
            library_frequency,
            duplicates,
        );
        super::store::replace_stats(conn, &snapshot).await?;

        let summary = StatsSummary::from(&snapshot);
        tracing::info!(
            target: "stats::engine",
            collections = summary.collections,
            artists = summary.artists,
            duplicates = summary.duplicates,
            "Statistics recomputed"
        );
        Ok(snapshot)
    }
}
