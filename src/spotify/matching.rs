//! Find the remote counterpart of a locally described track.

use std::time::Duration;

use super::api::SpotifyApi;
use super::domain::{RemoteTrack, SpotifyError};

/// Relative duration difference still accepted as the same recording.
pub const DURATION_TOLERANCE: f64 = 0.10;

/// A track as a manual collection describes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackQuery {
    pub name: String,
    /// Comma separated artist names
    pub artist_field: String,
    pub duration: Duration,
}

impl TrackQuery {
    fn artists(&self) -> impl Iterator<Item = String> + '_ {
        self.artist_field
            .split(',')
            .map(|a| a.trim().to_lowercase())
            .filter(|a| !a.is_empty())
    }

    /// Search text for the service's track search.
    pub fn search_text(&self) -> String {
        match self.artists().next() {
            Some(artist) => format!("track:{} artist:{}", self.name.trim(), artist),
            None => format!("track:{}", self.name.trim()),
        }
    }

    fn accepts(&self, candidate: &RemoteTrack) -> bool {
        let candidate_artists: Vec<String> =
            candidate.artist_names().map(str::to_lowercase).collect();
        if !self.artists().all(|a| candidate_artists.contains(&a)) {
            return false;
        }

        let wanted = self.duration.as_secs_f64();
        let actual = candidate.duration().as_secs_f64();
        (actual - wanted).abs() <= wanted * DURATION_TOLERANCE
    }
}

/// First candidate crediting every queried artist within the duration tolerance.
pub fn find_match<'a>(query: &TrackQuery, candidates: &'a [RemoteTrack]) -> Option<&'a RemoteTrack> {
    candidates.iter().find(|c| query.accepts(c))
}

/// Search the service for `query` and pick the first acceptable result.
pub async fn search_match<A: SpotifyApi + ?Sized>(
    api: &A,
    query: &TrackQuery,
) -> Result<Option<RemoteTrack>, SpotifyError> {
    let candidates = api.search_tracks(&query.search_text()).await?;
    let found = find_match(query, &candidates).cloned();
    tracing::debug!(
        target: "spotify::matching",
        track = %query.name,
        candidates = candidates.len(),
        matched = found.is_some(),
        "Searched for remote match"
    );
    Ok(found)
}
