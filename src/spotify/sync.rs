//! Pull finished playlists into local snapshots.
//!
//! A playlist is finished when the current user owns it and its name does
//! not carry one of the work-in-progress prefixes. Playlists that already
//! have a snapshot are left alone.

use std::pin::pin;

use futures::TryStreamExt;

use super::adapter;
use super::api::{SpotifyApi, playlist_entries, playlists};
use super::domain::{RemoteCollection, RemotePlaylist, SpotifyError};
use crate::error::Result;
use crate::sources::SnapshotStore;

/// Name prefixes marking playlists that are still being put together.
pub const DEFAULT_UNFINISHED_PREFIXES: [&str; 4] = ["ZZZ", "KIDS", "XXX", "0"];

/// Whether `playlist` belongs to `user_name` and is not work in progress.
pub fn is_final_playlist(playlist: &RemotePlaylist, user_name: &str, prefixes: &[String]) -> bool {
    if playlist.owner.as_deref().unwrap_or_default() != user_name {
        return false;
    }
    let name = playlist.name.to_uppercase();
    !prefixes
        .iter()
        .any(|prefix| name.starts_with(&prefix.to_uppercase()))
}

/// Fetch every entry of `playlist` and assemble the collection.
///
/// Returns `None` for a playlist without playable tracks.
pub async fn fetch_collection<A: SpotifyApi + ?Sized>(
    api: &A,
    playlist: &RemotePlaylist,
) -> std::result::Result<Option<RemoteCollection>, SpotifyError> {
    let entries: Vec<_> = playlist_entries(api, playlist).try_collect().await?;
    if entries.is_empty() {
        return Ok(None);
    }
    Ok(Some(adapter::to_collection(playlist, entries)))
}

/// What happened to one playlist during sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Written { name: String, tracks: usize },
    SkippedExisting { name: String },
    SkippedEmpty { name: String },
}

/// Per-playlist outcomes in service order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub outcomes: Vec<SyncOutcome>,
    /// Playlists filtered out as foreign or unfinished
    pub ignored: usize,
}

impl SyncReport {
    pub fn written(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, SyncOutcome::Written { .. }))
            .count()
    }
}

/// Write a snapshot for every finished playlist not yet stored locally.
pub async fn sync_playlists<A: SpotifyApi + ?Sized>(
    api: &A,
    store: &SnapshotStore,
    unfinished_prefixes: &[String],
) -> Result<SyncReport> {
    let user = api.current_user().await?;
    let user_name = user.display_name.ok_or_else(|| {
        SpotifyError::ContractViolation(format!("user {} has no display name", user.id))
    })?;

    let existing = store.local_remote_ids()?;
    let mut report = SyncReport::default();

    let mut listing = pin!(playlists(api));
    while let Some(playlist) = listing.try_next().await? {
        if !is_final_playlist(&playlist, &user_name, unfinished_prefixes) {
            report.ignored += 1;
            continue;
        }

        if existing.contains(&playlist.id) {
            tracing::info!(target: "spotify::sync", name = %playlist.name, "Skipping existing collection");
            report.outcomes.push(SyncOutcome::SkippedExisting {
                name: playlist.name,
            });
            continue;
        }

        match fetch_collection(api, &playlist).await? {
            Some(collection) => {
                let path = store.write(&collection)?;
                tracing::info!(
                    target: "spotify::sync",
                    name = %collection.name,
                    tracks = collection.tracks.len(),
                    path = %path.display(),
                    "New collection written"
                );
                report.outcomes.push(SyncOutcome::Written {
                    name: collection.name,
                    tracks: collection.tracks.len(),
                });
            }
            None => {
                tracing::warn!(target: "spotify::sync", name = %playlist.name, "Playlist has no tracks, skipping");
                report.outcomes.push(SyncOutcome::SkippedEmpty {
                    name: playlist.name,
                });
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spotify::api::mocks::{MockSpotify, remote_playlist, remote_track};

    fn prefixes() -> Vec<String> {
        DEFAULT_UNFINISHED_PREFIXES
            .iter()
            .map(|p| p.to_string())
            .collect()
    }

    #[test]
    fn test_is_final_playlist() {
        let p = prefixes();
        assert!(is_final_playlist(&remote_playlist("1", "Road Trip", "me"), "me", &p));
        assert!(!is_final_playlist(&remote_playlist("1", "Road Trip", "you"), "me", &p));
        assert!(!is_final_playlist(&remote_playlist("1", "zzz draft", "me"), "me", &p));
        assert!(!is_final_playlist(&remote_playlist("1", "Kids songs", "me"), "me", &p));
        assert!(!is_final_playlist(&remote_playlist("1", "01 scratch", "me"), "me", &p));
        assert!(is_final_playlist(&remote_playlist("1", "Zebra", "me"), "me", &p));
    }

    #[tokio::test]
    async fn test_sync_writes_new_and_skips_existing() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let mock = MockSpotify::new("me")
            .with_playlist(
                remote_playlist("p1", "First", "me"),
                vec![
                    (remote_track("a", &["A"], 1000), "2020-03-01T10:00:00Z"),
                    (remote_track("b", &["B"], 1000), "2021-07-04T10:00:00Z"),
                    (remote_track("c", &["C"], 1000), "2020-01-01T10:00:00Z"),
                ],
            )
            .with_playlist(remote_playlist("p2", "Theirs", "someone"), vec![])
            .with_playlist(remote_playlist("p3", "ZZZ wip", "me"), vec![])
            .with_playlist(remote_playlist("p4", "Empty", "me"), vec![]);

        let report = sync_playlists(&mock, &store, &prefixes()).await.unwrap();
        assert_eq!(report.written(), 1);
        assert_eq!(report.ignored, 2);
        assert_eq!(
            report.outcomes[1],
            SyncOutcome::SkippedEmpty {
                name: "Empty".to_string()
            }
        );

        let stored = store.load_all().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].created_date.as_deref(), Some("2021-07-04"));
        let names: Vec<&str> = stored[0].tracks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        let again = sync_playlists(&mock, &store, &prefixes()).await.unwrap();
        assert_eq!(again.written(), 0);
        assert_eq!(
            again.outcomes[0],
            SyncOutcome::SkippedExisting {
                name: "First".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_missing_display_name_is_contract_violation() {
        let dir = tempfile::tempdir().unwrap();
        let mut mock = MockSpotify::new("me");
        mock.user.display_name = None;

        let err = sync_playlists(&mock, &SnapshotStore::new(dir.path()), &prefixes())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Spotify(SpotifyError::ContractViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_network_error_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let mock =
            MockSpotify::new("me").with_error(SpotifyError::Network("connection reset".to_string()));
        let result = sync_playlists(&mock, &SnapshotStore::new(dir.path()), &prefixes()).await;
        assert!(matches!(
            result,
            Err(crate::error::Error::Spotify(SpotifyError::Network(_)))
        ));
    }
}
