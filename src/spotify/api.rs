//! Trait definition for the streaming-service client.
//!
//! Production code uses [`SpotifyClient`](super::SpotifyClient); tests
//! substitute the mocks below. Listings are exposed page by page on the
//! trait and as item streams through [`playlists`] and [`playlist_entries`].

use async_trait::async_trait;
use futures::Stream;

use super::client::SpotifyClient;
use super::domain::{PlaylistEntry, RemotePlaylist, RemoteTrack, SpotifyError, UserProfile};
use super::paging::{Page, paginate};

/// Operations the sync and match flows need from the service.
#[async_trait]
pub trait SpotifyApi: Send + Sync {
    /// Profile of the token's owner.
    async fn current_user(&self) -> Result<UserProfile, SpotifyError>;

    /// One page of the user's playlists; `next` is the previous page's link.
    async fn playlists_page(&self, next: Option<&str>)
    -> Result<Page<RemotePlaylist>, SpotifyError>;

    /// One page of a playlist's entries.
    async fn playlist_entries_page(
        &self,
        playlist: &RemotePlaylist,
        next: Option<&str>,
    ) -> Result<Page<PlaylistEntry>, SpotifyError>;

    /// Free-text track search, best matches first.
    async fn search_tracks(&self, query: &str) -> Result<Vec<RemoteTrack>, SpotifyError>;
}

#[async_trait]
impl SpotifyApi for SpotifyClient {
    async fn current_user(&self) -> Result<UserProfile, SpotifyError> {
        self.current_user().await
    }

    async fn playlists_page(
        &self,
        next: Option<&str>,
    ) -> Result<Page<RemotePlaylist>, SpotifyError> {
        self.playlists_page(next).await
    }

    async fn playlist_entries_page(
        &self,
        playlist: &RemotePlaylist,
        next: Option<&str>,
    ) -> Result<Page<PlaylistEntry>, SpotifyError> {
        self.playlist_entries_page(playlist, next).await
    }

    async fn search_tracks(&self, query: &str) -> Result<Vec<RemoteTrack>, SpotifyError> {
        self.search_tracks(query).await
    }
}

/// Every playlist of the current user.
pub fn playlists<A>(api: &A) -> impl Stream<Item = Result<RemotePlaylist, SpotifyError>> + '_
where
    A: SpotifyApi + ?Sized,
{
    paginate(move |next: Option<String>| async move { api.playlists_page(next.as_deref()).await })
}

/// Every entry of `playlist`, in playlist order.
pub fn playlist_entries<'a, A>(
    api: &'a A,
    playlist: &'a RemotePlaylist,
) -> impl Stream<Item = Result<PlaylistEntry, SpotifyError>> + 'a
where
    A: SpotifyApi + ?Sized,
{
    paginate(move |next: Option<String>| async move {
        api.playlist_entries_page(playlist, next.as_deref()).await
    })
}
