//! Spotify Web API HTTP client
//!
//! Authenticates with a bearer access token obtained out of band.
//! See: https://developer.spotify.com/documentation/web-api
//!
//! Failures are reported, never retried.

use serde::de::DeserializeOwned;

use super::domain::{PlaylistEntry, RemotePlaylist, RemoteTrack, SpotifyError, UserProfile};
use super::paging::Page;
use super::{adapter, dto};

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://api.spotify.com/v1";

/// Largest page the list endpoints accept.
pub const MAX_PAGE_LIMIT: u32 = 50;

const USER_AGENT: &str = concat!("musik/", env!("CARGO_PKG_VERSION"));

/// Spotify Web API client
pub struct SpotifyClient {
    http_client: reqwest::Client,
    base_url: String,
    access_token: String,
    page_limit: u32,
}

impl SpotifyClient {
    /// Create a client against the production API.
    pub fn new(access_token: impl Into<String>) -> Result<Self, SpotifyError> {
        Self::with_base_url(access_token, DEFAULT_BASE_URL)
    }

    /// Create a client against another API root (proxies, tests).
    pub fn with_base_url(
        access_token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, SpotifyError> {
        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(SpotifyError::MissingToken);
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SpotifyError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token,
            page_limit: MAX_PAGE_LIMIT,
        })
    }

    /// Items requested per page, clamped to `1..=50`.
    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit.clamp(1, MAX_PAGE_LIMIT);
        self
    }

    pub async fn current_user(&self) -> Result<UserProfile, SpotifyError> {
        let url = format!("{}/me", self.base_url);
        let user: dto::PrivateUser = self.get(&url).await?;
        Ok(adapter::to_user(user))
    }

    pub async fn playlists_page(
        &self,
        next: Option<&str>,
    ) -> Result<Page<RemotePlaylist>, SpotifyError> {
        let url = match next {
            Some(url) => url.to_string(),
            None => format!("{}/me/playlists?limit={}", self.base_url, self.page_limit),
        };
        let page: dto::Paging<dto::SimplePlaylist> = self.get(&url).await?;
        Ok(Page {
            items: page.items.into_iter().map(adapter::to_playlist).collect(),
            next: page.next,
        })
    }

    pub async fn playlist_entries_page(
        &self,
        playlist: &RemotePlaylist,
        next: Option<&str>,
    ) -> Result<Page<PlaylistEntry>, SpotifyError> {
        let url = match next {
            Some(url) => url.to_string(),
            None => with_limit(&playlist.tracks_href, self.page_limit),
        };
        let page: dto::Paging<dto::PlaylistItem> = self.get(&url).await?;
        let received = page.items.len();
        let items: Vec<_> = page.items.into_iter().filter_map(adapter::to_entry).collect();
        if items.len() < received {
            tracing::warn!(
                target: "spotify::client",
                playlist = %playlist.name,
                skipped = received - items.len(),
                "Skipped removed tracks or episodes"
            );
        }
        Ok(Page {
            items,
            next: page.next,
        })
    }

    pub async fn search_tracks(&self, query: &str) -> Result<Vec<RemoteTrack>, SpotifyError> {
        let url = format!(
            "{}/search?type=track&limit={}&q={}",
            self.base_url,
            self.page_limit,
            urlencoding::encode(query)
        );
        let response: dto::SearchResponse = self.get(&url).await?;
        Ok(response
            .tracks
            .map(|page| page.items.into_iter().filter_map(adapter::to_track).collect())
            .unwrap_or_default())
    }

    /// Send an authenticated GET and parse the JSON body
    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, SpotifyError> {
        tracing::debug!(target: "spotify::client", url, "GET");

        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| SpotifyError::Network(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SpotifyError::RateLimited);
        }

        if !status.is_success() {
            let message = match response.json::<dto::ApiError>().await {
                Ok(error) => error.error.message,
                Err(_) => status.canonical_reason().unwrap_or("Unknown").to_string(),
            };
            return Err(SpotifyError::Http {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SpotifyError::Parse(e.to_string()))
    }
}

fn with_limit(url: &str, limit: u32) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}limit={limit}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = SpotifyClient::new("token").unwrap();
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
        assert_eq!(client.page_limit, MAX_PAGE_LIMIT);
    }

    #[test]
    fn test_client_with_custom_url() {
        let client = SpotifyClient::with_base_url("token", "http://localhost:8080/")
            .unwrap()
            .with_page_limit(500);
        assert_eq!(client.base_url, "http://localhost:8080");
        assert_eq!(client.page_limit, MAX_PAGE_LIMIT);
    }

    #[test]
    fn test_empty_token_rejected() {
        assert!(matches!(
            SpotifyClient::new("  "),
            Err(SpotifyError::MissingToken)
        ));
    }

    #[test]
    fn test_with_limit() {
        assert_eq!(
            with_limit("https://x/playlists/1/tracks", 20),
            "https://x/playlists/1/tracks?limit=20"
        );
        assert_eq!(with_limit("https://x/t?market=IL", 5), "https://x/t?market=IL&limit=5");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let client = SpotifyClient::with_base_url("token", "http://127.0.0.1:9").unwrap();
        let result = client.current_user().await;
        assert!(matches!(result, Err(SpotifyError::Network(_))));
    }
}
