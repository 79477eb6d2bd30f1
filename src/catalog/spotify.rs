// Spotify Web API client
//
// Implements `Catalog` and `PlaylistApi` with a pre-issued bearer token.
// Token acquisition and refresh happen outside this crate.

use super::{Catalog, CatalogTrack, CreatedPlaylist, PlaylistApi, SavedTrackItem};
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";
/// Largest `limit` the search endpoint accepts
pub const MAX_SEARCH_LIMIT: usize = 50;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Option<TrackPage>,
}

#[derive(Debug, Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<Option<CatalogTrack>>,
}

#[derive(Debug, Deserialize)]
struct SavedTracksResponse {
    #[serde(default)]
    items: Vec<SavedTrackItem>,
}

#[derive(Debug, Serialize)]
struct CreatePlaylistRequest<'a> {
    name: &'a str,
    public: bool,
}

#[derive(Debug, Deserialize)]
struct PlaylistResponse {
    id: String,
    #[serde(default)]
    external_urls: ExternalUrls,
}

#[derive(Debug, Default, Deserialize)]
struct ExternalUrls {
    #[serde(default)]
    spotify: Option<String>,
}

#[derive(Debug, Serialize)]
struct AddTracksRequest {
    uris: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
}

pub struct SpotifyClient {
    access_token: String,
    api_base: String,
    client: Client,
}

impl SpotifyClient {
    pub fn new(access_token: String, api_base: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PipelineError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            access_token,
            api_base: api_base.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// Resolve the id of the user the token belongs to
    pub async fn current_user_id(&self) -> Result<String> {
        let response = self
            .client
            .get(self.url("/me"))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| PipelineError::CatalogUnavailable(format!("Profile request failed: {}", e)))?;

        let response = check_status(response, PipelineError::CatalogUnavailable).await?;
        let user: UserResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::CatalogUnavailable(format!("Failed to parse profile: {}", e)))?;
        Ok(user.id)
    }
}

/// Turn a non-2xx response into the given error variant, keeping the body for context
async fn check_status(response: Response, to_err: fn(String) -> PipelineError) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(to_err(format!("API error {}: {}", status, body)))
}

#[async_trait]
impl Catalog for SpotifyClient {
    async fn search_tracks(&self, query: &str, limit: usize) -> Result<Vec<CatalogTrack>> {
        let limit = limit.clamp(1, MAX_SEARCH_LIMIT).to_string();
        let response = self
            .client
            .get(self.url("/search"))
            .bearer_auth(&self.access_token)
            .query(&[
                ("q", query),
                ("type", "track"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PipelineError::CatalogUnavailable(format!("Search request failed: {}", e)))?;

        let response = check_status(response, PipelineError::CatalogUnavailable).await?;
        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::CatalogUnavailable(format!("Failed to parse search results: {}", e)))?;

        Ok(body
            .tracks
            .map(|page| page.items)
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .filter(|t| t.id.as_deref().is_some_and(|id| !id.is_empty()))
            .collect())
    }

    async fn saved_tracks(&self, limit: usize, offset: usize) -> Result<Vec<SavedTrackItem>> {
        let response = self
            .client
            .get(self.url("/me/tracks"))
            .bearer_auth(&self.access_token)
            .query(&[("limit", limit), ("offset", offset)])
            .send()
            .await
            .map_err(|e| {
                PipelineError::CatalogUnavailable(format!("Saved tracks request failed: {}", e))
            })?;

        let response = check_status(response, PipelineError::CatalogUnavailable).await?;
        let body: SavedTracksResponse = response.json().await.map_err(|e| {
            PipelineError::CatalogUnavailable(format!("Failed to parse saved tracks: {}", e))
        })?;
        Ok(body.items)
    }
}

#[async_trait]
impl PlaylistApi for SpotifyClient {
    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        public: bool,
    ) -> Result<CreatedPlaylist> {
        let response = self
            .client
            .post(self.url(&format!("/users/{}/playlists", user_id)))
            .bearer_auth(&self.access_token)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&CreatePlaylistRequest { name, public })
            .send()
            .await
            .map_err(|e| PipelineError::PlaylistCreateFailed(format!("Request failed: {}", e)))?;

        let response = check_status(response, PipelineError::PlaylistCreateFailed).await?;
        let playlist: PlaylistResponse = response.json().await.map_err(|e| {
            PipelineError::PlaylistCreateFailed(format!("Failed to parse playlist: {}", e))
        })?;

        let external_url = playlist
            .external_urls
            .spotify
            .unwrap_or_else(|| format!("https://open.spotify.com/playlist/{}", playlist.id));

        Ok(CreatedPlaylist {
            id: playlist.id,
            external_url,
        })
    }

    async fn add_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<()> {
        let request = AddTracksRequest {
            uris: track_ids
                .iter()
                .map(|id| format!("spotify:track:{}", id))
                .collect(),
        };

        let response = self
            .client
            .post(self.url(&format!("/playlists/{}/tracks", playlist_id)))
            .bearer_auth(&self.access_token)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::TrackAddFailed(format!("Request failed: {}", e)))?;

        check_status(response, PipelineError::TrackAddFailed).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header as header_eq, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> SpotifyClient {
        SpotifyClient::new("token-123".to_string(), format!("{}/", server.uri())).unwrap()
    }

    #[tokio::test]
    async fn test_search_drops_null_and_idless_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "rainy day"))
            .and(query_param("type", "track"))
            .and(query_param("limit", "50"))
            .and(header_eq("authorization", "Bearer token-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tracks": { "items": [
                    { "id": "t1", "name": "Rain", "artists": [{ "name": "A" }] },
                    null,
                    { "id": null, "name": "Local file", "artists": [] },
                    { "id": "t2", "name": "Drizzle", "artists": [{ "name": "B" }, { "name": "C" }] }
                ]}
            })))
            .mount(&server)
            .await;

        // 80 is above the endpoint maximum and gets capped
        let tracks = client_for(&server).search_tracks("rainy day", 80).await.unwrap();
        let ids: Vec<_> = tracks.iter().filter_map(|t| t.id.as_deref()).collect();
        assert_eq!(ids, vec!["t1", "t2"]);
        assert_eq!(tracks[1].primary_artist(), Some("B"));
    }

    #[tokio::test]
    async fn test_find_track_uses_field_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "track:Teardrop artist:Massive Attack"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tracks": { "items": [
                    { "id": "tear", "name": "Teardrop", "artists": [{ "name": "Massive Attack" }] }
                ]}
            })))
            .mount(&server)
            .await;

        let hit = client_for(&server)
            .find_track("Teardrop", "Massive Attack")
            .await
            .unwrap();
        assert_eq!(hit.and_then(|t| t.id), Some("tear".to_string()));
    }

    #[tokio::test]
    async fn test_search_failure_is_catalog_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server).search_tracks("x", 5).await.unwrap_err();
        assert!(matches!(err, PipelineError::CatalogUnavailable(_)));
    }

    #[tokio::test]
    async fn test_saved_tracks_keeps_null_entries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me/tracks"))
            .and(query_param("limit", "50"))
            .and(query_param("offset", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    { "track": { "id": "s1", "name": "One", "artists": [{ "name": "X" }] } },
                    { "track": null }
                ]
            })))
            .mount(&server)
            .await;

        let items = client_for(&server).saved_tracks(50, 100).await.unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[1].track.is_none());
    }

    #[tokio::test]
    async fn test_create_playlist_and_add_tracks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/alice/playlists"))
            .and(body_json(json!({ "name": "Moody Blues", "public": true })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "pl1",
                "external_urls": { "spotify": "https://open.spotify.com/playlist/pl1" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/playlists/pl1/tracks"))
            .and(body_json(json!({ "uris": ["spotify:track:a", "spotify:track:b"] })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "snapshot_id": "s" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let playlist = client.create_playlist("alice", "Moody Blues", true).await.unwrap();
        assert_eq!(playlist.id, "pl1");
        assert_eq!(playlist.external_url, "https://open.spotify.com/playlist/pl1");

        client
            .add_tracks("pl1", &["a".to_string(), "b".to_string()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_mutation_errors_map_to_their_variants() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/alice/playlists"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/playlists/pl1/tracks"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(matches!(
            client.create_playlist("alice", "x", true).await,
            Err(PipelineError::PlaylistCreateFailed(_))
        ));
        assert!(matches!(
            client.add_tracks("pl1", &["a".to_string()]).await,
            Err(PipelineError::TrackAddFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_current_user_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "alice" })))
            .mount(&server)
            .await;

        assert_eq!(client_for(&server).current_user_id().await.unwrap(), "alice");
    }
}
