// Catalog and playlist collaborators
//
// The pipeline only sees these traits; `spotify` provides the HTTP
// implementation and the tests use in-memory fakes.

pub mod spotify;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use spotify::SpotifyClient;

/// Artist credit on a catalog track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub name: String,
}

/// Track as returned by the catalog. IDs can be missing for local files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogTrack {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
}

impl CatalogTrack {
    pub fn new(id: &str, name: &str, artist: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            name: name.to_string(),
            artists: vec![ArtistRef {
                name: artist.to_string(),
            }],
        }
    }

    /// Name of the first credited artist
    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(|a| a.name.as_str())
    }
}

/// One entry of the saved-tracks listing; `track` is null for removed items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedTrackItem {
    #[serde(default)]
    pub track: Option<CatalogTrack>,
}

/// Playlist created on the remote service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedPlaylist {
    pub id: String,
    pub external_url: String,
}

/// Read access to the music catalog and the user's library
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Free-text track search
    async fn search_tracks(&self, query: &str, limit: usize) -> Result<Vec<CatalogTrack>>;

    /// One page of the user's saved tracks
    async fn saved_tracks(&self, limit: usize, offset: usize) -> Result<Vec<SavedTrackItem>>;

    /// Targeted search constrained to a name and artist; at most one hit
    async fn find_track(&self, name: &str, artist: &str) -> Result<Option<CatalogTrack>> {
        let query = format!("track:{} artist:{}", name, artist);
        let mut hits = self.search_tracks(&query, 1).await?;
        Ok(if hits.is_empty() {
            None
        } else {
            Some(hits.swap_remove(0))
        })
    }
}

/// Playlist mutation on the remote service
#[async_trait]
pub trait PlaylistApi: Send + Sync {
    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        public: bool,
    ) -> Result<CreatedPlaylist>;

    /// Append tracks; callers respect the service's batch limit
    async fn add_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<()>;
}
