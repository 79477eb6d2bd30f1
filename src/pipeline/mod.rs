// Playlist pipeline
//
// Candidate pool -> primary selection -> supplementation -> assembly.
// Each request owns its pool, selection and used-set; nothing is shared
// between requests.

pub mod assembler;
pub mod pool;
pub mod selector;
pub mod supplement;

use crate::ai::Agent;
use crate::catalog::{Catalog, PlaylistApi};
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

pub const MIN_QUOTA: usize = 1;
pub const MAX_QUOTA: usize = 100;
pub const DEFAULT_QUOTA: usize = 20;

/// A catalog track in the uniform shape used downstream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artist: String,
}

impl Track {
    pub fn new(id: &str, name: &str, artist: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            artist: artist.to_string(),
        }
    }
}

/// Name and artist of a pool track, as shown to the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrackInfo<'a> {
    pub name: &'a str,
    pub artist: &'a str,
}

/// Ordered candidate tracks the primary selector may choose from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidatePool {
    tracks: Vec<Track>,
}

impl CandidatePool {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    /// The allowed set: `id -> {name, artist}`
    pub fn allowed_map(&self) -> BTreeMap<&str, TrackInfo<'_>> {
        self.tracks
            .iter()
            .map(|t| {
                (
                    t.id.as_str(),
                    TrackInfo {
                        name: &t.name,
                        artist: &t.artist,
                    },
                )
            })
            .collect()
    }

    /// Set of pool IDs, for membership checks over many IDs
    pub fn id_set(&self) -> HashSet<&str> {
        self.tracks.iter().map(|t| t.id.as_str()).collect()
    }
}

/// Where candidate tracks come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// The user's saved tracks
    #[default]
    Liked,
    /// A catalog search for the description
    Search,
}

impl Mode {
    /// Anything other than "search" selects the user's library
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()) {
            Some(ref s) if s == "search" => Mode::Search,
            _ => Mode::Liked,
        }
    }
}

/// One playlist request. `quota` is always within `MIN_QUOTA..=MAX_QUOTA`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRequest {
    description: String,
    quota: usize,
    mode: Mode,
}

impl SelectionRequest {
    pub fn new(description: &str, quota: i64, mode: Mode) -> Result<Self> {
        let description = description.trim();
        if description.is_empty() {
            return Err(PipelineError::InvalidInput(
                "description is required".to_string(),
            ));
        }
        let quota = quota.clamp(MIN_QUOTA as i64, MAX_QUOTA as i64) as usize;
        Ok(Self {
            description: description.to_string(),
            quota,
            mode,
        })
    }

    /// Build from loosely typed form values. A missing or unparseable count
    /// falls back to `DEFAULT_QUOTA`.
    pub fn from_raw(description: &str, mode: Option<&str>, num_songs: Option<&str>) -> Result<Self> {
        let quota = num_songs
            .and_then(|s| s.trim().parse::<i64>().ok())
            .unwrap_or(DEFAULT_QUOTA as i64);
        Self::new(description, quota, Mode::parse(mode))
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn quota(&self) -> usize {
        self.quota
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }
}

/// Lowercased `(name, artist)` pair used to avoid re-suggesting a track
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UsedTrackKey {
    pub name: String,
    pub artist: String,
}

impl UsedTrackKey {
    pub fn new(name: &str, artist: &str) -> Self {
        Self {
            name: name.to_lowercase(),
            artist: artist.to_lowercase(),
        }
    }
}

/// Tunables for one pipeline instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Supplementation rounds when the primary selection falls short
    pub max_rounds: usize,
    /// Pool prefix length used when the agent selection is unusable
    pub fallback_count: usize,
    /// Saved-tracks page size
    pub liked_page_size: usize,
    /// Minimum saved-tracks pool size, regardless of quota
    pub liked_pool_floor: usize,
    /// Largest batch the playlist API accepts per add call
    pub add_batch_size: usize,
    /// Pause after submitting tracks so follow-up reads see them
    pub settle_delay: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_rounds: 1,
            fallback_count: 5,
            liked_page_size: 50,
            liked_pool_floor: 200,
            add_batch_size: 100,
            settle_delay: Duration::from_secs(5),
        }
    }
}

/// Result of a successful `build_playlist` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistOutcome {
    pub playlist_url: String,
    pub playlist_id: String,
    pub playlist_name: String,
    pub selected_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_agent_text: Option<String>,
}

/// Non-fatal advisory when fewer tracks were found than requested
pub fn shortfall_warning(found: usize, quota: usize) -> Option<String> {
    if found >= quota {
        return None;
    }
    Some(format!(
        "Only {} out of {} requested songs could be found and added. \
         Try lowering the number or broadening your mood description.",
        found, quota
    ))
}

/// The full selection-and-supplementation pipeline over its collaborators
#[derive(Clone)]
pub struct Pipeline {
    catalog: Arc<dyn Catalog>,
    playlists: Arc<dyn PlaylistApi>,
    agent: Arc<dyn Agent>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        playlists: Arc<dyn PlaylistApi>,
        agent: Arc<dyn Agent>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            catalog,
            playlists,
            agent,
            settings,
        }
    }

    /// Build and persist a playlist for `request`, owned by `user_id`.
    pub async fn build_playlist(
        &self,
        request: &SelectionRequest,
        user_id: &str,
    ) -> Result<PlaylistOutcome> {
        tracing::info!(
            mode = ?request.mode(),
            quota = request.quota(),
            "Building playlist"
        );

        let pool = pool::build_pool(self.catalog.as_ref(), request, &self.settings).await?;
        tracing::info!("Candidate pool has {} tracks", pool.len());

        let primary =
            selector::select_primary(self.agent.as_ref(), &pool, request, &self.settings).await;

        // An empty pool means nothing matched at all; the agent is not consulted
        let selected = if pool.is_empty() {
            primary.track_ids
        } else {
            let used = supplement::used_keys(&pool, &primary.track_ids);
            supplement::supplement(
                self.agent.as_ref(),
                self.catalog.as_ref(),
                request,
                primary.track_ids,
                used,
                self.settings.max_rounds,
            )
            .await
        };

        let warning = shortfall_warning(selected.len(), request.quota());
        if let Some(ref w) = warning {
            tracing::warn!("{}", w);
        }

        let assembled = assembler::assemble(
            self.playlists.as_ref(),
            &selected,
            primary.playlist_name.as_deref(),
            request.description(),
            user_id,
            &self.settings,
        )
        .await?;

        Ok(PlaylistOutcome {
            playlist_url: assembled.playlist.external_url,
            playlist_id: assembled.playlist.id,
            playlist_name: assembled.name,
            selected_ids: selected,
            warning,
            raw_agent_text: primary.raw_agent_text,
        })
    }
}
