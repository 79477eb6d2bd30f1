// In-memory collaborators for unit tests
//
// Scripted agent replies, a canned catalog and a recording playlist API.

use crate::ai::Agent;
use crate::catalog::{Catalog, CatalogTrack, CreatedPlaylist, PlaylistApi, SavedTrackItem};
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

fn exact_query(name: &str, artist: &str) -> String {
    format!("track:{} artist:{}", name, artist)
}

/// Agent that replays scripted responses in order
#[derive(Default)]
pub struct FakeAgent {
    responses: Mutex<VecDeque<Result<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl FakeAgent {
    pub fn scripted(responses: Vec<Result<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Agent for FakeAgent {
    async fn run(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PipelineError::AgentCallFailed("no scripted response".into())))
    }
}

/// Catalog with a fixed library, free-text results and exact-match hits
#[derive(Default)]
pub struct FakeCatalog {
    liked: Vec<SavedTrackItem>,
    search_results: Vec<CatalogTrack>,
    hits: HashMap<String, CatalogTrack>,
    errors: HashSet<String>,
    fail_all: bool,
    searches: Mutex<Vec<(String, usize)>>,
    saved_pages: Mutex<Vec<(usize, usize)>>,
}

impl FakeCatalog {
    pub fn with_liked(tracks: Vec<CatalogTrack>) -> Self {
        Self {
            liked: tracks
                .into_iter()
                .map(|t| SavedTrackItem { track: Some(t) })
                .collect(),
            ..Self::default()
        }
    }

    pub fn with_search(tracks: Vec<CatalogTrack>) -> Self {
        Self {
            search_results: tracks,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    /// Append a saved item whose track has been removed
    pub fn with_removed_item(mut self) -> Self {
        self.liked.push(SavedTrackItem { track: None });
        self
    }

    pub fn with_hit(mut self, name: &str, artist: &str, id: &str) -> Self {
        self.hits
            .insert(exact_query(name, artist), CatalogTrack::new(id, name, artist));
        self
    }

    pub fn with_search_error(mut self, name: &str, artist: &str) -> Self {
        self.errors.insert(exact_query(name, artist));
        self
    }

    pub fn searches(&self) -> Vec<(String, usize)> {
        self.searches.lock().unwrap().clone()
    }

    pub fn saved_pages(&self) -> Vec<(usize, usize)> {
        self.saved_pages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn search_tracks(&self, query: &str, limit: usize) -> Result<Vec<CatalogTrack>> {
        self.searches
            .lock()
            .unwrap()
            .push((query.to_string(), limit));

        if self.fail_all || self.errors.contains(query) {
            return Err(PipelineError::CatalogUnavailable("search failed".into()));
        }
        if query.starts_with("track:") {
            return Ok(self.hits.get(query).cloned().into_iter().collect());
        }
        Ok(self.search_results.iter().take(limit).cloned().collect())
    }

    async fn saved_tracks(&self, limit: usize, offset: usize) -> Result<Vec<SavedTrackItem>> {
        self.saved_pages.lock().unwrap().push((limit, offset));

        if self.fail_all {
            return Err(PipelineError::CatalogUnavailable("paging failed".into()));
        }
        Ok(self.liked.iter().skip(offset).take(limit).cloned().collect())
    }
}

/// Playlist API that records what it was asked to do
#[derive(Default)]
pub struct FakePlaylists {
    fail_create: bool,
    fail_add_on: Option<usize>,
    created: Mutex<Vec<(String, String, bool)>>,
    added: Mutex<Vec<Vec<String>>>,
    add_attempts: Mutex<usize>,
}

impl FakePlaylists {
    pub fn failing_create() -> Self {
        Self {
            fail_create: true,
            ..Self::default()
        }
    }

    /// Fail the `n`th add call (1-based)
    pub fn failing_add_on(n: usize) -> Self {
        Self {
            fail_add_on: Some(n),
            ..Self::default()
        }
    }

    pub fn created(&self) -> Vec<(String, String, bool)> {
        self.created.lock().unwrap().clone()
    }

    pub fn added(&self) -> Vec<Vec<String>> {
        self.added.lock().unwrap().clone()
    }

    pub fn add_attempts(&self) -> usize {
        *self.add_attempts.lock().unwrap()
    }
}

#[async_trait]
impl PlaylistApi for FakePlaylists {
    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        public: bool,
    ) -> Result<CreatedPlaylist> {
        if self.fail_create {
            return Err(PipelineError::PlaylistCreateFailed("rejected".into()));
        }
        let mut created = self.created.lock().unwrap();
        created.push((user_id.to_string(), name.to_string(), public));
        let id = format!("pl-{}", created.len());
        Ok(CreatedPlaylist {
            external_url: format!("https://example.test/playlist/{}", id),
            id,
        })
    }

    async fn add_tracks(&self, _playlist_id: &str, track_ids: &[String]) -> Result<()> {
        let attempt = {
            let mut attempts = self.add_attempts.lock().unwrap();
            *attempts += 1;
            *attempts
        };
        if self.fail_add_on == Some(attempt) {
            return Err(PipelineError::TrackAddFailed("rejected".into()));
        }
        self.added.lock().unwrap().push(track_ids.to_vec());
        Ok(())
    }
}
