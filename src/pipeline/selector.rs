// Primary selector
//
// Asks the agent to choose from the exact pool, then keeps only IDs that are
// really in the pool. Any agent or parsing failure degrades to a fixed prefix
// of the pool so the request still produces a playlist.

use super::{CandidatePool, PipelineSettings, SelectionRequest};
use crate::ai::{extractor, prompts, Agent};
use crate::error::Result;

/// Outcome of the primary selection step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrimarySelection {
    /// Pool IDs in the agent's order, deduplicated, at most `quota`
    pub track_ids: Vec<String>,
    pub playlist_name: Option<String>,
    /// Raw agent text, when the agent answered at all
    pub raw_agent_text: Option<String>,
}

/// First `fallback_count` pool tracks in pool order, never more than `quota`
fn fallback(pool: &CandidatePool, settings: &PipelineSettings, quota: usize) -> Vec<String> {
    pool.tracks()
        .iter()
        .take(settings.fallback_count.min(quota))
        .map(|t| t.id.clone())
        .collect()
}

/// Keep IDs that belong to the pool, dropping repeats and anything past `quota`
fn validate_ids(pool: &CandidatePool, ids: Vec<String>, quota: usize) -> Vec<String> {
    let allowed = pool.id_set();
    let mut valid: Vec<String> = Vec::new();
    for id in ids {
        if allowed.contains(id.as_str()) && !valid.contains(&id) {
            valid.push(id);
        }
    }
    valid.truncate(quota);
    valid
}

async fn ask_agent(
    agent: &dyn Agent,
    pool: &CandidatePool,
    request: &SelectionRequest,
) -> (Option<String>, Result<extractor::AgentSelection>) {
    let prompt = prompts::selection_prompt(request.description(), request.quota(), pool);
    match agent.run(&prompt).await {
        Ok(text) => {
            tracing::debug!("Agent selection response: {}", text);
            let parsed = extractor::extract_selection(&text);
            (Some(text), parsed)
        }
        Err(e) => (None, Err(e)),
    }
}

/// Run the primary selection for `pool`.
///
/// An empty pool yields an empty selection without contacting the agent.
pub async fn select_primary(
    agent: &dyn Agent,
    pool: &CandidatePool,
    request: &SelectionRequest,
    settings: &PipelineSettings,
) -> PrimarySelection {
    if pool.is_empty() {
        return PrimarySelection::default();
    }

    let (raw_agent_text, parsed) = ask_agent(agent, pool, request).await;

    let selection = match parsed {
        Ok(selection) => selection,
        Err(e) => {
            tracing::warn!("Agent selection unusable, falling back to pool prefix: {}", e);
            return PrimarySelection {
                track_ids: fallback(pool, settings, request.quota()),
                playlist_name: None,
                raw_agent_text,
            };
        }
    };

    let returned = selection.track_ids.len();
    let track_ids = validate_ids(pool, selection.track_ids, request.quota());
    if returned > track_ids.len() {
        tracing::info!(
            "Dropped {} agent track IDs not in the pool or beyond quota",
            returned - track_ids.len()
        );
    }

    // An empty or all-foreign answer gets the same fallback as a parse failure
    if track_ids.is_empty() {
        tracing::warn!("Agent selected no valid tracks, falling back to pool prefix");
        return PrimarySelection {
            track_ids: fallback(pool, settings, request.quota()),
            playlist_name: None,
            raw_agent_text,
        };
    }

    PrimarySelection {
        track_ids,
        playlist_name: selection.playlist_name,
        raw_agent_text,
    }
}
