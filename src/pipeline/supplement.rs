// Supplementation loop
//
// Tops up a short selection with agent-suggested tracks from outside the pool,
// resolved back to catalog IDs one search at a time. Bounded by `max_rounds`.

use super::{CandidatePool, SelectionRequest, UsedTrackKey};
use crate::ai::{extractor, prompts, Agent, TrackSuggestion};
use crate::catalog::Catalog;
use std::collections::BTreeSet;

/// Dedup keys for the pool tracks that made it into the selection
pub fn used_keys(pool: &CandidatePool, selected: &[String]) -> BTreeSet<UsedTrackKey> {
    selected
        .iter()
        .filter_map(|id| pool.get(id))
        .map(|t| UsedTrackKey::new(&t.name, &t.artist))
        .collect()
}

/// Ask the agent for `needed` more tracks. Failures become an empty list.
async fn request_suggestions(
    agent: &dyn Agent,
    description: &str,
    needed: usize,
    used: &BTreeSet<UsedTrackKey>,
) -> Vec<TrackSuggestion> {
    let prompt = prompts::supplement_prompt(description, needed, used);
    let text = match agent.run(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("Supplementation agent call failed: {}", e);
            return Vec::new();
        }
    };
    tracing::debug!("Agent supplementation response: {}", text);

    extractor::extract_suggestions(&text).unwrap_or_else(|e| {
        tracing::warn!("Could not parse supplementation suggestions: {}", e);
        Vec::new()
    })
}

/// Resolve suggestions to catalog IDs not already selected.
///
/// Every processed suggestion is recorded in `used`, hit or miss, so it is
/// never searched for again in this request.
async fn resolve_suggestions(
    catalog: &dyn Catalog,
    suggestions: Vec<TrackSuggestion>,
    selection: &[String],
    used: &mut BTreeSet<UsedTrackKey>,
) -> Vec<String> {
    let mut resolved: Vec<String> = Vec::new();

    for suggestion in suggestions {
        let key = UsedTrackKey::new(&suggestion.name, &suggestion.artist);
        if used.contains(&key) {
            continue;
        }

        match catalog.find_track(&suggestion.name, &suggestion.artist).await {
            Ok(Some(hit)) => match hit.id {
                Some(id) if !selection.contains(&id) && !resolved.contains(&id) => {
                    resolved.push(id);
                }
                Some(id) => tracing::debug!("Skipping duplicate suggestion {}", id),
                None => {}
            },
            Ok(None) => {
                tracing::debug!(
                    "No catalog match for '{}' by '{}'",
                    suggestion.name,
                    suggestion.artist
                );
            }
            Err(e) => {
                tracing::warn!(
                    "Search for '{}' by '{}' failed, skipping: {}",
                    suggestion.name,
                    suggestion.artist,
                    e
                );
            }
        }

        used.insert(key);
    }

    resolved
}

/// Extend `selection` up to the request quota.
///
/// Runs at most `max_rounds` rounds and stops as soon as the quota is met.
/// A remaining shortfall is not an error.
pub async fn supplement(
    agent: &dyn Agent,
    catalog: &dyn Catalog,
    request: &SelectionRequest,
    mut selection: Vec<String>,
    mut used: BTreeSet<UsedTrackKey>,
    max_rounds: usize,
) -> Vec<String> {
    let quota = request.quota();
    let mut round = 0;

    while selection.len() < quota && round < max_rounds {
        round += 1;
        let needed = quota - selection.len();
        tracing::info!("Supplementation round {}: need {} more tracks", round, needed);

        let suggestions = request_suggestions(agent, request.description(), needed, &used).await;
        let mut resolved = resolve_suggestions(catalog, suggestions, &selection, &mut used).await;

        resolved.truncate(needed);
        tracing::info!("Supplementation round {} added {} tracks", round, resolved.len());
        selection.extend(resolved);
    }

    selection
}
