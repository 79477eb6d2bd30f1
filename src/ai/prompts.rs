// Prompts for the playlist agent
//
// The system prompt sets the persona; the two builders produce the one-shot
// user prompts for primary selection and for supplementation.

use crate::pipeline::{CandidatePool, UsedTrackKey};
use serde_json::json;
use std::collections::BTreeSet;

pub const SYSTEM_PROMPT: &str = r#"You are MoodMix, a music expert that curates playlists from a listener's mood or description.

Rules you always follow:
- Only use information given in the request. Never invent track IDs.
- Answer with the exact JSON shape requested and nothing else: no prose, no commentary, no markdown.
- Prefer real, released recordings that are available on Spotify.
"#;

/// Build the "pick from this exact pool" prompt.
pub fn selection_prompt(description: &str, quota: usize, pool: &CandidatePool) -> String {
    let allowed = serde_json::to_string(&pool.allowed_map()).unwrap_or_else(|_| "{}".to_string());

    format!(
        "You are given a list of Spotify tracks as a JSON object mapping track IDs to song info. \
         Consider ONLY the tracks in this mapping. \
         Select as many track IDs from the provided mapping as best fit the user's mood or description, up to {quota}. \
         Do NOT invent or guess any track IDs; every ID you return MUST be a key of the mapping. \
         Return ONLY a JSON object with two fields: 'track_ids' (an array of selected track IDs, e.g. [\"id1\",\"id2\"]) and 'playlist_name'. \
         For 'playlist_name', create a unique, witty, and highly creative name that fits the mood. \
         Avoid generic names. Make it fun, poetic, or surprising if possible. \
         Do NOT include any explanations, commentary, or quotes outside the JSON.\n\
         User's mood/description: {description}\n\
         Allowed tracks: {allowed}"
    )
}

/// Build the supplementation prompt asking for `needed` additional tracks.
pub fn supplement_prompt(description: &str, needed: usize, used: &BTreeSet<UsedTrackKey>) -> String {
    let used_list: Vec<_> = used
        .iter()
        .map(|key| json!({ "name": key.name, "artist": key.artist }))
        .collect();
    let used_json = serde_json::to_string(&used_list).unwrap_or_else(|_| "[]".to_string());

    format!(
        "Suggest exactly {needed} additional real Spotify tracks that best fit this mood: '{description}'. \
         Do not suggest any of these already used tracks: {used_json}. \
         Only suggest tracks that actually exist on Spotify. \
         Return only a JSON array of objects, each with 'name' and 'artist'. \
         Do not include explanations or any other text."
    )
}
