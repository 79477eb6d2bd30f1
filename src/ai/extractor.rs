// Response extraction for agent output
//
// Agents are asked for bare JSON but routinely wrap it in markdown fences or
// surround it with prose. This module recovers the JSON payload or reports a
// clean failure; it never hands back a partially parsed structure.

use crate::error::{PipelineError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)```(?:json)?\s*([\s\S]*?)\s*```").expect("valid fence pattern")
});
static FIRST_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[\s\S]*?\}").expect("valid object pattern"));
static FIRST_ARRAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[\s\S]*?\]").expect("valid array pattern"));

/// Structural schema the caller expects from the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `{"track_ids": [...], "playlist_name": "..."}`
    Object,
    /// `[{"name": "...", "artist": "..."}, ...]`
    Array,
}

impl Shape {
    fn brackets(self) -> (char, char) {
        match self {
            Shape::Object => ('{', '}'),
            Shape::Array => ('[', ']'),
        }
    }

    fn pattern(self) -> &'static Regex {
        match self {
            Shape::Object => &FIRST_OBJECT,
            Shape::Array => &FIRST_ARRAY,
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Shape::Object => value.is_object(),
            Shape::Array => value.is_array(),
        }
    }
}

/// Track selection returned by the primary selection prompt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentSelection {
    #[serde(default)]
    pub track_ids: Vec<String>,
    #[serde(default)]
    pub playlist_name: Option<String>,
}

/// One externally suggested track from the supplementation prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSuggestion {
    pub name: String,
    pub artist: String,
}

/// Pull a JSON value of the given shape out of raw agent text.
pub fn extract(raw: &str, shape: Shape) -> Result<Value> {
    let trimmed = raw.trim();

    let body = match FENCED_BLOCK.captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => trimmed,
    };
    let body = body.trim_matches('`').trim();

    let (open, close) = shape.brackets();
    let candidate = if body.starts_with(open) && body.ends_with(close) {
        body
    } else {
        shape
            .pattern()
            .find(body)
            .map(|m| m.as_str())
            .ok_or_else(|| {
                PipelineError::ExtractionFailed(format!("no {:?} found in agent response", shape))
            })?
    };

    let value: Value = serde_json::from_str(candidate)
        .map_err(|e| PipelineError::ExtractionFailed(format!("invalid JSON: {}", e)))?;

    if !shape.matches(&value) {
        return Err(PipelineError::ExtractionFailed(format!(
            "expected {:?}, got a different JSON type",
            shape
        )));
    }

    Ok(value)
}

/// Extract the primary selection object.
pub fn extract_selection(raw: &str) -> Result<AgentSelection> {
    let value = extract(raw, Shape::Object)?;
    serde_json::from_value(value)
        .map_err(|e| PipelineError::ExtractionFailed(format!("unexpected selection fields: {}", e)))
}

/// Extract supplementation suggestions.
///
/// Entries missing a string `name` or `artist` are skipped individually;
/// the remaining well-formed entries are kept in order.
pub fn extract_suggestions(raw: &str) -> Result<Vec<TrackSuggestion>> {
    let value = extract(raw, Shape::Array)?;
    let items = match value {
        Value::Array(items) => items,
        _ => Vec::new(),
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<TrackSuggestion>(item) {
            Ok(s) => Some(s),
            Err(e) => {
                tracing::debug!("Skipping malformed suggestion: {}", e);
                None
            }
        })
        .collect())
}
