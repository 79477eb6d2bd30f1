// Application configuration
//
// Everything the service needs is read once at startup into `AppConfig` and
// passed down explicitly. Values come from the environment; the agent key can
// also live in the OS keychain.

use crate::ai::{claude_client, CredentialManager};
use crate::catalog::spotify;
use crate::error::{PipelineError, Result};
use crate::pipeline::PipelineSettings;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 1234;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub agent_api_key: String,
    pub agent_model: String,
    pub agent_url: String,
    pub spotify_access_token: String,
    pub spotify_api_base: String,
    /// Playlist owner; looked up from the token when not set
    pub spotify_user_id: Option<String>,
    pub port: u16,
    /// Bearer token for the HTTP surface; generated when not set
    pub server_token: Option<String>,
    pub pipeline: PipelineSettings,
}

impl AppConfig {
    /// Load from process environment, falling back to the keychain for the agent key
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(
            |key| std::env::var(key).ok(),
            || CredentialManager::retrieve_api_key().ok().flatten(),
        )
    }

    /// Load from an arbitrary key lookup. `stored_key` is consulted only when
    /// `ANTHROPIC_API_KEY` is absent.
    pub fn from_lookup<F, K>(lookup: F, stored_key: K) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
        K: FnOnce() -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let agent_api_key = get("ANTHROPIC_API_KEY")
            .or_else(stored_key)
            .ok_or_else(|| {
                PipelineError::Config(
                    "No agent API key. Set ANTHROPIC_API_KEY or run `moodmix set-api-key`.".to_string(),
                )
            })?;

        let spotify_access_token = get("SPOTIFY_ACCESS_TOKEN").ok_or_else(|| {
            PipelineError::Config("SPOTIFY_ACCESS_TOKEN is not set".to_string())
        })?;

        let port = parse_or(get("MOODMIX_PORT"), "MOODMIX_PORT", DEFAULT_PORT)?;

        let defaults = PipelineSettings::default();
        let max_rounds = parse_or(get("MOODMIX_MAX_ROUNDS"), "MOODMIX_MAX_ROUNDS", defaults.max_rounds)?;
        let settle_secs = parse_or(
            get("MOODMIX_SETTLE_SECS"),
            "MOODMIX_SETTLE_SECS",
            defaults.settle_delay.as_secs(),
        )?;

        Ok(Self {
            agent_api_key,
            agent_model: get("MOODMIX_AGENT_MODEL")
                .unwrap_or_else(|| claude_client::DEFAULT_MODEL.to_string()),
            agent_url: get("MOODMIX_AGENT_URL")
                .unwrap_or_else(|| claude_client::DEFAULT_API_URL.to_string()),
            spotify_access_token,
            spotify_api_base: get("SPOTIFY_API_BASE")
                .unwrap_or_else(|| spotify::DEFAULT_API_BASE.to_string()),
            spotify_user_id: get("SPOTIFY_USER_ID"),
            port,
            server_token: get("MOODMIX_SERVER_TOKEN"),
            pipeline: PipelineSettings {
                max_rounds,
                settle_delay: Duration::from_secs(settle_secs),
                ..defaults
            },
        })
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T> {
    match raw {
        Some(v) => v
            .parse()
            .map_err(|_| PipelineError::Config(format!("{} has an invalid value: '{}'", key, v))),
        None => Ok(default),
    }
}
