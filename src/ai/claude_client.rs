// Claude API client
//
// Implements the `Agent` seam on top of Anthropic's Messages API:
// - One-shot, non-streaming completions
// - Fixed system prompt, single user message per call
// - Error mapping into the pipeline's `AgentCallFailed`

use super::{Agent, SYSTEM_PROMPT};
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
const CLAUDE_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String, // "user" or "assistant"
    pub content: String,
}

/// Request to Claude API
#[derive(Debug, Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
}

/// Response from Claude API
#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

pub struct ClaudeClient {
    api_key: String,
    api_url: String,
    model: String,
    client: Client,
}

impl ClaudeClient {
    /// Create a new Claude client with the given API key, endpoint and model
    pub fn new(api_key: String, api_url: String, model: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PipelineError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            api_url,
            model,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a single user message and get the complete text response
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ClaudeRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            system: Some(SYSTEM_PROMPT),
        };

        let response = self
            .client
            .post(&self.api_url)
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", CLAUDE_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::AgentCallFailed(format!("API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PipelineError::AgentCallFailed(format!(
                "API error {}: {}",
                status, error_text
            )));
        }

        let claude_response: ClaudeResponse = response.json().await.map_err(|e| {
            PipelineError::AgentCallFailed(format!("Failed to parse response: {}", e))
        })?;

        // Extract text from content blocks
        let text = claude_response
            .content
            .iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n");

        if text.trim().is_empty() {
            return Err(PipelineError::AgentCallFailed(format!(
                "Agent returned no text (stop_reason: {})",
                claude_response.stop_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(text)
    }
}

#[async_trait]
impl Agent for ClaudeClient {
    async fn run(&self, prompt: &str) -> Result<String> {
        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "Calling agent");
        self.complete(prompt).await
    }
}
