// AI module for the playlist agent
//
// This module provides:
// - The `Agent` seam the pipeline talks to
// - Claude API client implementing it
// - Secure credential storage via OS keychain
// - Prompt builders and the response extractor for agent output

pub mod claude_client;
pub mod credentials;
pub mod extractor;
pub mod prompts;

use crate::error::Result;
use async_trait::async_trait;

// Re-export commonly used types
pub use claude_client::ClaudeClient;
pub use credentials::CredentialManager;
pub use extractor::{AgentSelection, Shape, TrackSuggestion};
pub use prompts::SYSTEM_PROMPT;

/// A reasoning agent answering one prompt at a time.
///
/// Calls are independent: no conversation state is kept between them.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Run a single prompt and return the agent's text content.
    async fn run(&self, prompt: &str) -> Result<String>;
}
