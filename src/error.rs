// Error taxonomy for the playlist pipeline
//
// Only failures of the authoritative remote services are fatal. Agent and
// parsing failures are absorbed inside the pipeline with safe defaults.

use thiserror::Error;

/// Result type used across the crate
pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Remote search or saved-tracks paging failed
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// Agent text could not be parsed into the expected shape
    #[error("Could not extract structured data from agent response: {0}")]
    ExtractionFailed(String),

    /// The agent invocation errored or returned nothing
    #[error("Agent call failed: {0}")]
    AgentCallFailed(String),

    #[error("Failed to create playlist: {0}")]
    PlaylistCreateFailed(String),

    #[error("Failed to add tracks to playlist: {0}")]
    TrackAddFailed(String),

    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid caller input (e.g. empty description)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// OS keychain access failed
    #[error("Credential storage error: {0}")]
    Credentials(String),
}

impl PipelineError {
    /// Whether this error terminates a playlist request.
    ///
    /// `ExtractionFailed` and `AgentCallFailed` are recovered locally by the
    /// selector and the supplementation loop, so they never abort a request.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            PipelineError::ExtractionFailed(_) | PipelineError::AgentCallFailed(_)
        )
    }

    /// Whether the failure came from a remote collaborator (catalog or playlist API)
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            PipelineError::CatalogUnavailable(_)
                | PipelineError::PlaylistCreateFailed(_)
                | PipelineError::TrackAddFailed(_)
        )
    }
}
