// Playlist assembler
//
// Picks the final name, creates the remote playlist and submits the
// selection in API-sized batches.

use super::PipelineSettings;
use crate::catalog::{CreatedPlaylist, PlaylistApi};
use crate::error::Result;

pub const DEFAULT_PLAYLIST_NAME: &str = "AI Playlist";
const MAX_NAME_FROM_DESCRIPTION: usize = 80;

/// Created playlist together with the name it was given
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPlaylist {
    pub playlist: CreatedPlaylist,
    pub name: String,
}

/// Agent name if non-blank, else the first 80 characters of the description,
/// else a fixed default
pub fn resolve_name(agent_name: Option<&str>, description: &str) -> String {
    if let Some(name) = agent_name.map(str::trim).filter(|n| !n.is_empty()) {
        return name.to_string();
    }
    let from_description: String = description
        .trim()
        .chars()
        .take(MAX_NAME_FROM_DESCRIPTION)
        .collect();
    if from_description.is_empty() {
        DEFAULT_PLAYLIST_NAME.to_string()
    } else {
        from_description
    }
}

/// Create the playlist and add `track_ids` in order, one call per batch.
///
/// The first failing batch aborts the request; earlier batches stay applied.
pub async fn assemble(
    playlists: &dyn PlaylistApi,
    track_ids: &[String],
    agent_name: Option<&str>,
    description: &str,
    user_id: &str,
    settings: &PipelineSettings,
) -> Result<AssembledPlaylist> {
    let name = resolve_name(agent_name, description);
    let playlist = playlists.create_playlist(user_id, &name, true).await?;
    tracing::info!("Created playlist '{}' ({})", name, playlist.id);

    let batch_size = settings.add_batch_size.max(1);
    for (i, batch) in track_ids.chunks(batch_size).enumerate() {
        playlists.add_tracks(&playlist.id, batch).await?;
        tracing::debug!("Added batch {} ({} tracks)", i + 1, batch.len());
    }

    if !settings.settle_delay.is_zero() {
        tokio::time::sleep(settings.settle_delay).await;
    }

    Ok(AssembledPlaylist { playlist, name })
}
