// Candidate pool builder
//
// Normalizes tracks from either the user's saved library or a catalog search
// into `Track`s. Remote failures are not retried here.

use super::{CandidatePool, Mode, PipelineSettings, SelectionRequest, Track};
use crate::catalog::{Catalog, CatalogTrack};
use crate::error::Result;

const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Convert a catalog track, dropping it when it has no usable ID
fn to_track(track: CatalogTrack) -> Option<Track> {
    let id = track.id.filter(|id| !id.is_empty())?;
    let artist = track
        .artists
        .into_iter()
        .next()
        .map(|a| a.name)
        .unwrap_or_else(|| UNKNOWN_ARTIST.to_string());
    Some(Track {
        id,
        name: track.name,
        artist,
    })
}

/// Build the candidate pool for a request
pub async fn build_pool(
    catalog: &dyn Catalog,
    request: &SelectionRequest,
    settings: &PipelineSettings,
) -> Result<CandidatePool> {
    match request.mode() {
        Mode::Search => search_pool(catalog, request).await,
        Mode::Liked => liked_pool(catalog, request, settings).await,
    }
}

/// One catalog search for the description, asking for exactly `quota` results
async fn search_pool(catalog: &dyn Catalog, request: &SelectionRequest) -> Result<CandidatePool> {
    let results = catalog
        .search_tracks(request.description(), request.quota())
        .await?;
    Ok(CandidatePool::new(
        results.into_iter().filter_map(to_track).collect(),
    ))
}

/// Page through saved tracks until the ceiling or the end of the library.
///
/// The ceiling is `max(quota, liked_pool_floor)` so the selector has more to
/// choose from than it will keep.
async fn liked_pool(
    catalog: &dyn Catalog,
    request: &SelectionRequest,
    settings: &PipelineSettings,
) -> Result<CandidatePool> {
    let ceiling = request.quota().max(settings.liked_pool_floor);
    let page_size = settings.liked_page_size.max(1);
    let mut tracks: Vec<Track> = Vec::new();
    let mut offset = 0;

    while tracks.len() < ceiling {
        let items = catalog.saved_tracks(page_size, offset).await?;
        let page_len = items.len();
        if page_len == 0 {
            break;
        }

        for item in items {
            if let Some(track) = item.track.and_then(to_track) {
                tracks.push(track);
                if tracks.len() >= ceiling {
                    break;
                }
            }
        }

        if page_len < page_size {
            break;
        }
        offset += page_size;
    }

    tracing::debug!("Fetched {} saved tracks (ceiling {})", tracks.len(), ceiling);
    Ok(CandidatePool::new(tracks))
}
