// REST API routes for the playlist server

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::ServerState;
use crate::error::PipelineError;
use crate::pipeline::{PlaylistOutcome, SelectionRequest};

// ---- Request/Response types ----

/// Body of `POST /api/playlists`. Values arrive loosely typed from forms,
/// so the count may be a string or a number.
#[derive(Debug, Deserialize)]
pub struct PlaylistRequest {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub num_songs: Option<serde_json::Value>,
}

impl PlaylistRequest {
    fn num_songs_raw(&self) -> Option<String> {
        match self.num_songs.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub name: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// HTTP mapping for pipeline errors
pub struct ApiError(PipelineError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PipelineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            e if e.is_remote() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

// ---- Route registration ----

pub fn api_routes() -> Router<Arc<ServerState>> {
    Router::new()
        .route("/api/status", get(get_status))
        .route("/api/playlists", post(create_playlist))
}

// ---- Handlers ----

async fn get_status() -> Json<StatusResponse> {
    Json(StatusResponse {
        name: "MoodMix".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn create_playlist(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<PlaylistRequest>,
) -> Result<Json<PlaylistOutcome>, ApiError> {
    let num_songs = body.num_songs_raw();
    let request =
        SelectionRequest::from_raw(&body.description, body.mode.as_deref(), num_songs.as_deref())
            .map_err(ApiError)?;

    let outcome = state
        .pipeline
        .build_playlist(&request, &state.user_id)
        .await
        .map_err(|e| {
            if e.is_fatal() {
                tracing::error!("Playlist request failed: {}", e);
            } else {
                tracing::warn!("Playlist request rejected: {}", e);
            }
            ApiError(e)
        })?;

    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogTrack;
    use crate::pipeline::{Pipeline, PipelineSettings};
    use crate::server::router;
    use crate::testing::{FakeAgent, FakeCatalog, FakePlaylists};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    fn state(catalog: FakeCatalog, agent: FakeAgent) -> Arc<ServerState> {
        let pipeline = Pipeline::new(
            Arc::new(catalog),
            Arc::new(FakePlaylists::default()),
            Arc::new(agent),
            PipelineSettings {
                settle_delay: Duration::ZERO,
                ..PipelineSettings::default()
            },
        );
        Arc::new(ServerState {
            token: "secret".to_string(),
            pipeline,
            user_id: "alice".to_string(),
        })
    }

    fn post_playlist(body: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/playlists")
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_status_is_public() {
        let app = router(state(FakeCatalog::default(), FakeAgent::default()));
        let response = app
            .oneshot(Request::builder().uri("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["name"], "MoodMix");
    }

    #[tokio::test]
    async fn test_playlists_require_token() {
        let app = router(state(FakeCatalog::default(), FakeAgent::default()));
        let response = app
            .clone()
            .oneshot(post_playlist(r#"{"description": "x"}"#, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(post_playlist(r#"{"description": "x"}"#, Some("wrong")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_playlist_from_search() {
        let catalog = FakeCatalog::with_search(vec![
            CatalogTrack::new("s1", "One", "A"),
            CatalogTrack::new("s2", "Two", "B"),
        ]);
        let agent = FakeAgent::scripted(vec![Ok(
            r#"{"track_ids": ["s1", "s2"], "playlist_name": "Pair Of Aces"}"#.into(),
        )]);
        let app = router(state(catalog, agent));

        let response = app
            .oneshot(post_playlist(
                r#"{"description": "two songs", "mode": "search", "num_songs": "2"}"#,
                Some("secret"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["playlist_name"], "Pair Of Aces");
        assert_eq!(body["selected_ids"], serde_json::json!(["s1", "s2"]));
        assert_eq!(body["playlist_id"], "pl-1");
        assert!(body.get("warning").is_none());
    }

    #[tokio::test]
    async fn test_missing_description_is_bad_request() {
        let app = router(state(FakeCatalog::default(), FakeAgent::default()));
        let response = app
            .oneshot(post_playlist(r#"{"num_songs": 5}"#, Some("secret")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_catalog_outage_is_bad_gateway() {
        let app = router(state(FakeCatalog::failing(), FakeAgent::default()));
        let response = app
            .oneshot(post_playlist(r#"{"description": "anything"}"#, Some("secret")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("Catalog unavailable"));
    }
}
