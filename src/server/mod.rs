// Playlist HTTP server - Axum JSON surface over the pipeline
// Every /api route except status requires the server's bearer token.

pub mod routes;

use axum::{
    extract::{Request, State},
    http::{HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::Response,
    Router,
};
use rand::thread_rng;
use rand::Rng;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::cors::CorsLayer;

use crate::error::{PipelineError, Result};
use crate::pipeline::Pipeline;

/// Shared state for the playlist server
pub struct ServerState {
    /// Auth token (256-bit random unless configured)
    pub token: String,
    pub pipeline: Pipeline,
    /// Owner of created playlists
    pub user_id: String,
}

/// Holds the running server's shutdown mechanism
pub struct RunningServer {
    pub shutdown_tx: oneshot::Sender<()>,
    pub addr: SocketAddr,
    pub token: String,
}

/// Generate a cryptographically random 256-bit token (64 hex chars)
pub fn generate_token() -> String {
    let mut rng = thread_rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.gen::<u8>()).collect();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Auth middleware - validates the Bearer token on every request.
/// The status endpoint is public.
async fn auth_middleware(
    State(state): State<Arc<ServerState>>,
    request: Request,
    next: Next,
) -> std::result::Result<Response, StatusCode> {
    if request.uri().path() == "/api/status" {
        return Ok(next.run(request).await);
    }

    let auth_header = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok());

    match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(provided) if provided == state.token => Ok(next.run(request).await),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

/// Build the router with auth and CORS layers applied
pub fn router(state: Arc<ServerState>) -> Router {
    // CORS configuration - not a security layer, auth middleware handles that
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ])
        .allow_origin(HeaderValue::from_static("*"));

    Router::new()
        .merge(routes::api_routes())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
        .layer(cors)
}

/// Start the server on the given port.
/// Returns the running server handle (for shutdown) or an error.
pub async fn start_server(port: u16, state: Arc<ServerState>) -> Result<RunningServer> {
    let token = state.token.clone();
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| PipelineError::Config(format!("Failed to bind to {}: {}", addr, e)))?;
    let actual_addr = listener
        .local_addr()
        .map_err(|e| PipelineError::Config(format!("Failed to get local addr: {}", e)))?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    // Log without the token
    tracing::info!("Server listening on {}", actual_addr);

    tokio::spawn(async move {
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Shutdown signal received, draining connections...");
            })
            .await;
        if let Err(e) = served {
            tracing::error!("Server error: {}", e);
        }
        tracing::info!("Server stopped");
    });

    Ok(RunningServer {
        shutdown_tx,
        addr: actual_addr,
        token,
    })
}
