// Modules
pub mod ai;
pub mod catalog;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod server;

#[cfg(test)]
mod testing;

use ai::ClaudeClient;
use catalog::SpotifyClient;
use config::AppConfig;
use error::{PipelineError, Result};
use pipeline::Pipeline;
use server::ServerState;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("moodmix=info,moodmix_lib=info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Wire the clients into a pipeline according to `config`
pub async fn build_state(config: &AppConfig) -> Result<ServerState> {
    let agent = Arc::new(ClaudeClient::new(
        config.agent_api_key.clone(),
        config.agent_url.clone(),
        config.agent_model.clone(),
    )?);
    let spotify = Arc::new(SpotifyClient::new(
        config.spotify_access_token.clone(),
        config.spotify_api_base.clone(),
    )?);

    let user_id = match &config.spotify_user_id {
        Some(id) => id.clone(),
        None => spotify.current_user_id().await?,
    };
    tracing::info!(user = %user_id, model = %agent.model(), "Playlist owner resolved");

    let token = config
        .server_token
        .clone()
        .unwrap_or_else(server::generate_token);

    let pipeline = Pipeline::new(
        spotify.clone(),
        spotify,
        agent,
        config.pipeline.clone(),
    );

    Ok(ServerState {
        token,
        pipeline,
        user_id,
    })
}

/// Run the HTTP server until Ctrl-C
pub async fn run(config: AppConfig) -> Result<()> {
    let state = Arc::new(build_state(&config).await?);
    let running = server::start_server(config.port, state).await?;

    if config.server_token.is_none() {
        // Generated tokens must be shown once or the API is unusable
        println!("API token: {}", running.token);
    }
    println!("MoodMix listening on http://{}", running.addr);

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| PipelineError::Config(format!("Failed to listen for Ctrl-C: {}", e)))?;

    let _ = running.shutdown_tx.send(());
    Ok(())
}
