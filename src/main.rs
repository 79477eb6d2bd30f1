use clap::{Parser, Subcommand};
use moodmix_lib::ai::CredentialManager;
use moodmix_lib::config::AppConfig;
use std::process::ExitCode;

/// Turn a mood description into a Spotify playlist
#[derive(Parser)]
#[command(name = "moodmix", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve {
        /// Port to listen on (overrides MOODMIX_PORT)
        #[arg(long, env = "MOODMIX_PORT")]
        port: Option<u16>,
    },
    /// Store the agent API key in the OS keychain
    SetApiKey { key: String },
    /// Remove the stored agent API key
    DeleteApiKey,
    /// Report whether an agent API key is stored
    ApiKeyStatus,
}

#[tokio::main]
async fn main() -> ExitCode {
    moodmix_lib::init_tracing();
    let cli = Cli::parse();

    let result = match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => match AppConfig::from_env() {
            Ok(mut config) => {
                if let Some(port) = port {
                    config.port = port;
                }
                moodmix_lib::run(config).await
            }
            Err(e) => Err(e),
        },
        Command::SetApiKey { key } => CredentialManager::store_api_key(&key).map(|_| {
            println!("API key stored in keychain");
        }),
        Command::DeleteApiKey => CredentialManager::delete_api_key().map(|_| {
            println!("API key removed from keychain");
        }),
        Command::ApiKeyStatus => CredentialManager::has_api_key().map(|stored| {
            if stored {
                println!("API key is configured");
            } else {
                println!("No API key configured");
            }
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
