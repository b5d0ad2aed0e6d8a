//! OpenDream relay server.

use std::env;
use std::sync::Arc;

use opendream_relay::{app, AppState, Config, RelayEngine, ReplicateProvider};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_version() {
    println!("opendream-relay {}", VERSION);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle --version / -V
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        print_version();
        return Ok(());
    }

    // .env must be applied before configuration is read
    let dotenv_path = dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Some(path) = dotenv_path {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    // Load configuration
    let config = Config::load()
        .map_err(|e| format!("Failed to load configuration: {}", e))?;

    let provider = Arc::new(ReplicateProvider::new(&config.replicate));
    let api_token = config.replicate.token().map(String::from);

    if api_token.is_some() {
        tracing::info!("Connected to Replicate ({})", config.replicate.model);
    } else {
        tracing::warn!("REPLICATE_API_TOKEN is missing. Generation requests will fail.");
    }

    let engine = RelayEngine::new(provider, api_token, config.generation.clone());
    let state = Arc::new(AppState::new(config.clone(), engine));

    tracing::info!("Allowed origins: {:?}", config.api.origins());

    // Build router
    let app = app(state);

    // Start server
    let addr = format!("{}:{}", config.api.host, config.api.port);
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
