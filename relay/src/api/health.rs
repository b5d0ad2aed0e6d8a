//! Health and engine status endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use opendream_common::{EngineStatus, HealthResponse};

use crate::state::AppState;

/// Provider label reported by `/health`.
pub const PROVIDER_LABEL: &str = "Replicate/Flux-Fill";

/// Build the health router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/engine/status", get(engine_status))
}

/// GET /health - reports whether an API token is configured.
///
/// Never calls the remote provider.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse::new(state.has_credential(), PROVIDER_LABEL))
}

/// GET /engine/status - static description of what this relay can do.
async fn engine_status(State(state): State<Arc<AppState>>) -> Json<EngineStatus> {
    let provider = state.engine.provider();
    Json(EngineStatus {
        engine: provider.provider_name().to_string(),
        model: provider.model().to_string(),
        capabilities: vec!["inpaint".to_string()],
        output_format: state.config.generation.output_format.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
