//! Inpainting endpoint.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use opendream_common::{GenerateRequest, GenerateResponse};

use crate::error::Result;
use crate::state::AppState;

/// Build the generate router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/generate", post(generate))
}

/// POST /generate - inpaint `image` under `mask` guided by `prompt`.
///
/// The body is parsed as JSON whatever its `Content-Type`.
async fn generate(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<GenerateResponse>> {
    let Json(request) = Json::<GenerateRequest>::from_bytes(&body)?;

    tracing::info!(body_bytes = body.len(), "Processing generation request");

    let image = state
        .engine
        .generate(&request.image, &request.mask, &request.prompt)
        .await
        .inspect_err(|e| tracing::error!("Generation failed: {}", e))?;

    Ok(Json(GenerateResponse::success(image)))
}
