//! OpenDream relay - forwards inpainting requests to a hosted inference API.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod state;
pub mod test_util;

pub use crate::config::Config;
pub use crate::engine::{InpaintProvider, PredictionOutput, RelayEngine, ReplicateProvider};
pub use crate::error::{Error, Result};
pub use crate::state::AppState;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::config::ApiConfig;

/// Build the full application router with CORS, body limit and request logging.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.api);
    let body_limit = DefaultBodyLimit::max(state.config.api.max_body_bytes);

    Router::new()
        .merge(api::router())
        .layer(body_limit)
        .layer(axum::middleware::from_fn(logging::request_logger))
        .layer(cors)
        .with_state(state)
}

/// CORS layer allowing credentials from the configured origins.
///
/// A `*` entry mirrors the caller's origin, since a literal wildcard cannot be
/// combined with credentials.
pub fn cors_layer(api: &ApiConfig) -> CorsLayer {
    let origins = api.origins();

    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::mirror_request()
    } else {
        let values: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect();
        AllowOrigin::list(values)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}
