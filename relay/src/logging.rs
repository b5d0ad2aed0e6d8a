use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::Response,
};
use std::time::Instant;

/// Declared request body size, or 0 when the client sent no `Content-Length`.
fn content_length(request: &Request) -> u64 {
    request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

/// Middleware that logs each request with its body size and latency.
///
/// Generation requests carry two base64 images and wait on a remote model,
/// so both numbers matter when reading the log. Server errors log at WARN.
pub async fn request_logger(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_bytes = content_length(&request);

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let duration_ms = start.elapsed().as_millis() as u64;

    if response.status().is_server_error() {
        tracing::warn!(%method, %path, status, request_bytes, duration_ms, "Relay request failed");
    } else {
        tracing::info!(%method, %path, status, request_bytes, duration_ms, "Relay request");
    }

    response
}
