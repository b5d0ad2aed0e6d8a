//! Error types for the relay.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use opendream_common::ErrorResponse;

/// Error types for relay operations.
///
/// Only `MissingCredential` and `InvalidBody` originate here; everything else
/// passes through whatever the remote API or result host reported.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Missing API Key. Please set REPLICATE_API_TOKEN in .env")]
    MissingCredential,

    /// Request body that is not a valid `GenerateRequest`.
    #[error("{0}")]
    InvalidBody(#[from] JsonRejection),

    #[error("Invalid image payload: {0}")]
    InvalidPayload(String),

    #[error("Remote inference error: {0}")]
    Communication(String),

    #[error("Prediction failed: {0}")]
    PredictionFailed(String),

    #[error("Unexpected model output: {0}")]
    UnexpectedOutput(String),

    #[error("Result download failed: {0}")]
    DownloadFailed(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            Error::InvalidBody(rejection) => (rejection.status(), rejection.body_text()),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        (status, Json(ErrorResponse::new(detail))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
