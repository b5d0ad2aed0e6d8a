//! Replicate inference provider.

use std::time::Duration;

use async_trait::async_trait;
use opendream_common::data_uri;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{InpaintInput, InpaintProvider, PredictionOutput};
use crate::config::ReplicateConfig;
use crate::error::{Error, Result};

/// Replicate inference provider.
///
/// Creates predictions on the hosted model and polls them until they reach
/// a terminal state.
pub struct ReplicateProvider {
    http_client: Client,
    api_base: String,
    model: String,
    poll_interval: Duration,
    inline_limit: usize,
}

impl ReplicateProvider {
    pub fn new(config: &ReplicateConfig) -> Self {
        Self {
            http_client: Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            inline_limit: config.inline_limit_bytes,
        }
    }

    /// Reference to pass as a model input: a data URI for small payloads,
    /// otherwise the URL of an upload to the files API.
    async fn input_reference(&self, api_token: &str, name: &str, bytes: &[u8]) -> Result<String> {
        let mime = sniff_mime(bytes);
        if bytes.len() <= self.inline_limit {
            return Ok(data_uri::encode_with_mime(mime, bytes));
        }

        let part = Part::bytes(bytes.to_vec())
            .file_name(name.to_string())
            .mime_str(mime)
            .map_err(|e| Error::Communication(e.to_string()))?;
        let form = Form::new().part("content", part);

        let url = format!("{}/files", self.api_base);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Communication(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Communication(format!(
                "Replicate returned {} uploading {}: {}",
                status, name, body
            )));
        }

        let file: UploadedFile = response
            .json()
            .await
            .map_err(|e| Error::Communication(e.to_string()))?;

        tracing::debug!(input = name, bytes = bytes.len(), url = %file.urls.get, "Uploaded input file");
        Ok(file.urls.get)
    }
}

// ============================================================================
// Replicate API types
// ============================================================================

#[derive(Debug, Serialize)]
struct PredictionRequest<'a> {
    input: FluxFillInput<'a>,
}

#[derive(Debug, Serialize)]
struct FluxFillInput<'a> {
    image: String,
    mask: String,
    prompt: &'a str,
    guidance_scale: f32,
    num_inference_steps: u32,
    output_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    urls: FileUrls,
}

#[derive(Debug, Deserialize)]
struct FileUrls {
    get: String,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    id: String,
    status: PredictionStatus,
    #[serde(default)]
    output: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    urls: Option<PredictionUrls>,
}

#[derive(Debug, Deserialize)]
struct PredictionUrls {
    #[serde(default)]
    get: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl PredictionStatus {
    fn is_pending(self) -> bool {
        matches!(self, PredictionStatus::Starting | PredictionStatus::Processing)
    }
}

impl Prediction {
    fn poll_url(&self, api_base: &str) -> String {
        self.urls
            .as_ref()
            .and_then(|u| u.get.clone())
            .unwrap_or_else(|| format!("{}/predictions/{}", api_base, self.id))
    }

    fn error_message(&self) -> String {
        match &self.error {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => {
                format!("prediction {} ended with status {:?}", self.id, self.status)
            }
            Some(other) => other.to_string(),
        }
    }
}

/// Guess an image MIME type from its leading bytes.
fn sniff_mime(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else {
        "application/octet-stream"
    }
}

async fn read_prediction(response: reqwest::Response) -> Result<Prediction> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Communication(format!("Replicate returned {}: {}", status, body)));
    }

    response
        .json()
        .await
        .map_err(|e| Error::Communication(e.to_string()))
}

// ============================================================================
// InpaintProvider implementation
// ============================================================================

#[async_trait]
impl InpaintProvider for ReplicateProvider {
    fn provider_name(&self) -> &'static str {
        "replicate"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn run(&self, api_token: &str, input: &InpaintInput) -> Result<PredictionOutput> {
        let url = format!("{}/models/{}/predictions", self.api_base, self.model);

        let request = PredictionRequest {
            input: FluxFillInput {
                image: self.input_reference(api_token, "image", &input.image).await?,
                mask: self.input_reference(api_token, "mask", &input.mask).await?,
                prompt: &input.prompt,
                guidance_scale: input.params.guidance_scale,
                num_inference_steps: input.params.num_inference_steps,
                output_format: &input.params.output_format,
            },
        };

        tracing::debug!("Creating prediction: {}", url);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_token)
            .header("Prefer", "wait")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Communication(e.to_string()))?;

        let mut prediction = read_prediction(response).await?;
        tracing::debug!(
            prediction_id = %prediction.id,
            status = ?prediction.status,
            "Prediction created"
        );

        while prediction.status.is_pending() {
            tokio::time::sleep(self.poll_interval).await;

            let poll_url = prediction.poll_url(&self.api_base);
            let response = self
                .http_client
                .get(&poll_url)
                .bearer_auth(api_token)
                .send()
                .await
                .map_err(|e| Error::Communication(e.to_string()))?;

            prediction = read_prediction(response).await?;
            tracing::trace!(prediction_id = %prediction.id, status = ?prediction.status, "Polled prediction");
        }

        if prediction.status != PredictionStatus::Succeeded {
            return Err(Error::PredictionFailed(prediction.error_message()));
        }

        let output = prediction
            .output
            .ok_or_else(|| Error::UnexpectedOutput("prediction returned no output".to_string()))?;

        serde_json::from_value(output.clone())
            .map_err(|_| Error::UnexpectedOutput(output.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_mime() {
        assert_eq!(sniff_mime(b"\x89PNG\r\n\x1a\n"), "image/png");
        assert_eq!(sniff_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), "image/jpeg");
        assert_eq!(sniff_mime(b"RIFF\0\0\0\0WEBPVP8 "), "image/webp");
        assert_eq!(sniff_mime(b"GIF89a"), "image/gif");
        assert_eq!(sniff_mime(b"\0\0\0"), "application/octet-stream");
    }

    #[test]
    fn test_prediction_status_parsing() {
        let p: Prediction =
            serde_json::from_str(r#"{"id": "abc", "status": "processing"}"#).unwrap();
        assert!(p.status.is_pending());

        let p: Prediction = serde_json::from_str(r#"{"id": "abc", "status": "aborted"}"#).unwrap();
        assert_eq!(p.status, PredictionStatus::Unknown);
        assert!(!p.status.is_pending());
    }

    #[test]
    fn test_poll_url_fallback() {
        let p: Prediction = serde_json::from_str(r#"{"id": "abc", "status": "starting"}"#).unwrap();
        assert_eq!(
            p.poll_url("https://api.test/v1"),
            "https://api.test/v1/predictions/abc"
        );

        let p: Prediction = serde_json::from_str(
            r#"{"id": "abc", "status": "starting", "urls": {"get": "https://api.test/v1/predictions/abc?x=1"}}"#,
        )
        .unwrap();
        assert_eq!(
            p.poll_url("https://api.test/v1"),
            "https://api.test/v1/predictions/abc?x=1"
        );
    }

    #[test]
    fn test_error_message() {
        let p: Prediction = serde_json::from_str(
            r#"{"id": "abc", "status": "failed", "error": "NSFW content detected"}"#,
        )
        .unwrap();
        assert_eq!(p.error_message(), "NSFW content detected");

        let p: Prediction =
            serde_json::from_str(r#"{"id": "abc", "status": "canceled", "error": null}"#).unwrap();
        assert_eq!(p.error_message(), "prediction abc ended with status Canceled");
    }
}
