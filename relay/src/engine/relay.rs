//! Request/response transformation between clients and the provider.

use std::sync::Arc;

use opendream_common::data_uri;
use reqwest::Client;
use tracing::Instrument;
use uuid::Uuid;

use super::{InpaintInput, InpaintProvider};
use crate::config::GenerationConfig;
use crate::error::{Error, Result};

/// Forwards decoded image data to the provider and re-encodes its result.
pub struct RelayEngine {
    provider: Arc<dyn InpaintProvider>,
    api_token: Option<String>,
    params: GenerationConfig,
    http_client: Client,
}

impl RelayEngine {
    pub fn new(
        provider: Arc<dyn InpaintProvider>,
        api_token: Option<String>,
        params: GenerationConfig,
    ) -> Self {
        Self {
            provider,
            api_token,
            params,
            http_client: Client::new(),
        }
    }

    pub fn has_credential(&self) -> bool {
        self.api_token.is_some()
    }

    pub fn provider(&self) -> &dyn InpaintProvider {
        self.provider.as_ref()
    }

    /// Run one inpainting job and return the result as a PNG data URI.
    ///
    /// `image` and `mask` may be bare base64 or data URIs. Fails with
    /// `MissingCredential` before touching the payloads when no token is set.
    pub async fn generate(&self, image: &str, mask: &str, prompt: &str) -> Result<String> {
        let api_token = self.api_token.as_deref().ok_or(Error::MissingCredential)?;

        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "generate",
            %request_id,
            provider = self.provider.provider_name()
        );

        async move {
            let input = InpaintInput {
                image: data_uri::decode(image)
                    .map_err(|e| Error::InvalidPayload(format!("image: {}", e)))?,
                mask: data_uri::decode(mask)
                    .map_err(|e| Error::InvalidPayload(format!("mask: {}", e)))?,
                prompt: prompt.to_string(),
                params: self.params.clone(),
            };

            tracing::info!(
                model = %self.provider.model(),
                image_bytes = input.image.len(),
                mask_bytes = input.mask.len(),
                "Sending inpainting request. Prompt: {}",
                prompt
            );

            let output = self.provider.run(api_token, &input).await?;
            let result_url = output
                .first()
                .ok_or_else(|| Error::UnexpectedOutput("empty output list".to_string()))?;

            tracing::info!("Received result URL: {}", result_url);

            let bytes = self.download(result_url).await?;
            Ok::<_, Error>(data_uri::encode_png(&bytes))
        }
        .instrument(span)
        .await
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::DownloadFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::DownloadFailed(e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::DownloadFailed(e.to_string()))?;

        tracing::debug!(bytes = bytes.len(), "Downloaded result");
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PredictionOutput;
    use crate::test_util::MockProvider;

    fn engine_with(provider: Arc<MockProvider>, token: Option<&str>) -> RelayEngine {
        RelayEngine::new(
            provider,
            token.map(String::from),
            GenerationConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_missing_credential_skips_provider() {
        let provider = Arc::new(MockProvider::returning(PredictionOutput::Single(
            "http://unused.test/out.png".to_string(),
        )));
        let engine = engine_with(provider.clone(), None);

        let err = engine.generate("AAAA", "AAAA", "cat").await.unwrap_err();
        assert!(matches!(err, Error::MissingCredential));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_payload_skips_provider() {
        let provider = Arc::new(MockProvider::returning(PredictionOutput::Many(vec![])));
        let engine = engine_with(provider.clone(), Some("r8_test"));

        let err = engine.generate("AAAA", "%%%", "cat").await.unwrap_err();
        assert!(matches!(err, Error::InvalidPayload(ref m) if m.starts_with("mask")));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_provider_receives_decoded_bytes() {
        let provider = Arc::new(MockProvider::returning(PredictionOutput::Many(vec![])));
        let engine = engine_with(provider.clone(), Some("r8_test"));

        // Empty list fails after the provider call, which is all we need here.
        let err = engine
            .generate("data:image/png;base64,AQID", "BAUG", "a lighthouse")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnexpectedOutput(_)));

        let input = provider.last_input().unwrap();
        assert_eq!(input.image, vec![1, 2, 3]);
        assert_eq!(input.mask, vec![4, 5, 6]);
        assert_eq!(input.prompt, "a lighthouse");
        assert_eq!(input.params.num_inference_steps, 20);
        assert_eq!(provider.last_token().as_deref(), Some("r8_test"));
    }

    #[tokio::test]
    async fn test_provider_error_passes_through() {
        let provider = Arc::new(MockProvider::failing("model is offline"));
        let engine = engine_with(provider, Some("r8_test"));

        let err = engine.generate("AAAA", "AAAA", "cat").await.unwrap_err();
        assert_eq!(err.to_string(), "Prediction failed: model is offline");
    }
}
