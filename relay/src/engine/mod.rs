//! Remote inpainting abstraction layer.
//!
//! This module defines the `InpaintProvider` trait that hides the hosted
//! inference service behind a common interface, and the `RelayEngine` that
//! turns client payloads into provider calls and provider results back into
//! data URIs.

mod relay;
mod replicate;

pub use relay::RelayEngine;
pub use replicate::ReplicateProvider;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::GenerationConfig;
use crate::error::Result;

/// Decoded inpainting job handed to a provider.
#[derive(Debug, Clone)]
pub struct InpaintInput {
    pub image: Vec<u8>,
    pub mask: Vec<u8>,
    pub prompt: String,
    pub params: GenerationConfig,
}

/// Result reference(s) returned by a remote prediction.
///
/// Models report either one URL or a list of URLs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PredictionOutput {
    Single(String),
    Many(Vec<String>),
}

impl PredictionOutput {
    /// The reference to download: the value itself, or the first list element.
    pub fn first(&self) -> Option<&str> {
        match self {
            PredictionOutput::Single(url) => Some(url.as_str()),
            PredictionOutput::Many(urls) => urls.first().map(String::as_str),
        }
    }
}

/// Primary trait for hosted inpainting backends.
#[async_trait]
pub trait InpaintProvider: Send + Sync {
    /// Unique identifier for this provider (e.g., "replicate").
    fn provider_name(&self) -> &'static str;

    /// Remote model identifier.
    fn model(&self) -> &str;

    /// Run one prediction and wait for its output.
    async fn run(&self, api_token: &str, input: &InpaintInput) -> Result<PredictionOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_single() {
        let output: PredictionOutput =
            serde_json::from_str(r#""https://cdn.test/out.png""#).unwrap();
        assert_eq!(output.first(), Some("https://cdn.test/out.png"));
    }

    #[test]
    fn test_output_list_takes_first() {
        let output: PredictionOutput =
            serde_json::from_str(r#"["https://cdn.test/a.png", "https://cdn.test/b.png"]"#)
                .unwrap();
        assert_eq!(output.first(), Some("https://cdn.test/a.png"));
    }

    #[test]
    fn test_output_empty_list() {
        let output: PredictionOutput = serde_json::from_str("[]").unwrap();
        assert_eq!(output.first(), None);
    }

    #[test]
    fn test_output_rejects_objects() {
        assert!(serde_json::from_str::<PredictionOutput>(r#"{"url": "x"}"#).is_err());
    }
}
