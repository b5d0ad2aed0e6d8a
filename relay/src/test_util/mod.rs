//! Helpers shared by unit and integration tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::{Config, ReplicateConfig};
use crate::engine::{InpaintInput, InpaintProvider, PredictionOutput, RelayEngine};
use crate::error::{Error, Result};
use crate::state::AppState;

/// Configuration pointing the Replicate client at `api_base` with fast polling.
pub fn test_config(api_base: &str, api_token: Option<&str>) -> Config {
    Config {
        replicate: ReplicateConfig {
            api_token: api_token.map(String::from),
            api_base: api_base.to_string(),
            poll_interval_ms: 10,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Application state wired to the given provider.
pub fn test_state(config: Config, provider: Arc<dyn InpaintProvider>) -> Arc<AppState> {
    let engine = RelayEngine::new(
        provider,
        config.replicate.token().map(String::from),
        config.generation.clone(),
    );
    Arc::new(AppState::new(config, engine))
}

/// In-process provider that records its calls.
pub struct MockProvider {
    outcome: std::result::Result<PredictionOutput, String>,
    calls: Mutex<Vec<(String, InpaintInput)>>,
}

impl MockProvider {
    pub fn returning(output: PredictionOutput) -> Self {
        Self {
            outcome: Ok(output),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_input(&self) -> Option<InpaintInput> {
        self.calls.lock().unwrap().last().map(|(_, input)| input.clone())
    }

    pub fn last_token(&self) -> Option<String> {
        self.calls.lock().unwrap().last().map(|(token, _)| token.clone())
    }
}

#[async_trait]
impl InpaintProvider for MockProvider {
    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock/inpaint"
    }

    async fn run(&self, api_token: &str, input: &InpaintInput) -> Result<PredictionOutput> {
        self.calls
            .lock()
            .unwrap()
            .push((api_token.to_string(), input.clone()));

        match &self.outcome {
            Ok(output) => Ok(output.clone()),
            Err(message) => Err(Error::PredictionFailed(message.clone())),
        }
    }
}
