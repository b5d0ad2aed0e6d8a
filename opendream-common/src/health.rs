//! Health and engine status payloads.

use serde::{Deserialize, Serialize};

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `"online"`, or `"online (missing key)"` when no API token is configured.
    pub status: String,
    pub provider: String,
}

impl HealthResponse {
    pub const ONLINE: &'static str = "online";
    pub const MISSING_KEY: &'static str = "online (missing key)";

    pub fn new(has_credential: bool, provider: impl Into<String>) -> Self {
        let status = if has_credential {
            Self::ONLINE
        } else {
            Self::MISSING_KEY
        };
        Self {
            status: status.to_string(),
            provider: provider.into(),
        }
    }
}

/// Static capability descriptor returned by `GET /engine/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStatus {
    /// Remote provider identifier (e.g. "replicate").
    pub engine: String,
    /// Remote model identifier (e.g. "black-forest-labs/flux-fill-dev").
    pub model: String,
    pub capabilities: Vec<String>,
    pub output_format: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_online() {
        let health = HealthResponse::new(true, "Replicate/Flux-Fill");
        assert_eq!(health.status, "online");
        assert_eq!(health.provider, "Replicate/Flux-Fill");
    }

    #[test]
    fn test_health_missing_key() {
        let health = HealthResponse::new(false, "Replicate/Flux-Fill");
        assert_eq!(health.status, HealthResponse::MISSING_KEY);
    }
}
