//! Configuration for the relay.

use std::env;

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

/// Main configuration structure for the relay.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub replicate: ReplicateConfig,
    /// Fixed parameters sent with every inpainting prediction.
    #[serde(default)]
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS origins, comma-separated. `*` allows any origin.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: String,
    /// Largest accepted request body. Image and mask both travel as base64.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ApiConfig {
    /// Allowed origins as a list, with blanks dropped.
    pub fn origins(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect()
    }
}

/// Replicate API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplicateConfig {
    /// Bearer token. Normally supplied through `REPLICATE_API_TOKEN`.
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Model in `owner/name` form.
    #[serde(default = "default_model")]
    pub model: String,
    /// Delay between prediction status polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Inputs up to this size are sent inline as data URIs; larger ones go
    /// through the files API first.
    #[serde(default = "default_inline_limit")]
    pub inline_limit_bytes: usize,
}

impl Default for ReplicateConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            api_base: default_api_base(),
            model: default_model(),
            poll_interval_ms: default_poll_interval(),
            inline_limit_bytes: default_inline_limit(),
        }
    }
}

impl ReplicateConfig {
    /// The configured token, treating an empty value as absent.
    pub fn token(&self) -> Option<&str> {
        self.api_token.as_deref().filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_guidance_scale")]
    pub guidance_scale: f32,
    #[serde(default = "default_num_inference_steps")]
    pub num_inference_steps: u32,
    #[serde(default = "default_output_format")]
    pub output_format: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            guidance_scale: default_guidance_scale(),
            num_inference_steps: default_num_inference_steps(),
            output_format: default_output_format(),
        }
    }
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_allowed_origins() -> String {
    "http://localhost:3000".to_string()
}
fn default_max_body_bytes() -> usize {
    64 * 1024 * 1024
}
fn default_api_base() -> String {
    "https://api.replicate.com/v1".to_string()
}
fn default_model() -> String {
    "black-forest-labs/flux-fill-dev".to_string()
}
fn default_poll_interval() -> u64 {
    500
}
fn default_inline_limit() -> usize {
    256 * 1024
}
fn default_guidance_scale() -> f32 {
    30.0
}
fn default_num_inference_steps() -> u32 {
    20
}
fn default_output_format() -> String {
    "png".to_string()
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. `REPLICATE_API_TOKEN` and `ALLOWED_ORIGINS`
    /// 2. Environment variables (OPENDREAM__SECTION__KEY format)
    /// 3. config.toml file (if present)
    /// 4. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .set_default("api.host", default_host())?
            .set_default("api.port", default_port() as i64)?
            .set_default("api.allowed_origins", default_allowed_origins())?
            .set_default("replicate.api_base", default_api_base())?
            .set_default("replicate.model", default_model())?
            // Load from config.toml if exists
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("OPENDREAM")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("replicate.api_token", env::var("REPLICATE_API_TOKEN").ok())?
            .set_override_option("api.allowed_origins", env::var("ALLOWED_ORIGINS").ok())?
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_api_config() {
        let api = ApiConfig::default();
        assert_eq!(api.host, "0.0.0.0");
        assert_eq!(api.port, 8000);
        assert_eq!(api.origins(), vec!["http://localhost:3000"]);
        assert_eq!(api.max_body_bytes, 64 * 1024 * 1024);
    }

    #[test]
    fn test_origins_split() {
        let api = ApiConfig {
            allowed_origins: "http://a.test, http://b.test,,".to_string(),
            ..Default::default()
        };
        assert_eq!(api.origins(), vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn test_default_generation_config() {
        let generation = GenerationConfig::default();
        assert_eq!(generation.guidance_scale, 30.0);
        assert_eq!(generation.num_inference_steps, 20);
        assert_eq!(generation.output_format, "png");
    }

    #[test]
    fn test_empty_token_is_absent() {
        let mut replicate = ReplicateConfig::default();
        assert!(replicate.token().is_none());

        replicate.api_token = Some(String::new());
        assert!(replicate.token().is_none());

        // Only an empty value is absent; whitespace still counts as set.
        replicate.api_token = Some("  ".to_string());
        assert_eq!(replicate.token(), Some("  "));

        replicate.api_token = Some("r8_abc".to_string());
        assert_eq!(replicate.token(), Some("r8_abc"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = ConfigLoader::builder()
            .add_source(config::File::from_str(
                "[replicate]\nmodel = \"owner/other\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.replicate.model, "owner/other");
        assert_eq!(config.replicate.poll_interval_ms, 500);
        assert_eq!(config.api.port, 8000);
    }
}
