//! # Configuration Management
//!
//! This module handles loading and managing application configuration from multiple sources:
//! - TOML configuration files (config.toml)
//! - Environment variables (with APP_ prefix)
//! - Default values (built into the code)
//!
//! ## Key Rust Concepts Used:
//! - **Serde**: Converting between Rust structs and TOML/JSON/environment values
//! - **derive macros**: Automatically generate Debug, Clone, Serialize, Deserialize
//! - **Option<T>**: Settings that may be absent (recognition hints are all optional)
//!
//! ## Configuration Priority (highest to lowest):
//! 1. `HOST` / `PORT` (deployment platforms)
//! 2. Environment variables (`APP_SERVER__PORT`, `APP_INFERENCE__API_TOKEN`, ...)
//! 3. Configuration file (config.toml)
//! 4. Default values (defined in the Default impl)
//!
//! Nested keys use a double underscore so that field names keep their own
//! single underscores: `APP_PIPELINE__MAX_CONCURRENT_REQUESTS=4`.

use crate::audio::{Segmenter, DEFAULT_CHUNK_SIZE};
use crate::transcription::inference::{InferenceSettings, RecognitionOptions, DEFAULT_MODEL};
use crate::transcription::workers_ai::DEFAULT_BASE_URL;
use crate::transcription::Dispatch;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::time::Duration;

/// Main application configuration that contains all settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub inference: InferenceConfig,
    pub pipeline: PipelineConfig,
}

/// Server-specific configuration settings.
///
/// ## Common values:
/// - `host = "127.0.0.1"`: Only accept connections from localhost (development)
/// - `host = "0.0.0.0"`: Accept connections from any IP address (production)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Speech-to-text service settings.
///
/// ## Fields:
/// - `base_url`, `account_id`, `api_token`: Where and as whom to call Workers AI
/// - `model`: Model identifier, sent unchanged for every segment
/// - `task` .. `prefix`: Optional recognition hints; unset means the model's default
/// - `request_timeout_secs`: Upper bound for a single inference call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    pub base_url: String,
    pub account_id: String,
    pub api_token: String,
    pub model: String,
    pub task: Option<String>,
    pub language: Option<String>,
    pub vad_filter: Option<bool>,
    pub initial_prompt: Option<String>,
    pub prefix: Option<String>,
    pub request_timeout_secs: u64,
}

/// Segmentation and scheduling settings.
///
/// ## Fields:
/// - `chunk_size_bytes`: Segment size (1 MiB by default)
/// - `max_concurrent_requests`: Inference calls in flight per request.
///   `1` keeps the strictly sequential behavior.
/// - `fetch_timeout_secs`: Upper bound for downloading the source audio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub chunk_size_bytes: usize,
    pub max_concurrent_requests: usize,
    pub fetch_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            inference: InferenceConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                account_id: String::new(),
                api_token: String::new(),
                model: DEFAULT_MODEL.to_string(),
                task: None,
                language: None,
                vad_filter: None,
                initial_prompt: None,
                prefix: None,
                request_timeout_secs: 120,
            },
            pipeline: PipelineConfig {
                chunk_size_bytes: DEFAULT_CHUNK_SIZE,
                max_concurrent_requests: 1,
                fetch_timeout_secs: 120,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources in priority order.
    ///
    /// ## Configuration Loading Process:
    /// 1. Start with built-in defaults
    /// 2. Override with values from config.toml (if it exists)
    /// 3. Override with environment variables prefixed with APP_
    /// 4. Handle special cases for HOST and PORT environment variables
    ///
    /// ## Environment Variable Examples:
    /// - `APP_SERVER__PORT=3000`
    /// - `APP_INFERENCE__ACCOUNT_ID=abc123`
    /// - `APP_INFERENCE__LANGUAGE=en`
    /// - `APP_PIPELINE__MAX_CONCURRENT_REQUESTS=4`
    pub fn load() -> Result<Self> {
        let mut settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        if let Ok(host) = env::var("HOST") {
            settings = settings.set_override("server.host", host)?;
        }

        if let Ok(port) = env::var("PORT") {
            settings = settings.set_override("server.port", port)?;
        }

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate that the configuration values make sense.
    ///
    /// ## What this checks:
    /// - Server port is not 0
    /// - Segment size and concurrency are at least 1
    /// - A model identifier is set
    /// - Timeouts are not 0 (a zero timeout fails every call immediately)
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        if self.pipeline.chunk_size_bytes == 0 {
            return Err(anyhow::anyhow!("Chunk size must be greater than 0"));
        }

        if self.pipeline.max_concurrent_requests == 0 {
            return Err(anyhow::anyhow!("Max concurrent requests must be greater than 0"));
        }

        if self.inference.model.trim().is_empty() {
            return Err(anyhow::anyhow!("Inference model cannot be empty"));
        }

        if self.inference.request_timeout_secs == 0 || self.pipeline.fetch_timeout_secs == 0 {
            return Err(anyhow::anyhow!("Timeouts must be greater than 0"));
        }

        Ok(())
    }

    /// Copy of the configuration that is safe to show over HTTP or in logs.
    pub fn redacted(&self) -> AppConfig {
        let mut config = self.clone();
        if !config.inference.api_token.is_empty() {
            config.inference.api_token = "***".to_string();
        }
        config
    }

    /// Update configuration from a JSON string (used for runtime config updates).
    ///
    /// ## Updatable fields:
    /// - `inference.model`, `inference.task`, `inference.language`,
    ///   `inference.vad_filter`, `inference.initial_prompt`, `inference.prefix`
    ///   (`null` clears an optional hint)
    /// - `pipeline.max_concurrent_requests`
    ///
    /// Server address, credentials, timeouts and the chunk size are fixed at
    /// startup because the HTTP clients and listener are built from them.
    ///
    /// ## Partial updates:
    /// `{"inference": {"language": "de"}}` changes only the language hint.
    pub fn update_from_json(&mut self, json_str: &str) -> Result<()> {
        let partial_config: Value = serde_json::from_str(json_str)?;

        if let Some(inference) = partial_config.get("inference") {
            if let Some(model) = inference.get("model").and_then(|v| v.as_str()) {
                self.inference.model = model.to_string();
            }
            update_optional_string(&mut self.inference.task, inference.get("task"));
            update_optional_string(&mut self.inference.language, inference.get("language"));
            update_optional_string(
                &mut self.inference.initial_prompt,
                inference.get("initial_prompt"),
            );
            update_optional_string(&mut self.inference.prefix, inference.get("prefix"));
            match inference.get("vad_filter") {
                Some(Value::Bool(flag)) => self.inference.vad_filter = Some(*flag),
                Some(Value::Null) => self.inference.vad_filter = None,
                _ => {}
            }
        }

        if let Some(pipeline) = partial_config.get("pipeline") {
            if let Some(limit) = pipeline
                .get("max_concurrent_requests")
                .and_then(|v| v.as_u64())
            {
                self.pipeline.max_concurrent_requests = limit as usize;
            }
        }

        self.validate()?;
        Ok(())
    }
}

fn update_optional_string(target: &mut Option<String>, value: Option<&Value>) {
    match value {
        Some(Value::String(s)) => *target = Some(s.clone()),
        Some(Value::Null) => *target = None,
        _ => {}
    }
}

impl InferenceConfig {
    /// Model + recognition hints applied to every segment.
    pub fn settings(&self) -> InferenceSettings {
        InferenceSettings {
            model: self.model.clone(),
            options: RecognitionOptions {
                task: self.task.clone(),
                language: self.language.clone(),
                vad_filter: self.vad_filter,
                initial_prompt: self.initial_prompt.clone(),
                prefix: self.prefix.clone(),
            },
        }
    }

    pub fn has_credentials(&self) -> bool {
        !self.account_id.trim().is_empty() && !self.api_token.trim().is_empty()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl PipelineConfig {
    pub fn segmenter(&self) -> Result<Segmenter> {
        Ok(Segmenter::new(self.chunk_size_bytes)?)
    }

    pub fn dispatch(&self) -> Dispatch {
        Dispatch::from_limit(self.max_concurrent_requests)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.pipeline.chunk_size_bytes, 1_048_576);
        assert_eq!(config.pipeline.dispatch(), Dispatch::Sequential);
        assert_eq!(config.inference.model, "@cf/openai/whisper-large-v3-turbo");
        assert_eq!(config.inference.settings().options, RecognitionOptions::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.pipeline.chunk_size_bytes = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.inference.model = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_update() {
        let mut config = AppConfig::default();
        let json = r#"{"inference": {"language": "en", "vad_filter": true}, "pipeline": {"max_concurrent_requests": 4}}"#;
        assert!(config.update_from_json(json).is_ok());

        assert_eq!(config.inference.language.as_deref(), Some("en"));
        assert_eq!(config.inference.vad_filter, Some(true));
        assert_eq!(
            config.pipeline.dispatch(),
            Dispatch::Concurrent { max_in_flight: 4 }
        );
        // Untouched fields stay as they were
        assert_eq!(config.inference.model, DEFAULT_MODEL);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_config_update_null_clears_hint() {
        let mut config = AppConfig::default();
        config.inference.prefix = Some("Transcription:".to_string());

        config
            .update_from_json(r#"{"inference": {"prefix": null}}"#)
            .unwrap();
        assert_eq!(config.inference.prefix, None);
    }

    #[test]
    fn test_config_update_rejects_invalid() {
        let mut config = AppConfig::default();
        let result = config.update_from_json(r#"{"pipeline": {"max_concurrent_requests": 0}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_redacted_hides_token() {
        let mut config = AppConfig::default();
        config.inference.api_token = "secret".to_string();

        assert_eq!(config.redacted().inference.api_token, "***");
        assert_eq!(AppConfig::default().redacted().inference.api_token, "");
    }
}
