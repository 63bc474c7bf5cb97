//! # Inference Contract
//!
//! Types shared by every speech recognizer the pipeline can talk to.
//!
//! ## Key Types:
//! - **SpeechRecognizer**: The capability the pipeline depends on (one call per segment)
//! - **InferenceRequest**: Base64 audio + model identifier + optional recognition hints
//! - **InferenceOutput**: The recognized text
//! - **InferenceError**: Every way a single call can fail
//!
//! The pipeline receives its recognizer as an explicit `Arc<dyn SpeechRecognizer>`,
//! so nothing here reaches for global or environment state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Whisper large v3 turbo on Cloudflare Workers AI.
pub const DEFAULT_MODEL: &str = "@cf/openai/whisper-large-v3-turbo";

/// Optional recognition parameters forwarded to the model.
///
/// Every field is omitted from the wire when unset, which is the baseline:
/// the model runs with its own defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionOptions {
    /// "transcribe" or "translate"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,

    /// Language hint (ISO 639-1 code like "en")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vad_filter: Option<bool>,

    /// Text that primes the decoder with context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_prompt: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

impl RecognitionOptions {
    /// Layer `overrides` on top of `self`; set fields in `overrides` win.
    pub fn merged_with(&self, overrides: &RecognitionOptions) -> RecognitionOptions {
        RecognitionOptions {
            task: overrides.task.clone().or_else(|| self.task.clone()),
            language: overrides.language.clone().or_else(|| self.language.clone()),
            vad_filter: overrides.vad_filter.or(self.vad_filter),
            initial_prompt: overrides
                .initial_prompt
                .clone()
                .or_else(|| self.initial_prompt.clone()),
            prefix: overrides.prefix.clone().or_else(|| self.prefix.clone()),
        }
    }
}

/// Model + options applied unchanged to every segment of one transcription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceSettings {
    pub model: String,
    pub options: RecognitionOptions,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            options: RecognitionOptions::default(),
        }
    }
}

impl InferenceSettings {
    /// Build the request for one segment's Base64 audio.
    pub fn request(&self, audio: String) -> InferenceRequest {
        InferenceRequest {
            model: self.model.clone(),
            audio,
            options: self.options.clone(),
        }
    }
}

/// A single inference call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceRequest {
    pub model: String,
    /// Standard Base64 (with padding) of the raw segment bytes
    pub audio: String,
    pub options: RecognitionOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InferenceOutput {
    pub text: String,
}

/// Failure of one inference call.
///
/// Only ever seen by the pipeline, which turns it into a placeholder line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    /// Could not reach the service or read its answer
    #[error("Inference request failed: {0}")]
    Transport(String),

    /// Service answered with a non-success HTTP status
    #[error("Inference service returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Service answered but reported the run as unsuccessful
    #[error("Inference rejected: {0}")]
    Rejected(String),

    /// Successful answer without a recognized-text field
    #[error("Inference response has no text")]
    MissingText,
}

impl From<reqwest::Error> for InferenceError {
    fn from(err: reqwest::Error) -> Self {
        InferenceError::Transport(err.to_string())
    }
}

/// Speech-to-text capability used once per segment.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn recognize(&self, request: InferenceRequest) -> Result<InferenceOutput, InferenceError>;

    /// Short backend name for logs and the health endpoint
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_serialize_to_nothing() {
        let json = serde_json::to_value(RecognitionOptions::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn test_merge_prefers_overrides() {
        let base = RecognitionOptions {
            language: Some("en".to_string()),
            prefix: Some("Transcription:".to_string()),
            ..Default::default()
        };
        let overrides = RecognitionOptions {
            language: Some("de".to_string()),
            ..Default::default()
        };

        let merged = base.merged_with(&overrides);
        assert_eq!(merged.language.as_deref(), Some("de"));
        assert_eq!(merged.prefix.as_deref(), Some("Transcription:"));
        assert_eq!(merged.task, None);
    }

    #[test]
    fn test_settings_build_request() {
        let settings = InferenceSettings::default();
        let request = settings.request("AAEC".to_string());

        assert_eq!(request.model, DEFAULT_MODEL);
        assert_eq!(request.audio, "AAEC");
        assert_eq!(request.options, RecognitionOptions::default());
    }
}
