//! # Workers AI Recognizer
//!
//! `SpeechRecognizer` backed by the Cloudflare Workers AI REST API.
//!
//! ## Wire Format:
//! `POST {base_url}/accounts/{account_id}/ai/run/{model}` with a bearer token and
//! ```json
//! { "audio": "<base64>", "language": "en" }
//! ```
//! Answers come wrapped in the Cloudflare envelope:
//! ```json
//! { "success": true, "result": { "text": "..." }, "errors": [] }
//! ```

use crate::transcription::inference::{
    InferenceError, InferenceOutput, InferenceRequest, RecognitionOptions, SpeechRecognizer,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.cloudflare.com/client/v4";

#[derive(Serialize)]
struct RunBody<'a> {
    audio: &'a str,
    #[serde(flatten)]
    options: &'a RecognitionOptions,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default = "default_success")]
    success: bool,
    result: Option<RunResult>,
    #[serde(default)]
    errors: Vec<ApiMessage>,
}

fn default_success() -> bool {
    true
}

#[derive(Deserialize)]
struct RunResult {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiMessage {
    message: String,
}

fn join_errors(errors: &[ApiMessage]) -> String {
    if errors.is_empty() {
        return "unknown error".to_string();
    }
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Client for one Workers AI account.
pub struct WorkersAiRecognizer {
    client: reqwest::Client,
    base_url: String,
    account_id: String,
    api_token: String,
}

impl WorkersAiRecognizer {
    pub fn new(
        base_url: &str,
        account_id: &str,
        api_token: &str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            account_id: account_id.to_string(),
            api_token: api_token.trim().to_string(),
        })
    }

    fn run_url(&self, model: &str) -> String {
        format!(
            "{}/accounts/{}/ai/run/{}",
            self.base_url, self.account_id, model
        )
    }
}

#[async_trait]
impl SpeechRecognizer for WorkersAiRecognizer {
    async fn recognize(&self, request: InferenceRequest) -> Result<InferenceOutput, InferenceError> {
        let body = RunBody {
            audio: &request.audio,
            options: &request.options,
        };

        let response = self
            .client
            .post(self.run_url(&request.model))
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Envelope>(&raw)
                .map(|envelope| join_errors(&envelope.errors))
                .unwrap_or(raw);
            return Err(InferenceError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope = serde_json::from_str(&raw)
            .map_err(|e| InferenceError::Transport(format!("invalid response body: {}", e)))?;

        if !envelope.success {
            return Err(InferenceError::Rejected(join_errors(&envelope.errors)));
        }

        envelope
            .result
            .and_then(|result| result.text)
            .map(|text| InferenceOutput { text })
            .ok_or(InferenceError::MissingText)
    }

    fn name(&self) -> &str {
        "workers-ai"
    }
}
