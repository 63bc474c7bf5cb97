//! Transcription endpoint.
//!
//! `GET /?url=<audio-url>` (also `GET /api/v1/transcribe?url=...`)
//!
//! ## Responses:
//! - **200** `text/plain`: One line per 1 MiB segment. A segment the model
//!   failed on reads `[Error transcribing chunk]`; the status stays 200
//!   even if every segment failed.
//! - **400**: `url` missing or empty. Nothing is fetched or transcribed.
//! - **500**: The audio could not be downloaded.
//!
//! ## Optional query parameters:
//! `language`, `initial_prompt` and `prefix` override the configured
//! recognition hints for this request (all segments get the same values).

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::transcription::{RecognitionOptions, TranscriptionPipeline};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::Instrument;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct TranscribeQuery {
    pub url: Option<String>,
    pub language: Option<String>,
    pub initial_prompt: Option<String>,
    pub prefix: Option<String>,
}

impl TranscribeQuery {
    /// The audio URL, treating an empty value the same as a missing one.
    fn audio_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    fn option_overrides(&self) -> RecognitionOptions {
        RecognitionOptions {
            language: self.language.clone(),
            initial_prompt: self.initial_prompt.clone(),
            prefix: self.prefix.clone(),
            ..Default::default()
        }
    }
}

pub async fn transcribe(
    state: web::Data<AppState>,
    query: web::Query<TranscribeQuery>,
) -> AppResult<HttpResponse> {
    let url = query
        .audio_url()
        .ok_or_else(|| AppError::BadRequest("Missing 'url' query parameter".to_string()))?
        .to_string();

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("transcription", %request_id, url = %url);

    async move {
        let _active = state.begin_transcription();
        let config = state.get_config();

        let payload = state.audio_source.fetch(&url).await.map_err(|e| {
            tracing::error!(error = %e, "Audio fetch failed");
            AppError::from(e)
        })?;

        let mut settings = config.inference.settings();
        settings.options = settings.options.merged_with(&query.option_overrides());

        let pipeline = TranscriptionPipeline::new(state.recognizer.clone(), settings)
            .with_segmenter(config.pipeline.segmenter()?)
            .with_dispatch(config.pipeline.dispatch());

        let transcript = pipeline.transcribe(&payload).await;
        state.record_transcription(transcript.segment_count(), transcript.failed_segments());

        if transcript.is_empty() {
            tracing::info!("Audio payload was empty, nothing to transcribe");
        } else if transcript.segment_count() > 0 && transcript.failed_segments() == transcript.segment_count() {
            tracing::warn!(segments = transcript.segment_count(), "Every segment failed");
        }

        Ok::<_, AppError>(
            HttpResponse::Ok()
                .content_type("text/plain")
                .body(transcript.into_text()),
        )
    }
    .instrument(span)
    .await
}
