//! # Transcription Pipeline
//!
//! Turns one audio payload into one transcript:
//! segment the bytes, send each segment to the recognizer, and join the
//! per-segment outcomes with newlines.
//!
//! ## Failure Policy:
//! A failed inference call never fails the transcription. The segment's line
//! becomes `[Error transcribing chunk]`, the error is logged, and the next
//! segment is processed as usual. A transcript where every line is the
//! placeholder is still a successful result.
//!
//! ## Key Rust Concepts:
//! - **Enums as results**: `SegmentOutcome` makes the "substitute a
//!   placeholder" branch explicit instead of hiding it in error suppression
//! - **Trait objects**: The recognizer is an `Arc<dyn SpeechRecognizer>`
//!   passed in by the caller, so tests use fakes

use crate::audio::{Segment, Segmenter};
use crate::transcription::dispatch::Dispatch;
use crate::transcription::inference::{InferenceError, InferenceSettings, SpeechRecognizer};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use std::sync::Arc;
use std::time::Instant;

/// Line used for a segment whose inference call failed.
pub const FAILED_SEGMENT_PLACEHOLDER: &str = "[Error transcribing chunk]";

/// What happened to one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentOutcome {
    /// Text recognized by the model, used verbatim
    Recognized(String),

    /// The call failed; rendered as the placeholder line
    Failed(InferenceError),
}

impl SegmentOutcome {
    /// Text that ends up on this segment's line of the transcript.
    pub fn display_text(&self) -> &str {
        match self {
            SegmentOutcome::Recognized(text) => text,
            SegmentOutcome::Failed(_) => FAILED_SEGMENT_PLACEHOLDER,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SegmentOutcome::Failed(_))
    }
}

/// Final, immutable transcript of one request.
///
/// ## Format:
/// Each segment's display text followed by `\n`, in segment order. Zero
/// segments give an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transcript {
    text: String,
    segment_count: usize,
    failed_segments: usize,
}

impl Transcript {
    /// Join outcomes into a transcript.
    pub fn assemble(outcomes: &[SegmentOutcome]) -> Self {
        let mut text = String::new();
        let mut failed_segments = 0;

        for outcome in outcomes {
            if outcome.is_failure() {
                failed_segments += 1;
            }
            text.push_str(outcome.display_text());
            text.push('\n');
        }

        Self {
            text,
            segment_count: outcomes.len(),
            failed_segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    pub fn failed_segments(&self) -> usize {
        self.failed_segments
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Segment-by-segment transcription of a complete payload.
///
/// ## Components:
/// - **recognizer**: The speech-to-text capability (called once per segment)
/// - **segmenter**: How the payload is cut (1 MiB by default)
/// - **dispatch**: How calls are scheduled (sequential by default)
/// - **settings**: Model and recognition options, identical for every segment
pub struct TranscriptionPipeline {
    recognizer: Arc<dyn SpeechRecognizer>,
    segmenter: Segmenter,
    dispatch: Dispatch,
    settings: InferenceSettings,
}

impl TranscriptionPipeline {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>, settings: InferenceSettings) -> Self {
        Self {
            recognizer,
            segmenter: Segmenter::default(),
            dispatch: Dispatch::default(),
            settings,
        }
    }

    pub fn with_segmenter(mut self, segmenter: Segmenter) -> Self {
        self.segmenter = segmenter;
        self
    }

    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Transcribe a complete payload.
    ///
    /// Never fails: per-segment errors are already folded into the transcript.
    pub async fn transcribe(&self, payload: &[u8]) -> Transcript {
        let start_time = Instant::now();
        let segments = self.segmenter.split(payload);

        tracing::info!(
            bytes = payload.len(),
            segments = segments.len(),
            chunk_size = self.segmenter.chunk_size(),
            max_in_flight = self.dispatch.max_in_flight(),
            recognizer = self.recognizer.name(),
            model = %self.settings.model,
            "Starting transcription"
        );

        let outcomes = self
            .dispatch
            .run(&segments, |segment| self.transcribe_segment(segment))
            .await;
        let transcript = Transcript::assemble(&outcomes);

        tracing::info!(
            segments = transcript.segment_count(),
            failed_segments = transcript.failed_segments(),
            chars = transcript.as_str().len(),
            duration_ms = start_time.elapsed().as_millis() as u64,
            "Transcription finished"
        );

        transcript
    }

    /// Send one segment to the recognizer.
    ///
    /// ## Process:
    /// 1. Base64-encode the raw segment bytes (standard alphabet, padded)
    /// 2. Call the recognizer with the configured model and options
    /// 3. Map success to `Recognized`, any error to `Failed`
    pub async fn transcribe_segment(&self, segment: Segment<'_>) -> SegmentOutcome {
        debug_assert!(!segment.is_empty(), "segmenter never yields empty segments");
        let audio = BASE64_STANDARD.encode(segment.bytes);
        let request = self.settings.request(audio);

        match self.recognizer.recognize(request).await {
            Ok(output) => {
                tracing::debug!(
                    segment = segment.index,
                    offset = segment.offset,
                    bytes = segment.len(),
                    chars = output.text.len(),
                    "Segment transcribed"
                );
                SegmentOutcome::Recognized(output.text)
            }
            Err(error) => {
                tracing::warn!(
                    segment = segment.index,
                    offset = segment.offset,
                    bytes = segment.len(),
                    error = %error,
                    "Segment transcription failed, using placeholder"
                );
                SegmentOutcome::Failed(error)
            }
        }
    }
}
