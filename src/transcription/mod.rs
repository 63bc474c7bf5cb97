//! # Transcription Module
//!
//! Turns downloaded audio bytes into a transcript by calling a remote
//! speech-to-text model once per segment.
//!
//! ## Key Components:
//! - **Inference contract**: `SpeechRecognizer` trait, request/response and error types
//! - **Workers AI client**: The production recognizer (Cloudflare Workers AI REST API)
//! - **Dispatch**: Sequential (default) or bounded-concurrent scheduling of calls
//! - **Pipeline**: Segmenting, per-segment calls, placeholder substitution, assembly
//!
//! ## Default Model:
//! `@cf/openai/whisper-large-v3-turbo`, called with the same model and
//! options for every segment of a request.

pub mod inference;    // Recognizer trait and shared types
pub mod workers_ai;   // Cloudflare Workers AI recognizer
pub mod dispatch;     // Call scheduling strategies
pub mod pipeline;     // Segment -> recognize -> assemble

pub use dispatch::Dispatch;
pub use inference::{RecognitionOptions, SpeechRecognizer};
pub use pipeline::TranscriptionPipeline;
pub use workers_ai::WorkersAiRecognizer;
