//! # Application State Management
//!
//! This module manages state shared by all HTTP request handlers:
//! the runtime configuration, the collaborators used to fetch and transcribe
//! audio, and request/transcription metrics.
//!
//! ## Key Rust Concepts:
//!
//! ### Arc (Atomically Reference Counted)
//! - Lets every worker thread hold the same configuration, metrics and clients
//! - The data is freed when the last reference is dropped
//!
//! ### RwLock (Reader-Writer Lock)
//! - Many requests can read the configuration at once, a config update
//!   waits for exclusive access
//!
//! ### Trait Objects (`Arc<dyn Trait>`)
//! - `recognizer` and `audio_source` are injected at startup; handlers never
//!   know whether they talk to Workers AI or a test double
//!
//! ## What is NOT shared:
//! Audio payloads, segments and transcripts belong to a single request and
//! never touch this state. Only the counters below are updated across requests.

use crate::audio::AudioSource;
use crate::config::AppConfig;
use crate::transcription::SpeechRecognizer;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

/// The main application state that's shared across all HTTP request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration (parts of it can be updated at runtime)
    pub config: Arc<RwLock<AppConfig>>,

    /// Performance metrics, updated by middleware and the transcribe handler
    pub metrics: Arc<RwLock<AppMetrics>>,

    /// Speech-to-text capability used by every transcription
    pub recognizer: Arc<dyn SpeechRecognizer>,

    /// Downloads the audio referenced by a request
    pub audio_source: Arc<dyn AudioSource>,

    /// When the server started (never changes)
    pub start_time: Instant,
}

/// Metrics collected across all HTTP requests.
///
/// ## Why these metrics matter:
/// - **request_count / error_count**: Load and reliability of the HTTP surface
/// - **active_transcriptions**: Requests currently fetching or transcribing
/// - **segments_failed**: How often the inference API fails for a segment.
///   These never show up as HTTP errors, so this is the only place they are visible.
#[derive(Debug, Default, Clone)]
pub struct AppMetrics {
    pub request_count: u64,
    pub error_count: u64,
    pub active_transcriptions: u32,
    pub transcriptions_completed: u64,
    pub segments_processed: u64,
    pub segments_failed: u64,
    /// Key: endpoint name (e.g., "GET /health")
    pub endpoint_metrics: HashMap<String, EndpointMetric>,
}

/// Detailed performance metrics for a specific API endpoint.
#[derive(Debug, Default, Clone)]
pub struct EndpointMetric {
    pub request_count: u64,
    /// Total time spent processing all requests to this endpoint (milliseconds)
    pub total_duration_ms: u64,
    pub error_count: u64,
}

impl AppState {
    /// Create a new AppState with the given configuration and collaborators.
    pub fn new(
        config: AppConfig,
        recognizer: Arc<dyn SpeechRecognizer>,
        audio_source: Arc<dyn AudioSource>,
    ) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            metrics: Arc::new(RwLock::new(AppMetrics::default())),
            recognizer,
            audio_source,
            start_time: Instant::now(),
        }
    }

    /// Get a copy of the current configuration.
    ///
    /// Cloning releases the lock immediately, so other threads aren't blocked.
    pub fn get_config(&self) -> AppConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the configuration after validating it.
    pub fn update_config(&self, new_config: AppConfig) -> Result<(), String> {
        match new_config.validate() {
            Ok(_) => {
                *self.config.write().unwrap_or_else(PoisonError::into_inner) = new_config;
                Ok(())
            }
            Err(e) => Err(e.to_string()),
        }
    }

    fn with_metrics<R>(&self, f: impl FnOnce(&mut AppMetrics) -> R) -> R {
        let mut metrics = self.metrics.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut metrics)
    }

    /// Increment the total request counter (called by middleware for every request).
    pub fn increment_request_count(&self) {
        self.with_metrics(|m| m.request_count += 1);
    }

    /// Increment the total error counter (any 4xx/5xx response).
    pub fn increment_error_count(&self) {
        self.with_metrics(|m| m.error_count += 1);
    }

    /// Record detailed metrics for a specific endpoint.
    ///
    /// The first time we see an endpoint, a zeroed EndpointMetric is created.
    pub fn record_endpoint_request(&self, endpoint: &str, duration_ms: u64, is_error: bool) {
        self.with_metrics(|m| {
            let endpoint_metric = m.endpoint_metrics.entry(endpoint.to_string()).or_default();
            endpoint_metric.request_count += 1;
            endpoint_metric.total_duration_ms += duration_ms;
            if is_error {
                endpoint_metric.error_count += 1;
            }
        });
    }

    /// Mark a transcription as started.
    ///
    /// The returned guard decrements the active counter when dropped.
    pub fn begin_transcription(&self) -> ActiveTranscription {
        self.with_metrics(|m| m.active_transcriptions += 1);
        ActiveTranscription {
            metrics: Arc::clone(&self.metrics),
        }
    }

    /// Record a finished transcription and its segment counts.
    pub fn record_transcription(&self, segments: usize, failed_segments: usize) {
        self.with_metrics(|m| {
            m.transcriptions_completed += 1;
            m.segments_processed += segments as u64;
            m.segments_failed += failed_segments as u64;
        });
    }

    /// Get a snapshot of current metrics (used for the /metrics endpoint).
    pub fn get_metrics_snapshot(&self) -> AppMetrics {
        self.metrics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Get server uptime in seconds.
    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// Keeps `active_transcriptions` accurate for the lifetime of one request.
pub struct ActiveTranscription {
    metrics: Arc<RwLock<AppMetrics>>,
}

impl Drop for ActiveTranscription {
    fn drop(&mut self) {
        let mut metrics = self.metrics.write().unwrap_or_else(PoisonError::into_inner);
        // Underflow protection
        if metrics.active_transcriptions > 0 {
            metrics.active_transcriptions -= 1;
        }
    }
}

impl AppMetrics {
    pub fn error_rate(&self) -> f64 {
        if self.request_count > 0 {
            self.error_count as f64 / self.request_count as f64
        } else {
            0.0
        }
    }

    /// Share of segments replaced by the placeholder (0.0 to 1.0).
    pub fn segment_failure_rate(&self) -> f64 {
        if self.segments_processed > 0 {
            self.segments_failed as f64 / self.segments_processed as f64
        } else {
            0.0
        }
    }
}

impl EndpointMetric {
    /// Average = Total Duration ÷ Number of Requests
    pub fn average_duration_ms(&self) -> f64 {
        if self.request_count > 0 {
            self.total_duration_ms as f64 / self.request_count as f64
        } else {
            0.0
        }
    }

    /// Error Rate = Number of Errors ÷ Total Requests
    pub fn error_rate(&self) -> f64 {
        if self.request_count > 0 {
            self.error_count as f64 / self.request_count as f64
        } else {
            0.0
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! In-memory collaborators shared by handler tests.

    use crate::audio::{AudioSource, FetchError};
    use crate::transcription::inference::{
        InferenceError, InferenceOutput, InferenceRequest, SpeechRecognizer,
    };
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Serves fixed payloads by URL; anything else is a 404.
    #[derive(Default)]
    pub struct StaticAudioSource {
        pub files: HashMap<String, Vec<u8>>,
        pub fetches: AtomicUsize,
    }

    impl StaticAudioSource {
        pub fn with_file(url: &str, bytes: Vec<u8>) -> Self {
            let mut files = HashMap::new();
            files.insert(url.to_string(), bytes);
            Self {
                files,
                fetches: AtomicUsize::new(0),
            }
        }

        pub fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AudioSource for StaticAudioSource {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.files.get(url).cloned().ok_or(FetchError::Status(404))
        }
    }

    /// Answers `seg<n>` for the n-th call, failing the calls listed in `fail_calls`.
    #[derive(Default)]
    pub struct ScriptedRecognizer {
        pub fail_calls: Vec<usize>,
        pub requests: Mutex<Vec<InferenceRequest>>,
    }

    impl ScriptedRecognizer {
        pub fn failing(fail_calls: &[usize]) -> Self {
            Self {
                fail_calls: fail_calls.to_vec(),
                ..Default::default()
            }
        }

        pub fn call_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl SpeechRecognizer for ScriptedRecognizer {
        async fn recognize(&self, request: InferenceRequest) -> Result<InferenceOutput, InferenceError> {
            let call = {
                let mut requests = self.requests.lock().unwrap();
                requests.push(request);
                requests.len() - 1
            };
            if self.fail_calls.contains(&call) {
                return Err(InferenceError::Transport("connection reset".to_string()));
            }
            Ok(InferenceOutput {
                text: format!("seg{}", call),
            })
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }
}
