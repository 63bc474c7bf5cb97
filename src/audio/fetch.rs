//! # Audio Fetching
//!
//! Downloads the complete audio resource referenced by a request.
//!
//! No retry, range requests or streaming: the whole body is read into
//! memory and handed to the segmenter. Any non-2xx status or transport
//! problem ends the request.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Ways an audio download can fail.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Server answered with a non-success status code
    #[error("Failed to fetch audio: {0}")]
    Status(u16),

    /// Connection, TLS, timeout or body read failure
    #[error("Failed to fetch audio: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Something that can turn a resource locator into raw audio bytes.
///
/// Handlers only see `Arc<dyn AudioSource>`; tests plug in an in-memory source.
#[async_trait]
pub trait AudioSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// `AudioSource` backed by a plain HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpAudioSource {
    client: reqwest::Client,
}

impl HttpAudioSource {
    /// Build a source whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl AudioSource for HttpAudioSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        tracing::debug!(url = %url, "Fetching audio");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        tracing::debug!(url = %url, bytes = body.len(), "Audio fetched");
        Ok(Vec::from(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{web, App, HttpResponse, HttpServer};

    async fn spawn_audio_server() -> String {
        let server = HttpServer::new(|| {
            App::new()
                .route(
                    "/clip.mp3",
                    web::get().to(|| async { HttpResponse::Ok().body(vec![7u8; 2048]) }),
                )
                .route("/gone.mp3", web::get().to(|| async { HttpResponse::NotFound().finish() }))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();

        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());
        format!("http://{}", addr)
    }

    #[actix_web::test]
    async fn test_fetch_returns_full_body() {
        let base = spawn_audio_server().await;
        let source = HttpAudioSource::new(Duration::from_secs(5)).unwrap();

        let bytes = source.fetch(&format!("{}/clip.mp3", base)).await.unwrap();
        assert_eq!(bytes, vec![7u8; 2048]);
    }

    #[actix_web::test]
    async fn test_fetch_non_success_status() {
        let base = spawn_audio_server().await;
        let source = HttpAudioSource::new(Duration::from_secs(5)).unwrap();

        let err = source.fetch(&format!("{}/gone.mp3", base)).await.unwrap_err();
        assert!(matches!(err, FetchError::Status(404)));
        assert_eq!(err.to_string(), "Failed to fetch audio: 404");
    }

    #[actix_web::test]
    async fn test_fetch_transport_error() {
        let source = HttpAudioSource::new(Duration::from_secs(5)).unwrap();

        let err = source.fetch("http://127.0.0.1:1/clip.mp3").await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }
}
