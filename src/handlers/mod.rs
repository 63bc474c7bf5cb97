pub mod config;
pub mod transcribe;

pub use self::config::*;
pub use self::transcribe::*;

use crate::health;
use actix_web::web;

/// Register every route of the service.
///
/// ## Routes:
/// - `GET /?url=...` and `GET /api/v1/transcribe?url=...`: transcription
/// - `GET /health`, `GET /api/v1/health`: liveness and summary stats
/// - `GET /api/v1/metrics`: per-endpoint and transcription metrics
/// - `GET|PUT /api/v1/config`: inspect and adjust runtime settings
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/transcribe", web::get().to(transcribe))
            .route("/health", web::get().to(health::health_check))
            .route("/metrics", web::get().to(health::detailed_metrics))
            .route("/config", web::get().to(get_config))
            .route("/config", web::put().to(update_config)),
    )
    .route("/health", web::get().to(health::health_check))
    .route("/", web::get().to(transcribe));
}
