use crate::{error::AppError, state::AppState};
use actix_web::{web, HttpResponse};
use serde_json::json;

/// `GET /api/v1/config` with the API token redacted.
pub async fn get_config(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let config = state.get_config().redacted();

    Ok(HttpResponse::Ok().json(json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "config": config
    })))
}

/// `PUT /api/v1/config`: partial update of the runtime-adjustable settings.
pub async fn update_config(
    state: web::Data<AppState>,
    body: web::Json<serde_json::Value>,
) -> Result<HttpResponse, AppError> {
    let json_str = serde_json::to_string(&body.into_inner())?;

    let mut current_config = state.get_config();
    current_config
        .update_from_json(&json_str)
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    state
        .update_config(current_config.clone())
        .map_err(AppError::ValidationError)?;

    tracing::info!(
        model = %current_config.inference.model,
        max_concurrent_requests = current_config.pipeline.max_concurrent_requests,
        "Configuration updated"
    );

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Configuration updated successfully",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "updated_config": current_config.redacted()
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::state::test_support::{ScriptedRecognizer, StaticAudioSource};
    use actix_web::{http::StatusCode, test, App};
    use std::sync::Arc;

    fn state() -> AppState {
        let mut config = AppConfig::default();
        config.inference.api_token = "secret".to_string();
        AppState::new(
            config,
            Arc::new(ScriptedRecognizer::default()),
            Arc::new(StaticAudioSource::default()),
        )
    }

    #[actix_web::test]
    async fn test_get_config_redacts_token() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state()))
                .route("/config", web::get().to(get_config)),
        )
        .await;

        let body: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/config").to_request(),
        )
        .await;

        assert_eq!(body["config"]["inference"]["api_token"], "***");
        assert_eq!(body["config"]["pipeline"]["chunk_size_bytes"], 1_048_576);
    }

    #[actix_web::test]
    async fn test_update_config() {
        let state = state();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .route("/config", web::put().to(update_config)),
        )
        .await;

        let req = test::TestRequest::put()
            .uri("/config")
            .set_json(json!({ "inference": { "language": "fr" } }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(state.get_config().inference.language.as_deref(), Some("fr"));

        let req = test::TestRequest::put()
            .uri("/config")
            .set_json(json!({ "pipeline": { "max_concurrent_requests": 0 } }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.get_config().pipeline.max_concurrent_requests, 1);
    }
}
