use actix_web::{web, HttpResponse, Responder};

use crate::error::MatchingError;
use crate::models::{ErrorResponse, HealthResponse, TriggerRequest};
use crate::services::MatchingService;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub service: MatchingService,
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/matches/create", web::post().to(create_matches))
        .route("/matches/process-timeouts", web::post().to(process_timeouts))
        .route("/matches/process-rejections", web::post().to(process_rejections));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let healthy = match state.service.store().health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            tracing::warn!("Store health check failed: {}", e);
            false
        }
    };

    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

fn failure(action: &str, err: &MatchingError) -> HttpResponse {
    tracing::error!("{} failed: {}", action, err);

    let error = match err {
        MatchingError::Config(_) => "Configuration error",
        MatchingError::Decode { .. } => "Invalid listing data",
        MatchingError::Store(_) => "Store error",
        MatchingError::Solver(_) => "Solver error",
    };

    HttpResponse::InternalServerError().json(ErrorResponse {
        error: error.to_string(),
        message: err.to_string(),
        status_code: 500,
    })
}

/// Run one batch-matching invocation
///
/// POST /api/v1/matches/create
///
/// The body is an optional push envelope; only its arrival matters:
/// ```json
/// { "message": { "messageId": "string", "data": "base64" }, "subscription": "string" }
/// ```
async fn create_matches(
    state: web::Data<AppState>,
    body: Option<web::Json<TriggerRequest>>,
) -> impl Responder {
    let trigger = body.map(web::Json::into_inner).unwrap_or_default();
    tracing::info!(
        "Matching triggered (message_id={:?}, subscription={:?})",
        trigger.message_id(),
        trigger.subscription
    );

    match state.service.create_matches().await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => failure("Matching run", &e),
    }
}

/// Time out matches that received no answer in time
///
/// POST /api/v1/matches/process-timeouts
async fn process_timeouts(state: web::Data<AppState>) -> impl Responder {
    match state.service.process_timeouts().await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => failure("Timeout sweep", &e),
    }
}

/// Close matches rejected by either party
///
/// POST /api/v1/matches/process-rejections
async fn process_rejections(state: web::Data<AppState>) -> impl Responder {
    match state.service.process_rejections().await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => failure("Rejection sweep", &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchingSettings;
    use crate::core::Matcher;
    use crate::models::{MatchingReport, ScoringWeights};
    use crate::services::InMemoryStore;
    use actix_web::{test, App};
    use std::sync::Arc;

    fn app_state(hosts_batch_size: usize) -> AppState {
        let settings = MatchingSettings {
            hosts_batch_size,
            guests_batch_size: 10,
            match_timeout_hours: 24,
            activity_boost: true,
        };
        let matcher = Matcher::from_settings(ScoringWeights::default(), &settings);
        AppState {
            service: MatchingService::new(Arc::new(InMemoryStore::new()), matcher, settings),
        }
    }

    #[actix_web::test]
    async fn test_health_check() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state(10)))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp: HealthResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.status, "healthy");
    }

    #[actix_web::test]
    async fn test_create_matches_on_empty_store() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state(10)))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/matches/create")
            .set_json(serde_json::json!({"message": {"messageId": "1"}}))
            .to_request();
        let report: MatchingReport = test::call_and_read_body_json(&app, req).await;
        assert_eq!(report.matches_created, 0);
        assert!(!report.run_id.is_empty());
    }

    #[actix_web::test]
    async fn test_invalid_settings_fail_invocation() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state(0)))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post().uri("/matches/create").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
