use actix_web::{web, HttpRequest, HttpResponse};
use prometheus::{Encoder, TextEncoder};

use crate::state::AppState;

/// GET /health
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}

/// GET /ready - 503 while the store does not answer.
pub async fn ready(state: web::Data<AppState>) -> HttpResponse {
    match state.store.health_check().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "blog-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unhealthy",
                "service": "blog-service"
            }))
        }
    }
}

/// GET /metrics - every registered collector in the Prometheus text format.
pub async fn metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let mut body = Vec::new();
    match encoder.encode(&prometheus::gather(), &mut body) {
        Ok(()) => HttpResponse::Ok()
            .content_type(encoder.format_type())
            .body(body),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Fallback for unmatched paths.
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "error": "Page not found",
        "status": 404,
        "path": req.path(),
    }))
}
