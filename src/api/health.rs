use actix_web::{web, HttpResponse};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use super::AppState;

/// 健康检查响应 / Health response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "OK")]
    pub status: String,
    #[schema(example = "memory")]
    pub storage: String,
    pub timestamp: String,
}

/// 健康检查：探测存储是否可达 / Health check probing storage reachability
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Storage reachable", body = HealthResponse),
        (status = 503, description = "Storage unreachable", body = HealthResponse),
    ),
    tag = "health"
)]
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let healthy = match state.health.check_health().await {
        Ok(()) => true,
        Err(e) => {
            error!(error = %e, backend = state.backend, "storage health check failed");
            false
        }
    };

    let body = HealthResponse {
        status: if healthy { "OK" } else { "Error" }.to_string(),
        storage: state.backend.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };
    if healthy {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}
