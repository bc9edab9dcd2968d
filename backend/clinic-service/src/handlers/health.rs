use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    database: String,
}

/// Basic health check; reports degraded when storage is unreachable
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let db_status = match state.repo.ping().await {
        Ok(()) => "healthy",
        Err(e) => {
            tracing::warn!(error = %e, "Health check: storage unreachable");
            "unhealthy"
        }
    };

    HttpResponse::Ok().json(HealthResponse {
        status: if db_status == "healthy" { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status.to_string(),
    })
}
