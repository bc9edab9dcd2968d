use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

use crate::error::AppError;

lazy_static! {
    // ======================
    // Authorization
    // ======================
    pub static ref AUTH_DENIALS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "auth_denials_total",
        "Requests refused by the authorization policy",
        &["resource", "verb", "reason"]
    )
    .expect("auth_denials_total registers once");

    // ======================
    // Storage
    // ======================
    pub static ref STORAGE_ERRORS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "storage_errors_total",
        "Repository calls that failed",
        &["operation"]
    )
    .expect("storage_errors_total registers once");
}

pub fn record_denial(resource: &str, verb: &str, reason: &str) {
    AUTH_DENIALS_TOTAL
        .with_label_values(&[resource, verb, reason])
        .inc();
}

pub fn record_storage_error(operation: &str) {
    STORAGE_ERRORS_TOTAL.with_label_values(&[operation]).inc();
}

/// Render every registered metric in the Prometheus text format
pub fn gather_metrics() -> Result<String, AppError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| AppError::Internal(e.to_string()))
}

/// GET /metrics
pub async fn serve_metrics() -> Result<HttpResponse, AppError> {
    let body = gather_metrics()?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(body))
}
