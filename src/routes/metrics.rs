use axum::http::StatusCode;
use prometheus::{Encoder, TextEncoder};

use crate::services::metrics;

/// GET /metrics in the Prometheus text format.
pub async fn metrics_handler() -> Result<String, StatusCode> {
    // Touch the lazies so the families are exported before the first signup.
    metrics::register();

    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| {
            tracing::error!(error = %e, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    String::from_utf8(buffer).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}
