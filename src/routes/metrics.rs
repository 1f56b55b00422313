use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
};
use prometheus::{Encoder, TextEncoder};

/// GET /metrics: Prometheus scrape endpoint, expected to stay behind the reverse proxy.
pub async fn metrics_handler() -> Result<impl IntoResponse, StatusCode> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| {
            tracing::error!("Metrics encoding failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    let body = String::from_utf8(buffer).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(([(header::CONTENT_TYPE, encoder.format_type().to_string())], body))
}
