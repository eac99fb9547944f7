use axum::response::{IntoResponse, Response};
use hyper::StatusCode;

use crate::metrics::REGISTRY;

pub async fn metrics_handler() -> Response {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(error) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        log::error!("Could not encode custom metrics: {error}");
    };
    let mut body = match String::from_utf8(buffer) {
        Ok(metrics) => metrics,
        Err(error) => {
            log::error!("Custom metrics are not valid utf8: {error}");
            String::default()
        }
    };

    let mut buffer = Vec::new();
    if let Err(error) = encoder.encode(&prometheus::gather(), &mut buffer) {
        log::error!("Could not encode prometheus metrics: {error}");
    };
    match String::from_utf8(buffer) {
        Ok(metrics) => body.push_str(&metrics),
        Err(error) => log::error!("Prometheus metrics are not valid utf8: {error}"),
    };

    (StatusCode::OK, body).into_response()
}
