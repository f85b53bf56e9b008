//! HTTP surface of the exporter: one route that runs a scrape and renders
//! the samples in the Prometheus text format.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};

use crate::exporter::Exporter;
use crate::metrics::render::render_prometheus;

pub struct ExporterState {
    pub exporter: Exporter,
}

pub fn exporter_router(state: Arc<ExporterState>, telemetry_path: &str) -> Router {
    Router::new()
        .route(telemetry_path, get(metrics_handler))
        .with_state(state)
}

/// A failed scrape still answers 200: the availability gauge in the body is
/// the sole failure signal.
pub async fn metrics_handler(State(state): State<Arc<ExporterState>>) -> impl IntoResponse {
    let descriptors = state.exporter.descriptors();
    let mut samples = vec![
        descriptors
            .build_info
            .sample(&[env!("CARGO_PKG_VERSION")], 1.0),
    ];
    samples.extend(state.exporter.collect().await);
    let payload = render_prometheus(&samples);

    let mut response = Response::new(Body::from(payload));
    *response.status_mut() = StatusCode::OK;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
    );
    response
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::{ExporterState, exporter_router};
    use crate::exporter::Exporter;

    #[tokio::test]
    async fn metrics_route_reports_up_zero_when_agent_is_unreachable() {
        let state = Arc::new(ExporterState {
            exporter: Exporter::new("/nonexistent/openvpnas-exporter.sock"),
        });
        let router = exporter_router(state, "/metrics");

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/plain; version=0.0.4; charset=utf-8"
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body = std::str::from_utf8(&body).unwrap();
        assert!(body.contains("openvpnas_up 0\n"));
        assert!(body.contains("openvpnas_exporter_build_info{version=\""));
        assert!(!body.contains("openvpnas_server_version_info"));
    }
}
