use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use loan_desk::workflows::lending::{lending_router, LendingService, NegotiationAdvisor};
use serde_json::json;
use std::sync::Arc;

/// Lending endpoints plus the operational probes.
pub(crate) fn with_lending_routes<A>(service: Arc<LendingService<A>>) -> axum::Router
where
    A: NegotiationAdvisor + 'static,
{
    lending_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use loan_desk::workflows::lending::DisabledAdvisor;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn app(readiness: Arc<AtomicBool>) -> axum::Router {
        let state = AppState {
            readiness,
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        with_lending_routes(Arc::new(LendingService::new(Arc::new(DisabledAdvisor))))
            .layer(Extension(state))
    }

    async fn get(router: axum::Router, uri: &str) -> StatusCode {
        let request = Request::get(uri).body(Body::empty()).expect("request builds");
        router
            .oneshot(request)
            .await
            .expect("router responds")
            .status()
    }

    #[tokio::test]
    async fn readiness_tracks_the_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        assert_eq!(
            get(app(flag.clone()), "/ready").await,
            StatusCode::SERVICE_UNAVAILABLE
        );

        flag.store(true, Ordering::Release);
        assert_eq!(get(app(flag), "/ready").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn probes_and_lending_docs_share_one_router() {
        let flag = Arc::new(AtomicBool::new(true));
        assert_eq!(get(app(flag.clone()), "/health").await, StatusCode::OK);
        assert_eq!(get(app(flag.clone()), "/metrics").await, StatusCode::OK);
        assert_eq!(get(app(flag), "/api/v1/loans").await, StatusCode::OK);
    }
}
