use crate::infra::{AppState, Platform};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use internhub::http::with_token_verifier;
use internhub::workflows::internships::internship_router;
use internhub::workflows::notifications::notification_router;
use serde_json::json;
use std::sync::Arc;

/// Workflow routes behind bearer auth, plus the unauthenticated operational endpoints.
pub(crate) fn with_platform_routes(platform: &Platform) -> Router {
    let workflows = internship_router(platform.service.clone())
        .merge(notification_router(platform.notifications.clone()));

    with_token_verifier(workflows, Arc::new(platform.tokens.clone()))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
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
    use crate::infra::seed_demo;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn state(ready: bool) -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        }
    }

    fn get_request(uri: &str, token: Option<&str>) -> axum::http::Request<axum::body::Body> {
        let mut builder = axum::http::Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder
            .body(axum::body::Body::empty())
            .expect("request builds")
    }

    #[tokio::test]
    async fn readiness_reflects_the_flag() {
        let state = state(false);
        let app = with_platform_routes(&Platform::in_memory(50)).layer(Extension(state.clone()));

        let response = app
            .clone()
            .oneshot(get_request("/ready", None))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.readiness.store(true, Ordering::Release);
        let response = app
            .oneshot(get_request("/ready", None))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_and_metrics_need_no_token() {
        let app = with_platform_routes(&Platform::in_memory(50)).layer(Extension(state(true)));

        let health = app
            .clone()
            .oneshot(get_request("/health", None))
            .await
            .expect("route executes");
        assert_eq!(health.status(), StatusCode::OK);

        let metrics = app
            .oneshot(get_request("/metrics", None))
            .await
            .expect("route executes");
        assert_eq!(metrics.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn seeded_tokens_reach_the_workflow_routes() {
        let platform = Platform::in_memory(50);
        seed_demo(&platform).expect("seed succeeds");
        let app = with_platform_routes(&platform).layer(Extension(state(true)));

        let anonymous = app
            .clone()
            .oneshot(get_request("/notifications", None))
            .await
            .expect("route executes");
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

        let student = app
            .oneshot(get_request("/notifications", Some("demo-student-token")))
            .await
            .expect("route executes");
        assert_eq!(student.status(), StatusCode::OK);
    }
}
