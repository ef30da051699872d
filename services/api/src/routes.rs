use crate::infra::{ApiHealthService, AppState, InMemoryMetricSource};
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum::Json;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use talent_pulse::workflows::health::{health_router, AssessmentMetricSet, Period, Subject};

pub(crate) fn with_health_routes(service: Arc<ApiHealthService>) -> axum::Router {
    health_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/health/:org_id/metrics",
            axum::routing::post(ingest_metrics_endpoint),
        )
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

#[derive(Debug, Serialize)]
pub(crate) struct IngestReceipt {
    pub(crate) subject: Subject,
    pub(crate) period: Period,
    pub(crate) readings: usize,
}

/// Accepts one subject's metric set for a period into the in-memory source.
pub(crate) async fn ingest_metrics_endpoint(
    Extension(metrics): Extension<Arc<InMemoryMetricSource>>,
    Path(org_id): Path<String>,
    Json(set): Json<AssessmentMetricSet>,
) -> Response {
    if set.org_id.0 != org_id {
        let payload = json!({
            "error": format!("payload org '{}' does not match path org '{org_id}'", set.org_id.0),
        });
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
    }

    let receipt = IngestReceipt {
        subject: set.subject.clone(),
        period: set.period,
        readings: set.tfci.len() + set.nr1.len() + set.copc.len(),
    };
    metrics.insert(set);
    (StatusCode::ACCEPTED, Json(receipt)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::build_service;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    fn router_with_state() -> (axum::Router, Arc<InMemoryMetricSource>) {
        let handles = build_service();
        let router = with_health_routes(handles.service.clone())
            .layer(Extension(handles.metrics.clone()));
        (router, handles.metrics)
    }

    #[tokio::test]
    async fn ingest_endpoint_stores_the_metric_set() {
        let (router, metrics) = router_with_state();
        let body = serde_json::json!({
            "org_id": "org-acme",
            "subject": { "kind": "employee", "id": "emp-77" },
            "period": "2025-06",
            "copc": [ { "metric": "quality_score", "value": 88.0 } ],
        });

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/health/org-acme/metrics")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router dispatch");

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let bytes = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let payload: Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(payload["readings"], serde_json::json!(1));
        assert_eq!(
            metrics.subjects(&talent_pulse::workflows::health::OrgId("org-acme".into())).len(),
            1
        );
    }

    #[tokio::test]
    async fn ingest_endpoint_rejects_mismatched_org() {
        let (router, _) = router_with_state();
        let body = serde_json::json!({
            "org_id": "org-other",
            "subject": { "kind": "employee", "id": "emp-77" },
            "period": "2025-06",
        });

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/health/org-acme/metrics")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router dispatch");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
