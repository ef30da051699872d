use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::workflows::health::plans::PlanState;
use crate::workflows::health::router::health_router;

fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json payload")
}

#[tokio::test]
async fn get_settings_returns_defaults() {
    let harness = build_service();
    let router = health_router(harness.service.clone());

    let response = router
        .oneshot(request("GET", "/api/v1/health/org-acme/settings", None))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = json_body(response).await;
    assert_eq!(payload["weights"]["tfci"], json!(30.0));
    assert_eq!(payload["thresholds"]["php_score_warning"], json!(80.0));
    assert_eq!(payload["action_plan_overdue_days"], json!(30));
}

#[tokio::test]
async fn put_settings_rejects_invalid_weights_with_field_errors() {
    let harness = build_service();
    let router = health_router(harness.service.clone());

    let response = router
        .oneshot(request(
            "PUT",
            "/api/v1/health/org-acme/settings",
            Some(json!({ "weights": { "tfci": 50.0 } })),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = json_body(response).await;
    assert!(payload["error"].as_str().unwrap_or_default().contains("sum"));
    assert!(payload["fields"]
        .as_array()
        .map(|fields| !fields.is_empty())
        .unwrap_or(false));
}

#[tokio::test]
async fn put_settings_persists_valid_overrides() {
    let harness = build_service();
    let router = health_router(harness.service.clone());

    let response = router
        .clone()
        .oneshot(request(
            "PUT",
            "/api/v1/health/org-acme/settings",
            Some(json!({ "thresholds": { "php_score_critical": 50.0 } })),
        ))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(request("GET", "/api/v1/health/org-acme/settings", None))
        .await
        .expect("router dispatch");
    let payload = json_body(response).await;
    assert_eq!(payload["thresholds"]["php_score_critical"], json!(50.0));
}

#[tokio::test]
async fn evaluate_endpoint_returns_score_and_opened_plans() {
    let harness = build_service();
    harness.metrics.insert(burnout_metric_set(period("2025-06")));
    let router = health_router(harness.service.clone());

    let response = router
        .oneshot(request(
            "POST",
            "/api/v1/health/org-acme/evaluate",
            Some(json!({
                "subject": { "kind": "employee", "id": "emp-001" },
                "period": "2025-06",
                "today": "2025-06-15",
            })),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = json_body(response).await;
    assert_eq!(payload["status"], json!("scored"));
    assert_eq!(payload["result"]["tier"], json!("critical"));
    assert!(payload["result"]["composite"].as_f64().is_some());
    assert!(payload["plans"]["opened"]
        .as_array()
        .map(|plans| !plans.is_empty())
        .unwrap_or(false));
}

#[tokio::test]
async fn evaluate_endpoint_reports_not_yet_computable() {
    let harness = build_service();
    let router = health_router(harness.service.clone());

    let response = router
        .oneshot(request(
            "POST",
            "/api/v1/health/org-acme/evaluate",
            Some(json!({
                "subject": { "kind": "employee", "id": "emp-unknown" },
                "period": "2025-06",
            })),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = json_body(response).await;
    assert_eq!(payload["status"], json!("not_yet_computable"));
}

#[tokio::test]
async fn evaluate_endpoint_rejects_corrupt_readings() {
    let harness = build_service();
    let mut set = burnout_metric_set(period("2025-06"));
    set.copc.push(crate::workflows::health::domain::CopcReading {
        metric: crate::workflows::health::domain::CopcMetric::QualityScore,
        value: 150.0,
    });
    harness.metrics.insert(set);
    let router = health_router(harness.service.clone());

    let response = router
        .oneshot(request(
            "POST",
            "/api/v1/health/org-acme/evaluate",
            Some(json!({
                "subject": { "kind": "employee", "id": "emp-001" },
                "period": "2025-06",
            })),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .unwrap_or_default()
        .contains("quality_score"));
}

#[tokio::test]
async fn plan_listing_and_events_round_trip() {
    let harness = build_service();
    harness.metrics.insert(burnout_metric_set(period("2025-06")));
    let router = health_router(harness.service.clone());

    let response = router
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/health/org-acme/evaluate",
            Some(json!({
                "subject": { "kind": "employee", "id": "emp-001" },
                "period": "2025-06",
                "today": "2025-06-15",
            })),
        ))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .clone()
        .oneshot(request(
            "GET",
            "/api/v1/health/org-acme/plans?subject_id=emp-001&subject_kind=employee",
            None,
        ))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::OK);
    let plans = json_body(response).await;
    let plan_id = plans[0]["id"].as_str().expect("plan id").to_string();

    let response = router
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/v1/health/org-acme/plans/{plan_id}/events"),
            Some(json!({ "event": "review" })),
        ))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = json_body(response).await;
    assert_eq!(payload["state"], json!(PlanState::InProgress.label()));

    // Resolving twice is an invalid transition.
    let response = router
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/v1/health/org-acme/plans/{plan_id}/events"),
            Some(json!({ "event": "resolve" })),
        ))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(request(
            "POST",
            &format!("/api/v1/health/org-acme/plans/{plan_id}/events"),
            Some(json!({ "event": "resolve" })),
        ))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn plan_event_on_unknown_plan_is_not_found() {
    let harness = build_service();
    let router = health_router(harness.service.clone());

    let response = router
        .oneshot(request(
            "POST",
            "/api/v1/health/org-acme/plans/plan-missing/events",
            Some(json!({ "event": "review" })),
        ))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
