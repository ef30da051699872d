use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use super::domain::{OrgId, Period, Subject, SubjectId, SubjectKind};
use super::plans::{NotificationDispatcher, PlanEvent, PlanId, PlanStore, RecommendationProvider};
use super::service::{
    EvaluationOutcome, HealthScoreService, HealthServiceError, MetricSource,
};
use super::settings::{SettingsOverrides, SettingsStore};

/// Router builder exposing HTTP endpoints for the health workflow.
pub fn health_router<M, S, P, N, R>(service: Arc<HealthScoreService<M, S, P, N, R>>) -> Router
where
    M: MetricSource + 'static,
    S: SettingsStore + 'static,
    P: PlanStore + 'static,
    N: NotificationDispatcher + 'static,
    R: RecommendationProvider + 'static,
{
    Router::new()
        .route(
            "/api/v1/health/:org_id/settings",
            get(get_settings_handler::<M, S, P, N, R>)
                .put(put_settings_handler::<M, S, P, N, R>),
        )
        .route(
            "/api/v1/health/:org_id/evaluate",
            post(evaluate_handler::<M, S, P, N, R>),
        )
        .route(
            "/api/v1/health/:org_id/plans",
            get(list_plans_handler::<M, S, P, N, R>),
        )
        .route(
            "/api/v1/health/:org_id/plans/:plan_id/events",
            post(plan_event_handler::<M, S, P, N, R>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct EvaluateRequest {
    pub(crate) subject: Subject,
    pub(crate) period: Period,
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlanQuery {
    pub(crate) subject_id: String,
    #[serde(default)]
    pub(crate) subject_kind: Option<SubjectKind>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlanEventRequest {
    pub(crate) event: PlanEvent,
}

pub(crate) async fn get_settings_handler<M, S, P, N, R>(
    State(service): State<Arc<HealthScoreService<M, S, P, N, R>>>,
    Path(org_id): Path<String>,
) -> Response
where
    M: MetricSource + 'static,
    S: SettingsStore + 'static,
    P: PlanStore + 'static,
    N: NotificationDispatcher + 'static,
    R: RecommendationProvider + 'static,
{
    match service.settings(&OrgId(org_id)) {
        Ok(settings) => (StatusCode::OK, axum::Json(settings)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn put_settings_handler<M, S, P, N, R>(
    State(service): State<Arc<HealthScoreService<M, S, P, N, R>>>,
    Path(org_id): Path<String>,
    axum::Json(overrides): axum::Json<SettingsOverrides>,
) -> Response
where
    M: MetricSource + 'static,
    S: SettingsStore + 'static,
    P: PlanStore + 'static,
    N: NotificationDispatcher + 'static,
    R: RecommendationProvider + 'static,
{
    match service.update_settings(&OrgId(org_id), overrides) {
        Ok(settings) => (StatusCode::OK, axum::Json(settings)).into_response(),
        Err(HealthServiceError::Configuration(err)) => {
            let payload = json!({
                "error": err.to_string(),
                "fields": err.field_errors(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn evaluate_handler<M, S, P, N, R>(
    State(service): State<Arc<HealthScoreService<M, S, P, N, R>>>,
    Path(org_id): Path<String>,
    axum::Json(request): axum::Json<EvaluateRequest>,
) -> Response
where
    M: MetricSource + 'static,
    S: SettingsStore + 'static,
    P: PlanStore + 'static,
    N: NotificationDispatcher + 'static,
    R: RecommendationProvider + 'static,
{
    let EvaluateRequest {
        subject,
        period,
        today,
    } = request;
    let today = today.unwrap_or_else(|| chrono::Local::now().date_naive());

    match service.evaluate(&OrgId(org_id), &subject, period, today) {
        Ok(EvaluationOutcome::Scored {
            result,
            reconciliation,
        }) => {
            let payload = json!({
                "status": "scored",
                "result": result,
                "plans": reconciliation,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Ok(EvaluationOutcome::NotYetComputable { subject, period }) => {
            let payload = json!({
                "status": "not_yet_computable",
                "subject": subject,
                "period": period,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(HealthServiceError::DataIntegrity(err)) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(HealthServiceError::DuplicatePlan(err)) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_plans_handler<M, S, P, N, R>(
    State(service): State<Arc<HealthScoreService<M, S, P, N, R>>>,
    Path(org_id): Path<String>,
    Query(query): Query<PlanQuery>,
) -> Response
where
    M: MetricSource + 'static,
    S: SettingsStore + 'static,
    P: PlanStore + 'static,
    N: NotificationDispatcher + 'static,
    R: RecommendationProvider + 'static,
{
    let subject = Subject {
        kind: query.subject_kind.unwrap_or(SubjectKind::Employee),
        id: SubjectId(query.subject_id),
    };

    match service.plans_for_subject(&OrgId(org_id), &subject) {
        Ok(plans) => (StatusCode::OK, axum::Json(plans)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn plan_event_handler<M, S, P, N, R>(
    State(service): State<Arc<HealthScoreService<M, S, P, N, R>>>,
    Path((_org_id, plan_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<PlanEventRequest>,
) -> Response
where
    M: MetricSource + 'static,
    S: SettingsStore + 'static,
    P: PlanStore + 'static,
    N: NotificationDispatcher + 'static,
    R: RecommendationProvider + 'static,
{
    match service.apply_plan_event(&PlanId(plan_id), request.event) {
        Ok(plan) => (StatusCode::OK, axum::Json(plan)).into_response(),
        Err(HealthServiceError::PlanTransition(err)) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(HealthServiceError::PlanStore(super::plans::PlanStoreError::NotFound)) => {
            let payload = json!({ "error": "plan not found" });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

fn error_response(err: HealthServiceError) -> Response {
    let payload = json!({ "error": err.to_string() });
    (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
}
