//! Organizational psychosocial-health workflow.
//!
//! Ingests TFCI 360-degree ratings, NR-1 occupational-risk assessments, and
//! COPC operational metrics per subject and period, blends them into a
//! weighted composite health score, classifies risk, and reconciles action
//! plans against the result. Every stage is a pure function of its inputs
//! plus resolved settings; persistence, notification transport, and AI
//! recommendations sit behind trait boundaries.

pub mod catalog;
pub mod domain;
pub mod ingest;
pub mod plans;
pub mod router;
pub mod scoring;
pub mod service;
pub mod settings;

#[cfg(test)]
mod tests;

pub use catalog::{metric_domain, MetricDomain, Polarity};
pub use domain::{
    AssessmentMetricSet, CategoryScore, CompositeScoreResult, CopcMetric, CopcReading,
    DimensionBreach, DimensionValues, MetricCategory, MetricId, Nr1Dimension, Nr1Risk, OrgId,
    Period, PeriodParseError, RiskDimension, RiskTier, Subject, SubjectId, SubjectKind,
    TfciDimension, TfciRating,
};
pub use ingest::{import_copc_csv, CopcImportError};
pub use plans::{
    suggested_actions, ActionPlan, AlertKind, BreachContext, DispatchError, DuplicatePlanError,
    HealthAlert, NotificationDispatcher, PlanCreation, PlanEvent, PlanId, PlanReconciliation,
    PlanState, PlanStore, PlanStoreError, PlanTransitionError, RecommendationError,
    RecommendationProvider,
};
pub use router::health_router;
pub use scoring::{
    aggregate, classify, classify_tier, normalize, normalize_set, Classification,
    CompositeBreakdown, DataIntegrityError, InsufficientDataError, NormalizedMetric, ScoreOutcome,
    ScoringEngine,
};
pub use service::{
    BatchReport, EvaluationOutcome, HealthScoreService, HealthServiceError, MetricSource,
    MetricSourceError, SubjectFailure,
};
pub use settings::{
    AlertThresholds, CategoryWeights, ConfigurationError, FieldError, NotificationSettings,
    NotificationsOverride, OrgSettings, SettingsOverrides, SettingsResolver, SettingsStore,
    SettingsStoreError, SettingsUpdateError, ThresholdsOverride, WeightsOverride, WEIGHT_TOTAL,
};
