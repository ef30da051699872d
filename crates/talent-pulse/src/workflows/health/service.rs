//! Service composing the settings resolver, metric source, scoring pipeline,
//! and plan trigger for one organization at a time.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};

use super::domain::{AssessmentMetricSet, CompositeScoreResult, OrgId, Period, Subject};
use super::plans::{
    reconcile_plans, ActionPlan, DuplicatePlanError, NotificationDispatcher, PlanEvent, PlanId,
    PlanReconcileError, PlanReconciliation, PlanStore, PlanStoreError, PlanTransitionError,
    RecommendationProvider,
};
use super::scoring::{DataIntegrityError, ScoreOutcome, ScoringEngine};
use super::settings::{
    ConfigurationError, OrgSettings, SettingsOverrides, SettingsResolver, SettingsStore,
    SettingsStoreError, SettingsUpdateError,
};

/// Read-only supplier of assessment data. Also consulted for the previous
/// period so the classifier can detect sudden quality drops.
pub trait MetricSource: Send + Sync {
    fn fetch(
        &self,
        org_id: &OrgId,
        subject: &Subject,
        period: &Period,
    ) -> Result<Option<AssessmentMetricSet>, MetricSourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MetricSourceError {
    #[error("metric source unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of one subject's evaluation run.
#[derive(Debug, Clone)]
pub enum EvaluationOutcome {
    Scored {
        result: CompositeScoreResult,
        reconciliation: PlanReconciliation,
    },
    NotYetComputable {
        subject: Subject,
        period: Period,
    },
}

/// One subject's failure inside a batch run.
#[derive(Debug)]
pub struct SubjectFailure {
    pub subject: Subject,
    pub error: HealthServiceError,
}

/// Aggregate outcome of a batch run; per-subject failures never abort the
/// batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<EvaluationOutcome>,
    pub failures: Vec<SubjectFailure>,
}

/// Orchestrates one evaluation run: resolve settings, fetch metrics, score,
/// reconcile plans. All dependencies arrive explicitly; nothing is fetched
/// from process-wide state.
pub struct HealthScoreService<M, S, P, N, R> {
    metrics: Arc<M>,
    settings: SettingsResolver<S>,
    plans: Arc<P>,
    notifications: Arc<N>,
    recommendations: Arc<R>,
}

impl<M, S, P, N, R> HealthScoreService<M, S, P, N, R>
where
    M: MetricSource + 'static,
    S: SettingsStore + 'static,
    P: PlanStore + 'static,
    N: NotificationDispatcher + 'static,
    R: RecommendationProvider + 'static,
{
    pub fn new(
        metrics: Arc<M>,
        settings_store: Arc<S>,
        plans: Arc<P>,
        notifications: Arc<N>,
        recommendations: Arc<R>,
    ) -> Self {
        Self {
            metrics,
            settings: SettingsResolver::new(settings_store),
            plans,
            notifications,
            recommendations,
        }
    }

    /// Effective settings for an organization (defaults when nothing stored).
    pub fn settings(&self, org_id: &OrgId) -> Result<OrgSettings, HealthServiceError> {
        Ok(self.settings.resolve(org_id)?)
    }

    /// Persist partial overrides after validating the merged result.
    pub fn update_settings(
        &self,
        org_id: &OrgId,
        overrides: SettingsOverrides,
    ) -> Result<OrgSettings, HealthServiceError> {
        let effective = self.settings.update(org_id, overrides)?;
        info!(org = %org_id.0, "health settings updated");
        Ok(effective)
    }

    /// Evaluate one subject for one period.
    ///
    /// Side effects (plans, notifications) only happen after the pure scoring
    /// stages succeed, so a failed run leaves no partial state behind.
    pub fn evaluate(
        &self,
        org_id: &OrgId,
        subject: &Subject,
        period: Period,
        today: NaiveDate,
    ) -> Result<EvaluationOutcome, HealthServiceError> {
        let settings = self.settings.resolve(org_id)?;

        let Some(current) = self.metrics.fetch(org_id, subject, &period)? else {
            return Ok(EvaluationOutcome::NotYetComputable {
                subject: subject.clone(),
                period,
            });
        };
        let previous = self.metrics.fetch(org_id, subject, &period.prev())?;

        let engine = ScoringEngine::new(settings.clone());
        match engine.score(&current, previous.as_ref())? {
            ScoreOutcome::NotYetComputable { subject, period } => {
                Ok(EvaluationOutcome::NotYetComputable { subject, period })
            }
            ScoreOutcome::Scored(result) => {
                let reconciliation = reconcile_plans(
                    self.plans.as_ref(),
                    self.notifications.as_ref(),
                    self.recommendations.as_ref(),
                    org_id,
                    &settings,
                    &result,
                    today,
                )?;
                info!(
                    org = %org_id.0,
                    subject = %result.subject,
                    period = %result.period,
                    composite = result.composite,
                    tier = result.tier.label(),
                    opened = reconciliation.opened.len(),
                    "subject evaluated"
                );
                Ok(EvaluationOutcome::Scored {
                    result,
                    reconciliation,
                })
            }
        }
    }

    /// Evaluate many subjects, recording per-subject failures and moving on.
    pub fn evaluate_batch(
        &self,
        org_id: &OrgId,
        subjects: &[Subject],
        period: Period,
        today: NaiveDate,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        for subject in subjects {
            match self.evaluate(org_id, subject, period, today) {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(error) => {
                    warn!(subject = %subject, %error, "subject evaluation failed");
                    report.failures.push(SubjectFailure {
                        subject: subject.clone(),
                        error,
                    });
                }
            }
        }
        report
    }

    pub fn plans_for_subject(
        &self,
        org_id: &OrgId,
        subject: &Subject,
    ) -> Result<Vec<ActionPlan>, HealthServiceError> {
        Ok(self.plans.plans_for_subject(org_id, subject)?)
    }

    /// Apply an explicit review/resolve/cancel event to a plan.
    pub fn apply_plan_event(
        &self,
        plan_id: &PlanId,
        event: PlanEvent,
    ) -> Result<ActionPlan, HealthServiceError> {
        let mut plan = self
            .plans
            .fetch(plan_id)?
            .ok_or(PlanStoreError::NotFound)?;
        plan.apply_event(event)?;
        self.plans.update(plan.clone())?;
        Ok(plan)
    }
}

/// Error raised by the health score service.
#[derive(Debug, thiserror::Error)]
pub enum HealthServiceError {
    #[error(transparent)]
    DataIntegrity(#[from] DataIntegrityError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    DuplicatePlan(#[from] DuplicatePlanError),
    #[error(transparent)]
    PlanTransition(#[from] PlanTransitionError),
    #[error(transparent)]
    SettingsStore(#[from] SettingsStoreError),
    #[error(transparent)]
    PlanStore(#[from] PlanStoreError),
    #[error(transparent)]
    MetricSource(#[from] MetricSourceError),
}

impl From<SettingsUpdateError> for HealthServiceError {
    fn from(value: SettingsUpdateError) -> Self {
        match value {
            SettingsUpdateError::Config(err) => Self::Configuration(err),
            SettingsUpdateError::Store(err) => Self::SettingsStore(err),
        }
    }
}

impl From<PlanReconcileError> for HealthServiceError {
    fn from(value: PlanReconcileError) -> Self {
        match value {
            PlanReconcileError::Duplicate(err) => Self::DuplicatePlan(err),
            PlanReconcileError::Store(err) => Self::PlanStore(err),
        }
    }
}
