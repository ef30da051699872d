use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use crate::workflows::health::domain::{
    AssessmentMetricSet, CompositeScoreResult, CopcMetric, CopcReading, DimensionValues,
    Nr1Dimension, Nr1Risk, OrgId, Period, RiskDimension, RiskTier, Subject, TfciDimension,
    TfciRating,
};
use crate::workflows::health::plans::{
    ActionPlan, BreachContext, DispatchError, HealthAlert, NotificationDispatcher, PlanCreation,
    PlanId, PlanState, PlanStore, PlanStoreError, RecommendationError, RecommendationProvider,
};
use crate::workflows::health::service::{HealthScoreService, MetricSource, MetricSourceError};
use crate::workflows::health::settings::{
    OrgSettings, SettingsOverrides, SettingsStore, SettingsStoreError,
};

pub(super) fn org() -> OrgId {
    OrgId("org-acme".to_string())
}

pub(super) fn subject() -> Subject {
    Subject::employee("emp-001")
}

pub(super) fn period(value: &str) -> Period {
    value.parse().expect("valid period")
}

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).expect("valid date")
}

/// A subject well inside every threshold.
pub(super) fn healthy_metric_set(p: Period) -> AssessmentMetricSet {
    let mut set = AssessmentMetricSet::empty(org(), subject(), p);
    set.tfci = vec![
        TfciRating {
            dimension: TfciDimension::Technical,
            rating: 4.5,
        },
        TfciRating {
            dimension: TfciDimension::Functional,
            rating: 4.0,
        },
        TfciRating {
            dimension: TfciDimension::Interpersonal,
            rating: 4.4,
        },
    ];
    set.nr1 = vec![
        Nr1Risk {
            dimension: Nr1Dimension::WorkloadPace,
            risk: 1.0,
        },
        Nr1Risk {
            dimension: Nr1Dimension::ConflictHarassment,
            risk: 1.0,
        },
        Nr1Risk {
            dimension: Nr1Dimension::RecoveryBoundaries,
            risk: 1.0,
        },
    ];
    set.copc = vec![
        CopcReading {
            metric: CopcMetric::QualityScore,
            value: 92.0,
        },
        CopcReading {
            metric: CopcMetric::AbsenteeismRate,
            value: 3.0,
        },
        CopcReading {
            metric: CopcMetric::EngagementScore,
            value: 4.5,
        },
    ];
    set
}

/// A subject breaching burnout and absenteeism with a weak composite.
pub(super) fn burnout_metric_set(p: Period) -> AssessmentMetricSet {
    let mut set = AssessmentMetricSet::empty(org(), subject(), p);
    set.tfci = vec![TfciRating {
        dimension: TfciDimension::Technical,
        rating: 2.0,
    }];
    set.nr1 = vec![
        Nr1Risk {
            dimension: Nr1Dimension::WorkloadPace,
            risk: 3.0,
        },
        Nr1Risk {
            dimension: Nr1Dimension::RecoveryBoundaries,
            risk: 3.0,
        },
    ];
    set.copc = vec![
        CopcReading {
            metric: CopcMetric::AbsenteeismRate,
            value: 15.0,
        },
        CopcReading {
            metric: CopcMetric::OperationalStressLevel,
            value: 3.0,
        },
    ];
    set
}

/// Hand-built score result for trigger-level tests.
pub(super) fn score_result(
    p: Period,
    tier: RiskTier,
    signals: Vec<(RiskDimension, f64, f64)>,
    dimensions: DimensionValues,
) -> CompositeScoreResult {
    CompositeScoreResult {
        subject: subject(),
        period: p,
        composite: match tier {
            RiskTier::Healthy => 90.0,
            RiskTier::Warning => 70.0,
            RiskTier::Critical => 40.0,
        },
        categories: Vec::new(),
        tier,
        signals: signals
            .into_iter()
            .map(
                |(dimension, observed, threshold)| crate::workflows::health::domain::DimensionBreach {
                    dimension,
                    observed,
                    threshold,
                },
            )
            .collect(),
        dimensions,
        settings: OrgSettings::default(),
    }
}

pub(super) fn open_plan(dimension: RiskDimension, opened_on: NaiveDate, p: Period) -> ActionPlan {
    ActionPlan {
        id: PlanId(format!("plan-test-{}", dimension.label())),
        org_id: org(),
        subject: subject(),
        dimension,
        severity: RiskTier::Warning,
        state: PlanState::Open,
        opened_on,
        opened_period: p,
        escalated: false,
        suggested_actions: Vec::new(),
        recommended_action: None,
    }
}

#[derive(Default, Clone)]
pub(super) struct MemorySettingsStore {
    overrides: Arc<Mutex<HashMap<String, SettingsOverrides>>>,
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, org_id: &OrgId) -> Result<Option<SettingsOverrides>, SettingsStoreError> {
        let guard = self.overrides.lock().expect("settings mutex poisoned");
        Ok(guard.get(&org_id.0).cloned())
    }

    fn put(&self, org_id: &OrgId, overrides: SettingsOverrides) -> Result<(), SettingsStoreError> {
        let mut guard = self.overrides.lock().expect("settings mutex poisoned");
        guard.insert(org_id.0.clone(), overrides);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryMetricSource {
    sets: Arc<Mutex<HashMap<(OrgId, Subject, Period), AssessmentMetricSet>>>,
}

impl MemoryMetricSource {
    pub(super) fn insert(&self, set: AssessmentMetricSet) {
        let mut guard = self.sets.lock().expect("metric mutex poisoned");
        guard.insert((set.org_id.clone(), set.subject.clone(), set.period), set);
    }
}

impl MetricSource for MemoryMetricSource {
    fn fetch(
        &self,
        org_id: &OrgId,
        subject: &Subject,
        period: &Period,
    ) -> Result<Option<AssessmentMetricSet>, MetricSourceError> {
        let guard = self.sets.lock().expect("metric mutex poisoned");
        Ok(guard
            .get(&(org_id.clone(), subject.clone(), *period))
            .cloned())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryPlanStore {
    plans: Arc<Mutex<HashMap<PlanId, ActionPlan>>>,
}

impl MemoryPlanStore {
    pub(super) fn seed(&self, plan: ActionPlan) {
        let mut guard = self.plans.lock().expect("plan mutex poisoned");
        guard.insert(plan.id.clone(), plan);
    }

    pub(super) fn all(&self) -> Vec<ActionPlan> {
        let guard = self.plans.lock().expect("plan mutex poisoned");
        guard.values().cloned().collect()
    }
}

impl PlanStore for MemoryPlanStore {
    fn create_if_absent(&self, plan: ActionPlan) -> Result<PlanCreation, PlanStoreError> {
        let mut guard = self.plans.lock().expect("plan mutex poisoned");
        let existing = guard.values().find(|candidate| {
            candidate.state.is_active()
                && candidate.org_id == plan.org_id
                && candidate.subject == plan.subject
                && candidate.dimension == plan.dimension
        });
        if let Some(existing) = existing {
            return Ok(PlanCreation::AlreadyOpen(existing.clone()));
        }
        guard.insert(plan.id.clone(), plan.clone());
        Ok(PlanCreation::Created(plan))
    }

    fn update(&self, plan: ActionPlan) -> Result<(), PlanStoreError> {
        let mut guard = self.plans.lock().expect("plan mutex poisoned");
        if !guard.contains_key(&plan.id) {
            return Err(PlanStoreError::NotFound);
        }
        guard.insert(plan.id.clone(), plan);
        Ok(())
    }

    fn fetch(&self, id: &PlanId) -> Result<Option<ActionPlan>, PlanStoreError> {
        let guard = self.plans.lock().expect("plan mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn plans_for_subject(
        &self,
        org_id: &OrgId,
        subject: &Subject,
    ) -> Result<Vec<ActionPlan>, PlanStoreError> {
        let guard = self.plans.lock().expect("plan mutex poisoned");
        Ok(guard
            .values()
            .filter(|plan| &plan.org_id == org_id && &plan.subject == subject)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryDispatcher {
    alerts: Arc<Mutex<Vec<HealthAlert>>>,
}

impl MemoryDispatcher {
    pub(super) fn alerts(&self) -> Vec<HealthAlert> {
        self.alerts.lock().expect("alert mutex poisoned").clone()
    }
}

impl NotificationDispatcher for MemoryDispatcher {
    fn dispatch(&self, alert: HealthAlert) -> Result<(), DispatchError> {
        self.alerts.lock().expect("alert mutex poisoned").push(alert);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(super) struct StaticRecommender;

impl RecommendationProvider for StaticRecommender {
    fn recommend(
        &self,
        context: &BreachContext<'_>,
    ) -> Result<Option<String>, RecommendationError> {
        Ok(Some(format!(
            "Address {} for {}",
            context.breach.dimension.label(),
            context.subject.id.0
        )))
    }
}

pub(super) struct FailingRecommender;

impl RecommendationProvider for FailingRecommender {
    fn recommend(
        &self,
        _context: &BreachContext<'_>,
    ) -> Result<Option<String>, RecommendationError> {
        Err(RecommendationError::Unavailable("model offline".to_string()))
    }
}

pub(super) type TestService = HealthScoreService<
    MemoryMetricSource,
    MemorySettingsStore,
    MemoryPlanStore,
    MemoryDispatcher,
    StaticRecommender,
>;

pub(super) struct TestHarness {
    pub(super) service: Arc<TestService>,
    pub(super) metrics: Arc<MemoryMetricSource>,
    pub(super) plans: Arc<MemoryPlanStore>,
    pub(super) alerts: Arc<MemoryDispatcher>,
}

pub(super) fn build_service() -> TestHarness {
    let metrics = Arc::new(MemoryMetricSource::default());
    let settings = Arc::new(MemorySettingsStore::default());
    let plans = Arc::new(MemoryPlanStore::default());
    let alerts = Arc::new(MemoryDispatcher::default());
    let service = Arc::new(HealthScoreService::new(
        metrics.clone(),
        settings,
        plans.clone(),
        alerts.clone(),
        Arc::new(StaticRecommender),
    ));
    TestHarness {
        service,
        metrics,
        plans,
        alerts,
    }
}
