use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use talent_pulse::workflows::health::{
    ActionPlan, AssessmentMetricSet, BreachContext, DispatchError, HealthAlert,
    HealthScoreService, MetricSource, MetricSourceError, NotificationDispatcher, OrgId, Period,
    PlanCreation, PlanId, PlanStore, PlanStoreError, RecommendationError, RecommendationProvider,
    SettingsOverrides, SettingsStore, SettingsStoreError, Subject,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type ApiHealthService = HealthScoreService<
    InMemoryMetricSource,
    InMemorySettingsStore,
    InMemoryPlanStore,
    InMemoryAlertDispatcher,
    CatalogRecommendationProvider,
>;

#[derive(Default, Clone)]
pub(crate) struct InMemorySettingsStore {
    records: Arc<Mutex<HashMap<String, SettingsOverrides>>>,
}

impl SettingsStore for InMemorySettingsStore {
    fn get(&self, org_id: &OrgId) -> Result<Option<SettingsOverrides>, SettingsStoreError> {
        let guard = self.records.lock().expect("settings mutex poisoned");
        Ok(guard.get(&org_id.0).cloned())
    }

    fn put(&self, org_id: &OrgId, overrides: SettingsOverrides) -> Result<(), SettingsStoreError> {
        let mut guard = self.records.lock().expect("settings mutex poisoned");
        guard.insert(org_id.0.clone(), overrides);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryMetricSource {
    sets: Arc<Mutex<HashMap<(OrgId, Subject, Period), AssessmentMetricSet>>>,
}

impl InMemoryMetricSource {
    pub(crate) fn insert(&self, set: AssessmentMetricSet) {
        let mut guard = self.sets.lock().expect("metric mutex poisoned");
        guard.insert((set.org_id.clone(), set.subject.clone(), set.period), set);
    }

    pub(crate) fn subjects(&self, org_id: &OrgId) -> Vec<(Subject, Period)> {
        let guard = self.sets.lock().expect("metric mutex poisoned");
        let mut keys: Vec<(Subject, Period)> = guard
            .keys()
            .filter(|(org, _, _)| org == org_id)
            .map(|(_, subject, period)| (subject.clone(), *period))
            .collect();
        keys.sort();
        keys
    }
}

impl MetricSource for InMemoryMetricSource {
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
pub(crate) struct InMemoryPlanStore {
    plans: Arc<Mutex<HashMap<PlanId, ActionPlan>>>,
}

impl PlanStore for InMemoryPlanStore {
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
pub(crate) struct InMemoryAlertDispatcher {
    events: Arc<Mutex<Vec<HealthAlert>>>,
}

impl InMemoryAlertDispatcher {
    pub(crate) fn events(&self) -> Vec<HealthAlert> {
        self.events.lock().expect("alert mutex poisoned").clone()
    }
}

impl NotificationDispatcher for InMemoryAlertDispatcher {
    fn dispatch(&self, alert: HealthAlert) -> Result<(), DispatchError> {
        self.events
            .lock()
            .expect("alert mutex poisoned")
            .push(alert);
        Ok(())
    }
}

/// Serves the engine's built-in remediation catalog as the recommendation
/// text; a real deployment would swap in the AI provider here.
#[derive(Default, Clone)]
pub(crate) struct CatalogRecommendationProvider;

impl RecommendationProvider for CatalogRecommendationProvider {
    fn recommend(
        &self,
        context: &BreachContext<'_>,
    ) -> Result<Option<String>, RecommendationError> {
        let actions = talent_pulse::workflows::health::suggested_actions(context.breach.dimension);
        Ok(actions.first().map(|action| action.to_string()))
    }
}

pub(crate) struct ServiceHandles {
    pub(crate) service: Arc<ApiHealthService>,
    pub(crate) metrics: Arc<InMemoryMetricSource>,
    pub(crate) alerts: Arc<InMemoryAlertDispatcher>,
}

pub(crate) fn build_service() -> ServiceHandles {
    let metrics = Arc::new(InMemoryMetricSource::default());
    let settings = Arc::new(InMemorySettingsStore::default());
    let plans = Arc::new(InMemoryPlanStore::default());
    let alerts = Arc::new(InMemoryAlertDispatcher::default());
    let service = Arc::new(HealthScoreService::new(
        metrics.clone(),
        settings,
        plans,
        alerts.clone(),
        Arc::new(CatalogRecommendationProvider),
    ));
    ServiceHandles {
        service,
        metrics,
        alerts,
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
