//! Action plans: the tracked remediation records opened when a risk signal
//! breaches policy, plus the trigger that reconciles them on every
//! evaluation run.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::domain::{
    CompositeScoreResult, DimensionBreach, OrgId, Period, RiskDimension, RiskTier, Subject,
};
use super::settings::OrgSettings;

/// Identifier wrapper for action plans.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanId(pub String);

static PLAN_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_plan_id() -> PlanId {
    let id = PLAN_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    PlanId(format!("plan-{id:06}"))
}

/// Lifecycle state of an action plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanState {
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl PlanState {
    pub const fn label(self) -> &'static str {
        match self {
            PlanState::Open => "open",
            PlanState::InProgress => "in_progress",
            PlanState::Completed => "completed",
            PlanState::Cancelled => "cancelled",
        }
    }

    /// Open and in-progress plans count against the one-plan-per-dimension
    /// invariant.
    pub const fn is_active(self) -> bool {
        matches!(self, PlanState::Open | PlanState::InProgress)
    }
}

/// Externally driven lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanEvent {
    Review,
    Resolve,
    Cancel,
}

impl PlanEvent {
    pub const fn label(self) -> &'static str {
        match self {
            PlanEvent::Review => "review",
            PlanEvent::Resolve => "resolve",
            PlanEvent::Cancel => "cancel",
        }
    }
}

/// Tracked remediation record for one (subject, dimension) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub id: PlanId,
    pub org_id: OrgId,
    pub subject: Subject,
    pub dimension: RiskDimension,
    pub severity: RiskTier,
    pub state: PlanState,
    pub opened_on: NaiveDate,
    pub opened_period: Period,
    /// Annotation set once the plan outlives the configured overdue window;
    /// never changes the lifecycle state.
    pub escalated: bool,
    pub suggested_actions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_action: Option<String>,
}

impl ActionPlan {
    /// Apply an explicit lifecycle event, rejecting invalid transitions.
    pub fn apply_event(&mut self, event: PlanEvent) -> Result<(), PlanTransitionError> {
        let next = match (self.state, event) {
            (PlanState::Open, PlanEvent::Review) => PlanState::InProgress,
            (PlanState::Open | PlanState::InProgress, PlanEvent::Resolve) => PlanState::Completed,
            (PlanState::Open | PlanState::InProgress, PlanEvent::Cancel) => PlanState::Cancelled,
            (from, event) => return Err(PlanTransitionError { from, event }),
        };
        self.state = next;
        Ok(())
    }

    pub fn is_overdue(&self, today: NaiveDate, overdue_days: u32) -> bool {
        today.signed_duration_since(self.opened_on).num_days() > i64::from(overdue_days)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot apply '{event}' to a plan in state '{from}'", event = .event.label(), from = .from.label())]
pub struct PlanTransitionError {
    pub from: PlanState,
    pub event: PlanEvent,
}

/// Storage contract violated: more than one active plan for one
/// (subject, dimension). Surfaced for manual reconciliation, never silently
/// merged or closed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{count} active plans found for {subject} dimension '{dimension}', expected at most one", subject = .subject, dimension = .dimension.label())]
pub struct DuplicatePlanError {
    pub subject: Subject,
    pub dimension: RiskDimension,
    pub count: usize,
}

/// Result of an atomic create-if-absent.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanCreation {
    Created(ActionPlan),
    /// Another run already holds the open plan for this (subject, dimension);
    /// the losing create is a no-op.
    AlreadyOpen(ActionPlan),
}

/// Storage abstraction for action plans.
///
/// `create_if_absent` must be atomic with respect to the active-plan check so
/// concurrent evaluation runs cannot open duplicates.
pub trait PlanStore: Send + Sync {
    fn create_if_absent(&self, plan: ActionPlan) -> Result<PlanCreation, PlanStoreError>;
    fn update(&self, plan: ActionPlan) -> Result<(), PlanStoreError>;
    fn fetch(&self, id: &PlanId) -> Result<Option<ActionPlan>, PlanStoreError>;
    fn plans_for_subject(
        &self,
        org_id: &OrgId,
        subject: &Subject,
    ) -> Result<Vec<ActionPlan>, PlanStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PlanStoreError {
    #[error("plan not found")]
    NotFound,
    #[error("plan store unavailable: {0}")]
    Unavailable(String),
}

/// Kind of outbound alert raised by the trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    PlanOpened,
    PlanEscalated,
}

/// Event handed to the notification dispatcher. Delivery mechanics and retry
/// policy belong to the dispatcher, not the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthAlert {
    pub kind: AlertKind,
    pub org_id: OrgId,
    pub subject: Subject,
    pub dimension: RiskDimension,
    pub severity: RiskTier,
    pub tier: RiskTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_action: Option<String>,
}

pub trait NotificationDispatcher: Send + Sync {
    fn dispatch(&self, alert: HealthAlert) -> Result<(), DispatchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Context handed to the optional recommendation provider.
#[derive(Debug, Clone)]
pub struct BreachContext<'a> {
    pub org_id: &'a OrgId,
    pub subject: &'a Subject,
    pub breach: &'a DimensionBreach,
    pub tier: RiskTier,
}

/// Optional external collaborator supplying remediation text for a breach.
/// Failure or absence degrades to "no recommendation", never a fatal error.
pub trait RecommendationProvider: Send + Sync {
    fn recommend(&self, context: &BreachContext<'_>) -> Result<Option<String>, RecommendationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RecommendationError {
    #[error("recommendation provider unavailable: {0}")]
    Unavailable(String),
}

/// Built-in remediation starting points per monitored dimension.
pub fn suggested_actions(dimension: RiskDimension) -> &'static [&'static str] {
    match dimension {
        RiskDimension::BurnoutRisk => &[
            "Review task distribution and workload pacing",
            "Protect recovery time and enforce break policy",
            "Reassess deadlines with the team lead",
        ],
        RiskDimension::ConflictLatent => &[
            "Hold individual check-ins with affected team members",
            "Set up a mediated conversation",
            "Reinforce the respectful-workplace policy",
        ],
        RiskDimension::SuddenQualityDrop => &[
            "Audit recent process or tooling changes",
            "Pair senior staff on failing work items",
            "Recalibrate quality sampling",
        ],
        RiskDimension::AbsenteeismAbnormal => &[
            "Check in with affected employees",
            "Review schedule and shift balance",
            "Offer occupational health support",
        ],
    }
}

/// Mutations performed by one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlanReconciliation {
    pub opened: Vec<ActionPlan>,
    pub cancelled: Vec<PlanId>,
    pub escalated: Vec<PlanId>,
}

#[derive(Debug, thiserror::Error)]
pub enum PlanReconcileError {
    #[error(transparent)]
    Duplicate(#[from] DuplicatePlanError),
    #[error(transparent)]
    Store(#[from] PlanStoreError),
}

/// Re-evaluate a subject's plans against the latest classifier output.
///
/// Opens plans for fresh breaches, cancels plans whose dimension recovered in
/// a later period, and flags overdue plans as escalated. Runs after the pure
/// scoring stages, so a scoring failure never leaves partial side effects.
pub fn reconcile_plans<P, N, R>(
    store: &P,
    dispatcher: &N,
    recommender: &R,
    org_id: &OrgId,
    settings: &OrgSettings,
    result: &CompositeScoreResult,
    today: NaiveDate,
) -> Result<PlanReconciliation, PlanReconcileError>
where
    P: PlanStore + ?Sized,
    N: NotificationDispatcher + ?Sized,
    R: RecommendationProvider + ?Sized,
{
    let existing = store.plans_for_subject(org_id, &result.subject)?;
    let active: Vec<&ActionPlan> = existing.iter().filter(|plan| plan.state.is_active()).collect();

    for dimension in RiskDimension::ALL {
        let count = active
            .iter()
            .filter(|plan| plan.dimension == dimension)
            .count();
        if count > 1 {
            return Err(DuplicatePlanError {
                subject: result.subject.clone(),
                dimension,
                count,
            }
            .into());
        }
    }

    let severity = breach_severity(result.tier);
    let mut reconciliation = PlanReconciliation::default();

    if settings.auto_action_plans_enabled {
        for breach in &result.signals {
            if active.iter().any(|plan| plan.dimension == breach.dimension) {
                // Repeat breach; the existing plan stays untouched.
                continue;
            }

            let recommended_action = if settings.ai_recommendations_enabled {
                let context = BreachContext {
                    org_id,
                    subject: &result.subject,
                    breach,
                    tier: result.tier,
                };
                recommender.recommend(&context).unwrap_or_else(|err| {
                    debug!(dimension = breach.dimension.label(), %err, "recommendation unavailable");
                    None
                })
            } else {
                None
            };

            let plan = ActionPlan {
                id: next_plan_id(),
                org_id: org_id.clone(),
                subject: result.subject.clone(),
                dimension: breach.dimension,
                severity,
                state: PlanState::Open,
                opened_on: today,
                opened_period: result.period,
                escalated: false,
                suggested_actions: suggested_actions(breach.dimension)
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
                recommended_action: recommended_action.clone(),
            };

            match store.create_if_absent(plan)? {
                PlanCreation::Created(plan) => {
                    notify(
                        dispatcher,
                        settings,
                        HealthAlert {
                            kind: AlertKind::PlanOpened,
                            org_id: org_id.clone(),
                            subject: result.subject.clone(),
                            dimension: plan.dimension,
                            severity,
                            tier: result.tier,
                            recommended_action,
                        },
                    );
                    reconciliation.opened.push(plan);
                }
                PlanCreation::AlreadyOpen(_) => {}
            }
        }
    }

    for plan in active {
        let recovered = result
            .dimensions
            .value(plan.dimension)
            .is_some_and(|observed| observed < settings.thresholds.for_dimension(plan.dimension));

        if recovered && result.period > plan.opened_period {
            let mut cancelled = plan.clone();
            cancelled.state = PlanState::Cancelled;
            store.update(cancelled)?;
            reconciliation.cancelled.push(plan.id.clone());
        } else if !plan.escalated && plan.is_overdue(today, settings.action_plan_overdue_days) {
            let mut escalated = plan.clone();
            escalated.escalated = true;
            store.update(escalated)?;
            notify(
                dispatcher,
                settings,
                HealthAlert {
                    kind: AlertKind::PlanEscalated,
                    org_id: org_id.clone(),
                    subject: result.subject.clone(),
                    dimension: plan.dimension,
                    severity: plan.severity,
                    tier: result.tier,
                    recommended_action: None,
                },
            );
            reconciliation.escalated.push(plan.id.clone());
        }
    }

    Ok(reconciliation)
}

fn breach_severity(tier: RiskTier) -> RiskTier {
    if tier == RiskTier::Critical {
        RiskTier::Critical
    } else {
        RiskTier::Warning
    }
}

fn notify<N>(dispatcher: &N, settings: &OrgSettings, alert: HealthAlert)
where
    N: NotificationDispatcher + ?Sized,
{
    let notifications = &settings.notifications;
    if !notifications.any_channel_enabled() {
        return;
    }
    if notifications.critical_only && alert.severity != RiskTier::Critical {
        return;
    }

    // Fire-and-forget: delivery failures belong to the dispatcher.
    if let Err(err) = dispatcher.dispatch(alert) {
        warn!(%err, "alert dispatch failed");
    }
}
