//! Per-organization configuration: category weights, alert thresholds,
//! notification and feature toggles, persisted as partial overrides that merge
//! over system defaults.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::domain::{MetricCategory, OrgId, RiskDimension};

/// Category weights are validated against this total.
pub const WEIGHT_TOTAL: f64 = 100.0;

const WEIGHT_EPSILON: f64 = 1e-6;

/// Relative contribution of each source category to the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeights {
    pub tfci: f64,
    pub nr1: f64,
    pub copc: f64,
}

impl CategoryWeights {
    pub fn for_category(&self, category: MetricCategory) -> f64 {
        match category {
            MetricCategory::Tfci => self.tfci,
            MetricCategory::Nr1 => self.nr1,
            MetricCategory::Copc => self.copc,
        }
    }

    pub fn sum(&self) -> f64 {
        self.tfci + self.nr1 + self.copc
    }
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            tfci: 30.0,
            nr1: 40.0,
            copc: 30.0,
        }
    }
}

/// Numeric thresholds driving the risk classifier.
///
/// `php_score_critical` and `php_score_warning` bound the composite tiers;
/// the rest apply independently per monitored dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    pub burnout_risk: f64,
    pub conflict_latent: f64,
    pub sudden_drop_percent: f64,
    pub absenteeism_abnormal: f64,
    pub php_score_critical: f64,
    pub php_score_warning: f64,
}

impl AlertThresholds {
    pub fn for_dimension(&self, dimension: RiskDimension) -> f64 {
        match dimension {
            RiskDimension::BurnoutRisk => self.burnout_risk,
            RiskDimension::ConflictLatent => self.conflict_latent,
            RiskDimension::SuddenQualityDrop => self.sudden_drop_percent,
            RiskDimension::AbsenteeismAbnormal => self.absenteeism_abnormal,
        }
    }
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            burnout_risk: 2.5,
            conflict_latent: 2.0,
            sudden_drop_percent: 20.0,
            absenteeism_abnormal: 10.0,
            php_score_critical: 60.0,
            php_score_warning: 80.0,
        }
    }
}

/// Outbound alert channel toggles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub email_enabled: bool,
    pub email_recipients: Vec<String>,
    pub webhook_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    pub critical_only: bool,
}

impl NotificationSettings {
    /// Whether any delivery channel is switched on at all.
    pub fn any_channel_enabled(&self) -> bool {
        self.email_enabled || self.webhook_enabled
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email_enabled: true,
            email_recipients: Vec::new(),
            webhook_enabled: false,
            webhook_url: None,
            critical_only: false,
        }
    }
}

/// Effective per-organization configuration for the health workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgSettings {
    pub weights: CategoryWeights,
    pub thresholds: AlertThresholds,
    pub notifications: NotificationSettings,
    pub ai_recommendations_enabled: bool,
    pub auto_action_plans_enabled: bool,
    pub action_plan_overdue_days: u32,
}

impl Default for OrgSettings {
    fn default() -> Self {
        Self {
            weights: CategoryWeights::default(),
            thresholds: AlertThresholds::default(),
            notifications: NotificationSettings::default(),
            ai_recommendations_enabled: true,
            auto_action_plans_enabled: true,
            action_plan_overdue_days: 30,
        }
    }
}

impl OrgSettings {
    /// Validate ranges, weight totals, and threshold ordering.
    ///
    /// Runs at settings-write time so malformed configuration never reaches
    /// the aggregator or classifier.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let mut errors = Vec::new();

        check_range(&mut errors, "weights.tfci", self.weights.tfci, 0.0, 100.0);
        check_range(&mut errors, "weights.nr1", self.weights.nr1, 0.0, 100.0);
        check_range(&mut errors, "weights.copc", self.weights.copc, 0.0, 100.0);
        if (self.weights.sum() - WEIGHT_TOTAL).abs() > WEIGHT_EPSILON {
            errors.push(FieldError {
                field: "weights",
                message: format!("must sum to {WEIGHT_TOTAL}, got {}", self.weights.sum()),
            });
        }

        let thresholds = &self.thresholds;
        check_range(&mut errors, "thresholds.burnout_risk", thresholds.burnout_risk, 1.0, 3.0);
        check_range(
            &mut errors,
            "thresholds.conflict_latent",
            thresholds.conflict_latent,
            1.0,
            3.0,
        );
        check_range(
            &mut errors,
            "thresholds.sudden_drop_percent",
            thresholds.sudden_drop_percent,
            5.0,
            50.0,
        );
        check_range(
            &mut errors,
            "thresholds.absenteeism_abnormal",
            thresholds.absenteeism_abnormal,
            1.0,
            30.0,
        );
        check_range(
            &mut errors,
            "thresholds.php_score_critical",
            thresholds.php_score_critical,
            0.0,
            100.0,
        );
        check_range(
            &mut errors,
            "thresholds.php_score_warning",
            thresholds.php_score_warning,
            0.0,
            100.0,
        );
        if thresholds.php_score_critical >= thresholds.php_score_warning {
            errors.push(FieldError {
                field: "thresholds.php_score_critical",
                message: format!(
                    "must be below php_score_warning ({} >= {})",
                    thresholds.php_score_critical, thresholds.php_score_warning
                ),
            });
        }

        if !(1..=365).contains(&self.action_plan_overdue_days) {
            errors.push(FieldError {
                field: "action_plan_overdue_days",
                message: format!(
                    "must be between 1 and 365, got {}",
                    self.action_plan_overdue_days
                ),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigurationError::Invalid(errors))
        }
    }
}

fn check_range(errors: &mut Vec<FieldError>, field: &'static str, value: f64, min: f64, max: f64) {
    if !value.is_finite() || value < min || value > max {
        errors.push(FieldError {
            field,
            message: format!("must be between {min} and {max}, got {value}"),
        });
    }
}

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Malformed settings rejected at write time.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("settings rejected: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Invalid(Vec<FieldError>),
}

impl ConfigurationError {
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ConfigurationError::Invalid(errors) => errors,
        }
    }
}

/// Partial weights override; absent fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightsOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tfci: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nr1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copc: Option<f64>,
}

/// Partial thresholds override.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdsOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burnout_risk: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict_latent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sudden_drop_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absenteeism_abnormal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub php_score_critical: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub php_score_warning: Option<f64>,
}

/// Partial notification override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationsOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_recipients: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_only: Option<bool>,
}

/// Partial settings document persisted per organization.
///
/// Stored values win field-by-field over [`OrgSettings::default`]; absent
/// fields fall back to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<WeightsOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<ThresholdsOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<NotificationsOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_recommendations_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_action_plans_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_plan_overdue_days: Option<u32>,
}

impl SettingsOverrides {
    /// Merge these overrides over a base configuration, field by field.
    pub fn apply_to(&self, base: &OrgSettings) -> OrgSettings {
        let mut effective = base.clone();

        if let Some(weights) = &self.weights {
            effective.weights.tfci = weights.tfci.unwrap_or(effective.weights.tfci);
            effective.weights.nr1 = weights.nr1.unwrap_or(effective.weights.nr1);
            effective.weights.copc = weights.copc.unwrap_or(effective.weights.copc);
        }

        if let Some(thresholds) = &self.thresholds {
            let current = &mut effective.thresholds;
            current.burnout_risk = thresholds.burnout_risk.unwrap_or(current.burnout_risk);
            current.conflict_latent = thresholds.conflict_latent.unwrap_or(current.conflict_latent);
            current.sudden_drop_percent = thresholds
                .sudden_drop_percent
                .unwrap_or(current.sudden_drop_percent);
            current.absenteeism_abnormal = thresholds
                .absenteeism_abnormal
                .unwrap_or(current.absenteeism_abnormal);
            current.php_score_critical = thresholds
                .php_score_critical
                .unwrap_or(current.php_score_critical);
            current.php_score_warning = thresholds
                .php_score_warning
                .unwrap_or(current.php_score_warning);
        }

        if let Some(notifications) = &self.notifications {
            let current = &mut effective.notifications;
            if let Some(email_enabled) = notifications.email_enabled {
                current.email_enabled = email_enabled;
            }
            if let Some(recipients) = &notifications.email_recipients {
                current.email_recipients = recipients.clone();
            }
            if let Some(webhook_enabled) = notifications.webhook_enabled {
                current.webhook_enabled = webhook_enabled;
            }
            if let Some(webhook_url) = &notifications.webhook_url {
                current.webhook_url = Some(webhook_url.clone());
            }
            if let Some(critical_only) = notifications.critical_only {
                current.critical_only = critical_only;
            }
        }

        if let Some(ai) = self.ai_recommendations_enabled {
            effective.ai_recommendations_enabled = ai;
        }
        if let Some(auto) = self.auto_action_plans_enabled {
            effective.auto_action_plans_enabled = auto;
        }
        if let Some(days) = self.action_plan_overdue_days {
            effective.action_plan_overdue_days = days;
        }

        effective
    }

    /// Layer newer overrides over these, leaf field by leaf field.
    pub fn merged_with(&self, incoming: &SettingsOverrides) -> SettingsOverrides {
        let mut merged = self.clone();

        if let Some(weights) = &incoming.weights {
            let base = merged.weights.get_or_insert_with(WeightsOverride::default);
            base.tfci = weights.tfci.or(base.tfci);
            base.nr1 = weights.nr1.or(base.nr1);
            base.copc = weights.copc.or(base.copc);
        }

        if let Some(thresholds) = &incoming.thresholds {
            let base = merged
                .thresholds
                .get_or_insert_with(ThresholdsOverride::default);
            base.burnout_risk = thresholds.burnout_risk.or(base.burnout_risk);
            base.conflict_latent = thresholds.conflict_latent.or(base.conflict_latent);
            base.sudden_drop_percent = thresholds.sudden_drop_percent.or(base.sudden_drop_percent);
            base.absenteeism_abnormal = thresholds
                .absenteeism_abnormal
                .or(base.absenteeism_abnormal);
            base.php_score_critical = thresholds.php_score_critical.or(base.php_score_critical);
            base.php_score_warning = thresholds.php_score_warning.or(base.php_score_warning);
        }

        if let Some(notifications) = &incoming.notifications {
            let base = merged
                .notifications
                .get_or_insert_with(NotificationsOverride::default);
            base.email_enabled = notifications.email_enabled.or(base.email_enabled);
            base.email_recipients = notifications
                .email_recipients
                .clone()
                .or_else(|| base.email_recipients.clone());
            base.webhook_enabled = notifications.webhook_enabled.or(base.webhook_enabled);
            base.webhook_url = notifications
                .webhook_url
                .clone()
                .or_else(|| base.webhook_url.clone());
            base.critical_only = notifications.critical_only.or(base.critical_only);
        }

        merged.ai_recommendations_enabled = incoming
            .ai_recommendations_enabled
            .or(merged.ai_recommendations_enabled);
        merged.auto_action_plans_enabled = incoming
            .auto_action_plans_enabled
            .or(merged.auto_action_plans_enabled);
        merged.action_plan_overdue_days = incoming
            .action_plan_overdue_days
            .or(merged.action_plan_overdue_days);

        merged
    }
}

/// Storage abstraction for persisted per-organization overrides.
pub trait SettingsStore: Send + Sync {
    fn get(&self, org_id: &OrgId) -> Result<Option<SettingsOverrides>, SettingsStoreError>;
    fn put(&self, org_id: &OrgId, overrides: SettingsOverrides) -> Result<(), SettingsStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsStoreError {
    #[error("settings store unavailable: {0}")]
    Unavailable(String),
}

/// Supplies effective settings per organization.
///
/// The only component permitted to read persisted configuration; every other
/// stage receives the resolved settings as an argument.
pub struct SettingsResolver<S> {
    store: Arc<S>,
}

impl<S> SettingsResolver<S>
where
    S: SettingsStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Stored overrides merged over system defaults. A missing record is not
    /// an error; the defaults come back unchanged.
    pub fn resolve(&self, org_id: &OrgId) -> Result<OrgSettings, SettingsStoreError> {
        let overrides = self.store.get(org_id)?.unwrap_or_default();
        Ok(overrides.apply_to(&OrgSettings::default()))
    }

    /// Layer incoming overrides over the stored ones and persist, rejecting
    /// the write if the merged effective settings fail validation.
    pub fn update(
        &self,
        org_id: &OrgId,
        incoming: SettingsOverrides,
    ) -> Result<OrgSettings, SettingsUpdateError> {
        let stored = self.store.get(org_id)?.unwrap_or_default();
        let combined = stored.merged_with(&incoming);
        let effective = combined.apply_to(&OrgSettings::default());
        effective.validate()?;
        self.store.put(org_id, combined)?;
        Ok(effective)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsUpdateError {
    #[error(transparent)]
    Config(#[from] ConfigurationError),
    #[error(transparent)]
    Store(#[from] SettingsStoreError),
}
