use std::sync::Arc;

use super::common::*;
use crate::workflows::health::settings::{
    ConfigurationError, OrgSettings, SettingsOverrides, SettingsResolver, SettingsStore,
    SettingsUpdateError, ThresholdsOverride, WeightsOverride,
};

fn resolver() -> (SettingsResolver<MemorySettingsStore>, Arc<MemorySettingsStore>) {
    let store = Arc::new(MemorySettingsStore::default());
    (SettingsResolver::new(store.clone()), store)
}

#[test]
fn defaults_match_the_reference_configuration() {
    let settings = OrgSettings::default();
    assert_eq!(settings.weights.tfci, 30.0);
    assert_eq!(settings.weights.nr1, 40.0);
    assert_eq!(settings.weights.copc, 30.0);
    assert_eq!(settings.thresholds.burnout_risk, 2.5);
    assert_eq!(settings.thresholds.conflict_latent, 2.0);
    assert_eq!(settings.thresholds.sudden_drop_percent, 20.0);
    assert_eq!(settings.thresholds.absenteeism_abnormal, 10.0);
    assert_eq!(settings.thresholds.php_score_critical, 60.0);
    assert_eq!(settings.thresholds.php_score_warning, 80.0);
    assert!(settings.notifications.email_enabled);
    assert!(!settings.notifications.webhook_enabled);
    assert!(!settings.notifications.critical_only);
    assert!(settings.ai_recommendations_enabled);
    assert!(settings.auto_action_plans_enabled);
    assert_eq!(settings.action_plan_overdue_days, 30);
    assert!(settings.validate().is_ok());
}

#[test]
fn resolve_returns_defaults_for_missing_record() {
    let (resolver, _) = resolver();
    let settings = resolver.resolve(&org()).expect("resolve never fails on missing");
    assert_eq!(settings, OrgSettings::default());
}

#[test]
fn resolve_merges_partial_overrides_over_defaults() {
    let (resolver, _) = resolver();
    resolver
        .update(
            &org(),
            SettingsOverrides {
                thresholds: Some(ThresholdsOverride {
                    php_score_critical: Some(55.0),
                    ..Default::default()
                }),
                action_plan_overdue_days: Some(14),
                ..Default::default()
            },
        )
        .expect("valid update");

    let settings = resolver.resolve(&org()).expect("resolve");
    assert_eq!(settings.thresholds.php_score_critical, 55.0);
    // Untouched fields keep their defaults.
    assert_eq!(settings.thresholds.php_score_warning, 80.0);
    assert_eq!(settings.weights.nr1, 40.0);
    assert_eq!(settings.action_plan_overdue_days, 14);
}

#[test]
fn update_rejects_weights_that_break_the_total() {
    let (resolver, store) = resolver();
    let err = resolver
        .update(
            &org(),
            SettingsOverrides {
                weights: Some(WeightsOverride {
                    tfci: Some(50.0),
                    ..Default::default()
                }),
                ..Default::default()
            },
        )
        .expect_err("50 + 40 + 30 does not sum to 100");

    match err {
        SettingsUpdateError::Config(ConfigurationError::Invalid(fields)) => {
            assert!(fields.iter().any(|field| field.field == "weights"));
        }
        other => panic!("expected configuration error, got {other:?}"),
    }
    // Nothing was persisted.
    assert!(store.get(&org()).expect("store read").is_none());
}

#[test]
fn update_rejects_negative_weight() {
    let (resolver, _) = resolver();
    let err = resolver
        .update(
            &org(),
            SettingsOverrides {
                weights: Some(WeightsOverride {
                    tfci: Some(-10.0),
                    nr1: Some(80.0),
                    copc: Some(30.0),
                }),
                ..Default::default()
            },
        )
        .expect_err("negative weight is invalid");

    match err {
        SettingsUpdateError::Config(ConfigurationError::Invalid(fields)) => {
            assert!(fields.iter().any(|field| field.field == "weights.tfci"));
        }
        other => panic!("expected configuration error, got {other:?}"),
    }
}

#[test]
fn update_rejects_inverted_score_thresholds() {
    let (resolver, _) = resolver();
    let err = resolver
        .update(
            &org(),
            SettingsOverrides {
                thresholds: Some(ThresholdsOverride {
                    php_score_critical: Some(85.0),
                    ..Default::default()
                }),
                ..Default::default()
            },
        )
        .expect_err("critical above warning is invalid");

    match err {
        SettingsUpdateError::Config(ConfigurationError::Invalid(fields)) => {
            assert!(fields
                .iter()
                .any(|field| field.field == "thresholds.php_score_critical"));
        }
        other => panic!("expected configuration error, got {other:?}"),
    }
}

#[test]
fn update_rejects_out_of_range_overdue_window() {
    let (resolver, _) = resolver();
    let err = resolver
        .update(
            &org(),
            SettingsOverrides {
                action_plan_overdue_days: Some(0),
                ..Default::default()
            },
        )
        .expect_err("zero-day window is invalid");
    assert!(matches!(err, SettingsUpdateError::Config(_)));
}

#[test]
fn updates_layer_incrementally_over_stored_overrides() {
    let (resolver, _) = resolver();
    resolver
        .update(
            &org(),
            SettingsOverrides {
                weights: Some(WeightsOverride {
                    tfci: Some(20.0),
                    nr1: Some(50.0),
                    ..Default::default()
                }),
                ..Default::default()
            },
        )
        .expect("first update valid");
    resolver
        .update(
            &org(),
            SettingsOverrides {
                thresholds: Some(ThresholdsOverride {
                    absenteeism_abnormal: Some(8.0),
                    ..Default::default()
                }),
                ..Default::default()
            },
        )
        .expect("second update valid");

    let settings = resolver.resolve(&org()).expect("resolve");
    assert_eq!(settings.weights.tfci, 20.0);
    assert_eq!(settings.weights.nr1, 50.0);
    assert_eq!(settings.weights.copc, 30.0);
    assert_eq!(settings.thresholds.absenteeism_abnormal, 8.0);
}

#[test]
fn validation_collects_every_failing_field() {
    let mut settings = OrgSettings::default();
    settings.weights.tfci = -5.0;
    settings.thresholds.burnout_risk = 9.0;
    settings.action_plan_overdue_days = 900;

    let err = settings.validate().expect_err("multiple violations");
    let fields = err.field_errors();
    assert!(fields.iter().any(|field| field.field == "weights.tfci"));
    assert!(fields
        .iter()
        .any(|field| field.field == "thresholds.burnout_risk"));
    assert!(fields
        .iter()
        .any(|field| field.field == "action_plan_overdue_days"));
}
