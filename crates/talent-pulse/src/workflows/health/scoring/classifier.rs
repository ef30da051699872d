use super::super::domain::{
    AssessmentMetricSet, CopcMetric, DimensionBreach, DimensionValues, Nr1Dimension, RiskDimension,
    RiskTier, TfciDimension,
};
use super::super::settings::AlertThresholds;

/// Composite tier plus the independent per-dimension signals.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub tier: RiskTier,
    pub signals: Vec<DimensionBreach>,
}

/// Map a composite score onto its tier.
///
/// Total over [0, 100]; a score exactly on a threshold classifies as the
/// worse tier.
pub fn classify_tier(composite: f64, thresholds: &AlertThresholds) -> RiskTier {
    if composite <= thresholds.php_score_critical {
        RiskTier::Critical
    } else if composite <= thresholds.php_score_warning {
        RiskTier::Warning
    } else {
        RiskTier::Healthy
    }
}

/// Derive the monitored dimension values from the period's raw readings.
///
/// `previous` feeds the sudden-drop comparison; without it the drop dimension
/// stays unreported.
pub fn dimension_values(
    current: &AssessmentMetricSet,
    previous: Option<&AssessmentMetricSet>,
) -> DimensionValues {
    let burnout = mean_of(&[
        current.nr1_mean(Nr1Dimension::WorkloadPace),
        current.nr1_mean(Nr1Dimension::RecoveryBoundaries),
        current.copc_mean(CopcMetric::OperationalStressLevel),
    ]);

    let conflict = mean_of(&[
        current.nr1_mean(Nr1Dimension::ConflictHarassment),
        current
            .tfci_mean(TfciDimension::Interpersonal)
            .map(interpersonal_risk),
    ]);

    let quality_drop_percent = previous
        .and_then(|set| set.copc_mean(CopcMetric::QualityScore))
        .filter(|prior| *prior > 0.0)
        .and_then(|prior| {
            current
                .copc_mean(CopcMetric::QualityScore)
                .map(|latest| (prior - latest) * 100.0 / prior)
        });

    let absenteeism = current.copc_mean(CopcMetric::AbsenteeismRate);

    DimensionValues {
        burnout,
        conflict,
        quality_drop_percent,
        absenteeism,
    }
}

/// Classify a composite score and the monitored dimensions against thresholds.
///
/// Dimension signals fire independently of the composite tier; a subject with
/// a healthy composite can still breach absenteeism.
pub fn classify(
    composite: f64,
    values: &DimensionValues,
    thresholds: &AlertThresholds,
) -> Classification {
    let tier = classify_tier(composite, thresholds);

    let mut signals = Vec::new();
    for dimension in RiskDimension::ALL {
        let threshold = thresholds.for_dimension(dimension);
        if let Some(observed) = values.value(dimension) {
            if observed >= threshold {
                signals.push(DimensionBreach {
                    dimension,
                    observed,
                    threshold,
                });
            }
        }
    }

    Classification { tier, signals }
}

/// Map a 1-5 interpersonal rating onto the 1-3 risk scale (rating 5 -> risk 1).
fn interpersonal_risk(rating: f64) -> f64 {
    1.0 + (5.0 - rating) / 2.0
}

fn mean_of(parts: &[Option<f64>]) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for part in parts.iter().flatten() {
        sum += part;
        count += 1;
    }
    (count > 0).then(|| sum / count as f64)
}
