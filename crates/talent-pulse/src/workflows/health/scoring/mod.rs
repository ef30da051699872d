//! The pure scoring pipeline: normalize raw readings, blend them into a
//! weighted composite, classify risk. No I/O; settings arrive as an argument.

mod aggregator;
mod classifier;
mod normalizer;

pub use aggregator::{aggregate, CompositeBreakdown, InsufficientDataError};
pub use classifier::{classify, classify_tier, dimension_values, Classification};
pub use normalizer::{normalize, normalize_set, DataIntegrityError, NormalizedMetric};

use super::domain::{AssessmentMetricSet, CompositeScoreResult, Period, Subject};
use super::settings::OrgSettings;

/// Outcome of one scoring run.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreOutcome {
    Scored(CompositeScoreResult),
    /// All categories were empty for the period; a valid "no score yet"
    /// answer, not a failure.
    NotYetComputable { subject: Subject, period: Period },
}

/// Stateless engine applying one organization's resolved settings to a
/// subject's metric sets.
pub struct ScoringEngine {
    settings: OrgSettings,
}

impl ScoringEngine {
    pub fn new(settings: OrgSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &OrgSettings {
        &self.settings
    }

    /// Run normalize -> aggregate -> classify for one subject and period.
    pub fn score(
        &self,
        current: &AssessmentMetricSet,
        previous: Option<&AssessmentMetricSet>,
    ) -> Result<ScoreOutcome, DataIntegrityError> {
        let normalized = normalize_set(current)?;

        let breakdown = match aggregate(&normalized, &self.settings.weights) {
            Ok(breakdown) => breakdown,
            Err(InsufficientDataError) => {
                return Ok(ScoreOutcome::NotYetComputable {
                    subject: current.subject.clone(),
                    period: current.period,
                })
            }
        };

        let dimensions = dimension_values(current, previous);
        let classification = classify(breakdown.composite, &dimensions, &self.settings.thresholds);

        Ok(ScoreOutcome::Scored(CompositeScoreResult {
            subject: current.subject.clone(),
            period: current.period,
            composite: breakdown.composite,
            categories: breakdown.categories,
            tier: classification.tier,
            signals: classification.signals,
            dimensions,
            settings: self.settings.clone(),
        }))
    }
}
