//! Static declaration of every metric's domain and polarity.
//!
//! Keeping the table in one place means the normalizer never special-cases
//! individual metrics; a new reading only needs a row here.

use std::fmt;

use super::domain::{CopcMetric, MetricId};

/// Direction in which a raw value improves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    HigherIsBetter,
    HigherIsWorse,
}

/// Declared bounds and polarity for a raw metric value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricDomain {
    pub min: f64,
    pub max: f64,
    pub polarity: Polarity,
}

impl MetricDomain {
    const fn new(min: f64, max: f64, polarity: Polarity) -> Self {
        Self { min, max, polarity }
    }

    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

impl fmt::Display for MetricDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Likert 1-5 rating where 5 is the strongest assessment.
const LIKERT_RATING: MetricDomain = MetricDomain::new(1.0, 5.0, Polarity::HigherIsBetter);
/// NR-1 risk scale where 3 marks the highest exposure.
const RISK_SCALE: MetricDomain = MetricDomain::new(1.0, 3.0, Polarity::HigherIsWorse);
const PERCENT_GOOD: MetricDomain = MetricDomain::new(0.0, 100.0, Polarity::HigherIsBetter);
const PERCENT_BAD: MetricDomain = MetricDomain::new(0.0, 100.0, Polarity::HigherIsWorse);

/// Look up the declared domain for any metric.
pub fn metric_domain(metric: MetricId) -> MetricDomain {
    match metric {
        MetricId::Tfci(_) => LIKERT_RATING,
        MetricId::Nr1(_) => RISK_SCALE,
        MetricId::Copc(metric) => copc_domain(metric),
    }
}

fn copc_domain(metric: CopcMetric) -> MetricDomain {
    match metric {
        CopcMetric::QualityScore => PERCENT_GOOD,
        CopcMetric::ReworkRate => PERCENT_BAD,
        CopcMetric::ProcessAdherenceRate => PERCENT_GOOD,
        // Handle time has no natural ceiling in the source data; an hour per
        // contact is treated as fully unhealthy.
        CopcMetric::AverageHandleTimeSecs => {
            MetricDomain::new(0.0, 3600.0, Polarity::HigherIsWorse)
        }
        CopcMetric::FirstCallResolutionRate => PERCENT_GOOD,
        CopcMetric::DeliveryConsistency => PERCENT_GOOD,
        CopcMetric::CustomerSatisfactionScore => PERCENT_GOOD,
        CopcMetric::NpsScore => MetricDomain::new(-100.0, 100.0, Polarity::HigherIsBetter),
        CopcMetric::AbsenteeismRate => PERCENT_BAD,
        CopcMetric::EngagementScore => LIKERT_RATING,
        CopcMetric::OperationalStressLevel => RISK_SCALE,
    }
}
