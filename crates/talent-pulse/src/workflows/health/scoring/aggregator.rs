use super::super::domain::{CategoryScore, MetricCategory};
use super::super::settings::CategoryWeights;
use super::normalizer::NormalizedMetric;

/// No usable metrics for the period. A "no score yet" condition rather than a
/// hard failure; callers surface it as a not-yet-computable result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no assessment data available in any category for this period")]
pub struct InsufficientDataError;

/// Weighted composite plus the per-category averages that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeBreakdown {
    pub composite: f64,
    pub categories: Vec<CategoryScore>,
}

/// Blend normalized sub-scores into one composite per the category weights.
///
/// Categories with no contributing metrics drop out of both numerator and
/// denominator, so an organization that has not yet run COPC assessments
/// still gets a valid composite from TFCI and NR-1 alone.
pub fn aggregate(
    metrics: &[NormalizedMetric],
    weights: &CategoryWeights,
) -> Result<CompositeBreakdown, InsufficientDataError> {
    let mut categories = Vec::new();
    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for category in MetricCategory::ALL {
        let mut sum = 0.0;
        let mut samples = 0usize;
        for metric in metrics {
            if metric.metric.category() == category {
                sum += metric.score;
                samples += 1;
            }
        }
        if samples == 0 {
            continue;
        }

        let average = sum / samples as f64;
        let weight = weights.for_category(category);
        numerator += average * weight;
        denominator += weight;
        categories.push(CategoryScore {
            category,
            average,
            samples,
        });
    }

    // A lone zero-weight category cannot form a composite either.
    if categories.is_empty() || denominator == 0.0 {
        return Err(InsufficientDataError);
    }

    let composite = round_one_decimal(numerator / denominator);
    Ok(CompositeBreakdown {
        composite,
        categories,
    })
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}
