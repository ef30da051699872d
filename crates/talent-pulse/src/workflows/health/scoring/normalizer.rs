use super::super::catalog::{metric_domain, MetricDomain, Polarity};
use super::super::domain::{AssessmentMetricSet, MetricId};

/// Raw input outside its declared domain. Surfaced, never clamped, because it
/// points at corrupted upstream data that needs correction at the source.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("metric {metric} reported {value}, outside its declared domain {domain}")]
pub struct DataIntegrityError {
    pub metric: MetricId,
    pub value: f64,
    pub domain: MetricDomain,
}

/// A raw reading rescaled onto 0-100 where 100 always means healthiest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedMetric {
    pub metric: MetricId,
    pub score: f64,
}

/// Rescale one raw value onto the common 0-100 health scale.
pub fn normalize(metric: MetricId, raw: f64) -> Result<f64, DataIntegrityError> {
    let domain = metric_domain(metric);
    if !domain.contains(raw) {
        return Err(DataIntegrityError {
            metric,
            value: raw,
            domain,
        });
    }

    let fraction = (raw - domain.min) * 100.0 / domain.span();
    Ok(match domain.polarity {
        Polarity::HigherIsBetter => fraction,
        Polarity::HigherIsWorse => 100.0 - fraction,
    })
}

/// Normalize every reading in a metric set, failing on the first value that
/// violates its declared domain.
pub fn normalize_set(set: &AssessmentMetricSet) -> Result<Vec<NormalizedMetric>, DataIntegrityError> {
    let mut normalized =
        Vec::with_capacity(set.tfci.len() + set.nr1.len() + set.copc.len());

    for rating in &set.tfci {
        let metric = MetricId::Tfci(rating.dimension);
        normalized.push(NormalizedMetric {
            metric,
            score: normalize(metric, rating.rating)?,
        });
    }
    for risk in &set.nr1 {
        let metric = MetricId::Nr1(risk.dimension);
        normalized.push(NormalizedMetric {
            metric,
            score: normalize(metric, risk.risk)?,
        });
    }
    for reading in &set.copc {
        let metric = MetricId::Copc(reading.metric);
        normalized.push(NormalizedMetric {
            metric,
            score: normalize(metric, reading.value)?,
        });
    }

    Ok(normalized)
}
