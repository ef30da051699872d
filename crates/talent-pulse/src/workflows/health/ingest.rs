//! Import of COPC operational-metric CSV exports.
//!
//! One row per employee and period; a blank cell means the metric was not
//! reported, not that it was zero.

use std::io::Read;

use serde::Deserialize;

use super::domain::{
    AssessmentMetricSet, CopcMetric, CopcReading, OrgId, Period, Subject,
};

#[derive(Debug, thiserror::Error)]
pub enum CopcImportError {
    #[error("failed to read metrics export: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: {message}")]
    InvalidRow { row: usize, message: String },
}

/// Parse a COPC metrics export into one metric set per row.
pub fn import_copc_csv<R: Read>(
    reader: R,
    org_id: &OrgId,
) -> Result<Vec<AssessmentMetricSet>, CopcImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut sets = Vec::new();
    for (index, record) in csv_reader.deserialize::<CopcRow>().enumerate() {
        let row_number = index + 2; // 1-based, after the header row
        let row = record?;

        if row.employee_id.is_empty() {
            return Err(CopcImportError::InvalidRow {
                row: row_number,
                message: "missing employee id".to_string(),
            });
        }
        let period: Period = row.period.parse().map_err(|err| CopcImportError::InvalidRow {
            row: row_number,
            message: format!("{err}"),
        })?;

        let mut set = AssessmentMetricSet::empty(
            org_id.clone(),
            Subject::employee(row.employee_id.clone()),
            period,
        );
        set.copc = row.readings();
        sets.push(set);
    }

    Ok(sets)
}

#[derive(Debug, Deserialize)]
struct CopcRow {
    #[serde(rename = "Employee ID")]
    employee_id: String,
    #[serde(rename = "Period")]
    period: String,
    #[serde(rename = "Quality Score", default)]
    quality_score: Option<f64>,
    #[serde(rename = "Rework Rate", default)]
    rework_rate: Option<f64>,
    #[serde(rename = "Process Adherence", default)]
    process_adherence: Option<f64>,
    #[serde(rename = "Average Handle Time", default)]
    average_handle_time: Option<f64>,
    #[serde(rename = "First Call Resolution", default)]
    first_call_resolution: Option<f64>,
    #[serde(rename = "Delivery Consistency", default)]
    delivery_consistency: Option<f64>,
    #[serde(rename = "Customer Satisfaction", default)]
    customer_satisfaction: Option<f64>,
    #[serde(rename = "NPS", default)]
    nps: Option<f64>,
    #[serde(rename = "Absenteeism Rate", default)]
    absenteeism_rate: Option<f64>,
    #[serde(rename = "Engagement", default)]
    engagement: Option<f64>,
    #[serde(rename = "Operational Stress", default)]
    operational_stress: Option<f64>,
}

impl CopcRow {
    fn readings(&self) -> Vec<CopcReading> {
        let columns = [
            (CopcMetric::QualityScore, self.quality_score),
            (CopcMetric::ReworkRate, self.rework_rate),
            (CopcMetric::ProcessAdherenceRate, self.process_adherence),
            (CopcMetric::AverageHandleTimeSecs, self.average_handle_time),
            (
                CopcMetric::FirstCallResolutionRate,
                self.first_call_resolution,
            ),
            (CopcMetric::DeliveryConsistency, self.delivery_consistency),
            (
                CopcMetric::CustomerSatisfactionScore,
                self.customer_satisfaction,
            ),
            (CopcMetric::NpsScore, self.nps),
            (CopcMetric::AbsenteeismRate, self.absenteeism_rate),
            (CopcMetric::EngagementScore, self.engagement),
            (CopcMetric::OperationalStressLevel, self.operational_stress),
        ];

        columns
            .into_iter()
            .filter_map(|(metric, value)| value.map(|value| CopcReading { metric, value }))
            .collect()
    }
}
