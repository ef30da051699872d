use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::settings::OrgSettings;

/// Identifier wrapper for tenant organizations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrgId(pub String);

/// Identifier wrapper for the entity being scored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectId(pub String);

/// Granularity of the entity a composite score describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Organization,
    Team,
    Employee,
}

impl SubjectKind {
    pub const fn label(self) -> &'static str {
        match self {
            SubjectKind::Organization => "organization",
            SubjectKind::Team => "team",
            SubjectKind::Employee => "employee",
        }
    }
}

/// The entity being scored for a given period.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Subject {
    pub kind: SubjectKind,
    pub id: SubjectId,
}

impl Subject {
    pub fn employee(id: impl Into<String>) -> Self {
        Self {
            kind: SubjectKind::Employee,
            id: SubjectId(id.into()),
        }
    }

    pub fn team(id: impl Into<String>) -> Self {
        Self {
            kind: SubjectKind::Team,
            id: SubjectId(id.into()),
        }
    }

    pub fn organization(id: impl Into<String>) -> Self {
        Self {
            kind: SubjectKind::Organization,
            id: SubjectId(id.into()),
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.label(), self.id.0)
    }
}

/// Calendar month an assessment run covers, rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self, PeriodParseError> {
        if !(1..=12).contains(&month) {
            return Err(PeriodParseError {
                value: format!("{year}-{month:02}"),
            });
        }
        Ok(Self { year, month })
    }

    pub const fn year(&self) -> i32 {
        self.year
    }

    pub const fn month(&self) -> u32 {
        self.month
    }

    pub fn next(&self) -> Period {
        if self.month == 12 {
            Period {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Period {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn prev(&self) -> Period {
        if self.month == 1 {
            Period {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Period {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{value}' is not a valid YYYY-MM period")]
pub struct PeriodParseError {
    pub value: String,
}

impl FromStr for Period {
    type Err = PeriodParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || PeriodParseError {
            value: value.to_string(),
        };
        let (year, month) = value.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Period::new(year, month).map_err(|_| invalid())
    }
}

impl TryFrom<String> for Period {
    type Error = PeriodParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(value: Period) -> Self {
        value.to_string()
    }
}

/// Assessment source category contributing to the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    Tfci,
    Nr1,
    Copc,
}

impl MetricCategory {
    pub const ALL: [MetricCategory; 3] =
        [MetricCategory::Tfci, MetricCategory::Nr1, MetricCategory::Copc];

    pub const fn label(self) -> &'static str {
        match self {
            MetricCategory::Tfci => "tfci",
            MetricCategory::Nr1 => "nr1",
            MetricCategory::Copc => "copc",
        }
    }
}

/// Behavioral dimensions rated in 360-degree TFCI assessments (Likert 1-5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TfciDimension {
    Technical,
    Functional,
    Contextual,
    Interpersonal,
}

impl TfciDimension {
    pub const fn label(self) -> &'static str {
        match self {
            TfciDimension::Technical => "technical",
            TfciDimension::Functional => "functional",
            TfciDimension::Contextual => "contextual",
            TfciDimension::Interpersonal => "interpersonal",
        }
    }
}

/// The ten NR-1 occupational psychosocial-risk dimensions (1-3 scale, higher = worse).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nr1Dimension {
    WorkloadPace,
    GoalPressure,
    RoleClarity,
    AutonomyControl,
    LeadershipSupport,
    PeerCollaboration,
    RecognitionJustice,
    CommunicationChange,
    ConflictHarassment,
    RecoveryBoundaries,
}

impl Nr1Dimension {
    pub const fn label(self) -> &'static str {
        match self {
            Nr1Dimension::WorkloadPace => "workload_pace",
            Nr1Dimension::GoalPressure => "goal_pressure",
            Nr1Dimension::RoleClarity => "role_clarity",
            Nr1Dimension::AutonomyControl => "autonomy_control",
            Nr1Dimension::LeadershipSupport => "leadership_support",
            Nr1Dimension::PeerCollaboration => "peer_collaboration",
            Nr1Dimension::RecognitionJustice => "recognition_justice",
            Nr1Dimension::CommunicationChange => "communication_change",
            Nr1Dimension::ConflictHarassment => "conflict_harassment",
            Nr1Dimension::RecoveryBoundaries => "recovery_boundaries",
        }
    }
}

/// Operational metrics tracked under the COPC program, mixed polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopcMetric {
    QualityScore,
    ReworkRate,
    ProcessAdherenceRate,
    AverageHandleTimeSecs,
    FirstCallResolutionRate,
    DeliveryConsistency,
    CustomerSatisfactionScore,
    NpsScore,
    AbsenteeismRate,
    EngagementScore,
    OperationalStressLevel,
}

impl CopcMetric {
    pub const fn label(self) -> &'static str {
        match self {
            CopcMetric::QualityScore => "quality_score",
            CopcMetric::ReworkRate => "rework_rate",
            CopcMetric::ProcessAdherenceRate => "process_adherence_rate",
            CopcMetric::AverageHandleTimeSecs => "average_handle_time_secs",
            CopcMetric::FirstCallResolutionRate => "first_call_resolution_rate",
            CopcMetric::DeliveryConsistency => "delivery_consistency",
            CopcMetric::CustomerSatisfactionScore => "customer_satisfaction_score",
            CopcMetric::NpsScore => "nps_score",
            CopcMetric::AbsenteeismRate => "absenteeism_rate",
            CopcMetric::EngagementScore => "engagement_score",
            CopcMetric::OperationalStressLevel => "operational_stress_level",
        }
    }
}

/// A metric identifier across all three source categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricId {
    Tfci(TfciDimension),
    Nr1(Nr1Dimension),
    Copc(CopcMetric),
}

impl MetricId {
    pub const fn category(self) -> MetricCategory {
        match self {
            MetricId::Tfci(_) => MetricCategory::Tfci,
            MetricId::Nr1(_) => MetricCategory::Nr1,
            MetricId::Copc(_) => MetricCategory::Copc,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            MetricId::Tfci(dimension) => dimension.label(),
            MetricId::Nr1(dimension) => dimension.label(),
            MetricId::Copc(metric) => metric.label(),
        }
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category().label(), self.label())
    }
}

/// One assessor's rating of a TFCI dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TfciRating {
    pub dimension: TfciDimension,
    pub rating: f64,
}

/// One NR-1 risk reading; higher means worse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Nr1Risk {
    pub dimension: Nr1Dimension,
    pub risk: f64,
}

/// One COPC operational reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CopcReading {
    pub metric: CopcMetric,
    pub value: f64,
}

/// One subject's measurable inputs for a period, grouped by source category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentMetricSet {
    pub org_id: OrgId,
    pub subject: Subject,
    pub period: Period,
    #[serde(default)]
    pub tfci: Vec<TfciRating>,
    #[serde(default)]
    pub nr1: Vec<Nr1Risk>,
    #[serde(default)]
    pub copc: Vec<CopcReading>,
}

impl AssessmentMetricSet {
    pub fn empty(org_id: OrgId, subject: Subject, period: Period) -> Self {
        Self {
            org_id,
            subject,
            period,
            tfci: Vec::new(),
            nr1: Vec::new(),
            copc: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tfci.is_empty() && self.nr1.is_empty() && self.copc.is_empty()
    }

    /// Mean TFCI rating for one dimension across assessors, if any were recorded.
    pub fn tfci_mean(&self, dimension: TfciDimension) -> Option<f64> {
        mean(self
            .tfci
            .iter()
            .filter(|rating| rating.dimension == dimension)
            .map(|rating| rating.rating))
    }

    /// Mean NR-1 risk for one dimension, if recorded.
    pub fn nr1_mean(&self, dimension: Nr1Dimension) -> Option<f64> {
        mean(self
            .nr1
            .iter()
            .filter(|risk| risk.dimension == dimension)
            .map(|risk| risk.risk))
    }

    /// Mean COPC value for one metric, if recorded.
    pub fn copc_mean(&self, metric: CopcMetric) -> Option<f64> {
        mean(self
            .copc
            .iter()
            .filter(|reading| reading.metric == metric)
            .map(|reading| reading.value))
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for value in values {
        sum += value;
        count += 1;
    }
    (count > 0).then(|| sum / count as f64)
}

/// Discrete risk tier; the composite is healthier the higher it is, so
/// `Critical` is the worst tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Healthy,
    Warning,
    Critical,
}

impl RiskTier {
    pub const fn label(self) -> &'static str {
        match self {
            RiskTier::Healthy => "healthy",
            RiskTier::Warning => "warning",
            RiskTier::Critical => "critical",
        }
    }
}

/// Dimensions monitored by per-dimension alert thresholds, independent of the
/// composite tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskDimension {
    BurnoutRisk,
    ConflictLatent,
    SuddenQualityDrop,
    AbsenteeismAbnormal,
}

impl RiskDimension {
    pub const ALL: [RiskDimension; 4] = [
        RiskDimension::BurnoutRisk,
        RiskDimension::ConflictLatent,
        RiskDimension::SuddenQualityDrop,
        RiskDimension::AbsenteeismAbnormal,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            RiskDimension::BurnoutRisk => "burnout_risk",
            RiskDimension::ConflictLatent => "conflict_latent",
            RiskDimension::SuddenQualityDrop => "sudden_quality_drop",
            RiskDimension::AbsenteeismAbnormal => "absenteeism_abnormal",
        }
    }
}

/// Observed values for the monitored risk dimensions; `None` means the
/// underlying data was not reported this period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionValues {
    pub burnout: Option<f64>,
    pub conflict: Option<f64>,
    pub quality_drop_percent: Option<f64>,
    pub absenteeism: Option<f64>,
}

impl DimensionValues {
    pub fn value(&self, dimension: RiskDimension) -> Option<f64> {
        match dimension {
            RiskDimension::BurnoutRisk => self.burnout,
            RiskDimension::ConflictLatent => self.conflict,
            RiskDimension::SuddenQualityDrop => self.quality_drop_percent,
            RiskDimension::AbsenteeismAbnormal => self.absenteeism,
        }
    }
}

/// A per-dimension threshold crossing reported by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionBreach {
    pub dimension: RiskDimension,
    pub observed: f64,
    pub threshold: f64,
}

/// Normalized average for one contributing category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: MetricCategory,
    pub average: f64,
    pub samples: usize,
}

/// Output of one aggregation run for one subject and period.
///
/// Carries the settings snapshot the run used so the figure can be reproduced
/// and audited later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScoreResult {
    pub subject: Subject,
    pub period: Period,
    pub composite: f64,
    pub categories: Vec<CategoryScore>,
    pub tier: RiskTier,
    pub signals: Vec<DimensionBreach>,
    pub dimensions: DimensionValues,
    pub settings: OrgSettings,
}
