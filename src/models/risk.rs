//! Risk assessment data model.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One named reason an operation is considered dangerous.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskFactor {
    /// Factor type.
    #[serde(rename = "type")]
    pub factor_type: RiskFactorType,
    /// Independent severity for this factor.
    pub severity: Severity,
    /// Human-readable description.
    pub description: String,
    /// Paths this factor applies to.
    pub affected_paths: Vec<PathBuf>,
    /// Suggested mitigation, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mitigation: Option<String>,
}

/// Closed set of recognized risk factor types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactorType {
    SystemFileModification,
    ConfigurationChange,
    SecurityRelatedChanges,
    LargeFileOperation,
    BulkOperation,
    DeletionOperation,
    DependencyManifestChange,
    BuildSystemChange,
}

impl RiskFactorType {
    /// Factor types whose behavior is well understood by the scoring model.
    /// Their presence raises assessment confidence.
    pub fn is_well_understood(&self) -> bool {
        matches!(
            self,
            Self::SystemFileModification
                | Self::DeletionOperation
                | Self::ConfigurationChange
        )
    }

    /// Factor types that block automatic approval when present at high
    /// severity.
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            Self::DeletionOperation
                | Self::SystemFileModification
                | Self::SecurityRelatedChanges
        )
    }
}

/// Severity of a single risk factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Multiplier applied to the factor weight when scoring.
    pub fn multiplier(&self) -> f32 {
        match self {
            Self::High => 3.0,
            Self::Medium => 2.0,
            Self::Low => 1.0,
        }
    }
}

/// Overall risk level derived from the numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Minimal,
    Low,
    Medium,
    High,
    Critical,
}

/// Coarse operational-danger classification, independent of the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyLevel {
    Safe,
    Cautious,
    Risky,
    Dangerous,
}

/// Breadth of the operation's impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLevel {
    Minimal,
    Moderate,
    Significant,
    Major,
}

/// Derived risk assessment for one operation. Recomputed per assessment,
/// never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Overall risk level.
    pub level: RiskLevel,
    /// Operational danger classification.
    pub safety_level: SafetyLevel,
    /// Breadth of impact.
    pub impact_level: ImpactLevel,
    /// All factors that applied.
    pub risk_factors: Vec<RiskFactor>,
    /// Suggested mitigations, deduplicated.
    pub mitigation_strategies: Vec<String>,
    /// Confidence in this assessment (0.0-1.0).
    pub confidence: f32,
    /// Explanation of the outcome.
    pub reasoning: String,
    /// Whether the operation may proceed without explicit approval.
    pub automatic_approval: bool,
}

/// Outcome of running the risk engine.
///
/// The engine is total: internal failures produce a conservative fallback
/// assessment instead of an error, but the degradation stays visible in the
/// type so callers can log or surface it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Assessment {
    /// Assessment completed normally.
    Complete(RiskAssessment),
    /// Assessment failed internally; `assessment` is the conservative
    /// fallback.
    Degraded {
        assessment: RiskAssessment,
        reason: String,
    },
}

impl Assessment {
    /// The underlying assessment, complete or fallback.
    pub fn assessment(&self) -> &RiskAssessment {
        match self {
            Self::Complete(a) => a,
            Self::Degraded { assessment, .. } => assessment,
        }
    }

    /// Consume and return the underlying assessment.
    pub fn into_assessment(self) -> RiskAssessment {
        match self {
            Self::Complete(a) => a,
            Self::Degraded { assessment, .. } => assessment,
        }
    }

    /// Whether the engine fell back to the conservative result.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}
