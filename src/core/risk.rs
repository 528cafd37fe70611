//! Risk assessment engine.
//!
//! Pure function of (operation, targets) to a risk assessment. The engine is
//! total: internal failures produce a conservative fallback rather than an
//! error, reported through the `Assessment` type.

use crate::models::config::SafetyConfig;
use crate::models::operation::{FileOperation, FileTarget, OperationType};
use crate::models::risk::{
    Assessment, ImpactLevel, RiskAssessment, RiskFactor, RiskFactorType, RiskLevel, SafetyLevel,
    Severity,
};
use crate::utils::fs;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Generic strategies included in every assessment.
const GENERIC_STRATEGIES: &[&str] = &[
    "Create comprehensive backup before operation",
    "Review the change preview before applying",
];

/// Extra strategies added when any factor is high severity.
const HIGH_SEVERITY_STRATEGIES: &[&str] = &[
    "Require explicit confirmation before execution",
    "Apply changes in stages with verification between steps",
    "Monitor affected paths in real time during execution",
];

/// Risk assessment engine.
pub struct RiskEngine {
    config: SafetyConfig,
}

impl RiskEngine {
    pub fn new(config: SafetyConfig) -> Self {
        Self { config }
    }

    /// Assess an operation. Total: never fails, degrades instead.
    pub fn assess(&self, operation: &FileOperation, targets: &[FileTarget]) -> Assessment {
        match self.try_assess(operation, targets) {
            Ok(assessment) => Assessment::Complete(assessment),
            Err(reason) => {
                tracing::warn!("Risk assessment degraded: {}", reason);
                Assessment::Degraded {
                    assessment: conservative_fallback(&reason),
                    reason,
                }
            }
        }
    }

    fn try_assess(
        &self,
        operation: &FileOperation,
        targets: &[FileTarget],
    ) -> std::result::Result<RiskAssessment, String> {
        for target in targets {
            if target.path.as_os_str().is_empty() {
                return Err("target with empty path (unreadable metadata)".to_string());
            }
            if !target.confidence.is_finite() {
                return Err(format!(
                    "target {} has non-finite confidence",
                    target.path.display()
                ));
            }
        }

        let factors = self.identify_factors(operation, targets);
        let score = self.score(&factors);
        let level = level_for_score(score);
        let safety_level = safety_level_for(operation, targets);
        let impact_level = self.impact_level_for(operation, targets);
        let confidence = self.confidence_for(targets, &factors);
        let automatic_approval = self.automatic_approval(level, &factors);
        let mitigation_strategies = mitigation_strategies(&factors);
        let reasoning = reasoning_for(operation, targets, &factors, score, level);

        Ok(RiskAssessment {
            level,
            safety_level,
            impact_level,
            risk_factors: factors,
            mitigation_strategies,
            confidence,
            reasoning,
            automatic_approval,
        })
    }

    /// Identify applicable risk factors. One factor per type, accumulating
    /// every path it applies to.
    fn identify_factors(
        &self,
        operation: &FileOperation,
        targets: &[FileTarget],
    ) -> Vec<RiskFactor> {
        let mut paths_by_type: BTreeMap<u8, (RiskFactorType, Vec<PathBuf>)> = BTreeMap::new();
        let mut add = |factor_type: RiskFactorType, path: Option<&PathBuf>| {
            let entry = paths_by_type
                .entry(factor_order(factor_type))
                .or_insert_with(|| (factor_type, Vec::new()));
            if let Some(p) = path {
                if !entry.1.contains(p) {
                    entry.1.push(p.clone());
                }
            }
        };

        if operation.op_type == OperationType::Delete {
            for target in targets {
                add(RiskFactorType::DeletionOperation, Some(&target.path));
            }
            if targets.is_empty() {
                add(RiskFactorType::DeletionOperation, None);
            }
        }

        for target in targets {
            if fs::is_system_path(&target.path) {
                add(RiskFactorType::SystemFileModification, Some(&target.path));
            }
            if fs::is_config_path(&target.path) {
                add(RiskFactorType::ConfigurationChange, Some(&target.path));
            }
            if fs::is_security_path(&target.path) {
                add(RiskFactorType::SecurityRelatedChanges, Some(&target.path));
            }
            if fs::is_dependency_manifest(&target.path) {
                add(RiskFactorType::DependencyManifestChange, Some(&target.path));
            }
            if fs::is_build_file(&target.path) {
                add(RiskFactorType::BuildSystemChange, Some(&target.path));
            }
            if target
                .size
                .map(|s| s >= self.config.thresholds.large_file_bytes)
                .unwrap_or(false)
            {
                add(RiskFactorType::LargeFileOperation, Some(&target.path));
            }
        }

        if targets.len() > self.config.thresholds.bulk_targets {
            for target in targets {
                add(RiskFactorType::BulkOperation, Some(&target.path));
            }
        }

        paths_by_type
            .into_values()
            .map(|(factor_type, affected_paths)| {
                self.build_factor(operation, factor_type, affected_paths)
            })
            .collect()
    }

    fn build_factor(
        &self,
        operation: &FileOperation,
        factor_type: RiskFactorType,
        affected_paths: Vec<PathBuf>,
    ) -> RiskFactor {
        let is_delete = operation.op_type == OperationType::Delete;
        let (severity, description, mitigation) = match factor_type {
            RiskFactorType::DeletionOperation => (
                Severity::High,
                format!("Operation deletes {} path(s)", affected_paths.len()),
                Some("Create comprehensive backup before operation".to_string()),
            ),
            RiskFactorType::SystemFileModification => (
                if is_delete { Severity::High } else { Severity::Medium },
                "Operation touches system or project-critical files".to_string(),
                Some("Verify system file changes against a known-good copy".to_string()),
            ),
            RiskFactorType::ConfigurationChange => (
                Severity::Medium,
                "Operation modifies configuration files".to_string(),
                Some("Validate configuration syntax after the change".to_string()),
            ),
            RiskFactorType::SecurityRelatedChanges => (
                Severity::High,
                "Operation touches security-sensitive files".to_string(),
                Some("Audit security-related changes manually".to_string()),
            ),
            RiskFactorType::LargeFileOperation => (
                Severity::Medium,
                format!(
                    "Operation touches files at or above {} bytes",
                    self.config.thresholds.large_file_bytes
                ),
                Some("Verify checksums after the operation".to_string()),
            ),
            RiskFactorType::BulkOperation => (
                Severity::Medium,
                format!("Operation affects {} targets at once", affected_paths.len()),
                Some("Apply changes in smaller batches".to_string()),
            ),
            RiskFactorType::DependencyManifestChange => (
                if is_delete { Severity::High } else { Severity::Medium },
                "Operation changes a dependency manifest".to_string(),
                Some("Reinstall dependencies and run the build after applying".to_string()),
            ),
            RiskFactorType::BuildSystemChange => (
                Severity::Medium,
                "Operation changes build-system files".to_string(),
                Some("Run a full build to verify the change".to_string()),
            ),
        };

        RiskFactor {
            factor_type,
            severity,
            description,
            affected_paths,
            mitigation,
        }
    }

    /// Weighted severity score across all factors.
    fn score(&self, factors: &[RiskFactor]) -> f32 {
        factors
            .iter()
            .map(|f| self.config.weights.weight(f.factor_type) * f.severity.multiplier())
            .sum()
    }

    fn impact_level_for(&self, operation: &FileOperation, targets: &[FileTarget]) -> ImpactLevel {
        let count = targets.len();
        if operation.op_type == OperationType::Delete || count > self.config.thresholds.bulk_targets
        {
            ImpactLevel::Major
        } else if operation.op_type == OperationType::Move || count > 5 {
            ImpactLevel::Significant
        } else if count > 2 {
            ImpactLevel::Moderate
        } else {
            ImpactLevel::Minimal
        }
    }

    fn confidence_for(&self, targets: &[FileTarget], factors: &[RiskFactor]) -> f32 {
        let cfg = &self.config.confidence;
        let mut confidence = cfg.base;

        if !targets.is_empty() {
            let unknown = targets.iter().filter(|t| t.language.is_none()).count();
            confidence -= cfg.unknown_type_penalty * unknown as f32 / targets.len() as f32;
        }
        if targets.len() > self.config.thresholds.many_targets {
            confidence -= cfg.many_targets_penalty;
        }
        if !factors.is_empty() {
            let understood = factors
                .iter()
                .filter(|f| f.factor_type.is_well_understood())
                .count();
            confidence += cfg.well_understood_bonus * understood as f32 / factors.len() as f32;
        }

        confidence.clamp(0.0, 1.0)
    }

    fn automatic_approval(&self, level: RiskLevel, factors: &[RiskFactor]) -> bool {
        if level >= RiskLevel::High {
            return false;
        }
        !factors
            .iter()
            .any(|f| f.factor_type.is_blocking() && f.severity == Severity::High)
    }
}

/// Map the weighted score to a risk level. Thresholds are fixed; weights are
/// the tunable part.
fn level_for_score(score: f32) -> RiskLevel {
    if score >= 10.0 {
        RiskLevel::Critical
    } else if score >= 7.0 {
        RiskLevel::High
    } else if score >= 4.0 {
        RiskLevel::Medium
    } else if score >= 2.0 {
        RiskLevel::Low
    } else {
        RiskLevel::Minimal
    }
}

fn safety_level_for(operation: &FileOperation, targets: &[FileTarget]) -> SafetyLevel {
    match operation.op_type {
        OperationType::Delete => SafetyLevel::Dangerous,
        OperationType::Move => SafetyLevel::Risky,
        _ => {
            if targets.iter().any(|t| fs::is_system_path(&t.path)) {
                SafetyLevel::Risky
            } else if targets.iter().any(|t| fs::is_config_path(&t.path)) {
                SafetyLevel::Cautious
            } else {
                SafetyLevel::Safe
            }
        }
    }
}

fn mitigation_strategies(factors: &[RiskFactor]) -> Vec<String> {
    let mut strategies: Vec<String> = GENERIC_STRATEGIES.iter().map(|s| s.to_string()).collect();

    for factor in factors {
        if let Some(m) = &factor.mitigation {
            if !strategies.contains(m) {
                strategies.push(m.clone());
            }
        }
    }

    if factors.iter().any(|f| f.severity == Severity::High) {
        for s in HIGH_SEVERITY_STRATEGIES {
            let s = s.to_string();
            if !strategies.contains(&s) {
                strategies.push(s);
            }
        }
    }

    strategies
}

fn reasoning_for(
    operation: &FileOperation,
    targets: &[FileTarget],
    factors: &[RiskFactor],
    score: f32,
    level: RiskLevel,
) -> String {
    if factors.is_empty() {
        return format!(
            "{:?} operation on {} target(s) matched no risk factors (score 0)",
            operation.op_type,
            targets.len()
        );
    }
    let names: Vec<String> = factors.iter().map(|f| format!("{:?}", f.factor_type)).collect();
    format!(
        "{:?} operation on {} target(s) scored {:.1} ({:?}) from factors: {}",
        operation.op_type,
        targets.len(),
        score,
        level,
        names.join(", ")
    )
}

/// Stable ordering for factor aggregation.
fn factor_order(factor_type: RiskFactorType) -> u8 {
    match factor_type {
        RiskFactorType::DeletionOperation => 0,
        RiskFactorType::SystemFileModification => 1,
        RiskFactorType::SecurityRelatedChanges => 2,
        RiskFactorType::ConfigurationChange => 3,
        RiskFactorType::DependencyManifestChange => 4,
        RiskFactorType::BuildSystemChange => 5,
        RiskFactorType::LargeFileOperation => 6,
        RiskFactorType::BulkOperation => 7,
    }
}

/// Conservative result returned when assessment itself fails.
fn conservative_fallback(reason: &str) -> RiskAssessment {
    RiskAssessment {
        level: RiskLevel::High,
        safety_level: SafetyLevel::Dangerous,
        impact_level: ImpactLevel::Major,
        risk_factors: vec![],
        mitigation_strategies: vec![
            "Create comprehensive backup before operation".to_string(),
            "Require explicit confirmation before execution".to_string(),
        ],
        confidence: 0.05,
        reasoning: format!("Risk assessment failed; treating as dangerous: {}", reason),
        automatic_approval: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn engine() -> RiskEngine {
        RiskEngine::new(SafetyConfig::default())
    }

    fn op(op_type: OperationType, paths: &[&str]) -> (FileOperation, Vec<FileTarget>) {
        let targets: Vec<FileTarget> = paths
            .iter()
            .map(|p| FileTarget::new(PathBuf::from(p), true))
            .collect();
        let operation = FileOperation {
            op_type,
            targets: targets.iter().map(|t| t.path.clone()).collect(),
            description: "test".to_string(),
            estimated_changes: 1,
        };
        (operation, targets)
    }

    #[test]
    fn test_plain_modify_is_minimal_and_auto_approved() {
        let (operation, targets) = op(OperationType::Modify, &["src/main.rs"]);
        let assessment = engine().assess(&operation, &targets).into_assessment();

        assert!(assessment.level <= RiskLevel::Low);
        assert!(assessment.automatic_approval);
        assert_eq!(assessment.safety_level, SafetyLevel::Safe);
    }

    #[test]
    fn test_move_is_always_risky() {
        let (operation, targets) = op(OperationType::Move, &["notes.txt"]);
        let assessment = engine().assess(&operation, &targets).into_assessment();
        assert_eq!(assessment.safety_level, SafetyLevel::Risky);
    }

    #[test]
    fn test_delete_blocks_auto_approval() {
        let (operation, targets) = op(OperationType::Delete, &["scratch.txt"]);
        let assessment = engine().assess(&operation, &targets).into_assessment();

        assert_eq!(assessment.safety_level, SafetyLevel::Dangerous);
        assert!(!assessment.automatic_approval);
    }

    #[test]
    fn test_empty_path_degrades() {
        let (operation, mut targets) = op(OperationType::Modify, &["src/lib.rs"]);
        targets.push(FileTarget::new(PathBuf::new(), false));

        let assessment = engine().assess(&operation, &targets);
        assert!(assessment.is_degraded());
        let fallback = assessment.assessment();
        assert_eq!(fallback.level, RiskLevel::High);
        assert_eq!(fallback.safety_level, SafetyLevel::Dangerous);
        assert!(!fallback.automatic_approval);
        assert!(fallback.confidence < 0.1);
    }

    #[test]
    fn test_bulk_operation_factor() {
        let paths: Vec<String> = (0..12).map(|i| format!("src/file{}.rs", i)).collect();
        let refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
        let (operation, targets) = op(OperationType::Modify, &refs);

        let assessment = engine().assess(&operation, &targets).into_assessment();
        assert!(assessment
            .risk_factors
            .iter()
            .any(|f| f.factor_type == RiskFactorType::BulkOperation));
        assert_eq!(assessment.impact_level, ImpactLevel::Major);
    }

    #[test]
    fn test_confidence_clamped() {
        let (operation, targets) = op(OperationType::Modify, &["a.rs", "b.rs"]);
        let assessment = engine().assess(&operation, &targets).into_assessment();
        assert!((0.0..=1.0).contains(&assessment.confidence));
    }
}
