//! Configuration model.

use crate::models::risk::RiskFactorType;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level safety configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// Risk scoring weights.
    pub weights: RiskWeights,
    /// Detection thresholds.
    pub thresholds: Thresholds,
    /// Confidence tuning.
    pub confidence: ConfidenceConfig,
    /// Backup store settings.
    pub backup: BackupConfig,
    /// Preview rendering settings.
    pub preview: PreviewConfig,
}

/// Per-factor-type scoring weights. These are configuration, not logic:
/// operators tune them without touching the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskWeights {
    pub system_file_modification: f32,
    pub configuration_change: f32,
    pub security_related_changes: f32,
    pub large_file_operation: f32,
    pub bulk_operation: f32,
    pub deletion_operation: f32,
    pub dependency_manifest_change: f32,
    pub build_system_change: f32,
}

impl RiskWeights {
    /// Weight for a factor type. Exhaustive so new factor types are
    /// compile-time-checked additions.
    pub fn weight(&self, factor_type: RiskFactorType) -> f32 {
        match factor_type {
            RiskFactorType::SystemFileModification => self.system_file_modification,
            RiskFactorType::ConfigurationChange => self.configuration_change,
            RiskFactorType::SecurityRelatedChanges => self.security_related_changes,
            RiskFactorType::LargeFileOperation => self.large_file_operation,
            RiskFactorType::BulkOperation => self.bulk_operation,
            RiskFactorType::DeletionOperation => self.deletion_operation,
            RiskFactorType::DependencyManifestChange => self.dependency_manifest_change,
            RiskFactorType::BuildSystemChange => self.build_system_change,
        }
    }
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            system_file_modification: 1.0,
            configuration_change: 0.75,
            security_related_changes: 1.5,
            large_file_operation: 0.5,
            bulk_operation: 0.75,
            deletion_operation: 1.5,
            dependency_manifest_change: 0.5,
            build_system_change: 0.5,
        }
    }
}

/// Thresholds used by factor predicates and impact classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thresholds {
    /// Files at or above this size count as large.
    pub large_file_bytes: u64,
    /// Target counts above this count as a bulk operation.
    pub bulk_targets: usize,
    /// Target counts above this lower the assessment confidence
    /// (unclear scope).
    pub many_targets: usize,
    /// Total changed lines above this trigger the smaller-batches
    /// recommendation.
    pub large_change_lines: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            large_file_bytes: 1024 * 1024,
            bulk_targets: 10,
            many_targets: 20,
            large_change_lines: 500,
        }
    }
}

/// Confidence arithmetic constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceConfig {
    /// Starting confidence.
    pub base: f32,
    /// Penalty scaled by the fraction of targets with unknown language.
    pub unknown_type_penalty: f32,
    /// Flat penalty when the target count exceeds `many_targets`.
    pub many_targets_penalty: f32,
    /// Bonus scaled by the fraction of well-understood risk factors.
    pub well_understood_bonus: f32,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            base: 0.8,
            unknown_type_penalty: 0.2,
            many_targets_penalty: 0.1,
            well_understood_bonus: 0.15,
        }
    }
}

/// Backup store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Root directory of the backup store.
    pub backup_dir: PathBuf,
    /// Hours a checkpoint is retained before becoming GC-eligible.
    pub retention_hours: i64,
    /// Maximum retained checkpoints; oldest are evicted beyond this.
    pub max_checkpoints: usize,
    /// Bounded concurrency for per-file backup copies.
    pub concurrency: usize,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            backup_dir: dirs_data_path().join("checkpoints"),
            retention_hours: 24 * 7,
            max_checkpoints: 50,
            concurrency: 4,
        }
    }
}

/// Preview rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Context lines around each hunk.
    pub context_lines: usize,
    /// Maximum lines in the truncated preview text.
    pub max_preview_lines: usize,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            context_lines: 3,
            max_preview_lines: 40,
        }
    }
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            weights: RiskWeights::default(),
            thresholds: Thresholds::default(),
            confidence: ConfidenceConfig::default(),
            backup: BackupConfig::default(),
            preview: PreviewConfig::default(),
        }
    }
}

/// Get the configuration directory path.
fn dirs_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("opguard")
}

/// Get the data directory path (backup store default location).
fn dirs_data_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("opguard")
}

/// Load configuration from file, falling back to defaults.
pub fn load_config() -> SafetyConfig {
    let config_path = dirs_config_path().join("config.toml");

    if config_path.exists() {
        match std::fs::read_to_string(&config_path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Invalid config file, using defaults: {}", e);
                }
            },
            Err(e) => {
                tracing::warn!("Cannot read config file, using defaults: {}", e);
            }
        }
    }

    SafetyConfig::default()
}

/// Save configuration to file.
pub fn save_config(config: &SafetyConfig) -> crate::Result<()> {
    let config_dir = dirs_config_path();
    std::fs::create_dir_all(&config_dir)?;

    let content = toml::to_string_pretty(config)
        .map_err(|e| crate::Error::InvalidConfig(e.to_string()))?;
    std::fs::write(config_dir.join("config.toml"), content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_cover_all_factor_types() {
        let weights = RiskWeights::default();
        assert_eq!(weights.weight(RiskFactorType::DeletionOperation), 1.5);
        assert_eq!(weights.weight(RiskFactorType::SystemFileModification), 1.0);
        assert_eq!(weights.weight(RiskFactorType::LargeFileOperation), 0.5);
    }

    #[test]
    fn test_config_toml_round_trip() {
        let config = SafetyConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let loaded: SafetyConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(loaded.backup.max_checkpoints, config.backup.max_checkpoints);
        assert_eq!(
            loaded.weights.deletion_operation,
            config.weights.deletion_operation
        );
    }
}
