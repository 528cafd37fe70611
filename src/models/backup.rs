//! Backup and rollback data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// What a backup actually stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupKind {
    /// The full original file bytes are stored in the backup store.
    FullFile,
    /// The path did not exist before the operation; rollback deletes it.
    Intent,
}

/// One backed-up file. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Backup {
    /// Unique backup ID.
    pub id: Uuid,
    /// Backup kind.
    pub kind: BackupKind,
    /// Where the copied bytes live in the backup store (full_file only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_path: Option<PathBuf>,
    /// The path this backup protects.
    pub original_path: PathBuf,
    /// Size of the stored bytes.
    pub size_bytes: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// SHA-256 of the stored bytes (full_file only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    /// When this backup becomes eligible for garbage collection.
    pub retention_until: DateTime<Utc>,
    /// Operation this backup was created for.
    pub operation_id: Uuid,
}

/// A checkpoint: the set of backups created immediately before one
/// operation's mutation executes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Checkpoint ID (also names the store directory).
    pub id: Uuid,
    /// Human-readable label.
    pub label: String,
    /// Operation this checkpoint guards.
    pub operation_id: Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Current VCS commit hash, if it could be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_hash: Option<String>,
    /// Backups in this checkpoint.
    pub backups: Vec<Backup>,
}

/// Result of creating a checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointResult {
    /// Whether anything useful was backed up.
    pub success: bool,
    /// ID of the created checkpoint, if one was recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint_id: Option<Uuid>,
    /// Number of backups recorded (full-file and intent).
    pub files_backed_up: usize,
    /// Per-file errors, reported as data.
    pub errors: Vec<String>,
}

/// Result of restoring a checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreResult {
    /// True only when every backup restored cleanly.
    pub success: bool,
    /// Paths restored (or, in a dry run, paths that would be restored).
    pub restored_files: Vec<PathBuf>,
    /// Conflicts detected between checkpoint time and now.
    pub conflicts: Vec<String>,
    /// Per-file restore errors.
    pub errors: Vec<String>,
}

/// Options for a restore.
#[derive(Debug, Clone, Copy, Default)]
pub struct RestoreOptions {
    /// Report conflicts without writing anything.
    pub dry_run: bool,
    /// Overwrite files even when they drifted since the checkpoint.
    pub force_overwrite: bool,
}

/// How a rollback plan undoes an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackStrategy {
    /// Restore files from the checkpoint backups.
    BackupRestore,
    /// Apply inverse operations step by step.
    IncrementalUndo,
}

/// Action taken by one rollback step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackAction {
    /// Overwrite the target with backed-up bytes.
    RestoreFile,
    /// Delete a file that the operation created.
    DeleteCreated,
}

/// One ordered step in a rollback plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackStep {
    /// Action to take.
    pub action: RollbackAction,
    /// Path the action applies to.
    pub target_path: PathBuf,
    /// Whether the step can run without human intervention.
    pub automated: bool,
}

/// The ordered set of restore actions needed to undo one operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackPlan {
    /// Plan ID.
    pub id: Uuid,
    /// Operation this plan undoes.
    pub operation_id: Uuid,
    /// Undo strategy.
    pub strategy: RollbackStrategy,
    /// Backups referenced by the steps (populated once a checkpoint exists).
    pub backups: Vec<Backup>,
    /// Ordered steps.
    pub steps: Vec<RollbackStep>,
    /// Whether every step is automated.
    pub can_auto_rollback: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoint_round_trip_json() {
        let checkpoint = Checkpoint {
            id: Uuid::new_v4(),
            label: "pre-refactor".to_string(),
            operation_id: Uuid::new_v4(),
            created_at: Utc::now(),
            commit_hash: Some("abc123".to_string()),
            backups: vec![],
        };

        let json = serde_json::to_string(&checkpoint).unwrap();
        let loaded: Checkpoint = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.id, checkpoint.id);
        assert_eq!(loaded.label, checkpoint.label);
        assert_eq!(loaded.commit_hash, checkpoint.commit_hash);
    }

    #[test]
    fn test_intent_backup_has_no_stored_path() {
        let backup = Backup {
            id: Uuid::new_v4(),
            kind: BackupKind::Intent,
            stored_path: None,
            original_path: PathBuf::from("/tmp/new.txt"),
            size_bytes: 0,
            created_at: Utc::now(),
            checksum: None,
            retention_until: Utc::now(),
            operation_id: Uuid::new_v4(),
        };

        let json = serde_json::to_string(&backup).unwrap();
        assert!(!json.contains("stored_path"));
        assert!(!json.contains("checksum"));
    }
}
