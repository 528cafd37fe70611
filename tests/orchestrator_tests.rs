//! Integration tests for the safety orchestrator.
//!
//! Tests cover:
//! - Auto-approval and execution flow
//! - Failure handling and rollback availability
//! - Approval gating and terminal states

use opguard::core::orchestrator::{OperationContext, SafetyOrchestrator};
use opguard::models::config::SafetyConfig;
use opguard::models::operation::{FileOperation, FileTarget, OperationType};
use opguard::models::preview::FileContent;
use opguard::models::record::{OperationStatus, SafetyEvent};
use opguard::Error;
use std::collections::BTreeMap;
use std::path::Path;
use tempfile::TempDir;

fn orchestrator(store: &Path) -> SafetyOrchestrator {
    let mut config = SafetyConfig::default();
    config.backup.backup_dir = store.to_path_buf();
    SafetyOrchestrator::new(config).unwrap()
}

/// A modify operation over one existing file.
fn modify_context(path: &Path, before: &str, after: &str) -> OperationContext {
    let mut contents = BTreeMap::new();
    contents.insert(path.to_path_buf(), FileContent::modified(before, after));
    OperationContext {
        operation: FileOperation {
            op_type: OperationType::Modify,
            targets: vec![path.to_path_buf()],
            description: "update file".to_string(),
            estimated_changes: 1,
        },
        targets: vec![FileTarget::new(path.to_path_buf(), true)],
        contents,
    }
}

/// A delete operation, which is never auto-approved.
fn delete_context(path: &Path, before: &str) -> OperationContext {
    let mut contents = BTreeMap::new();
    contents.insert(path.to_path_buf(), FileContent::deleted(before));
    OperationContext {
        operation: FileOperation {
            op_type: OperationType::Delete,
            targets: vec![path.to_path_buf()],
            description: "remove file".to_string(),
            estimated_changes: 1,
        },
        targets: vec![FileTarget::new(path.to_path_buf(), true)],
        contents,
    }
}

// ========== HAPPY PATH ==========

#[tokio::test]
async fn test_auto_approved_execute_completes() {
    let workspace = TempDir::new().unwrap();
    let store = TempDir::new().unwrap();
    let orch = orchestrator(store.path());

    let file = workspace.path().join("src_main.rs");
    std::fs::write(&file, "fn main() {}\n").unwrap();

    let record = orch
        .assess_operation(modify_context(&file, "fn main() {}\n", "fn main() { run(); }\n"))
        .unwrap();
    assert_eq!(record.status, OperationStatus::Approved);
    assert!(record.required_approvals.is_empty());

    let id = record.operation_id;
    let target = file.clone();
    let record = orch
        .execute_operation(id, move || {
            std::fs::write(&target, "fn main() { run(); }\n")?;
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(record.status, OperationStatus::Completed);
    assert!(record.checkpoint_id.is_some());

    let events = orch.safety_events(id).unwrap();
    assert!(events
        .iter()
        .any(|e| matches!(e, SafetyEvent::OperationStarted { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, SafetyEvent::CheckpointCreated { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, SafetyEvent::OperationCompleted { .. })));
}

// ========== FAILURE AND ROLLBACK ==========

#[tokio::test]
async fn test_failing_callback_leaves_checkpoint_for_rollback() {
    let workspace = TempDir::new().unwrap();
    let store = TempDir::new().unwrap();
    let orch = orchestrator(store.path());

    let file = workspace.path().join("config_rs.rs");
    std::fs::write(&file, "original\n").unwrap();

    let record = orch
        .assess_operation(modify_context(&file, "original\n", "changed\n"))
        .unwrap();
    let id = record.operation_id;

    let target = file.clone();
    let record = orch
        .execute_operation(id, move || {
            // Half-applied mutation, then failure.
            std::fs::write(&target, "partially changed\n")?;
            Err(Error::other("generation layer crashed"))
        })
        .await
        .unwrap();

    assert_eq!(record.status, OperationStatus::Failed);
    assert!(record.checkpoint_id.is_some());

    let events = orch.safety_events(id).unwrap();
    let failed_events: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, SafetyEvent::OperationFailed { .. }))
        .collect();
    assert_eq!(failed_events.len(), 1);

    // Rollback restores the pre-execution bytes.
    let restore = orch.rollback_operation(id).await.unwrap();
    assert!(restore.success);
    assert_eq!(std::fs::read_to_string(&file).unwrap(), "original\n");
    assert_eq!(
        orch.operation_status(id).unwrap(),
        OperationStatus::RolledBack
    );
}

#[tokio::test]
async fn test_rollback_without_checkpoint_fails() {
    let workspace = TempDir::new().unwrap();
    let store = TempDir::new().unwrap();
    let orch = orchestrator(store.path());

    let file = workspace.path().join("never_run.txt");
    std::fs::write(&file, "content\n").unwrap();

    let record = orch
        .assess_operation(modify_context(&file, "content\n", "new\n"))
        .unwrap();

    // Approved but never executed: no checkpoint, nothing to roll back.
    let result = orch.rollback_operation(record.operation_id).await;
    assert!(result.is_err());
}

// ========== APPROVAL GATING ==========

#[tokio::test]
async fn test_delete_requires_user_approval() {
    let workspace = TempDir::new().unwrap();
    let store = TempDir::new().unwrap();
    let orch = orchestrator(store.path());

    let file = workspace.path().join("doomed.txt");
    std::fs::write(&file, "bye\n").unwrap();

    let record = orch.assess_operation(delete_context(&file, "bye\n")).unwrap();
    assert_eq!(record.status, OperationStatus::Pending);
    assert_eq!(record.required_approvals, vec!["user".to_string()]);
    let id = record.operation_id;

    // Executing before approval is an invalid state transition.
    let result = orch.execute_operation(id, || Ok(())).await;
    assert!(matches!(result, Err(Error::InvalidState { .. })));

    let record = orch.approve_operation(id, "user").unwrap();
    assert_eq!(record.status, OperationStatus::Approved);

    let target = file.clone();
    let record = orch
        .execute_operation(id, move || {
            std::fs::remove_file(&target)?;
            Ok(())
        })
        .await
        .unwrap();
    assert_eq!(record.status, OperationStatus::Completed);
    assert!(!file.exists());

    // Rollback from completed resurrects the file.
    let restore = orch.rollback_operation(id).await.unwrap();
    assert!(restore.success);
    assert_eq!(std::fs::read_to_string(&file).unwrap(), "bye\n");
}

#[tokio::test]
async fn test_rejected_operation_is_terminal() {
    let workspace = TempDir::new().unwrap();
    let store = TempDir::new().unwrap();
    let orch = orchestrator(store.path());

    let file = workspace.path().join("kept.txt");
    std::fs::write(&file, "safe\n").unwrap();

    let record = orch.assess_operation(delete_context(&file, "safe\n")).unwrap();
    let id = record.operation_id;

    let record = orch.reject_operation(id, "too risky").unwrap();
    assert_eq!(record.status, OperationStatus::Rejected);

    assert!(matches!(
        orch.approve_operation(id, "user"),
        Err(Error::InvalidState { .. })
    ));
    assert!(matches!(
        orch.execute_operation(id, || Ok(())).await,
        Err(Error::InvalidState { .. })
    ));
}

// ========== TERMINAL STATES ==========

#[tokio::test]
async fn test_double_rollback_fails() {
    let workspace = TempDir::new().unwrap();
    let store = TempDir::new().unwrap();
    let orch = orchestrator(store.path());

    let file = workspace.path().join("twice.txt");
    std::fs::write(&file, "v1\n").unwrap();

    let record = orch
        .assess_operation(modify_context(&file, "v1\n", "v2\n"))
        .unwrap();
    let id = record.operation_id;

    let target = file.clone();
    orch.execute_operation(id, move || {
        std::fs::write(&target, "v2\n")?;
        Ok(())
    })
    .await
    .unwrap();

    let restore = orch.rollback_operation(id).await.unwrap();
    assert!(restore.success);

    let again = orch.rollback_operation(id).await;
    assert!(matches!(again, Err(Error::InvalidState { .. })));
}

#[tokio::test]
async fn test_execute_on_completed_fails() {
    let workspace = TempDir::new().unwrap();
    let store = TempDir::new().unwrap();
    let orch = orchestrator(store.path());

    let file = workspace.path().join("once.txt");
    std::fs::write(&file, "a\n").unwrap();

    let record = orch
        .assess_operation(modify_context(&file, "a\n", "b\n"))
        .unwrap();
    let id = record.operation_id;

    orch.execute_operation(id, || Ok(())).await.unwrap();

    let again = orch.execute_operation(id, || Ok(())).await;
    assert!(matches!(again, Err(Error::InvalidState { .. })));

    // Unknown ids are a distinct error.
    let missing = orch.operation_status(uuid::Uuid::new_v4());
    assert!(matches!(missing, Err(Error::OperationNotFound(_))));
}
