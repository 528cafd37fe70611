//! Safety orchestrator.
//!
//! Ties risk assessment, change preview and checkpointing into one
//! approval -> execute -> rollback state machine per operation. Records are
//! kept in a concurrent registry; callers always receive read-only snapshot
//! clones.

use crate::core::backup::BackupManager;
use crate::core::preview::PreviewEngine;
use crate::core::risk::RiskEngine;
use crate::models::backup::{
    RestoreOptions, RestoreResult, RollbackAction, RollbackPlan, RollbackStep, RollbackStrategy,
};
use crate::models::config::SafetyConfig;
use crate::models::operation::{FileOperation, FileTarget};
use crate::models::preview::FileContent;
use crate::models::record::{OperationRecord, OperationStatus, SafetyEvent};
use crate::Result;
use chrono::Utc;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::path::PathBuf;
use uuid::Uuid;

/// Everything the caller submits for one operation.
#[derive(Debug, Clone)]
pub struct OperationContext {
    /// The requested operation.
    pub operation: FileOperation,
    /// Resolved targets with metadata.
    pub targets: Vec<FileTarget>,
    /// Before/after content per path, from the generation layer.
    pub contents: BTreeMap<PathBuf, FileContent>,
}

/// Coordinates the safety core for guarded operations.
pub struct SafetyOrchestrator {
    risk: RiskEngine,
    preview: PreviewEngine,
    backups: BackupManager,
    records: DashMap<Uuid, OperationRecord>,
}

impl SafetyOrchestrator {
    /// Build an orchestrator over a backup store.
    pub fn new(config: SafetyConfig) -> Result<Self> {
        Ok(Self {
            risk: RiskEngine::new(config.clone()),
            preview: PreviewEngine::new(config.clone()),
            backups: BackupManager::open(config)?,
            records: DashMap::new(),
        })
    }

    /// Direct access to backup primitives, for callers that need
    /// checkpoint/restore without full orchestration.
    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    /// Assess an operation and register it. Auto-approved operations come
    /// back `Approved`; everything else waits as `Pending`.
    pub fn assess_operation(&self, context: OperationContext) -> Result<OperationRecord> {
        let operation_id = Uuid::new_v4();

        let assessment = self.risk.assess(&context.operation, &context.targets);
        if assessment.is_degraded() {
            tracing::warn!(
                "Operation {} assessed with degraded risk engine output",
                operation_id
            );
        }
        let risk_assessment = assessment.into_assessment();

        let change_preview = self
            .preview
            .generate_preview(&context.operation, &context.contents)?;

        let rollback_plan = rollback_skeleton(operation_id, &context.targets);

        let (status, required_approvals) = if risk_assessment.automatic_approval {
            (OperationStatus::Approved, Vec::new())
        } else {
            (OperationStatus::Pending, vec!["user".to_string()])
        };

        let record = OperationRecord {
            operation_id,
            operation: context.operation,
            status,
            risk_assessment,
            change_preview,
            rollback_plan,
            checkpoint_id: None,
            required_approvals,
            approvals: Vec::new(),
            events: vec![SafetyEvent::OperationStarted {
                operation_id,
                ts: Utc::now(),
            }],
        };

        self.records.insert(operation_id, record.clone());
        tracing::info!(
            "Operation {} assessed: {:?}, auto_approval={}",
            operation_id,
            record.risk_assessment.level,
            record.risk_assessment.automatic_approval
        );
        Ok(record)
    }

    /// Record an approval. When every required approver has signed off the
    /// operation becomes `Approved`.
    pub fn approve_operation(&self, id: Uuid, approver: &str) -> Result<OperationRecord> {
        let mut record = self
            .records
            .get_mut(&id)
            .ok_or_else(|| crate::Error::OperationNotFound(id.to_string()))?;

        if record.status != OperationStatus::Pending {
            return Err(invalid_state(&record, "approve"));
        }

        if !record.approvals.iter().any(|a| a == approver) {
            record.approvals.push(approver.to_string());
        }
        record.events.push(SafetyEvent::OperationApproved {
            operation_id: id,
            approver: approver.to_string(),
            ts: Utc::now(),
        });

        let satisfied = record
            .required_approvals
            .iter()
            .all(|req| record.approvals.iter().any(|a| a == req));
        if satisfied {
            record.status = OperationStatus::Approved;
        }

        Ok(record.clone())
    }

    /// Reject a pending operation. Terminal.
    pub fn reject_operation(&self, id: Uuid, reason: &str) -> Result<OperationRecord> {
        let mut record = self
            .records
            .get_mut(&id)
            .ok_or_else(|| crate::Error::OperationNotFound(id.to_string()))?;

        if record.status != OperationStatus::Pending {
            return Err(invalid_state(&record, "reject"));
        }

        record.status = OperationStatus::Rejected;
        record.events.push(SafetyEvent::OperationRejected {
            operation_id: id,
            reason: reason.to_string(),
            ts: Utc::now(),
        });
        Ok(record.clone())
    }

    /// Execute an approved operation.
    ///
    /// A checkpoint over the operation's targets is created immediately
    /// before the mutation callback runs. A failing callback moves the
    /// operation to `Failed` (returned as data, not an error) with the
    /// checkpoint kept for rollback.
    pub async fn execute_operation<F>(&self, id: Uuid, mutation: F) -> Result<OperationRecord>
    where
        F: FnOnce() -> Result<()>,
    {
        // Claim the executing slot without holding the entry across I/O.
        let (targets, label) = {
            let mut record = self
                .records
                .get_mut(&id)
                .ok_or_else(|| crate::Error::OperationNotFound(id.to_string()))?;
            if record.status != OperationStatus::Approved {
                return Err(invalid_state(&record, "execute"));
            }
            record.status = OperationStatus::Executing;
            (
                record.operation.targets.clone(),
                record.operation.description.clone(),
            )
        };

        // Pinned on creation so a store at capacity cannot evict it before
        // the record below references it.
        let checkpoint = self
            .backups
            .create_checkpoint_pinned(&label, &targets, id)
            .await;

        if !checkpoint.success {
            let error = format!(
                "checkpoint creation failed: {}",
                checkpoint.errors.join("; ")
            );
            return self.finish_execution(id, Err(crate::Error::other(error)));
        }

        let checkpoint_id = checkpoint.checkpoint_id;
        if let Some(cp_id) = checkpoint_id {
            if let Some(mut record) = self.records.get_mut(&id) {
                record.checkpoint_id = Some(cp_id);
                if let Some(cp) = self.backups.checkpoint(cp_id) {
                    record.rollback_plan.backups = cp.backups;
                }
                record.events.push(SafetyEvent::CheckpointCreated {
                    operation_id: id,
                    checkpoint_id: cp_id,
                    files_backed_up: checkpoint.files_backed_up,
                    ts: Utc::now(),
                });
            }
        }

        let outcome = mutation();
        self.finish_execution(id, outcome)
    }

    /// Roll an operation back to its checkpoint.
    pub async fn rollback_operation(&self, id: Uuid) -> Result<RestoreResult> {
        let (checkpoint_id, status) = {
            let record = self
                .records
                .get(&id)
                .ok_or_else(|| crate::Error::OperationNotFound(id.to_string()))?;
            (record.checkpoint_id, record.status)
        };

        if !status.can_transition_to(OperationStatus::RolledBack) {
            let record = self
                .records
                .get(&id)
                .ok_or_else(|| crate::Error::OperationNotFound(id.to_string()))?;
            return Err(invalid_state(&record, "rollback"));
        }
        let checkpoint_id =
            checkpoint_id.ok_or_else(|| crate::Error::NoCheckpoint(id.to_string()))?;

        let result = self
            .backups
            .restore_checkpoint(checkpoint_id, RestoreOptions::default())
            .await?;

        if result.success {
            if let Some(mut record) = self.records.get_mut(&id) {
                record.status = OperationStatus::RolledBack;
                record.events.push(SafetyEvent::RollbackCompleted {
                    operation_id: id,
                    restored_files: result.restored_files.len(),
                    ts: Utc::now(),
                });
            }
            self.backups.unpin(checkpoint_id);
            tracing::info!("Operation {} rolled back", id);
        } else {
            tracing::error!(
                "Rollback of operation {} failed: {}",
                id,
                result.errors.join("; ")
            );
        }

        Ok(result)
    }

    /// Current status of an operation.
    pub fn operation_status(&self, id: Uuid) -> Result<OperationStatus> {
        self.records
            .get(&id)
            .map(|r| r.status)
            .ok_or_else(|| crate::Error::OperationNotFound(id.to_string()))
    }

    /// Append-only event log for an operation.
    pub fn safety_events(&self, id: Uuid) -> Result<Vec<SafetyEvent>> {
        self.records
            .get(&id)
            .map(|r| r.events.clone())
            .ok_or_else(|| crate::Error::OperationNotFound(id.to_string()))
    }

    /// Full snapshot of an operation record.
    pub fn operation(&self, id: Uuid) -> Result<OperationRecord> {
        self.records
            .get(&id)
            .map(|r| r.clone())
            .ok_or_else(|| crate::Error::OperationNotFound(id.to_string()))
    }

    /// Record the mutation outcome and emit the matching event.
    fn finish_execution(
        &self,
        id: Uuid,
        outcome: Result<()>,
    ) -> Result<OperationRecord> {
        let mut record = self
            .records
            .get_mut(&id)
            .ok_or_else(|| crate::Error::OperationNotFound(id.to_string()))?;

        match outcome {
            Ok(()) => {
                record.status = OperationStatus::Completed;
                record.events.push(SafetyEvent::OperationCompleted {
                    operation_id: id,
                    ts: Utc::now(),
                });
                tracing::info!("Operation {} completed", id);
            }
            Err(e) => {
                record.status = OperationStatus::Failed;
                record.events.push(SafetyEvent::OperationFailed {
                    operation_id: id,
                    error: e.to_string(),
                    ts: Utc::now(),
                });
                tracing::error!("Operation {} failed: {}", id, e);
            }
        }

        Ok(record.clone())
    }
}

/// Rollback plan skeleton built at assessment time, before any backup
/// exists.
fn rollback_skeleton(operation_id: Uuid, targets: &[FileTarget]) -> RollbackPlan {
    let steps: Vec<RollbackStep> = targets
        .iter()
        .map(|t| RollbackStep {
            action: if t.exists {
                RollbackAction::RestoreFile
            } else {
                RollbackAction::DeleteCreated
            },
            target_path: t.path.clone(),
            automated: true,
        })
        .collect();

    RollbackPlan {
        id: Uuid::new_v4(),
        operation_id,
        strategy: RollbackStrategy::BackupRestore,
        backups: Vec::new(),
        can_auto_rollback: steps.iter().all(|s| s.automated),
        steps,
    }
}

fn invalid_state(record: &OperationRecord, action: &str) -> crate::Error {
    crate::Error::InvalidState {
        id: record.operation_id.to_string(),
        status: record.status.as_str().to_string(),
        action: action.to_string(),
    }
}
