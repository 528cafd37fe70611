//! Orchestrator state: per-operation records and events.

use super::backup::RollbackPlan;
use super::operation::FileOperation;
use super::preview::ChangePreview;
use super::risk::RiskAssessment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of one guarded operation.
///
/// Transitions only move forward:
/// pending -> (approved | rejected) -> executing -> (completed | failed)
/// -> rolled_back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Pending,
    Approved,
    Rejected,
    Executing,
    Completed,
    Failed,
    RolledBack,
}

impl OperationStatus {
    /// Whether a transition from `self` to `next` is allowed.
    pub fn can_transition_to(&self, next: OperationStatus) -> bool {
        use OperationStatus::*;
        matches!(
            (self, next),
            (Pending, Approved)
                | (Pending, Rejected)
                | (Approved, Executing)
                | (Executing, Completed)
                | (Executing, Failed)
                | (Completed, RolledBack)
                | (Failed, RolledBack)
        )
    }

    /// States that accept no further transitions at all.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::RolledBack)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Executing => "executing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::RolledBack => "rolled_back",
        }
    }
}

/// Safety event emitted while an operation moves through its lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SafetyEvent {
    OperationStarted {
        operation_id: Uuid,
        ts: DateTime<Utc>,
    },
    OperationApproved {
        operation_id: Uuid,
        approver: String,
        ts: DateTime<Utc>,
    },
    OperationRejected {
        operation_id: Uuid,
        reason: String,
        ts: DateTime<Utc>,
    },
    CheckpointCreated {
        operation_id: Uuid,
        checkpoint_id: Uuid,
        files_backed_up: usize,
        ts: DateTime<Utc>,
    },
    OperationCompleted {
        operation_id: Uuid,
        ts: DateTime<Utc>,
    },
    OperationFailed {
        operation_id: Uuid,
        error: String,
        ts: DateTime<Utc>,
    },
    RollbackCompleted {
        operation_id: Uuid,
        restored_files: usize,
        ts: DateTime<Utc>,
    },
}

/// Full orchestrator record for one operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRecord {
    /// Operation ID.
    pub operation_id: Uuid,
    /// The original request.
    pub operation: FileOperation,
    /// Current lifecycle status.
    pub status: OperationStatus,
    /// Risk assessment computed at submission.
    pub risk_assessment: RiskAssessment,
    /// Change preview computed at submission.
    pub change_preview: ChangePreview,
    /// Rollback plan (skeleton until a checkpoint exists).
    pub rollback_plan: RollbackPlan,
    /// Checkpoint created just before execution, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint_id: Option<Uuid>,
    /// Approvers still required before execution.
    pub required_approvals: Vec<String>,
    /// Approvals received so far.
    pub approvals: Vec<String>,
    /// Append-only event log.
    pub events: Vec<SafetyEvent>,
}
