//! Change preview data model.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How a file is affected by the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
}

/// Rendered diff for a single file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDiff {
    /// File path.
    pub file_path: PathBuf,
    /// How the file changes.
    pub change_type: ChangeType,
    /// Number of added lines.
    pub additions: usize,
    /// Number of removed lines.
    pub deletions: usize,
    /// Full unified diff text.
    pub diff_text: String,
    /// Whether the file was treated as binary.
    pub is_binary: bool,
    /// Truncated preview of the diff.
    pub preview: String,
}

/// Aggregate counts for a preview.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeSummary {
    /// Total files in the preview.
    pub total_files: usize,
    /// Lines added across all files.
    pub added_lines: usize,
    /// Lines removed across all files.
    pub removed_lines: usize,
    /// Files created by the operation.
    pub new_files: usize,
    /// Files deleted by the operation.
    pub deleted_files: usize,
    /// Files skipped as binary.
    pub binary_files: usize,
}

/// Category of a detected issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    BreakingChange,
    Security,
    Syntax,
}

/// A potential problem detected while scanning the new content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PotentialIssue {
    /// Issue category.
    pub kind: IssueKind,
    /// Affected file.
    pub file_path: PathBuf,
    /// What was detected.
    pub detail: String,
}

/// Full preview of an operation's textual impact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePreview {
    /// Aggregate counts.
    pub summary: ChangeSummary,
    /// Per-file diffs.
    pub diffs: Vec<FileDiff>,
    /// Dependency manifests affected by the change.
    pub affected_dependencies: Vec<PathBuf>,
    /// Detected issues.
    pub potential_issues: Vec<PotentialIssue>,
    /// Generated recommendations.
    pub recommendations: Vec<String>,
}

/// Before/after content for one file, as supplied by the generation layer.
#[derive(Debug, Clone, Default)]
pub struct FileContent {
    /// Content before the operation (None for creations).
    pub before: Option<String>,
    /// Content after the operation (None for deletions).
    pub after: Option<String>,
}

impl FileContent {
    pub fn modified(before: impl Into<String>, after: impl Into<String>) -> Self {
        Self {
            before: Some(before.into()),
            after: Some(after.into()),
        }
    }

    pub fn created(after: impl Into<String>) -> Self {
        Self {
            before: None,
            after: Some(after.into()),
        }
    }

    pub fn deleted(before: impl Into<String>) -> Self {
        Self {
            before: Some(before.into()),
            after: None,
        }
    }
}
