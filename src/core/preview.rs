//! Change preview engine.
//!
//! Renders the exact textual impact of an operation before it is applied:
//! per-file unified diffs, aggregate statistics, detected issues and
//! recommendations. Per-file diff failures degrade to a placeholder diff;
//! the whole preview fails only when nothing can be rendered at all.

use crate::core::diff;
use crate::models::config::SafetyConfig;
use crate::models::operation::{FileOperation, Language, OperationType};
use crate::models::preview::{
    ChangePreview, ChangeSummary, ChangeType, FileContent, FileDiff, IssueKind, PotentialIssue,
};
use crate::utils::fs;
use crate::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Change preview engine.
pub struct PreviewEngine {
    config: SafetyConfig,
}

impl PreviewEngine {
    pub fn new(config: SafetyConfig) -> Self {
        Self { config }
    }

    /// Generate a preview for an operation over per-file before/after
    /// content.
    pub fn generate_preview(
        &self,
        operation: &FileOperation,
        contents: &BTreeMap<PathBuf, FileContent>,
    ) -> Result<ChangePreview> {
        if contents.is_empty() {
            return Err(crate::Error::PreviewFailed(
                "no file content supplied for preview".to_string(),
            ));
        }

        let mut summary = ChangeSummary {
            total_files: contents.len(),
            ..Default::default()
        };
        let mut diffs = Vec::new();
        let mut affected_dependencies = Vec::new();
        let mut potential_issues = Vec::new();

        for (path, content) in contents {
            let file_diff = self.diff_file(operation, path, content);

            summary.added_lines += file_diff.additions;
            summary.removed_lines += file_diff.deletions;
            match file_diff.change_type {
                ChangeType::Added => summary.new_files += 1,
                ChangeType::Deleted => summary.deleted_files += 1,
                _ => {}
            }
            if file_diff.is_binary {
                summary.binary_files += 1;
            }

            if fs::is_dependency_manifest(path) {
                affected_dependencies.push(path.clone());
            }

            if !file_diff.is_binary {
                scan_issues(path, content, &mut potential_issues);
            }

            diffs.push(file_diff);
        }

        let recommendations = self.recommendations(
            &summary,
            &diffs,
            &affected_dependencies,
            &potential_issues,
            contents,
        );

        Ok(ChangePreview {
            summary,
            diffs,
            affected_dependencies,
            potential_issues,
            recommendations,
        })
    }

    /// Diff one file. Never fails: unrenderable files get a placeholder.
    fn diff_file(&self, operation: &FileOperation, path: &Path, content: &FileContent) -> FileDiff {
        let change_type = change_type_for(operation, content);

        if fs::is_binary_file(path) {
            return placeholder_diff(path, change_type, true, "binary file");
        }

        let before = content.before.as_deref().unwrap_or("");
        let after = content.after.as_deref().unwrap_or("");

        if before.contains('\u{0}') || after.contains('\u{0}') {
            // Content the caller sent as text but is not renderable.
            return placeholder_diff(path, change_type, true, "unrenderable content");
        }

        let line_diff = diff::diff_lines(before, after, self.config.preview.context_lines);
        let diff_text = diff::render_unified(&line_diff);
        let preview = diff::truncate_preview(&diff_text, self.config.preview.max_preview_lines);

        FileDiff {
            file_path: path.to_path_buf(),
            change_type,
            additions: line_diff.additions,
            deletions: line_diff.deletions,
            diff_text,
            is_binary: false,
            preview,
        }
    }

    fn recommendations(
        &self,
        summary: &ChangeSummary,
        diffs: &[FileDiff],
        affected_dependencies: &[PathBuf],
        issues: &[PotentialIssue],
        contents: &BTreeMap<PathBuf, FileContent>,
    ) -> Vec<String> {
        let mut recommendations = Vec::new();

        let code_changed = contents.keys().any(|p| {
            Language::from_path(p).map(|l| l.is_code()).unwrap_or(false)
        });
        if code_changed {
            recommendations.push("Run the test suite after applying these changes".to_string());
        }

        if !affected_dependencies.is_empty() {
            recommendations
                .push("Reinstall dependencies after the manifest change".to_string());
        }

        let changed_lines = summary.added_lines + summary.removed_lines;
        if changed_lines > self.config.thresholds.large_change_lines {
            recommendations.push(format!(
                "Large change ({} lines); consider applying in smaller batches",
                changed_lines
            ));
        }

        if issues.iter().any(|i| i.kind == IssueKind::Security) {
            recommendations
                .push("Review flagged security issues before approving".to_string());
        }
        if issues.iter().any(|i| i.kind == IssueKind::BreakingChange) {
            recommendations
                .push("Removed exported symbols; check downstream callers".to_string());
        }

        if diffs.iter().any(|d| d.is_binary) {
            recommendations
                .push("Binary files cannot be previewed; verify them manually".to_string());
        }

        recommendations
    }
}

fn change_type_for(operation: &FileOperation, content: &FileContent) -> ChangeType {
    match operation.op_type {
        OperationType::Move => ChangeType::Renamed,
        OperationType::Copy => ChangeType::Copied,
        OperationType::Delete => ChangeType::Deleted,
        OperationType::Create => ChangeType::Added,
        _ => match (&content.before, &content.after) {
            (None, Some(_)) => ChangeType::Added,
            (Some(_), None) => ChangeType::Deleted,
            _ => ChangeType::Modified,
        },
    }
}

fn placeholder_diff(
    path: &Path,
    change_type: ChangeType,
    is_binary: bool,
    reason: &str,
) -> FileDiff {
    let text = format!("({}: {})", reason, path.display());
    FileDiff {
        file_path: path.to_path_buf(),
        change_type,
        additions: 0,
        deletions: 0,
        diff_text: text.clone(),
        is_binary,
        preview: text,
    }
}

/// Scan new content for breaking-change, security and syntax issues.
fn scan_issues(path: &Path, content: &FileContent, issues: &mut Vec<PotentialIssue>) {
    let before = content.before.as_deref().unwrap_or("");
    let after = content.after.as_deref().unwrap_or("");

    // Exported symbols present before but missing after are breaking.
    for symbol in exported_symbols(before) {
        if !after.contains(&symbol) {
            issues.push(PotentialIssue {
                kind: IssueKind::BreakingChange,
                file_path: path.to_path_buf(),
                detail: format!("exported symbol '{}' removed", symbol),
            });
        }
    }

    for detail in security_findings(after) {
        issues.push(PotentialIssue {
            kind: IssueKind::Security,
            file_path: path.to_path_buf(),
            detail,
        });
    }

    if let Some(detail) = bracket_imbalance(after) {
        issues.push(PotentialIssue {
            kind: IssueKind::Syntax,
            file_path: path.to_path_buf(),
            detail,
        });
    }
}

/// Extract exported symbol names from source text.
fn exported_symbols(text: &str) -> Vec<String> {
    const PATTERNS: &[&str] = &[
        r"pub\s+fn\s+([A-Za-z_][A-Za-z0-9_]*)",
        r"pub\s+struct\s+([A-Za-z_][A-Za-z0-9_]*)",
        r"pub\s+enum\s+([A-Za-z_][A-Za-z0-9_]*)",
        r"export\s+(?:default\s+)?(?:async\s+)?function\s+([A-Za-z_$][A-Za-z0-9_$]*)",
        r"export\s+(?:const|let|var|class)\s+([A-Za-z_$][A-Za-z0-9_$]*)",
        r"^def\s+([A-Za-z_][A-Za-z0-9_]*)",
        r"^class\s+([A-Za-z_][A-Za-z0-9_]*)",
    ];

    let mut symbols = Vec::new();
    for pattern in PATTERNS {
        if let Ok(re) = regex::Regex::new(&format!("(?m){}", pattern)) {
            for cap in re.captures_iter(text) {
                if let Some(name) = cap.get(1) {
                    let name = name.as_str().to_string();
                    if !symbols.contains(&name) {
                        symbols.push(name);
                    }
                }
            }
        }
    }
    symbols
}

/// Detect hardcoded secrets and unsafe constructs in new content.
fn security_findings(text: &str) -> Vec<String> {
    const PATTERNS: &[(&str, &str)] = &[
        (
            r#"(?i)(api[_-]?key|secret|password|token)\s*[:=]\s*["'][^"']{8,}["']"#,
            "possible hardcoded credential",
        ),
        (
            r"-----BEGIN (?:RSA |EC |OPENSSH )?PRIVATE KEY-----",
            "embedded private key",
        ),
        (r"\beval\s*\(", "dynamic eval call"),
        (r"child_process|subprocess\.call|os\.system", "shell execution from code"),
        (r"\bunsafe\s*\{", "unsafe block"),
    ];

    let mut findings = Vec::new();
    for (pattern, label) in PATTERNS {
        if let Ok(re) = regex::Regex::new(pattern) {
            if re.is_match(text) {
                findings.push((*label).to_string());
            }
        }
    }
    findings
}

/// Cheap unmatched-bracket heuristic over new content. Ignores string and
/// comment context on purpose; it only has to flag gross imbalance.
fn bracket_imbalance(text: &str) -> Option<String> {
    let mut braces = 0i64;
    let mut parens = 0i64;
    let mut brackets = 0i64;

    for ch in text.chars() {
        match ch {
            '{' => braces += 1,
            '}' => braces -= 1,
            '(' => parens += 1,
            ')' => parens -= 1,
            '[' => brackets += 1,
            ']' => brackets -= 1,
            _ => {}
        }
    }

    if braces != 0 {
        Some(format!("unbalanced braces ({:+})", braces))
    } else if parens != 0 {
        Some(format!("unbalanced parentheses ({:+})", parens))
    } else if brackets != 0 {
        Some(format!("unbalanced square brackets ({:+})", brackets))
    } else {
        None
    }
}
