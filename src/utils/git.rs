//! Best-effort version-control integration.
//!
//! Checkpoints record the current commit hash when the working tree is under
//! git. Every function here is allowed to fail; callers log and continue.

use std::path::Path;
use std::process::Command;

/// Check if a directory is inside a git working tree.
pub fn is_work_tree(dir: &Path) -> bool {
    Command::new("git")
        .args(["rev-parse", "--is-inside-work-tree"])
        .current_dir(dir)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Read the current commit hash, if any.
pub fn current_commit(dir: &Path) -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(dir)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if hash.is_empty() {
        None
    } else {
        Some(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_commit_outside_repo() {
        let dir = tempfile::tempdir().unwrap();
        // A fresh temp dir is not a work tree; lookup must degrade to None.
        assert_eq!(current_commit(dir.path()), None);
    }
}
