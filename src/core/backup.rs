//! Backup and rollback manager.
//!
//! Persists checkpoints to a backup store, restores them, and expires old
//! ones. Store layout: one directory per checkpoint containing path-mirrored
//! file copies under `files/` and a `checkpoint.json` metadata sidecar.

use crate::models::backup::{
    Backup, BackupKind, Checkpoint, CheckpointResult, RestoreOptions, RestoreResult,
};
use crate::models::config::SafetyConfig;
use crate::utils::{fs as fsutil, git, hash};
use crate::Result;
use chrono::{Duration, Utc};
use dashmap::{DashMap, DashSet};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use uuid::Uuid;

const SIDECAR_NAME: &str = "checkpoint.json";
const FILES_DIR: &str = "files";

/// Stateful checkpoint/backup manager.
pub struct BackupManager {
    config: SafetyConfig,
    /// Checkpoint registry. Locked per entry only, never across an
    /// operation.
    registry: DashMap<Uuid, Checkpoint>,
    /// Checkpoints referenced by operations that have not been rolled back.
    /// Pinned checkpoints are never evicted.
    pinned: DashSet<Uuid>,
}

impl BackupManager {
    /// Open the backup store, rebuilding the registry from sidecar files.
    pub fn open(config: SafetyConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.backup.backup_dir)?;

        let registry = DashMap::new();
        for entry in std::fs::read_dir(&config.backup.backup_dir)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let sidecar = entry.path().join(SIDECAR_NAME);
            if !sidecar.exists() {
                continue;
            }
            match load_sidecar(&sidecar) {
                Ok(checkpoint) => {
                    registry.insert(checkpoint.id, checkpoint);
                }
                Err(e) => {
                    tracing::warn!("Skipping unreadable checkpoint {:?}: {}", sidecar, e);
                }
            }
        }

        Ok(Self {
            config,
            registry,
            pinned: DashSet::new(),
        })
    }

    /// Create a checkpoint for a set of paths.
    ///
    /// Existing files are copied into the store with a checksum; missing
    /// paths are recorded as intent backups (rollback deletes them). A
    /// per-file failure is recorded without aborting sibling backups.
    pub async fn create_checkpoint(
        &self,
        label: &str,
        paths: &[PathBuf],
        operation_id: Uuid,
    ) -> CheckpointResult {
        self.create_checkpoint_inner(label, paths, operation_id, false)
            .await
    }

    /// Create a checkpoint that starts out pinned.
    ///
    /// The pin lands before capacity eviction runs, so a store at capacity
    /// cannot evict the new checkpoint before the owning operation records
    /// its id.
    pub async fn create_checkpoint_pinned(
        &self,
        label: &str,
        paths: &[PathBuf],
        operation_id: Uuid,
    ) -> CheckpointResult {
        self.create_checkpoint_inner(label, paths, operation_id, true)
            .await
    }

    async fn create_checkpoint_inner(
        &self,
        label: &str,
        paths: &[PathBuf],
        operation_id: Uuid,
        pin: bool,
    ) -> CheckpointResult {
        let checkpoint_id = Uuid::new_v4();
        let files_dir = self
            .config
            .backup
            .backup_dir
            .join(checkpoint_id.to_string())
            .join(FILES_DIR);
        let retention_until =
            Utc::now() + Duration::hours(self.config.backup.retention_hours);

        // Back up files with bounded concurrency. A failing file never
        // cancels its in-flight siblings; every result is collected.
        let outcomes: Vec<std::result::Result<Backup, String>> = stream::iter(paths.to_vec())
            .map(|path| {
                let files_dir = files_dir.clone();
                async move {
                    tokio::task::spawn_blocking(move || {
                        backup_one(&path, &files_dir, operation_id, retention_until)
                    })
                    .await
                    .unwrap_or_else(|e| Err(format!("backup task panicked: {}", e)))
                }
            })
            .buffer_unordered(self.config.backup.concurrency.max(1))
            .collect()
            .await;

        let mut backups = Vec::new();
        let mut errors = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(backup) => backups.push(backup),
                Err(e) => errors.push(e),
            }
        }

        if backups.is_empty() && !errors.is_empty() {
            // Total failure: nothing was preserved.
            return CheckpointResult {
                success: false,
                checkpoint_id: None,
                files_backed_up: 0,
                errors,
            };
        }

        let commit_hash = self.read_commit_hash();
        let checkpoint = Checkpoint {
            id: checkpoint_id,
            label: label.to_string(),
            operation_id,
            created_at: Utc::now(),
            commit_hash,
            backups,
        };

        if let Err(e) = self.persist(&checkpoint) {
            errors.push(format!("failed to persist checkpoint metadata: {}", e));
            return CheckpointResult {
                success: false,
                checkpoint_id: None,
                files_backed_up: 0,
                errors,
            };
        }

        let files_backed_up = checkpoint.backups.len();
        if pin {
            self.pinned.insert(checkpoint_id);
        }
        self.registry.insert(checkpoint_id, checkpoint);
        self.evict_over_capacity();

        CheckpointResult {
            success: true,
            checkpoint_id: Some(checkpoint_id),
            files_backed_up,
            errors,
        }
    }

    /// Restore a checkpoint.
    ///
    /// Dry run reports conflicts between checkpoint time and the current
    /// file state without writing. A real restore overwrites drifted files
    /// (deleting intent-backed paths) and verifies each restored file's
    /// checksum. Already-matching files are skipped unless `force_overwrite`
    /// is set, which makes repeated restores naturally idempotent.
    pub async fn restore_checkpoint(
        &self,
        checkpoint_id: Uuid,
        options: RestoreOptions,
    ) -> Result<RestoreResult> {
        // Snapshot the checkpoint; no registry lock is held during I/O.
        let checkpoint = self
            .registry
            .get(&checkpoint_id)
            .map(|c| c.clone())
            .ok_or_else(|| crate::Error::CheckpointNotFound(checkpoint_id.to_string()))?;

        let mut result = RestoreResult {
            success: true,
            restored_files: Vec::new(),
            conflicts: Vec::new(),
            errors: Vec::new(),
        };

        for backup in &checkpoint.backups {
            let backup = backup.clone();
            let force = options.force_overwrite;
            let dry_run = options.dry_run;
            let outcome = tokio::task::spawn_blocking(move || {
                restore_one(&backup, dry_run, force)
            })
            .await
            .unwrap_or_else(|e| FileRestore::Error(format!("restore task panicked: {}", e)));

            match outcome {
                FileRestore::Restored(path) => result.restored_files.push(path),
                FileRestore::Skipped => {}
                FileRestore::Conflict(msg) => result.conflicts.push(msg),
                FileRestore::ConflictAndRestored(msg, path) => {
                    result.conflicts.push(msg);
                    result.restored_files.push(path);
                }
                FileRestore::Error(e) => result.errors.push(e),
            }
        }

        result.success = result.errors.is_empty();
        if result.success && !options.dry_run {
            tracing::info!(
                "Restored checkpoint {} ({} files)",
                checkpoint_id,
                result.restored_files.len()
            );
        }
        Ok(result)
    }

    /// All checkpoints, oldest first.
    pub fn checkpoints(&self) -> Vec<Checkpoint> {
        let mut list: Vec<Checkpoint> =
            self.registry.iter().map(|e| e.value().clone()).collect();
        list.sort_by_key(|c| c.created_at);
        list
    }

    /// Read one checkpoint by id.
    pub fn checkpoint(&self, id: Uuid) -> Option<Checkpoint> {
        self.registry.get(&id).map(|c| c.clone())
    }

    /// Pin a checkpoint so eviction and GC leave it alone.
    pub fn pin(&self, id: Uuid) {
        self.pinned.insert(id);
    }

    /// Release a pinned checkpoint.
    pub fn unpin(&self, id: Uuid) {
        self.pinned.remove(&id);
    }

    /// Remove checkpoints past their retention deadline. Pinned checkpoints
    /// survive regardless of age.
    pub fn prune_expired(&self) -> usize {
        let now = Utc::now();
        let retention = Duration::hours(self.config.backup.retention_hours);
        let expired: Vec<Uuid> = self
            .registry
            .iter()
            .filter(|e| {
                if self.pinned.contains(e.key()) {
                    return false;
                }
                let checkpoint = e.value();
                if checkpoint.backups.is_empty() {
                    // No per-backup deadlines to consult; age the
                    // checkpoint itself.
                    checkpoint.created_at + retention < now
                } else {
                    checkpoint.backups.iter().all(|b| b.retention_until < now)
                }
            })
            .map(|e| *e.key())
            .collect();

        for id in &expired {
            self.remove_checkpoint(*id);
        }
        expired.len()
    }

    /// Evict oldest checkpoints while over the configured maximum.
    fn evict_over_capacity(&self) {
        while self.registry.len() > self.config.backup.max_checkpoints {
            let oldest = self
                .registry
                .iter()
                .filter(|e| !self.pinned.contains(e.key()))
                .min_by_key(|e| e.value().created_at)
                .map(|e| *e.key());

            match oldest {
                Some(id) => self.remove_checkpoint(id),
                None => break, // everything left is pinned
            }
        }
    }

    fn remove_checkpoint(&self, id: Uuid) {
        if self.registry.remove(&id).is_some() {
            let dir = self.config.backup.backup_dir.join(id.to_string());
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                tracing::warn!("Failed to remove checkpoint directory {:?}: {}", dir, e);
            }
            tracing::debug!("Evicted checkpoint {}", id);
        }
    }

    /// Best-effort VCS integration: failure is logged, never fatal.
    fn read_commit_hash(&self) -> Option<String> {
        let cwd = std::env::current_dir().ok()?;
        if !git::is_work_tree(&cwd) {
            return None;
        }
        match git::current_commit(&cwd) {
            Some(hash) => Some(hash),
            None => {
                tracing::warn!("Working tree detected but commit hash unreadable");
                None
            }
        }
    }

    fn persist(&self, checkpoint: &Checkpoint) -> Result<()> {
        let dir = self
            .config
            .backup
            .backup_dir
            .join(checkpoint.id.to_string());
        std::fs::create_dir_all(&dir)?;
        let json = serde_json::to_string_pretty(checkpoint)?;
        std::fs::write(dir.join(SIDECAR_NAME), json)?;
        Ok(())
    }
}

/// Back up a single path. Runs on the blocking pool.
fn backup_one(
    path: &Path,
    files_dir: &Path,
    operation_id: Uuid,
    retention_until: chrono::DateTime<Utc>,
) -> std::result::Result<Backup, String> {
    if !path.exists() {
        // Expected for creates: rollback of an intent backup deletes the
        // path the operation produced.
        return Ok(Backup {
            id: Uuid::new_v4(),
            kind: BackupKind::Intent,
            stored_path: None,
            original_path: path.to_path_buf(),
            size_bytes: 0,
            created_at: Utc::now(),
            checksum: None,
            retention_until,
            operation_id,
        });
    }

    if path.is_dir() {
        return Err(format!(
            "{}: directories must be expanded to files before backup",
            path.display()
        ));
    }

    // One read of the source: the checksum covers the original bytes, not
    // the copy.
    let bytes = std::fs::read(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let checksum = hash::sha256_bytes(&bytes);

    let stored_path = files_dir.join(mirror_path(path));
    if let Some(parent) = stored_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("{}: {}", parent.display(), e))?;
    }
    std::fs::write(&stored_path, &bytes)
        .map_err(|e| format!("{}: {}", stored_path.display(), e))?;

    Ok(Backup {
        id: Uuid::new_v4(),
        kind: BackupKind::FullFile,
        stored_path: Some(stored_path),
        original_path: path.to_path_buf(),
        size_bytes: bytes.len() as u64,
        created_at: Utc::now(),
        checksum: Some(checksum),
        retention_until,
        operation_id,
    })
}

/// Outcome of restoring one backup.
enum FileRestore {
    Restored(PathBuf),
    Skipped,
    Conflict(String),
    ConflictAndRestored(String, PathBuf),
    Error(String),
}

/// Restore a single backup. Runs on the blocking pool.
fn restore_one(backup: &Backup, dry_run: bool, force: bool) -> FileRestore {
    let target = &backup.original_path;

    match backup.kind {
        BackupKind::Intent => {
            if !target.exists() {
                // Nothing to undo; repeated restores land here.
                return FileRestore::Skipped;
            }
            let conflict = format!(
                "{}: created by the operation, will be deleted",
                target.display()
            );
            if dry_run {
                return FileRestore::Conflict(conflict);
            }
            match std::fs::remove_file(target) {
                Ok(()) => FileRestore::ConflictAndRestored(conflict, target.clone()),
                Err(e) => FileRestore::Error(format!("{}: {}", target.display(), e)),
            }
        }
        BackupKind::FullFile => {
            let stored = match &backup.stored_path {
                Some(p) => p,
                None => {
                    return FileRestore::Error(format!(
                        "{}: full-file backup has no stored bytes",
                        target.display()
                    ))
                }
            };
            let expected = backup.checksum.as_deref().unwrap_or_default();

            // Compare current state to checkpoint time.
            let mut conflict = None;
            if !target.exists() {
                conflict = Some(format!(
                    "{}: missing, will be recreated",
                    target.display()
                ));
            } else {
                match hash::sha256_file(target) {
                    Ok(current) if current == expected => {
                        if !force {
                            // Already at checkpoint state.
                            return FileRestore::Skipped;
                        }
                    }
                    Ok(_) => {
                        conflict = Some(format!(
                            "{}: modified since checkpoint, will be overwritten",
                            target.display()
                        ));
                    }
                    Err(e) => {
                        return FileRestore::Error(format!(
                            "{}: cannot read current state: {}",
                            target.display(),
                            e
                        ));
                    }
                }
            }

            if dry_run {
                return match conflict {
                    Some(c) => FileRestore::Conflict(c),
                    None => FileRestore::Skipped,
                };
            }

            if let Err(e) = fsutil::copy_file(stored, target) {
                return FileRestore::Error(format!("{}: {}", target.display(), e));
            }

            // Verify integrity after the write.
            match hash::sha256_file(target) {
                Ok(actual) if actual == expected => match conflict {
                    Some(c) => FileRestore::ConflictAndRestored(c, target.clone()),
                    None => FileRestore::Restored(target.clone()),
                },
                Ok(actual) => FileRestore::Error(
                    crate::Error::ChecksumMismatch {
                        path: target.display().to_string(),
                        expected: expected.to_string(),
                        actual,
                    }
                    .to_string(),
                ),
                Err(e) => FileRestore::Error(format!(
                    "{}: verification failed: {}",
                    target.display(),
                    e
                )),
            }
        }
    }
}

/// Mirror an absolute or relative path under the checkpoint files dir.
fn mirror_path(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| matches!(c, std::path::Component::Normal(_)))
        .collect()
}

fn load_sidecar(path: &Path) -> Result<Checkpoint> {
    let content = std::fs::read_to_string(path)?;
    let checkpoint: Checkpoint = serde_json::from_str(&content)
        .map_err(|e| crate::Error::InvalidCheckpoint(e.to_string()))?;
    Ok(checkpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_path_strips_root() {
        assert_eq!(
            mirror_path(Path::new("/home/user/file.txt")),
            PathBuf::from("home/user/file.txt")
        );
        assert_eq!(
            mirror_path(Path::new("rel/file.txt")),
            PathBuf::from("rel/file.txt")
        );
        assert_eq!(
            mirror_path(Path::new("../escape.txt")),
            PathBuf::from("escape.txt")
        );
    }
}
