//! Restore command implementation.

use crate::core::backup::BackupManager;
use crate::models::backup::RestoreOptions;
use crate::models::config::SafetyConfig;
use crate::Result;
use colored::Colorize;
use uuid::Uuid;

/// Restore a checkpoint by id.
pub async fn restore(
    checkpoint_id: &str,
    dry_run: bool,
    force: bool,
    config: SafetyConfig,
) -> Result<()> {
    if dry_run {
        println!("{}", "[DRY-RUN] No changes will be made".bold().yellow());
    } else {
        println!("{}", "[RESTORE] Restoring checkpoint...".bold().cyan());
    }
    println!();

    let id = Uuid::parse_str(checkpoint_id)
        .map_err(|_| crate::Error::CheckpointNotFound(checkpoint_id.to_string()))?;

    let manager = BackupManager::open(config)?;
    let result = manager
        .restore_checkpoint(
            id,
            RestoreOptions {
                dry_run,
                force_overwrite: force,
            },
        )
        .await?;

    if !result.conflicts.is_empty() {
        println!("{}", "[Conflicts]".bold().yellow());
        for conflict in &result.conflicts {
            println!("  - {}", conflict);
        }
        println!();
    }

    println!("{}", "[Restore Summary]".bold().green());
    if dry_run {
        // Dry runs write nothing; conflicts are the files a real restore
        // would touch.
        println!("  {} {}", "Would restore:".bold(), result.conflicts.len());
    } else {
        println!("  {} {}", "Restored:".bold(), result.restored_files.len());
    }
    println!("  {} {}", "Errors:".bold(), result.errors.len());

    if !result.errors.is_empty() {
        println!();
        println!("{}", "[Errors]".bold().red());
        for error in &result.errors {
            println!("  - {}", error);
        }
        return Err(crate::Error::other("restore completed with errors"));
    }

    println!();
    if dry_run {
        println!("{}", "[OK] Dry run complete - no changes were made".green());
    } else {
        println!("{}", "[OK] Checkpoint restored".green());
    }
    Ok(())
}
