//! List and garbage-collect checkpoints.

use crate::core::backup::BackupManager;
use crate::models::config::SafetyConfig;
use crate::Result;
use colored::Colorize;

/// List retained checkpoints, oldest first.
pub async fn list(config: SafetyConfig) -> Result<()> {
    println!("{}", "[Checkpoints]".bold().cyan());
    println!();

    let manager = BackupManager::open(config)?;
    let checkpoints = manager.checkpoints();

    if checkpoints.is_empty() {
        println!("No checkpoints found.");
        return Ok(());
    }

    println!(
        "{:<38} {:<22} {:<8} {}",
        "ID".bold(),
        "Created".bold(),
        "Files".bold(),
        "Label".bold()
    );
    println!("{}", "-".repeat(90));

    for cp in checkpoints {
        println!(
            "{:<38} {:<22} {:<8} {}",
            cp.id,
            cp.created_at.format("%Y-%m-%d %H:%M:%S"),
            cp.backups.len(),
            cp.label
        );
    }

    Ok(())
}

/// Remove checkpoints past their retention deadline.
pub async fn gc(config: SafetyConfig) -> Result<()> {
    println!("{}", "[GC] Pruning expired checkpoints...".bold().cyan());

    let manager = BackupManager::open(config)?;
    let removed = manager.prune_expired();

    println!();
    println!("  {} {}", "Removed:".bold(), removed);
    println!("{}", "[OK] Done".green());
    Ok(())
}
