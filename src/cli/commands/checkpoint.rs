//! Checkpoint command implementation.

use crate::core::backup::BackupManager;
use crate::models::config::SafetyConfig;
use crate::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;
use walkdir::WalkDir;

/// Create a checkpoint of the given paths.
pub async fn checkpoint(label: &str, paths: &[PathBuf], config: SafetyConfig) -> Result<()> {
    println!("{}", "[CHECKPOINT] Creating checkpoint...".bold().cyan());
    println!();

    let files = expand_paths(paths);
    println!("  {} {}", "Label:".bold(), label);
    println!("  {} {}", "Files:".bold(), files.len());
    println!();

    let manager = BackupManager::open(config)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("Backing up files...");

    let result = manager
        .create_checkpoint(label, &files, Uuid::new_v4())
        .await;

    spinner.finish_and_clear();

    println!("{}", "[Checkpoint Summary]".bold().green());
    println!("  {} {}", "Files backed up:".bold(), result.files_backed_up);
    if let Some(id) = result.checkpoint_id {
        println!("  {} {}", "Checkpoint ID:".bold(), id);
    }

    if !result.errors.is_empty() {
        println!();
        println!("{}", "[Errors]".bold().red());
        for error in &result.errors {
            println!("  - {}", error);
        }
    }

    if result.success {
        println!();
        println!("{}", "[OK] Checkpoint created".green());
        Ok(())
    } else {
        Err(crate::Error::other("checkpoint creation failed"))
    }
}

/// Expand directories into their contained files.
fn expand_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                files.push(entry.path().to_path_buf());
            }
        } else {
            // Missing paths stay in the list; they become intent backups.
            files.push(path.clone());
        }
    }
    files
}
