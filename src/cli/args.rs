//! Command line argument definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Opguard - assess, checkpoint and roll back agent file operations
#[derive(Parser, Debug)]
#[command(name = "opguard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Risk-score and preview an operation described in a JSON file
    Assess {
        /// Path to the operation description JSON
        #[arg(value_name = "OPERATION_FILE")]
        operation_file: PathBuf,
    },

    /// Create a checkpoint of the given paths
    Checkpoint {
        /// Label for the checkpoint
        #[arg(value_name = "LABEL")]
        label: String,

        /// Files or directories to back up (directories are expanded)
        #[arg(value_name = "PATHS", required = true)]
        paths: Vec<PathBuf>,
    },

    /// Restore a checkpoint
    Restore {
        /// Checkpoint ID
        #[arg(value_name = "CHECKPOINT_ID")]
        checkpoint_id: String,

        /// Dry run - report conflicts without writing
        #[arg(long)]
        dry_run: bool,

        /// Overwrite files even when they already match the checkpoint
        #[arg(long)]
        force: bool,
    },

    /// List retained checkpoints
    List,

    /// Remove checkpoints past their retention deadline
    Gc,

    /// Write the default configuration file
    Init,
}
