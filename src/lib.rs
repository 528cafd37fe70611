//! Opguard Library
//!
//! The trust boundary between an automated change-generation process and the
//! user's file system: risk-scores, previews, checkpoints and rolls back
//! mutating file operations.

pub mod cli;
pub mod core;
pub mod error;
pub mod models;
pub mod utils;

pub use error::{Error, Result};
