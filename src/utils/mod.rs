//! Shared utilities.

pub mod fs;
pub mod git;
pub mod hash;
