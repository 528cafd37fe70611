//! Data models.

pub mod backup;
pub mod config;
pub mod operation;
pub mod preview;
pub mod record;
pub mod risk;
