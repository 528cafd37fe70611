//! Core safety engines.

pub mod backup;
pub mod diff;
pub mod orchestrator;
pub mod preview;
pub mod risk;
