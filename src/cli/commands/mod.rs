//! CLI command implementations.

pub mod assess;
pub mod checkpoint;
pub mod init;
pub mod list;
pub mod restore;
