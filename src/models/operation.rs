//! File operation request model.
//!
//! These types are produced by the intent/router layer that sits in front of
//! the safety core. The core treats them as read-only input.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Kind of mutating file operation requested by an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Create,
    Modify,
    Delete,
    Move,
    Copy,
    Refactor,
    Test,
}

/// A requested file operation, immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOperation {
    /// Operation type.
    #[serde(rename = "type")]
    pub op_type: OperationType,
    /// Paths the operation intends to touch.
    pub targets: Vec<PathBuf>,
    /// Human-readable description of the intent.
    pub description: String,
    /// Rough number of changes the agent expects to make.
    #[serde(default)]
    pub estimated_changes: u32,
}

/// A resolved target for an operation, with metadata gathered by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileTarget {
    /// Target path.
    pub path: PathBuf,
    /// Whether the path currently exists.
    pub exists: bool,
    /// File size in bytes, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Detected language, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    /// Resolver confidence that this target is correct (0.0-1.0).
    pub confidence: f32,
    /// Why the resolver selected this target.
    pub reason: String,
}

impl FileTarget {
    /// Build a target for a path, detecting language from the extension.
    pub fn new(path: impl Into<PathBuf>, exists: bool) -> Self {
        let path = path.into();
        let language = Language::from_path(&path);
        Self {
            path,
            exists,
            size: None,
            language,
            confidence: 1.0,
            reason: String::new(),
        }
    }
}

/// Source language detected from a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Rust,
    JavaScript,
    TypeScript,
    Python,
    Go,
    Java,
    C,
    Cpp,
    Shell,
    Markdown,
    Json,
    Yaml,
    Toml,
}

impl Language {
    /// Detect a language from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        let lang = match ext.as_str() {
            "rs" => Self::Rust,
            "js" | "mjs" | "cjs" | "jsx" => Self::JavaScript,
            "ts" | "tsx" => Self::TypeScript,
            "py" => Self::Python,
            "go" => Self::Go,
            "java" => Self::Java,
            "c" | "h" => Self::C,
            "cc" | "cpp" | "hpp" | "cxx" => Self::Cpp,
            "sh" | "bash" => Self::Shell,
            "md" => Self::Markdown,
            "json" => Self::Json,
            "yml" | "yaml" => Self::Yaml,
            "toml" => Self::Toml,
            _ => return None,
        };
        Some(lang)
    }

    /// Whether this language is executable source code (as opposed to
    /// markup or configuration).
    pub fn is_code(&self) -> bool {
        !matches!(
            self,
            Self::Markdown | Self::Json | Self::Yaml | Self::Toml
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_language_detection() {
        assert_eq!(
            Language::from_path(&PathBuf::from("src/main.rs")),
            Some(Language::Rust)
        );
        assert_eq!(
            Language::from_path(&PathBuf::from("app.TSX")),
            Some(Language::TypeScript)
        );
        assert_eq!(Language::from_path(&PathBuf::from("README")), None);
    }

    #[test]
    fn test_code_vs_markup() {
        assert!(Language::Rust.is_code());
        assert!(!Language::Markdown.is_code());
        assert!(!Language::Toml.is_code());
    }

    #[test]
    fn test_target_detects_language() {
        let target = FileTarget::new("lib/util.py", true);
        assert_eq!(target.language, Some(Language::Python));
        assert!(target.exists);
    }
}
