//! Assess command implementation.
//!
//! Reads an operation description from JSON, gathers target metadata and
//! current file content, then prints the risk assessment and change preview.

use crate::core::preview::PreviewEngine;
use crate::core::risk::RiskEngine;
use crate::models::config::SafetyConfig;
use crate::models::operation::{FileOperation, FileTarget, OperationType};
use crate::models::preview::FileContent;
use crate::models::risk::SafetyLevel;
use crate::Result;
use colored::Colorize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Assess an operation described in a JSON file.
pub async fn assess(operation_file: &Path, config: SafetyConfig) -> Result<()> {
    println!("{}", "[ASSESS] Assessing operation...".bold().cyan());
    println!();

    if !operation_file.exists() {
        return Err(crate::Error::PathNotFound(
            operation_file.display().to_string(),
        ));
    }

    let content = std::fs::read_to_string(operation_file)?;
    let operation: FileOperation = serde_json::from_str(&content)?;

    let targets = resolve_targets(&operation);
    let contents = gather_contents(&operation);

    let risk_engine = RiskEngine::new(config.clone());
    let assessment = risk_engine.assess(&operation, &targets);
    if assessment.is_degraded() {
        println!(
            "{}",
            "[WARNING] Assessment degraded to conservative fallback"
                .bold()
                .yellow()
        );
    }
    let assessment = assessment.into_assessment();

    println!("{}", "[Risk Assessment]".bold().green());
    println!("  {} {:?}", "Level:".bold(), assessment.level);
    let safety = format!("{:?}", assessment.safety_level);
    let safety = match assessment.safety_level {
        SafetyLevel::Safe => safety.green(),
        SafetyLevel::Cautious => safety.yellow(),
        _ => safety.red(),
    };
    println!("  {} {}", "Safety:".bold(), safety);
    println!("  {} {:?}", "Impact:".bold(), assessment.impact_level);
    println!("  {} {:.2}", "Confidence:".bold(), assessment.confidence);
    println!(
        "  {} {}",
        "Auto-approval:".bold(),
        assessment.automatic_approval
    );
    println!("  {} {}", "Reasoning:".bold(), assessment.reasoning);

    if !assessment.risk_factors.is_empty() {
        println!();
        println!("{}", "[Risk Factors]".bold().yellow());
        for factor in &assessment.risk_factors {
            println!(
                "  - {:?} ({:?}): {}",
                factor.factor_type, factor.severity, factor.description
            );
        }
    }

    if !assessment.mitigation_strategies.is_empty() {
        println!();
        println!("{}", "[Mitigations]".bold());
        for strategy in &assessment.mitigation_strategies {
            println!("  - {}", strategy);
        }
    }

    if !contents.is_empty() {
        let preview_engine = PreviewEngine::new(config);
        let preview = preview_engine.generate_preview(&operation, &contents)?;

        println!();
        println!("{}", "[Change Preview]".bold().green());
        println!(
            "  {} files, +{} -{} lines, {} new, {} deleted, {} binary",
            preview.summary.total_files,
            preview.summary.added_lines,
            preview.summary.removed_lines,
            preview.summary.new_files,
            preview.summary.deleted_files,
            preview.summary.binary_files
        );
        for diff in &preview.diffs {
            println!();
            println!("  {} {}", "---".bold(), diff.file_path.display());
            for line in diff.preview.lines() {
                println!("  {}", line);
            }
        }
        if !preview.recommendations.is_empty() {
            println!();
            println!("{}", "[Recommendations]".bold());
            for rec in &preview.recommendations {
                println!("  - {}", rec);
            }
        }
    }

    Ok(())
}

/// Resolve operation paths into targets with on-disk metadata.
fn resolve_targets(operation: &FileOperation) -> Vec<FileTarget> {
    operation
        .targets
        .iter()
        .map(|path| {
            let exists = path.exists();
            let mut target = FileTarget::new(path.clone(), exists);
            if exists {
                target.size = std::fs::metadata(path).map(|m| m.len()).ok();
            }
            target.reason = "listed in operation description".to_string();
            target
        })
        .collect()
}

/// Build a content map from the current disk state. Without generated
/// content the preview shows what a delete removes and flags issues in
/// what already exists.
fn gather_contents(operation: &FileOperation) -> BTreeMap<PathBuf, FileContent> {
    let mut contents = BTreeMap::new();
    for path in &operation.targets {
        let before = std::fs::read_to_string(path).ok();
        let content = match operation.op_type {
            OperationType::Delete => FileContent {
                after: None,
                before,
            },
            _ => FileContent {
                after: before.clone(),
                before,
            },
        };
        contents.insert(path.clone(), content);
    }
    contents
}
