//! Markdown run report generation
//!
//! This module renders a run report as Markdown and writes it to a uniquely
//! named file in the report directory.

use crate::output::report::{OutputError, OutputResult, RunReport};
use std::path::{Path, PathBuf};

/// Writes a run report into `directory`
///
/// The file is named `{date}_mirror_{unique}.md`, so reports of concurrent or
/// repeated runs never overwrite each other.
///
/// # Arguments
///
/// * `report` - The run report
/// * `directory` - Report directory; created if missing
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the written report
/// * `Err(OutputError)` - Failed to write the report
pub fn write_report(report: &RunReport, directory: &Path) -> OutputResult<PathBuf> {
    std::fs::create_dir_all(directory).map_err(|source| OutputError::Write {
        path: directory.display().to_string(),
        source,
    })?;

    let path = directory.join(report_file_name(report));
    std::fs::write(&path, format_report(report)).map_err(|source| OutputError::Write {
        path: path.display().to_string(),
        source,
    })?;

    Ok(path)
}

/// `{YYYY-MM-DD}_mirror_{unique}.md`
pub fn report_file_name(report: &RunReport) -> String {
    let nanos = report
        .started_at
        .timestamp_nanos_opt()
        .unwrap_or_else(|| report.started_at.timestamp());
    format!(
        "{}_mirror_{:x}{:x}.md",
        report.started_at.format("%Y-%m-%d"),
        nanos,
        std::process::id()
    )
}

/// Formats a run report as markdown
///
/// # Arguments
///
/// * `report` - The run report
///
/// # Returns
///
/// A formatted markdown string
pub fn format_report(report: &RunReport) -> String {
    let mut md = String::new();

    // Title
    md.push_str("# Sumi-Mirror Run Report\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Request**: {}\n", report.request));
    md.push_str(&format!(
        "- **Started**: {}\n",
        report.started_at.format("%Y-%m-%d %H:%M:%S %:z")
    ));
    md.push_str(&format!(
        "- **Elapsed**: {:.3} seconds\n",
        report.elapsed.as_secs_f64()
    ));
    md.push_str(&format!("- **Status**: {}\n", report.status));
    if report.cancelled {
        md.push_str("- **Cancelled**: yes\n");
    }
    md.push_str(&format!("- **Mirror Root**: {}\n", report.mirror_root));
    if let Some(hash) = &report.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    if let Some(error) = &report.error {
        md.push_str(&format!("- **Error**: {}\n", error));
    }
    md.push('\n');

    // Counters
    md.push_str("## Statistics\n\n");
    md.push_str("| Counter | Value |\n");
    md.push_str("|---------|-------|\n");
    for (label, value) in report.statistics.entries() {
        md.push_str(&format!("| {} | {} |\n", label, value));
    }

    md
}
