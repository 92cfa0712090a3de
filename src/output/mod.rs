//! Output module for run reports and statistics
//!
//! This module handles:
//! - Counting what a run discovered, saved and converted
//! - Generating a markdown report per run
//! - Printing a summary to the terminal

mod markdown;
mod report;
pub mod stats;

pub use markdown::{format_report, report_file_name, write_report};
pub use report::{OutputError, OutputResult, RunReport, RunStatus};
pub use stats::{print_statistics, Statistics};
