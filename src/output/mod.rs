//! Output formatting and display for pdfmix.
//!
//! This module handles all user-facing output:
//! - Formatted status messages
//! - The dry-run plan
//! - Per-file outcomes and the batch summary
//!
//! # Examples
//!
//! ```no_run
//! use pdfmix::output::OutputFormatter;
//! use pdfmix::config::Config;
//!
//! # fn example(config: Config) {
//! let formatter = OutputFormatter::from_config(&config);
//! formatter.info("Starting conversion");
//! formatter.success("Merge completed successfully");
//! # }
//! ```

pub mod formatter;

pub use formatter::{MessageLevel, OutputFormatter};

use crate::UploadedFile;
use crate::convert::FileKind;
use crate::io::WriteStatistics;
use crate::merge::{BatchReport, FileStatus};

/// One line of the dry-run plan.
pub fn plan_line(file: &UploadedFile) -> String {
    match FileKind::detect(file) {
        Some(kind) => format!("{} ({kind})", file.name()),
        None => format!("{} (unsupported, will be skipped)", file.name()),
    }
}

/// Display the order in which files would be converted.
pub fn display_plan(formatter: &OutputFormatter, files: &[UploadedFile]) {
    formatter.section("Merge plan:");
    for (idx, file) in files.iter().enumerate() {
        formatter.list_item(idx + 1, &plan_line(file));
    }
}

/// Summary line for a batch.
pub fn summary_line(report: &BatchReport) -> String {
    format!(
        "Merged {} of {} file(s) into {} page(s)",
        report.success_count(),
        report.total_count(),
        report.total_pages()
    )
}

/// Display per-file outcomes and the batch summary.
///
/// Failures are always shown; successes only in verbose mode.
pub fn display_batch_report(formatter: &OutputFormatter, report: &BatchReport) {
    for outcome in report.outcomes() {
        match &outcome.status {
            FileStatus::Converted { pages } => {
                formatter.debug(&format!("{}: {pages} page(s)", outcome.name));
            }
            FileStatus::Failed { kind, reason } => {
                formatter.warning(&format!("Skipped {} ({kind}): {reason}", outcome.name));
            }
        }
    }

    formatter.detail("Time", &format!("{:.2?}", report.elapsed()));

    if report.is_total_failure() {
        formatter.error(&format!(
            "None of the {} file(s) could be merged",
            report.total_count()
        ));
    } else if report.failures().is_empty() {
        formatter.success(&summary_line(report));
    } else {
        formatter.warning(&summary_line(report));
    }
}

/// Display where a file was written.
pub fn display_write_statistics(formatter: &OutputFormatter, stats: &WriteStatistics) {
    formatter.success(&format!(
        "Wrote {} ({})",
        stats.output_path.display(),
        stats.format_file_size()
    ));
    formatter.detail("Write time", &format!("{:.2?}", stats.write_time));
}
