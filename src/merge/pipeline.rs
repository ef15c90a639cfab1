//! Batch processing: convert every file, append the successes, report all.

use serde::Serialize;
use std::time::{Duration, Instant};

use crate::UploadedFile;
use crate::convert::{ConverterSet, FileKind};
use crate::error::{FailureKind, FileFailure, MixError, Result};
use crate::merge::MergedDocument;
use crate::order::FileOrder;

/// Largest batch accepted by default.
pub const DEFAULT_MAX_FILES: usize = 15;

/// What happened to one file of the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum FileStatus {
    /// Converted and appended.
    Converted {
        /// Pages contributed to the merged document.
        pages: usize,
    },
    /// Skipped because of a per-file failure.
    Failed {
        /// Failure category.
        kind: FailureKind,
        /// Human-readable cause.
        reason: String,
    },
}

/// Outcome of one file, in processing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOutcome {
    /// File name as uploaded.
    pub name: String,
    /// Detected kind, `None` for unsupported extensions.
    pub file_kind: Option<FileKind>,
    /// Success or failure.
    #[serde(flatten)]
    pub status: FileStatus,
}

impl FileOutcome {
    /// Whether this file made it into the merged document.
    pub fn is_success(&self) -> bool {
        matches!(self.status, FileStatus::Converted { .. })
    }

    /// The failure entry, if the file failed.
    pub fn failure(&self) -> Option<FileFailure> {
        match &self.status {
            FileStatus::Converted { .. } => None,
            FileStatus::Failed { kind, reason } => {
                Some(FileFailure::new(self.name.clone(), *kind, reason.clone()))
            }
        }
    }
}

/// Result of processing one batch.
///
/// The merged buffer is present whenever at least one file succeeded.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    outcomes: Vec<FileOutcome>,
    success_count: usize,
    total_count: usize,
    total_pages: usize,
    #[serde(skip)]
    elapsed: Duration,
    #[serde(skip)]
    merged: Option<Vec<u8>>,
}

impl BatchReport {
    /// Per-file outcomes in processing order.
    pub fn outcomes(&self) -> &[FileOutcome] {
        &self.outcomes
    }

    /// Every failed file with its reason.
    pub fn failures(&self) -> Vec<FileFailure> {
        self.outcomes.iter().filter_map(FileOutcome::failure).collect()
    }

    /// Number of files merged.
    pub fn success_count(&self) -> usize {
        self.success_count
    }

    /// Number of files in the batch.
    pub fn total_count(&self) -> usize {
        self.total_count
    }

    /// Pages in the merged document.
    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    /// Wall time spent on the batch.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// True when no file succeeded and there is no output.
    pub fn is_total_failure(&self) -> bool {
        self.merged.is_none()
    }

    /// The merged PDF, if any file succeeded.
    pub fn merged(&self) -> Option<&[u8]> {
        self.merged.as_deref()
    }

    /// Take ownership of the merged PDF.
    pub fn into_merged(self) -> Option<Vec<u8>> {
        self.merged
    }
}

/// Converts and merges batches of uploaded files.
///
/// A pipeline holds no per-batch state; each call to [`Pipeline::process`]
/// owns its own accumulator and report.
pub struct Pipeline {
    converters: ConverterSet,
    max_files: usize,
}

impl Pipeline {
    /// Pipeline with the built-in converters and the default batch limit.
    pub fn new() -> Self {
        Self::with_converters(ConverterSet::new())
    }

    /// Pipeline using a custom converter set.
    pub fn with_converters(converters: ConverterSet) -> Self {
        Self {
            converters,
            max_files: DEFAULT_MAX_FILES,
        }
    }

    /// Change the batch size limit.
    pub fn max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    /// Maximum number of files per batch.
    pub fn file_limit(&self) -> usize {
        self.max_files
    }

    /// Process an already ordered batch.
    ///
    /// Files are converted one after another and every success is appended
    /// to the merged document in order. Failures are recorded in the report
    /// and never stop the remaining files.
    ///
    /// # Errors
    ///
    /// Returns [`MixError::BatchSizeExceeded`] before converting anything if
    /// the batch is larger than the limit. No other error escapes.
    pub fn process(&self, files: &[UploadedFile]) -> Result<BatchReport> {
        if files.len() > self.max_files {
            return Err(MixError::BatchSizeExceeded {
                count: files.len(),
                max: self.max_files,
            });
        }

        let start = Instant::now();
        log::info!("Processing batch of {} file(s)", files.len());

        let mut merged = MergedDocument::new();
        let mut outcomes = Vec::with_capacity(files.len());

        for file in files {
            let file_kind = FileKind::detect(file);
            let status = match self.converters.convert(file) {
                Ok(pdf) => match merged.append(&pdf) {
                    Ok(pages) => {
                        log::debug!("Appended {} ({pages} page(s))", file.name());
                        FileStatus::Converted { pages }
                    }
                    Err(err) => failed(MixError::merge_append(file.name(), err.to_string()).into()),
                },
                Err(failure) => failed(failure),
            };

            if let FileStatus::Failed { kind, reason } = &status {
                log::warn!("Skipping {} ({kind}): {reason}", file.name());
            }

            outcomes.push(FileOutcome {
                name: file.name().to_string(),
                file_kind,
                status,
            });
        }

        let success_count = merged.source_count();
        let total_pages = merged.page_count();
        let merged = match merged.finalize() {
            Ok(buffer) => buffer,
            Err(err) => {
                log::warn!("Failed to finalize merged document: {err}");
                fail_converted(
                    &mut outcomes,
                    &format!("failed to finalize merged document: {err}"),
                );
                None
            }
        };

        let report = BatchReport {
            outcomes,
            success_count: if merged.is_some() { success_count } else { 0 },
            total_count: files.len(),
            total_pages: if merged.is_some() { total_pages } else { 0 },
            elapsed: start.elapsed(),
            merged,
        };

        log::info!(
            "Merged {}/{} file(s) into {} page(s)",
            report.success_count,
            report.total_count,
            report.total_pages
        );

        Ok(report)
    }

    /// Reorder a batch and process it.
    ///
    /// # Errors
    ///
    /// Returns [`MixError::InvalidOrder`] if the order does not cover the
    /// batch, or any error from [`Pipeline::process`].
    pub fn process_with_order(
        &self,
        files: Vec<UploadedFile>,
        order: &FileOrder,
    ) -> Result<BatchReport> {
        let ordered = order.apply(files)?;
        self.process(&ordered)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn failed(failure: FileFailure) -> FileStatus {
    FileStatus::Failed {
        kind: failure.kind,
        reason: failure.reason,
    }
}

/// Mark every appended file as failed once the merged document is lost.
fn fail_converted(outcomes: &mut [FileOutcome], reason: &str) {
    for outcome in outcomes.iter_mut().filter(|o| o.is_success()) {
        outcome.status = FileStatus::Failed {
            kind: FailureKind::MergeAppend,
            reason: reason.to_string(),
        };
    }
}
