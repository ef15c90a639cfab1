//! Reading input files into uploaded files.
//!
//! The reader is the stand-in for an upload form: every path becomes an
//! [`UploadedFile`] named after the path's file name. Missing or unreadable
//! inputs are fatal here, since they never reached the batch.
//!
//! # Examples
//!
//! ```no_run
//! use pdfmix::io::InputReader;
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let reader = InputReader::new();
//! let paths = vec![PathBuf::from("a.pdf"), PathBuf::from("scan.png")];
//! let (files, stats) = reader.read_all(&paths).await?;
//! println!("Read {} files ({} bytes)", files.len(), stats.total_size);
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::UploadedFile;
use crate::error::{MixError, Result};

/// Statistics for reading a batch of inputs.
#[derive(Debug, Clone, Default)]
pub struct ReadStatistics {
    /// Number of files read.
    pub file_count: usize,

    /// Total size of all inputs in bytes.
    pub total_size: u64,

    /// Time spent reading.
    pub read_time: Duration,
}

impl ReadStatistics {
    /// Format total size as human-readable string.
    pub fn format_total_size(&self) -> String {
        crate::utils::format_file_size(self.total_size)
    }
}

/// Reads input paths from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputReader;

impl InputReader {
    /// Create a new input reader.
    pub fn new() -> Self {
        Self
    }

    /// Read one file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The path does not exist
    /// - The path is not a regular file
    /// - The file cannot be read
    pub async fn read(&self, path: &Path) -> Result<UploadedFile> {
        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MixError::file_not_found(path.to_path_buf())
            } else {
                MixError::FailedToReadInput {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        if !metadata.is_file() {
            return Err(MixError::NotAFile {
                path: path.to_path_buf(),
            });
        }

        let content = tokio::fs::read(path)
            .await
            .map_err(|e| MixError::FailedToReadInput {
                path: path.to_path_buf(),
                source: e,
            })?;

        log::debug!("Read {} ({} bytes)", path.display(), content.len());

        Ok(UploadedFile::new(display_name(path), content))
    }

    /// Read every path in order, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first error from [`InputReader::read`].
    pub async fn read_all(&self, paths: &[PathBuf]) -> Result<(Vec<UploadedFile>, ReadStatistics)> {
        let start = Instant::now();
        let mut files = Vec::with_capacity(paths.len());

        for path in paths {
            files.push(self.read(path).await?);
        }

        let stats = ReadStatistics {
            file_count: files.len(),
            total_size: files.iter().map(|f| f.len() as u64).sum(),
            read_time: start.elapsed(),
        };

        Ok((files, stats))
    }
}

/// Name used for reporting: the final path component.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
