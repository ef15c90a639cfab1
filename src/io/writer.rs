//! Output writing.
//!
//! Writes are atomic: bytes go to a sibling temporary file which is renamed
//! over the destination once fully flushed, so an interrupted run never
//! leaves a truncated PDF behind.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task;

use crate::error::{MixError, Result};

/// Statistics about a write operation.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Time taken to write the file.
    pub write_time: Duration,

    /// Size of the written file in bytes.
    pub file_size: u64,

    /// Path where the file was written.
    pub output_path: PathBuf,
}

impl WriteStatistics {
    /// Format file size as human-readable string.
    pub fn format_file_size(&self) -> String {
        crate::utils::format_file_size(self.file_size)
    }
}

/// Writes finished buffers to disk.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    atomic: bool,
}

impl OutputWriter {
    /// Create a writer using atomic writes.
    pub fn new() -> Self {
        Self { atomic: true }
    }

    /// Create a writer that writes the destination directly.
    pub fn non_atomic() -> Self {
        Self { atomic: false }
    }

    /// Write `bytes` to `path` and return statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Output directory doesn't exist
    /// - Insufficient permissions
    /// - Disk full
    pub async fn write(&self, bytes: Vec<u8>, path: &Path) -> Result<WriteStatistics> {
        let path_buf = path.to_path_buf();
        let atomic = self.atomic;

        task::spawn_blocking(move || {
            let start = Instant::now();

            let write_path = if atomic {
                temp_path_for(&path_buf)
            } else {
                path_buf.clone()
            };

            let file = std::fs::File::create(&write_path).map_err(|e| {
                MixError::FailedToCreateOutput {
                    path: write_path.clone(),
                    source: e,
                }
            })?;

            let mut writer = std::io::BufWriter::new(file);
            writer
                .write_all(&bytes)
                .and_then(|()| writer.flush())
                .map_err(|e| MixError::FailedToWrite {
                    path: write_path.clone(),
                    source: e,
                })?;
            drop(writer);

            if atomic {
                std::fs::rename(&write_path, &path_buf).map_err(|e| {
                    let _ = std::fs::remove_file(&write_path);
                    MixError::FailedToWrite {
                        path: path_buf.clone(),
                        source: e,
                    }
                })?;
            }

            Ok::<_, MixError>(WriteStatistics {
                write_time: start.elapsed(),
                file_size: bytes.len() as u64,
                output_path: path_buf,
            })
        })
        .await
        .map_err(|e| MixError::other(format!("Write task failed: {e}")))?
    }

    /// Check if output file exists.
    pub async fn exists(&self, path: &Path) -> bool {
        tokio::fs::metadata(path).await.is_ok()
    }
}

impl Default for OutputWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// `out.pdf` becomes `out.pdf.tmp` in the same directory.
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
