//! Error types for pdfmix.
//!
//! Two layers of failure exist. [`MixError`] is the ordinary error type used
//! by every fallible operation. Per-file problems inside a batch are turned
//! into [`FileFailure`] values and recorded in the batch report instead of
//! being propagated, so one broken upload never stops the rest.
//!
//! # Error Categories
//!
//! - **Per-file errors**: unsupported type, conversion failure, merge append failure
//! - **Batch errors**: too many files, nothing merged
//! - **I/O errors**: missing inputs, unwritable output
//! - **Post-processing errors**: protection, OCR, DOCX export

use serde::Serialize;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for pdfmix operations.
pub type Result<T> = std::result::Result<T, MixError>;

/// Main error type for pdfmix operations.
#[derive(Debug, thiserror::Error)]
pub enum MixError {
    /// The file extension is not one of the recognized types.
    #[error("Unsupported file type '{extension}' for: {name}")]
    UnsupportedType {
        /// Name of the uploaded file.
        name: String,
        /// Lowercased extension that was not recognized.
        extension: String,
    },

    /// A conversion backend failed on a specific file.
    #[error("Failed to convert {name}\n  Reason: {reason}")]
    Conversion {
        /// Name of the uploaded file.
        name: String,
        /// Human-readable cause.
        reason: String,
    },

    /// A converted buffer could not be appended to the merged document.
    #[error("Failed to merge {name}\n  Reason: {reason}")]
    MergeAppend {
        /// Name of the uploaded file.
        name: String,
        /// Human-readable cause.
        reason: String,
    },

    /// The batch holds more files than allowed.
    #[error("Too many files: {count} submitted, at most {max} allowed")]
    BatchSizeExceeded {
        /// Number of files submitted.
        count: usize,
        /// Maximum batch size.
        max: usize,
    },

    /// Every file in the batch failed, so there is no output.
    #[error("None of the {total} file(s) could be converted and merged")]
    NothingMerged {
        /// Number of files in the batch.
        total: usize,
    },

    /// The requested file order is not a permutation of the inputs.
    #[error("Invalid file order: {reason}")]
    InvalidOrder {
        /// What is wrong with the order.
        reason: String,
    },

    /// Input file was not found.
    #[error("File not found: {}", path.display())]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Input path exists but is not a regular file.
    #[error("Not a file: {}", path.display())]
    NotAFile {
        /// Offending path.
        path: PathBuf,
    },

    /// Input file could not be read.
    #[error("Cannot read file: {}\n  Reason: {source}", path.display())]
    FailedToReadInput {
        /// Path to the unreadable file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Output file already exists and overwrite is not allowed.
    #[error(
        "Output file already exists: {}\n  Use --force to overwrite or choose a different output path",
        path.display()
    )]
    OutputExists {
        /// Path to the existing output file.
        path: PathBuf,
    },

    /// Failed to create output file.
    #[error("Failed to create output file: {}\n  Reason: {source}", path.display())]
    FailedToCreateOutput {
        /// Path where output should be created.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to write to output file.
    #[error("Failed to write to output file: {}\n  Reason: {source}", path.display())]
    FailedToWrite {
        /// Path being written to.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Password protection failed.
    #[error("Failed to password-protect the PDF: {reason}")]
    Protection {
        /// Details about the failure.
        reason: String,
    },

    /// OCR overlay failed.
    #[error("OCR failed: {reason}")]
    Ocr {
        /// Details about the failure.
        reason: String,
    },

    /// PDF to DOCX export failed.
    #[error("DOCX export failed: {reason}")]
    Export {
        /// Details about the failure.
        reason: String,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// User cancelled the operation.
    #[error("Operation cancelled by user")]
    Cancelled,

    /// Generic I/O error.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// Generic error with a custom message.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl From<lopdf::Error> for MixError {
    fn from(err: lopdf::Error) -> Self {
        Self::other(err.to_string())
    }
}

impl From<anyhow::Error> for MixError {
    fn from(err: anyhow::Error) -> Self {
        Self::invalid_config(format!("{err:#}"))
    }
}

impl MixError {
    /// Create an UnsupportedType error.
    pub fn unsupported_type(name: impl Into<String>, extension: impl Into<String>) -> Self {
        Self::UnsupportedType {
            name: name.into(),
            extension: extension.into(),
        }
    }

    /// Create a Conversion error.
    pub fn conversion(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Conversion {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a MergeAppend error.
    pub fn merge_append(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MergeAppend {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileNotFound error.
    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    /// Create an OutputExists error.
    pub fn output_exists(path: PathBuf) -> Self {
        Self::OutputExists { path }
    }

    /// Create an InvalidOrder error.
    pub fn invalid_order(reason: impl Into<String>) -> Self {
        Self::InvalidOrder {
            reason: reason.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Check if this error belongs to a single file of a batch.
    ///
    /// Per-file errors are recorded in the batch report and never stop
    /// processing of the remaining files.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedType { .. } | Self::Conversion { .. } | Self::MergeAppend { .. }
        )
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileNotFound { .. } => 2,
            Self::NotAFile { .. } => 2,
            Self::FailedToReadInput { .. } => 2,
            Self::UnsupportedType { .. } => 3,
            Self::Conversion { .. } => 3,
            Self::MergeAppend { .. } => 3,
            Self::NothingMerged { .. } => 3,
            Self::OutputExists { .. } => 4,
            Self::FailedToCreateOutput { .. } => 5,
            Self::FailedToWrite { .. } => 5,
            Self::Io { .. } => 5,
            Self::Protection { .. } => 6,
            Self::Ocr { .. } => 6,
            Self::Export { .. } => 6,
            Self::BatchSizeExceeded { .. } => 1,
            Self::InvalidOrder { .. } => 1,
            Self::InvalidConfig { .. } => 1,
            Self::Other { .. } => 1,
            Self::Cancelled => 130,
        }
    }
}

/// Category of a per-file failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// Extension not recognized.
    UnsupportedType,
    /// Backend failed while converting the file.
    Conversion,
    /// Converted bytes could not be appended to the merged document.
    MergeAppend,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::UnsupportedType => "unsupported type",
            Self::Conversion => "conversion error",
            Self::MergeAppend => "merge error",
        };
        f.write_str(label)
    }
}

/// A per-file failure recorded in a batch report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFailure {
    /// Name of the uploaded file.
    pub name: String,
    /// What kind of failure occurred.
    pub kind: FailureKind,
    /// Human-readable cause.
    pub reason: String,
}

impl FileFailure {
    /// Create a failure entry.
    pub fn new(name: impl Into<String>, kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name, self.kind, self.reason)
    }
}

impl From<MixError> for FileFailure {
    fn from(err: MixError) -> Self {
        match err {
            MixError::UnsupportedType { name, extension } => Self::new(
                name,
                FailureKind::UnsupportedType,
                format!("unsupported type '{extension}'"),
            ),
            MixError::Conversion { name, reason } => {
                Self::new(name, FailureKind::Conversion, reason)
            }
            MixError::MergeAppend { name, reason } => {
                Self::new(name, FailureKind::MergeAppend, reason)
            }
            other => Self::new(String::new(), FailureKind::Conversion, other.to_string()),
        }
    }
}
