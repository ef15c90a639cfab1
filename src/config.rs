//! Configuration module for pdfmix.
//!
//! This module holds the validated, normalized configuration that drives a
//! run: which files to read, how to order them, the batch limit, which
//! office backend to use and which post-processing steps to apply.

use anyhow::{Result, bail};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use time::OffsetDateTime;
use time::macros::format_description;

use crate::MixError;
use crate::post::DEFAULT_MIN_CONFIDENCE;

/// Backend used for `.docx` and `.xlsx` inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OfficeBackend {
    /// Built-in plain-text rendering.
    #[default]
    Builtin,
    /// External LibreOffice (`soffice --headless`).
    Soffice,
}

impl FromStr for OfficeBackend {
    type Err = MixError;

    /// Parse an office backend from `"builtin"` or `"soffice"`.
    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "builtin" => Ok(Self::Builtin),
            "soffice" | "libreoffice" => Ok(Self::Soffice),
            _ => Err(MixError::InvalidConfig {
                message: format!("Invalid office backend: {s}. Must be one of: builtin, soffice"),
            }),
        }
    }
}

/// Output file overwrite behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwriteMode {
    /// Prompt the user before overwriting (default).
    #[default]
    Prompt,
    /// Always overwrite without prompting.
    Force,
    /// Never overwrite, error if file exists.
    NoClobber,
}

/// OCR settings.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrSettings {
    /// Tesseract language code, e.g. `eng` or `eng+deu`.
    pub language: String,

    /// Path to the `tesseract` binary.
    pub tesseract: PathBuf,

    /// Minimum word confidence (0-100).
    pub min_confidence: f32,
}

impl OcrSettings {
    /// Settings for `language` with the default binary and threshold.
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            tesseract: PathBuf::from("tesseract"),
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

/// Complete configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Input file paths, in upload order.
    pub inputs: Vec<PathBuf>,

    /// Output PDF file path.
    pub output: PathBuf,

    /// 1-based target position for each input.
    pub order: Option<Vec<usize>>,

    /// Maximum number of files per batch.
    pub max_files: usize,

    /// Backend for office documents.
    pub office_backend: OfficeBackend,

    /// Path to the `soffice` binary.
    pub soffice: PathBuf,

    /// Password for the output PDF.
    pub password: Option<String>,

    /// OCR settings, if OCR was requested.
    pub ocr: Option<OcrSettings>,

    /// Where to write a DOCX export of the output.
    pub export_docx: Option<PathBuf>,

    /// Where to write a JSON batch report.
    pub report: Option<PathBuf>,

    /// Dry run mode - plan without converting or writing.
    pub dry_run: bool,

    /// Verbose output mode.
    pub verbose: bool,

    /// Quiet mode - suppress non-error output.
    pub quiet: bool,

    /// File overwrite behavior.
    pub overwrite_mode: OverwriteMode,
}

impl Config {
    /// Returns a reference to inputs.
    pub fn inputs(&self) -> &[PathBuf] {
        self.inputs.as_ref()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No input files are specified
    /// - Verbose and quiet modes are both enabled
    /// - The batch limit is zero
    /// - The password is empty
    /// - The OCR confidence is outside 0-100
    /// - The output path is also an input, or the DOCX export path
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            bail!("No input files specified");
        }

        if self.verbose && self.quiet {
            bail!("Cannot use both --verbose and --quiet");
        }

        if self.max_files == 0 {
            bail!("Maximum number of files must be at least 1");
        }

        if let Some(password) = &self.password
            && password.is_empty()
        {
            bail!("Password cannot be empty");
        }

        if let Some(ocr) = &self.ocr {
            if ocr.language.trim().is_empty() {
                bail!("OCR language cannot be empty");
            }
            if !(0.0..=100.0).contains(&ocr.min_confidence) {
                bail!(
                    "OCR confidence must be between 0 and 100, got {}",
                    ocr.min_confidence
                );
            }
        }

        for input in &self.inputs {
            if input == &self.output {
                bail!(
                    "Output file cannot be the same as an input file: {}",
                    self.output.display()
                );
            }
        }

        if let Some(export) = &self.export_docx
            && export == &self.output
        {
            bail!(
                "DOCX export cannot overwrite the PDF output: {}",
                export.display()
            );
        }

        Ok(())
    }

    /// Check if output should be displayed.
    ///
    /// Returns false if in quiet mode and not doing a dry run.
    pub fn should_print(&self) -> bool {
        !self.quiet || self.dry_run
    }
}

/// Default output name, `merged_document_<YYYYMMDDHHMM>.pdf`.
pub fn default_output_name(at: OffsetDateTime) -> PathBuf {
    let stamp = at
        .format(format_description!("[year][month][day][hour][minute]"))
        .unwrap_or_default();
    PathBuf::from(format!("merged_document_{stamp}.pdf"))
}

/// Default output name for the current local time.
pub fn default_output_path() -> PathBuf {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    default_output_name(now)
}

/// Whether `path` carries a `.pdf` extension.
pub fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}
