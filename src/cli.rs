//! CLI argument parsing for pdfmix.
//!
//! This module defines the command-line interface structure using `clap`.
//! It handles argument parsing, validation, and help text generation.
//!
//! # Examples
//!
//! ```no_run
//! use pdfmix::cli::Cli;
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! println!("Merging {} files", cli.inputs.len());
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::{Config, OcrSettings, OfficeBackend, OverwriteMode, default_output_path};
use crate::error::{MixError, Result};
use crate::merge::DEFAULT_MAX_FILES;
use crate::order::OrderSpec;
use crate::post::DEFAULT_MIN_CONFIDENCE;
use crate::utils::collect_paths_for_patterns;

/// Convert documents, spreadsheets and images to PDF and merge them.
///
/// pdfmix accepts PDF, Word (.docx), Excel (.xlsx) and image (.png, .jpg,
/// .jpeg) files, converts each to PDF and concatenates them into a single
/// document. Files that cannot be converted are reported and skipped.
#[derive(Parser, Debug)]
#[command(name = "pdfmix")]
#[command(version)]
#[command(about = "Convert and merge documents into a single PDF", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Input files to convert and merge (in order)
    ///
    /// Specify multiple files or use glob patterns.
    /// Supported types: pdf, docx, xlsx, png, jpg, jpeg.
    ///
    /// Examples:
    ///   pdfmix cover.docx scans/*.jpg totals.xlsx -o report.pdf
    #[arg(required = true, value_name = "FILE")]
    pub inputs: Vec<String>,

    /// Output PDF file path
    ///
    /// Defaults to merged_document_<YYYYMMDDHHMM>.pdf in the current
    /// directory.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Target position of each input, 1-based and comma separated
    ///
    /// Must list every position from 1 to the number of inputs exactly once.
    /// With inputs A B C, "--order 3,1,2" merges B, C, A.
    #[arg(long, value_name = "POSITIONS")]
    pub order: Option<String>,

    /// Maximum number of files in one batch
    #[arg(long, value_name = "N", env = "PDFMIX_MAX_FILES", default_value_t = DEFAULT_MAX_FILES)]
    pub max_files: usize,

    /// Backend for .docx and .xlsx files
    ///
    /// - builtin: plain-text rendering, no external tools (default)
    /// - soffice: LibreOffice in headless mode, keeps formatting
    #[arg(long, value_name = "BACKEND", default_value = "builtin")]
    #[arg(value_parser = ["builtin", "soffice"])]
    pub office_backend: String,

    /// Path to the LibreOffice binary
    #[arg(long, value_name = "PATH", env = "PDFMIX_SOFFICE", default_value = "soffice")]
    pub soffice: PathBuf,

    /// Protect the output with a password
    #[arg(long, value_name = "TEXT", env = "PDFMIX_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Add an invisible OCR text layer using this tesseract language
    ///
    /// Example: --ocr eng, --ocr eng+deu
    #[arg(long, value_name = "LANG")]
    pub ocr: Option<String>,

    /// Path to the tesseract binary
    #[arg(long, value_name = "PATH", env = "PDFMIX_TESSERACT", default_value = "tesseract")]
    pub tesseract: PathBuf,

    /// Minimum OCR word confidence (0-100)
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MIN_CONFIDENCE)]
    pub min_confidence: f32,

    /// Also write the merged document as DOCX
    #[arg(long, value_name = "FILE")]
    pub export_docx: Option<PathBuf>,

    /// Write a JSON report of per-file outcomes
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Dry run - show the merge plan without converting or writing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Verbose output - show details about each file
    #[arg(short, long)]
    pub verbose: bool,

    /// Force overwrite of existing output files without confirmation
    #[arg(short, long)]
    pub force: bool,

    /// Never overwrite existing output files
    #[arg(long, conflicts_with = "force")]
    pub no_clobber: bool,

    /// Suppress all non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Convert CLI arguments into a validated Config.
    ///
    /// Glob patterns in the inputs are expanded here.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A glob pattern is malformed
    /// - The order does not parse
    /// - Configuration validation fails
    pub fn to_config(&self) -> Result<Config> {
        let inputs = collect_paths_for_patterns(&self.inputs)?;

        let order = match &self.order {
            Some(spec) => Some(OrderSpec::from_str(spec)?.0),
            None => None,
        };

        let office_backend = OfficeBackend::from_str(&self.office_backend)?;

        let overwrite_mode = if self.force {
            OverwriteMode::Force
        } else if self.no_clobber {
            OverwriteMode::NoClobber
        } else {
            OverwriteMode::Prompt
        };

        let ocr = self.ocr.as_ref().map(|language| OcrSettings {
            language: language.trim().to_string(),
            tesseract: self.tesseract.clone(),
            min_confidence: self.min_confidence,
        });

        let config = Config {
            inputs,
            output: self.output.clone().unwrap_or_else(default_output_path),
            order,
            max_files: self.max_files,
            office_backend,
            soffice: self.soffice.clone(),
            password: self.password.clone(),
            ocr,
            export_docx: self.export_docx.clone(),
            report: self.report.clone(),
            dry_run: self.dry_run,
            verbose: self.verbose,
            quiet: self.quiet,
            overwrite_mode,
        };

        config.validate().map_err(|e| {
            MixError::invalid_config(format!("Configuration validation failed: {e}"))
        })?;

        Ok(config)
    }

    /// Validate CLI arguments before processing.
    ///
    /// Performs early validation that doesn't require file I/O.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            return Err(MixError::invalid_config("No input files specified"));
        }

        if self.max_files == 0 {
            return Err(MixError::invalid_config(
                "Maximum number of files must be at least 1",
            ));
        }

        if !["builtin", "soffice"].contains(&self.office_backend.as_str()) {
            return Err(MixError::invalid_config(format!(
                "Invalid office backend: {}",
                self.office_backend
            )));
        }

        if let Some(ref order) = self.order {
            OrderSpec::from_str(order).map_err(|e| MixError::invalid_order(format!("{e:#}")))?;
        }

        if !(0.0..=100.0).contains(&self.min_confidence) {
            return Err(MixError::invalid_config(format!(
                "Invalid OCR confidence: {}. Must be between 0 and 100",
                self.min_confidence
            )));
        }

        Ok(())
    }
}
