//! Office conversion through an external LibreOffice binary.
//!
//! This backend renders documents with their original formatting, at the
//! cost of requiring `soffice` on the host. LibreOffice only converts files
//! on disk, so each call writes the input into its own temporary directory
//! which is removed when the call returns, whether it succeeded or not.

use std::path::PathBuf;
use std::process::Command;

use super::Converter;
use crate::error::{MixError, Result};

/// Converts office documents by shelling out to `soffice --headless`.
#[derive(Debug, Clone)]
pub struct SofficeConverter {
    program: PathBuf,
    extension: &'static str,
}

impl SofficeConverter {
    /// Create a converter for inputs carrying `extension` (e.g. `"docx"`).
    pub fn new(program: impl Into<PathBuf>, extension: &'static str) -> Self {
        Self {
            program: program.into(),
            extension,
        }
    }
}

impl Converter for SofficeConverter {
    fn backend(&self) -> &'static str {
        "soffice"
    }

    fn convert(&self, content: &[u8]) -> Result<Vec<u8>> {
        let workdir = tempfile::Builder::new()
            .prefix("pdfmix-soffice-")
            .tempdir()?;

        let input = workdir.path().join(format!("input.{}", self.extension));
        std::fs::write(&input, content)?;

        log::debug!(
            "Running {} on {}",
            self.program.display(),
            input.display()
        );

        let output = Command::new(&self.program)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(workdir.path())
            .arg(&input)
            .output()
            .map_err(|e| {
                MixError::other(format!("cannot run {}: {e}", self.program.display()))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MixError::other(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        let pdf_path = workdir.path().join("input.pdf");
        std::fs::read(&pdf_path).map_err(|e| {
            MixError::other(format!("{} produced no PDF: {e}", self.program.display()))
        })
    }
}
