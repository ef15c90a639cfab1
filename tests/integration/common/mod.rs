//! Shared helpers for the pdfmix integration tests.
//!
//! Inputs are generated in memory by the same builders the unit tests use,
//! so no binary fixtures are needed.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[path = "../../../src/test_support.rs"]
mod fixtures;

pub use fixtures::{Cell, docx_bytes, jpeg_bytes, page_widths, pdf_bytes, png_bytes, xlsx_bytes};

use pdfmix::UploadedFile;

/// A spreadsheet with a header row and one data row.
pub fn simple_xlsx() -> Vec<u8> {
    xlsx_bytes(
        &[&[
            &[Cell::Text("Item"), Cell::Text("Qty")],
            &[Cell::Text("Apples"), Cell::Number(3.0)],
        ]],
        0,
    )
}

/// A PDF upload `width` points wide, used to tell pages apart.
pub fn marked_pdf(name: &str, width: f32) -> UploadedFile {
    UploadedFile::new(name, pdf_bytes(&[width]))
}

/// Write `bytes` to `name` inside `dir` and return the full path.
pub fn write_input(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("failed to write input");
    path
}

/// Create a temporary working directory.
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("failed to create temp dir")
}
