//! pdfmix - Convert mixed documents to PDF and merge them into one file.
//!
//! This library turns a batch of uploaded files into a single PDF. It supports:
//!
//! - PDF passthrough
//! - Word (`.docx`) and Excel (`.xlsx`) rendering, built in or via LibreOffice
//! - PNG and JPEG images, one page per image
//! - User-chosen ordering of the batch
//! - Best-effort merging where a broken file is reported and skipped
//! - Optional password protection, OCR text layer and DOCX export
//!
//! # Examples
//!
//! ## Merging a Batch
//!
//! ```no_run
//! use pdfmix::UploadedFile;
//! use pdfmix::merge::Pipeline;
//!
//! # fn example() -> pdfmix::Result<()> {
//! let files = vec![
//!     UploadedFile::new("cover.pdf", std::fs::read("cover.pdf")?),
//!     UploadedFile::new("report.docx", std::fs::read("report.docx")?),
//!     UploadedFile::new("chart.png", std::fs::read("chart.png")?),
//! ];
//!
//! let report = Pipeline::new().process(&files)?;
//! println!("Merged {} of {} files", report.success_count(), report.total_count());
//!
//! if let Some(pdf) = report.into_merged() {
//!     std::fs::write("merged.pdf", pdf)?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Ordering and Protecting
//!
//! ```no_run
//! use pdfmix::UploadedFile;
//! use pdfmix::merge::Pipeline;
//! use pdfmix::order::FileOrder;
//! use pdfmix::post::protect;
//!
//! # fn example(files: Vec<UploadedFile>) -> pdfmix::Result<()> {
//! // Third upload first, then the first, then the second
//! let order = FileOrder::from_positions(vec![2, 3, 1], files.len())?;
//! let report = Pipeline::new().process_with_order(files, &order)?;
//!
//! if let Some(pdf) = report.merged() {
//!     let locked = protect(pdf, "secret")?;
//!     std::fs::write("locked.pdf", locked)?;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod app;
pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod io;
pub mod merge;
pub mod order;
pub mod output;
pub mod post;
pub mod upload;
pub mod utils;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::Config;
pub use error::{FailureKind, FileFailure, MixError, Result};
pub use upload::UploadedFile;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
