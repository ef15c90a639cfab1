//! File-type dispatch and conversion to PDF.
//!
//! Every uploaded file is routed by its lowercased extension to one of four
//! strategies:
//!
//! | Extension            | Kind          | Default backend        |
//! |----------------------|---------------|------------------------|
//! | `pdf`                | Pdf           | passthrough            |
//! | `docx`               | Document      | [`DocxConverter`]      |
//! | `xlsx`               | Spreadsheet   | [`XlsxConverter`]      |
//! | `png`, `jpg`, `jpeg` | Image         | [`ImageConverter`]     |
//!
//! Backends sit behind the [`Converter`] trait so they can be swapped per
//! kind (see [`SofficeConverter`]) without touching the merge pipeline.
//!
//! # Examples
//!
//! ```no_run
//! use pdfmix::UploadedFile;
//! use pdfmix::convert::ConverterSet;
//!
//! let converters = ConverterSet::new();
//! let file = UploadedFile::new("scan.png", std::fs::read("scan.png").unwrap());
//! match converters.convert(&file) {
//!     Ok(pdf) => println!("{} bytes of PDF", pdf.len()),
//!     Err(failure) => eprintln!("{failure}"),
//! }
//! ```

pub mod docx;
pub mod image;
pub mod layout;
pub mod soffice;
pub mod xlsx;

pub use self::docx::DocxConverter;
pub use self::image::ImageConverter;
pub use self::layout::TextLayout;
pub use self::soffice::SofficeConverter;
pub use self::xlsx::XlsxConverter;

use serde::Serialize;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::UploadedFile;
use crate::error::{FileFailure, MixError, Result};

/// Outcome of converting one file: PDF bytes or a recorded failure.
pub type ConversionResult = std::result::Result<Vec<u8>, FileFailure>;

/// A backend that turns the bytes of one file into PDF bytes.
pub trait Converter: Send + Sync {
    /// Short backend name used in logs.
    fn backend(&self) -> &'static str;

    /// Convert `content` into a complete PDF document.
    ///
    /// # Errors
    ///
    /// Returns an error describing why the content could not be converted.
    fn convert(&self, content: &[u8]) -> Result<Vec<u8>>;
}

/// Returns the input unchanged; used for files that already are PDFs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Converter for Passthrough {
    fn backend(&self) -> &'static str {
        "passthrough"
    }

    fn convert(&self, content: &[u8]) -> Result<Vec<u8>> {
        Ok(content.to_vec())
    }
}

/// Conversion strategy selected from a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FileKind {
    /// Already a PDF.
    Pdf,
    /// Word document.
    Document,
    /// Excel workbook.
    Spreadsheet,
    /// Raster image.
    Image,
}

impl FileKind {
    /// Map a lowercased extension to a kind.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Document),
            "xlsx" => Some(Self::Spreadsheet),
            "png" | "jpg" | "jpeg" => Some(Self::Image),
            _ => None,
        }
    }

    /// Detect the kind of an uploaded file from its name.
    pub fn detect(file: &UploadedFile) -> Option<Self> {
        Self::from_extension(&file.extension())
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pdf => "PDF",
            Self::Document => "Word document",
            Self::Spreadsheet => "Excel workbook",
            Self::Image => "image",
        };
        f.write_str(label)
    }
}

/// One converter per file kind, dispatched by extension.
pub struct ConverterSet {
    pdf: Box<dyn Converter>,
    document: Box<dyn Converter>,
    spreadsheet: Box<dyn Converter>,
    image: Box<dyn Converter>,
}

impl ConverterSet {
    /// Create a set with the built-in backends.
    pub fn new() -> Self {
        Self {
            pdf: Box::new(Passthrough),
            document: Box::new(DocxConverter::new()),
            spreadsheet: Box::new(XlsxConverter::new()),
            image: Box::new(ImageConverter::new()),
        }
    }

    /// Replace the backend used for one kind of file.
    pub fn with_converter(mut self, kind: FileKind, converter: Box<dyn Converter>) -> Self {
        match kind {
            FileKind::Pdf => self.pdf = converter,
            FileKind::Document => self.document = converter,
            FileKind::Spreadsheet => self.spreadsheet = converter,
            FileKind::Image => self.image = converter,
        }
        self
    }

    /// Backend registered for `kind`.
    pub fn converter_for(&self, kind: FileKind) -> &dyn Converter {
        match kind {
            FileKind::Pdf => self.pdf.as_ref(),
            FileKind::Document => self.document.as_ref(),
            FileKind::Spreadsheet => self.spreadsheet.as_ref(),
            FileKind::Image => self.image.as_ref(),
        }
    }

    /// Convert one uploaded file.
    ///
    /// Never fails with an error: unsupported extensions, backend errors
    /// and backend panics all come back as a [`FileFailure`] naming the file.
    pub fn convert(&self, file: &UploadedFile) -> ConversionResult {
        let Some(kind) = FileKind::detect(file) else {
            return Err(MixError::unsupported_type(file.name(), file.extension()).into());
        };

        let converter = self.converter_for(kind);
        log::debug!(
            "Converting {} as {kind} with {}",
            file.name(),
            converter.backend()
        );

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| converter.convert(file.content())));

        match outcome {
            Ok(Ok(pdf)) if pdf.is_empty() => {
                Err(MixError::conversion(file.name(), "backend produced an empty PDF").into())
            }
            Ok(Ok(pdf)) => Ok(pdf),
            Ok(Err(err)) => Err(MixError::conversion(file.name(), err.to_string()).into()),
            Err(payload) => Err(MixError::conversion(
                file.name(),
                format!("backend panicked: {}", panic_message(payload.as_ref())),
            )
            .into()),
        }
    }
}

impl Default for ConverterSet {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
