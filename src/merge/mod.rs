//! Merge pipeline: sequential conversion and page accumulation.
//!
//! [`Pipeline::process`] is the single entry point used by front ends. It
//! checks the batch size, converts each file through the
//! [`ConverterSet`](crate::convert::ConverterSet), appends every successful
//! PDF to a [`MergedDocument`] and returns a [`BatchReport`].

mod document;
mod pipeline;

pub use document::MergedDocument;
pub use pipeline::{BatchReport, DEFAULT_MAX_FILES, FileOutcome, FileStatus, Pipeline};
