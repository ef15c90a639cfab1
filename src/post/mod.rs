//! Optional transforms applied to a finished merged PDF.
//!
//! Each transform takes the merged bytes and returns new bytes; none of them
//! touch the merge pipeline's state. When several are requested they run in
//! this order: OCR, DOCX export (from the OCR'd document), encryption last so
//! the other two still see plain content.

pub mod export;
pub mod ocr;
pub mod protect;

pub use export::pdf_to_docx;
pub use ocr::{
    BoundingBox, DEFAULT_MIN_CONFIDENCE, OcrEngine, OcrOutput, OcrOverlay, PageText,
    RecognizedWord, TesseractEngine,
};
pub use protect::{protect, unlock};
