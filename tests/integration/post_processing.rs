//! Integration tests for the transforms applied to a merged document.

use image::DynamicImage;
use lopdf::Document;

use pdfmix::UploadedFile;
use pdfmix::convert::docx::read_paragraphs;
use pdfmix::merge::Pipeline;
use pdfmix::post::{
    BoundingBox, OcrEngine, OcrOverlay, RecognizedWord, pdf_to_docx, protect, unlock,
};

use crate::common::{docx_bytes, pdf_bytes, png_bytes};

fn merged(files: &[UploadedFile]) -> Vec<u8> {
    Pipeline::new()
        .process(files)
        .unwrap()
        .into_merged()
        .expect("batch should produce a document")
}

#[test]
fn test_password_round_trip_on_merged_output() {
    let pdf = merged(&[
        UploadedFile::new("a.pdf", pdf_bytes(&[100.0, 200.0])),
        UploadedFile::new("b.png", png_bytes(40, 40)),
    ]);

    let locked = protect(&pdf, "correct horse").unwrap();
    assert!(Document::load_mem(&locked).unwrap().is_encrypted());
    assert!(unlock(&locked, "battery staple").is_err());

    let opened = unlock(&locked, "correct horse").unwrap();
    let doc = Document::load_mem(&opened).unwrap();
    assert_eq!(doc.get_pages().len(), 3);
}

#[test]
fn test_docx_export_keeps_document_text() {
    let pdf = merged(&[
        UploadedFile::new("letter.docx", docx_bytes(&["Dear reader", "Kind regards"])),
        UploadedFile::new("blank.pdf", pdf_bytes(&[612.0])),
    ]);

    let docx = pdf_to_docx(&pdf).unwrap();
    let paragraphs = read_paragraphs(&docx).unwrap();

    assert!(paragraphs.iter().any(|p| p == "Dear reader"));
    assert!(paragraphs.iter().any(|p| p == "Kind regards"));
}

/// Returns one confident and one doubtful word for every image.
struct CannedEngine;

impl OcrEngine for CannedEngine {
    fn recognize(
        &self,
        _image: &DynamicImage,
        _language: &str,
    ) -> pdfmix::Result<Vec<RecognizedWord>> {
        let word = |text: &str, left, confidence| RecognizedWord {
            bbox: BoundingBox {
                left,
                top: 4,
                width: 20,
                height: 10,
            },
            text: text.to_string(),
            confidence,
        };
        Ok(vec![word("Receipt", 2, 88.0), word("blur", 30, 12.0)])
    }
}

#[test]
fn test_ocr_only_touches_scanned_pages() {
    let pdf = merged(&[
        UploadedFile::new("cover.pdf", pdf_bytes(&[300.0])),
        UploadedFile::new("scan.png", png_bytes(60, 30)),
    ]);

    let output = OcrOverlay::new(Box::new(CannedEngine))
        .apply(&pdf, "eng")
        .unwrap();

    assert_eq!(output.pages.len(), 2);
    assert!(output.pages[0].words.is_empty());
    assert_eq!(output.pages[1].text(), "Receipt");
    assert_eq!(output.pages[1].rejected, 1);

    let doc = Document::load_mem(&output.document).unwrap();
    assert_eq!(doc.get_pages().len(), 2);
}

#[test]
fn test_ocr_then_protect() {
    let pdf = merged(&[UploadedFile::new("scan.png", png_bytes(60, 30))]);

    let ocr = OcrOverlay::new(Box::new(CannedEngine))
        .min_confidence(0.0)
        .apply(&pdf, "eng")
        .unwrap();
    assert_eq!(ocr.pages[0].words.len(), 2);

    let locked = protect(&ocr.document, "pw").unwrap();
    let opened = unlock(&locked, "pw").unwrap();
    assert_eq!(Document::load_mem(&opened).unwrap().get_pages().len(), 1);
}
