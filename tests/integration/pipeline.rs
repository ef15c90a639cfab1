//! Integration tests for conversion, ordering and merging.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pdfmix::convert::{Converter, ConverterSet, FileKind, Passthrough};
use pdfmix::merge::{FileStatus, Pipeline};
use pdfmix::order::FileOrder;
use pdfmix::{FailureKind, MixError, UploadedFile};
use rstest::rstest;

use crate::common::{docx_bytes, jpeg_bytes, marked_pdf, page_widths, pdf_bytes, png_bytes, simple_xlsx};

#[rstest]
#[case("report.pdf", pdf_bytes(&[300.0]))]
#[case("report.docx", docx_bytes(&["Hello", "World"]))]
#[case("sheet.xlsx", simple_xlsx())]
#[case("photo.png", png_bytes(32, 16))]
#[case("photo.jpg", jpeg_bytes(16, 16))]
#[case("PHOTO.JPEG", jpeg_bytes(8, 8))]
fn test_every_supported_type_converts(#[case] name: &str, #[case] bytes: Vec<u8>) {
    let report = Pipeline::new()
        .process(&[UploadedFile::new(name, bytes)])
        .unwrap();

    assert_eq!(report.success_count(), 1, "{:?}", report.failures());
    assert!(report.total_pages() >= 1);
    assert!(report.merged().is_some_and(|pdf| !pdf.is_empty()));
}

#[test]
fn test_unsupported_type_reported_and_skipped() {
    let files = vec![
        marked_pdf("a.pdf", 100.0),
        UploadedFile::new("notes.txt", b"plain text".to_vec()),
    ];

    let report = Pipeline::new().process(&files).unwrap();

    let failures = report.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].name, "notes.txt");
    assert_eq!(failures[0].kind, FailureKind::UnsupportedType);
    assert_eq!(page_widths(report.merged().unwrap()), vec![100.0]);
}

#[test]
fn test_one_corrupt_file_in_batch() {
    let files = vec![
        marked_pdf("a.pdf", 100.0),
        marked_pdf("b.pdf", 200.0),
        UploadedFile::new("c.docx", b"PK not really a zip".to_vec()),
        marked_pdf("d.pdf", 400.0),
        UploadedFile::new("e.png", png_bytes(50, 50)),
    ];

    let report = Pipeline::new().process(&files).unwrap();

    assert_eq!(report.total_count(), 5);
    assert_eq!(report.success_count(), 4);
    let failures = report.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].name, "c.docx");
    assert_eq!(failures[0].kind, FailureKind::Conversion);

    assert_eq!(
        page_widths(report.merged().unwrap()),
        vec![100.0, 200.0, 400.0, 50.0]
    );
}

#[derive(Clone, Default)]
struct Counting(Arc<AtomicUsize>);

impl Converter for Counting {
    fn backend(&self) -> &'static str {
        "counting"
    }

    fn convert(&self, content: &[u8]) -> pdfmix::Result<Vec<u8>> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Passthrough.convert(content)
    }
}

#[test]
fn test_sixteen_files_rejected_before_conversion() {
    let counter = Counting::default();
    let pipeline = Pipeline::with_converters(
        ConverterSet::new().with_converter(FileKind::Pdf, Box::new(counter.clone())),
    );

    let files: Vec<_> = (0..16)
        .map(|i| marked_pdf(&format!("{i}.pdf"), 100.0))
        .collect();

    let err = pipeline.process(&files).unwrap_err();
    assert!(matches!(err, MixError::BatchSizeExceeded { count: 16, max: 15 }));
    assert_eq!(counter.0.load(Ordering::SeqCst), 0);

    let report = pipeline.process(&files[..15]).unwrap();
    assert_eq!(report.success_count(), 15);
    assert_eq!(counter.0.load(Ordering::SeqCst), 15);
}

#[test]
fn test_target_positions_reorder_pages() {
    let files = vec![
        marked_pdf("A.pdf", 100.0),
        marked_pdf("B.pdf", 200.0),
        marked_pdf("C.pdf", 300.0),
    ];
    let order = FileOrder::from_positions(vec![3, 1, 2], files.len()).unwrap();

    let report = Pipeline::new().process_with_order(files, &order).unwrap();

    let names: Vec<_> = report.outcomes().iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["B.pdf", "C.pdf", "A.pdf"]);
    assert_eq!(
        page_widths(report.merged().unwrap()),
        vec![200.0, 300.0, 100.0]
    );
}

#[test]
fn test_invalid_order_rejected() {
    let files = vec![marked_pdf("A.pdf", 100.0), marked_pdf("B.pdf", 200.0)];

    assert!(FileOrder::from_positions(vec![1, 1], 2).is_err());
    assert!(FileOrder::from_positions(vec![1, 3], 2).is_err());

    let order = FileOrder::from_positions(vec![1, 2, 3], 3).unwrap();
    let err = Pipeline::new().process_with_order(files, &order).unwrap_err();
    assert!(matches!(err, MixError::InvalidOrder { .. }));
}

#[test]
fn test_passthrough_keeps_page_count() {
    let source = pdf_bytes(&[100.0, 200.0, 300.0, 400.0]);

    let report = Pipeline::new()
        .process(&[UploadedFile::new("book.pdf", source.clone())])
        .unwrap();

    assert_eq!(report.total_pages(), 4);
    assert_eq!(page_widths(report.merged().unwrap()), page_widths(&source));
}

#[test]
fn test_all_files_failing_yields_no_buffer() {
    let files = vec![
        UploadedFile::new("a.txt", b"x".to_vec()),
        UploadedFile::new("b.pdf", b"%PDF-garbage".to_vec()),
    ];

    let report = Pipeline::new().process(&files).unwrap();

    assert!(report.is_total_failure());
    assert!(report.merged().is_none());
    assert_eq!(report.total_pages(), 0);
    assert!(
        report
            .outcomes()
            .iter()
            .all(|o| matches!(o.status, FileStatus::Failed { .. }))
    );
}
