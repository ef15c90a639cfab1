//! Integration tests driving the full run from command-line arguments.

use clap::Parser;
use lopdf::Document;
use serial_test::serial;

use pdfmix::MixError;
use pdfmix::app;
use pdfmix::cli::Cli;

use crate::common::{docx_bytes, pdf_bytes, png_bytes, simple_xlsx, temp_dir, write_input};

fn cli(args: &[&str]) -> Cli {
    let mut argv = vec!["pdfmix"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap()
}

#[tokio::test]
#[serial]
async fn test_run_merges_mixed_inputs() {
    let dir = temp_dir();
    let a = write_input(dir.path(), "a.pdf", &pdf_bytes(&[100.0, 200.0]));
    let b = write_input(dir.path(), "b.docx", &docx_bytes(&["Hello"]));
    let c = write_input(dir.path(), "c.xlsx", &simple_xlsx());
    let d = write_input(dir.path(), "d.png", &png_bytes(30, 30));
    let output = dir.path().join("merged.pdf");

    let outcome = app::run(cli(&[
        a.to_str().unwrap(),
        b.to_str().unwrap(),
        c.to_str().unwrap(),
        d.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "--force",
        "--quiet",
    ]))
    .await
    .unwrap();

    let report = outcome.report.unwrap();
    assert_eq!(report.success_count(), 4);
    assert_eq!(report.total_pages(), 5);

    let doc = Document::load(&output).unwrap();
    assert_eq!(doc.get_pages().len(), 5);
}

#[tokio::test]
#[serial]
async fn test_run_applies_order() {
    let dir = temp_dir();
    let a = write_input(dir.path(), "a.pdf", &pdf_bytes(&[100.0]));
    let b = write_input(dir.path(), "b.pdf", &pdf_bytes(&[200.0]));
    let output = dir.path().join("merged.pdf");

    let outcome = app::run(cli(&[
        a.to_str().unwrap(),
        b.to_str().unwrap(),
        "--order",
        "2,1",
        "-o",
        output.to_str().unwrap(),
        "-f",
        "-q",
    ]))
    .await
    .unwrap();

    let report = outcome.report.unwrap();
    let names: Vec<_> = report.outcomes().iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["b.pdf", "a.pdf"]);
}

#[tokio::test]
#[serial]
async fn test_run_dry_run_creates_nothing() {
    let dir = temp_dir();
    let a = write_input(dir.path(), "a.pdf", &pdf_bytes(&[100.0]));
    let b = write_input(dir.path(), "notes.txt", b"plain");
    let output = dir.path().join("merged.pdf");

    let outcome = app::run(cli(&[
        a.to_str().unwrap(),
        b.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "--dry-run",
    ]))
    .await
    .unwrap();

    assert!(outcome.report.is_none());
    assert!(outcome.written.is_empty());
    assert!(!output.exists());
}

#[tokio::test]
#[serial]
async fn test_run_writes_json_report() {
    let dir = temp_dir();
    let a = write_input(dir.path(), "a.pdf", &pdf_bytes(&[100.0]));
    let b = write_input(dir.path(), "notes.txt", b"plain");
    let output = dir.path().join("merged.pdf");
    let report_path = dir.path().join("report.json");

    app::run(cli(&[
        a.to_str().unwrap(),
        b.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "--report",
        report_path.to_str().unwrap(),
        "-f",
        "-q",
    ]))
    .await
    .unwrap();

    let json: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&report_path).unwrap()).unwrap();
    assert_eq!(json["successCount"], 1);
    assert_eq!(json["totalCount"], 2);
    assert_eq!(json["outcomes"][0]["status"], "converted");
    assert_eq!(json["outcomes"][1]["status"], "failed");
    assert_eq!(json["outcomes"][1]["kind"], "unsupportedType");
}

#[tokio::test]
#[serial]
async fn test_run_password_and_docx_export() {
    let dir = temp_dir();
    let a = write_input(dir.path(), "a.docx", &docx_bytes(&["Secret memo"]));
    let output = dir.path().join("locked.pdf");
    let export = dir.path().join("locked.docx");

    let outcome = app::run(cli(&[
        a.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "--password",
        "hunter2",
        "--export-docx",
        export.to_str().unwrap(),
        "-f",
        "-q",
    ]))
    .await
    .unwrap();

    assert_eq!(outcome.written, vec![export.clone(), output.clone()]);

    let locked = std::fs::read(&output).unwrap();
    assert!(pdfmix::post::unlock(&locked, "hunter2").is_ok());

    let paragraphs =
        pdfmix::convert::docx::read_paragraphs(&std::fs::read(&export).unwrap()).unwrap();
    assert!(paragraphs.iter().any(|p| p == "Secret memo"));
}

#[tokio::test]
#[serial]
async fn test_run_fails_when_nothing_merges() {
    let dir = temp_dir();
    let a = write_input(dir.path(), "a.txt", b"plain");
    let output = dir.path().join("merged.pdf");

    let err = app::run(cli(&[a.to_str().unwrap(), "-o", output.to_str().unwrap(), "-f", "-q"]))
        .await
        .unwrap_err();

    assert!(matches!(err, MixError::NothingMerged { total: 1 }));
    assert_eq!(err.exit_code(), 3);
    assert!(!output.exists());
}

#[tokio::test]
#[serial]
async fn test_run_no_clobber_keeps_existing_output() {
    let dir = temp_dir();
    let a = write_input(dir.path(), "a.pdf", &pdf_bytes(&[100.0]));
    let output = write_input(dir.path(), "merged.pdf", b"existing");

    let err = app::run(cli(&[
        a.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "--no-clobber",
        "-q",
    ]))
    .await
    .unwrap_err();

    assert!(matches!(err, MixError::OutputExists { .. }));
    assert_eq!(std::fs::read(&output).unwrap(), b"existing");
}

#[tokio::test]
#[serial]
async fn test_run_rejects_missing_input() {
    let dir = temp_dir();
    let missing = dir.path().join("missing.pdf");
    let output = dir.path().join("merged.pdf");

    let err = app::run(cli(&[
        missing.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "-f",
        "-q",
    ]))
    .await
    .unwrap_err();

    assert!(matches!(err, MixError::FileNotFound { .. }));
    assert_eq!(err.exit_code(), 2);
}
