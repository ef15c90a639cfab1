//! End-to-end run: read, order, convert and merge, post-process, write.

use std::path::{Path, PathBuf};
use tokio::task;

use crate::cli::Cli;
use crate::config::{Config, OfficeBackend, OverwriteMode, has_pdf_extension};
use crate::convert::{ConverterSet, FileKind, SofficeConverter};
use crate::error::{MixError, Result};
use crate::io::{InputReader, OutputWriter};
use crate::merge::{BatchReport, Pipeline};
use crate::order::FileOrder;
use crate::output::{
    OutputFormatter, display_batch_report, display_plan, display_write_statistics,
};
use crate::post::{OcrOverlay, TesseractEngine, pdf_to_docx, protect};

/// What a run produced.
#[derive(Debug, Default)]
pub struct RunOutcome {
    /// Batch report, absent for dry runs.
    pub report: Option<BatchReport>,

    /// Files written, in the order they were written.
    pub written: Vec<PathBuf>,
}

/// Validate CLI arguments and run.
///
/// # Errors
///
/// Returns any error that stops the run; per-file failures do not.
pub async fn run(cli: Cli) -> Result<RunOutcome> {
    cli.validate()?;
    let config = cli.to_config()?;
    execute(&config).await
}

/// Run with an already validated configuration.
///
/// # Errors
///
/// Returns an error if:
/// - An input cannot be read
/// - The order is not a permutation of the inputs
/// - The batch is larger than the limit
/// - No file could be merged
/// - Post-processing or writing fails
pub async fn execute(config: &Config) -> Result<RunOutcome> {
    let formatter = OutputFormatter::from_config(config);

    if formatter.should_print() {
        formatter.section(&format!("{} v{}", crate::NAME, crate::VERSION));
    }

    if !has_pdf_extension(&config.output) {
        formatter.warning(&format!(
            "Output file has no .pdf extension: {}",
            config.output.display()
        ));
    }

    let (files, read_stats) = InputReader::new().read_all(config.inputs()).await?;
    formatter.debug(&format!(
        "Read {} file(s), {}",
        read_stats.file_count,
        read_stats.format_total_size()
    ));

    let order = match &config.order {
        Some(positions) => FileOrder::from_positions(positions.clone(), files.len())?,
        None => FileOrder::identity(files.len()),
    };
    let files = order.apply(files)?;

    let pipeline = Pipeline::with_converters(build_converters(config)).max_files(config.max_files);
    if files.len() > pipeline.file_limit() {
        return Err(MixError::BatchSizeExceeded {
            count: files.len(),
            max: pipeline.file_limit(),
        });
    }

    if config.dry_run {
        display_plan(&formatter, &files);
        formatter.blank_line();
        formatter.success("Dry run completed successfully");
        formatter.info(&format!("  Output would be: {}", config.output.display()));
        return Ok(RunOutcome::default());
    }

    let mut targets = vec![config.output.as_path()];
    targets.extend(config.export_docx.as_deref());
    targets.extend(config.report.as_deref());
    for target in targets {
        handle_output_overwrite(target, config.overwrite_mode, &formatter)?;
    }

    formatter.info(&format!("Converting {} file(s)...", files.len()));
    let report = blocking(move || pipeline.process(&files)).await?;
    display_batch_report(&formatter, &report);

    let mut outcome = RunOutcome::default();
    let writer = OutputWriter::new();

    if let Some(path) = &config.report {
        let json = serde_json::to_vec_pretty(&report)
            .map_err(|e| MixError::other(format!("Failed to serialize report: {e}")))?;
        writer.write(json, path).await?;
        outcome.written.push(path.clone());
    }

    let Some(mut pdf) = report.merged().map(<[u8]>::to_vec) else {
        return Err(MixError::NothingMerged {
            total: report.total_count(),
        });
    };

    if let Some(ocr) = config.ocr.clone() {
        formatter.info(&format!("Running OCR ({})...", ocr.language));
        let output = blocking(move || {
            OcrOverlay::new(Box::new(TesseractEngine::new(ocr.tesseract)))
                .min_confidence(ocr.min_confidence)
                .apply(&pdf, &ocr.language)
        })
        .await?;

        for page in &output.pages {
            formatter.detail(
                &format!("Page {}", page.page),
                &format!("{} word(s), {} dropped", page.words.len(), page.rejected),
            );
        }
        pdf = output.document;
    }

    if let Some(path) = &config.export_docx {
        let source = pdf.clone();
        let docx = blocking(move || pdf_to_docx(&source)).await?;
        let stats = writer.write(docx, path).await?;
        display_write_statistics(&formatter, &stats);
        outcome.written.push(path.clone());
    }

    if let Some(password) = config.password.clone() {
        formatter.info("Applying password protection...");
        pdf = blocking(move || protect(&pdf, &password)).await?;
    }

    let stats = writer.write(pdf, &config.output).await?;
    display_write_statistics(&formatter, &stats);
    outcome.written.push(config.output.clone());

    outcome.report = Some(report);
    Ok(outcome)
}

/// Converter set for the configured office backend.
pub fn build_converters(config: &Config) -> ConverterSet {
    let converters = ConverterSet::new();
    match config.office_backend {
        OfficeBackend::Builtin => converters,
        OfficeBackend::Soffice => converters
            .with_converter(
                FileKind::Document,
                Box::new(SofficeConverter::new(config.soffice.clone(), "docx")),
            )
            .with_converter(
                FileKind::Spreadsheet,
                Box::new(SofficeConverter::new(config.soffice.clone(), "xlsx")),
            ),
    }
}

/// Run CPU-bound or blocking work off the async runtime.
async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    task::spawn_blocking(work)
        .await
        .map_err(|e| MixError::other(format!("Background task failed: {e}")))?
}

/// Handle output file overwrite scenarios.
fn handle_output_overwrite(
    path: &Path,
    mode: OverwriteMode,
    formatter: &OutputFormatter,
) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }

    match mode {
        OverwriteMode::Force => Ok(()),
        OverwriteMode::NoClobber => Err(MixError::output_exists(path.to_path_buf())),
        OverwriteMode::Prompt => {
            // In quiet mode, treat as no-clobber
            if formatter.is_quiet() {
                return Err(MixError::output_exists(path.to_path_buf()));
            }

            formatter.warning(&format!("Output file already exists: {}", path.display()));

            use std::io::{self, Write};
            print!("Overwrite? [y/N]: ");
            io::stdout().flush().ok();

            let mut response = String::new();
            io::stdin()
                .read_line(&mut response)
                .map_err(|err| MixError::other(format!("Failed to read input: {err}")))?;

            let response = response.trim().to_lowercase();
            if response == "y" || response == "yes" {
                Ok(())
            } else {
                Err(MixError::Cancelled)
            }
        }
    }
}
