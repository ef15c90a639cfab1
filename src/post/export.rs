//! PDF to DOCX export.
//!
//! Text is recovered line by line from each page's content stream and
//! written as one paragraph per line, with a page break between pages.
//! Layout, fonts and images are not carried over.

use lopdf::content::Content;
use lopdf::{Document, Object};
use quick_xml::escape::escape;
use std::io::{Cursor, Write};
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use crate::error::{MixError, Result};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// A4 portrait in twentieths of a point.
const SECTION: &str = r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1134" w:right="567" w:bottom="1134" w:left="567" w:header="0" w:footer="0" w:gutter="0"/></w:sectPr>"#;

/// Convert a PDF into a DOCX package.
///
/// # Errors
///
/// Returns [`MixError::Export`] if the PDF cannot be read or is encrypted.
pub fn pdf_to_docx(pdf: &[u8]) -> Result<Vec<u8>> {
    let pages = extract_lines(pdf)?;
    let document = document_xml(&pages);

    write_package(&document).map_err(|e| export(format!("cannot write DOCX: {e}")))
}

/// Text lines of every page, in page order.
///
/// # Errors
///
/// Returns [`MixError::Export`] if the PDF cannot be read or is encrypted.
pub fn extract_lines(pdf: &[u8]) -> Result<Vec<Vec<String>>> {
    let doc = Document::load_mem(pdf).map_err(|e| export(format!("cannot load PDF: {e}")))?;
    if doc.is_encrypted() {
        return Err(export("cannot export an encrypted PDF"));
    }

    let mut pages = Vec::new();
    for (page_number, page_id) in doc.get_pages() {
        let lines = match doc
            .get_page_content(page_id)
            .and_then(|data| Content::decode(&data))
        {
            Ok(content) => page_lines(&content),
            Err(e) => {
                log::warn!("Skipping text of page {page_number}: {e}");
                Vec::new()
            }
        };
        pages.push(lines);
    }
    Ok(pages)
}

/// Group the shown strings of a content stream into lines.
fn page_lines(content: &Content) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut last_y: Option<f32> = None;

    for op in &content.operations {
        match op.operator.as_str() {
            "Tm" => {
                let y = op.operands.get(5).and_then(|v| v.as_float().ok());
                if y.is_some() && last_y.is_some() && y != last_y {
                    break_line(&mut current, &mut lines);
                } else if !current.is_empty() && !current.ends_with(' ') {
                    current.push(' ');
                }
                last_y = y.or(last_y);
            }
            "Td" | "TD" => {
                let ty = op.operands.get(1).and_then(|v| v.as_float().ok());
                if ty.is_some_and(|ty| ty != 0.0) {
                    break_line(&mut current, &mut lines);
                }
            }
            "T*" => break_line(&mut current, &mut lines),
            "Tj" => push_strings(&mut current, &op.operands),
            "'" | "\"" => {
                break_line(&mut current, &mut lines);
                push_strings(&mut current, &op.operands);
            }
            "TJ" => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    for item in items {
                        match item {
                            Object::String(bytes, _) => current.push_str(&decode_win_ansi(bytes)),
                            // Large negative kerning is a word gap.
                            other => {
                                if other.as_float().is_ok_and(|k| k < -200.0)
                                    && !current.ends_with(' ')
                                {
                                    current.push(' ');
                                }
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }
    break_line(&mut current, &mut lines);

    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    while lines.first().is_some_and(String::is_empty) {
        lines.remove(0);
    }
    lines
}

fn break_line(current: &mut String, lines: &mut Vec<String>) {
    lines.push(current.trim().to_string());
    current.clear();
}

fn push_strings(current: &mut String, operands: &[Object]) {
    for operand in operands {
        if let Object::String(bytes, _) = operand {
            current.push_str(&decode_win_ansi(bytes));
        }
    }
}

/// Decode single-byte text using WinAnsiEncoding.
fn decode_win_ansi(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| match b {
            0x80 => '€',
            0x82 => '‚',
            0x84 => '„',
            0x85 => '…',
            0x91 => '‘',
            0x92 => '’',
            0x93 => '“',
            0x94 => '”',
            0x95 => '•',
            0x96 => '–',
            0x97 => '—',
            0x99 => '™',
            b if b < 0x20 => ' ',
            b => char::from(b),
        })
        .collect()
}

fn document_xml(pages: &[Vec<String>]) -> String {
    let mut body = String::new();

    for (idx, lines) in pages.iter().enumerate() {
        if idx > 0 {
            body.push_str(r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#);
        }
        for line in lines {
            if line.is_empty() {
                body.push_str("<w:p/>");
            } else {
                body.push_str(r#"<w:p><w:r><w:t xml:space="preserve">"#);
                body.push_str(&escape(line.as_str()));
                body.push_str("</w:t></w:r></w:p>");
            }
        }
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}{SECTION}</w:body></w:document>"#
    )
}

fn write_package(document: &str) -> zip::result::ZipResult<Vec<u8>> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for (name, body) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("word/document.xml", document),
    ] {
        zip.start_file(name, options)?;
        zip.write_all(body.as_bytes())?;
    }

    Ok(zip.finish()?.into_inner())
}

fn export(reason: impl Into<String>) -> MixError {
    MixError::Export {
        reason: reason.into(),
    }
}
