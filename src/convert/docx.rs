//! Word (`.docx`) to PDF conversion.
//!
//! Paragraph text is pulled out of `word/document.xml` and laid out as plain
//! text. Run formatting, tables-as-tables, headers and images are dropped.

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::io::{Cursor, Read};

use super::Converter;
use super::layout::TextLayout;
use crate::error::{MixError, Result};

/// Built-in DOCX converter.
#[derive(Debug, Clone, Default)]
pub struct DocxConverter {
    layout: TextLayout,
}

impl DocxConverter {
    /// Create a converter with the default text layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a converter with a custom text layout.
    pub fn with_layout(layout: TextLayout) -> Self {
        Self { layout }
    }
}

impl Converter for DocxConverter {
    fn backend(&self) -> &'static str {
        "docx-text"
    }

    fn convert(&self, content: &[u8]) -> Result<Vec<u8>> {
        let paragraphs = read_paragraphs(content)?;
        if paragraphs.is_empty() {
            return Err(MixError::other("document contains no paragraphs"));
        }
        self.layout.render(&paragraphs)
    }
}

/// Extract the text of every body paragraph of a DOCX package.
///
/// Tabs become `\t` and explicit line breaks become `\n` inside the
/// paragraph they belong to.
pub fn read_paragraphs(content: &[u8]) -> Result<Vec<String>> {
    let xml = read_zip_entry(content, "word/document.xml")?;
    parse_document_xml(&xml)
}

/// Read a UTF-8 entry from a zip package held in memory.
pub(crate) fn read_zip_entry(content: &[u8], entry: &str) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(content))
        .map_err(|e| MixError::other(format!("not a valid Office package: {e}")))?;

    let mut file = archive
        .by_name(entry)
        .map_err(|e| MixError::other(format!("missing {entry}: {e}")))?;

    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|e| MixError::other(format!("unreadable {entry}: {e}")))?;
    Ok(xml)
}

fn parse_document_xml(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    // Paragraphs can nest through text boxes; the innermost one collects text.
    let mut open: Vec<String> = Vec::new();
    let mut in_text = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| MixError::other(format!("malformed document.xml: {e}")))?;

        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => open.push(String::new()),
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match (e.local_name().as_ref(), open.last_mut()) {
                (b"p", None) => paragraphs.push(String::new()),
                (b"tab", Some(text)) => text.push('\t'),
                (b"br" | b"cr", Some(text)) => text.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_text => {
                if let Some(text) = open.last_mut() {
                    let unescaped = t
                        .unescape()
                        .map_err(|e| MixError::other(format!("malformed text run: {e}")))?;
                    text.push_str(&unescaped);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"p" => {
                    if let Some(text) = open.pop() {
                        paragraphs.push(text);
                    }
                }
                b"t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}
