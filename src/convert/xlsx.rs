//! Excel (`.xlsx`) to PDF conversion.
//!
//! Only the active sheet is read. Each row becomes one text line made of
//! its non-empty cell values joined by single spaces.

use calamine::{Data, Reader, Xlsx};
use quick_xml::events::Event;
use std::io::Cursor;

use super::Converter;
use super::docx::read_zip_entry;
use super::layout::TextLayout;
use crate::error::{MixError, Result};

/// Built-in XLSX converter.
#[derive(Debug, Clone, Default)]
pub struct XlsxConverter {
    layout: TextLayout,
}

impl XlsxConverter {
    /// Create a converter with the default text layout.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Converter for XlsxConverter {
    fn backend(&self) -> &'static str {
        "xlsx-text"
    }

    fn convert(&self, content: &[u8]) -> Result<Vec<u8>> {
        let rows = read_active_sheet_rows(content)?;
        if rows.is_empty() {
            return Err(MixError::other("active sheet is empty"));
        }
        self.layout.render(&rows)
    }
}

/// Read the active sheet and render each row as a space-joined line.
pub fn read_active_sheet_rows(content: &[u8]) -> Result<Vec<String>> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(content))
        .map_err(|e| MixError::other(format!("not a valid workbook: {e}")))?;

    let names = workbook.sheet_names();
    if names.is_empty() {
        return Err(MixError::other("workbook has no sheets"));
    }

    let active = active_tab(content).min(names.len() - 1);
    let name = names[active].clone();

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| MixError::other(format!("cannot read sheet '{name}': {e}")))?;

    let rows = range
        .rows()
        .map(|row| {
            row.iter()
                .filter(|cell| !matches!(cell, Data::Empty))
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();

    Ok(rows)
}

/// Index of the sheet shown when the workbook was last saved.
///
/// Falls back to the first sheet when the workbook view is absent or
/// unreadable.
fn active_tab(content: &[u8]) -> usize {
    let Ok(xml) = read_zip_entry(content, "xl/workbook.xml") else {
        return 0;
    };

    let mut reader = quick_xml::reader::Reader::from_str(&xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.local_name().as_ref() == b"workbookView" =>
            {
                return e
                    .try_get_attribute("activeTab")
                    .ok()
                    .flatten()
                    .and_then(|attr| std::str::from_utf8(&attr.value).ok()?.parse().ok())
                    .unwrap_or(0);
            }
            Ok(Event::Eof) | Err(_) => return 0,
            _ => {}
        }
    }
}
