//! Plain-text page layout.
//!
//! Office documents are rendered as plain text: every logical line is
//! wrapped to the printable width in Helvetica at a fixed size and flowed
//! top to bottom across as many A4 pages as needed. Formatting, tables and
//! embedded images are not preserved.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};

use crate::error::{MixError, Result};

const MM: f32 = 72.0 / 25.4;

/// Geometry and font settings for text pages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextLayout {
    /// Page width in points.
    pub page_width: f32,
    /// Page height in points.
    pub page_height: f32,
    /// Left and right margin in points.
    pub side_margin: f32,
    /// Top margin in points.
    pub top_margin: f32,
    /// Bottom margin in points.
    pub bottom_margin: f32,
    /// Font size in points.
    pub font_size: f32,
    /// Distance between baselines in points.
    pub line_height: f32,
}

impl Default for TextLayout {
    /// A4 portrait, 10 mm margins with a 20 mm bottom margin, 12 pt text on
    /// 10 mm lines.
    fn default() -> Self {
        Self {
            page_width: 210.0 * MM,
            page_height: 297.0 * MM,
            side_margin: 10.0 * MM,
            top_margin: 10.0 * MM,
            bottom_margin: 20.0 * MM,
            font_size: 12.0,
            line_height: 10.0 * MM,
        }
    }
}

impl TextLayout {
    /// Width available to a line of text.
    pub fn text_width(&self) -> f32 {
        // One millimetre of cell padding on each side.
        self.page_width - 2.0 * self.side_margin - 2.0 * MM
    }

    /// Number of lines that fit on one page.
    pub fn lines_per_page(&self) -> usize {
        let usable = self.page_height - self.top_margin - self.bottom_margin;
        ((usable / self.line_height).floor() as usize).max(1)
    }

    /// Wrap logical lines into physical lines that fit the text width.
    ///
    /// Each logical line produces at least one physical line, so blank
    /// paragraphs and empty spreadsheet rows keep their vertical space.
    pub fn wrap<S: AsRef<str>>(&self, lines: &[S]) -> Vec<String> {
        let max_width = self.text_width();
        let mut wrapped = Vec::new();

        for line in lines {
            for segment in line.as_ref().split('\n') {
                wrap_segment(segment, max_width, self.font_size, &mut wrapped);
            }
        }

        wrapped
    }

    /// Render logical lines as a PDF document and serialize it.
    ///
    /// # Errors
    ///
    /// Returns an error if there is nothing to render or the content stream
    /// cannot be encoded.
    pub fn render<S: AsRef<str>>(&self, lines: &[S]) -> Result<Vec<u8>> {
        if lines.is_empty() {
            return Err(MixError::other("document contains no text"));
        }

        let physical = self.wrap(lines);
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for chunk in physical.chunks(self.lines_per_page()) {
            let content_id = doc.add_object(Stream::new(
                Dictionary::new(),
                self.page_content(chunk).encode()?,
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![
                    0.into(),
                    0.into(),
                    self.page_width.into(),
                    self.page_height.into(),
                ],
            }),
        );

        finish_document(doc, pages_id)
    }

    fn page_content(&self, lines: &[String]) -> Content {
        let x = self.side_margin + MM;
        let first_baseline = self.page_height - self.top_margin - self.line_height / 2.0
            - self.font_size * 0.3;

        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(b"F1".to_vec()), self.font_size.into()],
            ),
        ];

        for (idx, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let y = first_baseline - idx as f32 * self.line_height;
            operations.push(Operation::new(
                "Tm",
                vec![
                    1.into(),
                    0.into(),
                    0.into(),
                    1.into(),
                    x.into(),
                    y.into(),
                ],
            ));
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(line), StringFormat::Literal)],
            ));
        }

        operations.push(Operation::new("ET", vec![]));
        Content { operations }
    }
}

/// Attach a catalog to a document whose page tree root is `pages_id` and
/// serialize it with compressed streams.
pub(crate) fn finish_document(mut doc: Document, pages_id: ObjectId) -> Result<Vec<u8>> {
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}

fn wrap_segment(segment: &str, max_width: f32, font_size: f32, out: &mut Vec<String>) {
    let segment = segment.replace('\t', "    ");
    let segment: String = segment.chars().filter(|c| !c.is_control()).collect();
    let segment = segment.trim_end();

    if segment.is_empty() {
        out.push(String::new());
        return;
    }

    let mut current = String::new();
    for word in segment.split(' ') {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };

        if text_width(&candidate, font_size) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }

        // A single word wider than the line is split character by character.
        for ch in word.chars() {
            current.push(ch);
            if text_width(&current, font_size) > max_width && current.chars().count() > 1 {
                current.pop();
                out.push(std::mem::take(&mut current));
                current.push(ch);
            }
        }
    }

    out.push(current);
}

/// Width of `text` in points when set in Helvetica at `font_size`.
pub(crate) fn text_width(text: &str, font_size: f32) -> f32 {
    let units: u32 = encode_win_ansi(text)
        .into_iter()
        .map(|b| u32::from(helvetica_width(b)))
        .sum();
    units as f32 * font_size / 1000.0
}

/// Encode text in WinAnsiEncoding, replacing unmappable characters with `?`.
pub(crate) fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            ' '..='~' => ch as u8,
            '\u{a0}'..='\u{ff}' => ch as u32 as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            _ => b'?',
        })
        .collect()
}

/// Advance width of a WinAnsi byte in Helvetica, in 1/1000 em.
fn helvetica_width(byte: u8) -> u16 {
    const ASCII: [u16; 95] = [
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
        278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
        278, 278, 278, 469, 556, 333, // '['..'`'
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
        556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
        334, 260, 334, 584, // '{'..'~'
    ];

    match byte {
        0x20..=0x7e => ASCII[usize::from(byte - 0x20)],
        0x85 | 0x97 => 1000,
        0x91 | 0x92 | 0x82 => 222,
        0x93 | 0x94 | 0x84 => 333,
        0x95 => 350,
        _ => 556,
    }
}
