//! Invisible OCR text layer.
//!
//! Every image drawn on a page is recognized by an [`OcrEngine`]. Words at
//! or above the confidence threshold are written back onto the page as
//! invisible text (render mode 3) positioned over the word's pixels, so the
//! page becomes searchable without changing how it looks.
//!
//! Images are assumed to cover the whole page, which holds for scans and for
//! pages produced by the image converter. Pixel boxes are mapped onto the
//! page's `MediaBox` accordingly.

use ::image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use serde::Serialize;
use std::path::PathBuf;
use std::process::Command;

use crate::convert::layout::{encode_win_ansi, text_width};
use crate::error::{MixError, Result};

/// Default minimum confidence (0-100) for keeping a recognized word.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 60.0;

/// Name of the font resource added for the text layer.
const OCR_FONT: &[u8] = b"OcrF";

/// Pixel rectangle of a recognized word, origin at the top left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    /// Distance from the left edge.
    pub left: u32,
    /// Distance from the top edge.
    pub top: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// One word reported by an OCR engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognizedWord {
    /// Location in the source image.
    pub bbox: BoundingBox,
    /// Recognized text.
    pub text: String,
    /// Engine confidence, 0-100.
    pub confidence: f32,
}

/// Words accepted on one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageText {
    /// 1-based page number.
    pub page: u32,
    /// Words that made it into the text layer.
    pub words: Vec<RecognizedWord>,
    /// Words dropped for low confidence.
    pub rejected: usize,
}

impl PageText {
    /// Accepted words joined by spaces.
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of running OCR over a document.
#[derive(Debug, Clone)]
pub struct OcrOutput {
    /// The document with its text layer.
    pub document: Vec<u8>,
    /// Per-page recognition metadata.
    pub pages: Vec<PageText>,
}

/// Something that can find words in an image.
pub trait OcrEngine: Send + Sync {
    /// Recognize words in `image` using `language` (e.g. `"eng"`).
    ///
    /// # Errors
    ///
    /// Returns an error if recognition cannot run.
    fn recognize(&self, image: &DynamicImage, language: &str) -> Result<Vec<RecognizedWord>>;
}

/// Runs the `tesseract` command line tool.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    program: PathBuf,
}

impl TesseractEngine {
    /// Use the given `tesseract` binary.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &DynamicImage, language: &str) -> Result<Vec<RecognizedWord>> {
        let input = tempfile::Builder::new()
            .prefix("pdfmix-ocr-")
            .suffix(".png")
            .tempfile()?;
        image
            .save_with_format(input.path(), ImageFormat::Png)
            .map_err(|e| ocr(format!("cannot write page image: {e}")))?;

        let output = Command::new(&self.program)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(language)
            .arg("tsv")
            .output()
            .map_err(|e| ocr(format!("cannot run {}: {e}", self.program.display())))?;

        if !output.status.success() {
            return Err(ocr(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(parse_tsv(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Parse tesseract TSV output into word entries.
///
/// Only word-level rows (level 5) with text and a non-negative confidence
/// are kept.
pub fn parse_tsv(tsv: &str) -> Vec<RecognizedWord> {
    tsv.lines()
        .skip(1)
        .filter_map(|line| {
            let cols: Vec<&str> = line.split('\t').collect();
            if cols.len() < 12 || cols[0] != "5" {
                return None;
            }
            let text = cols[11].trim();
            let confidence: f32 = cols[10].trim().parse().ok()?;
            if text.is_empty() || confidence < 0.0 {
                return None;
            }
            Some(RecognizedWord {
                bbox: BoundingBox {
                    left: cols[6].parse().ok()?,
                    top: cols[7].parse().ok()?,
                    width: cols[8].parse().ok()?,
                    height: cols[9].parse().ok()?,
                },
                text: text.to_string(),
                confidence,
            })
        })
        .collect()
}

/// Adds an OCR text layer to PDFs.
pub struct OcrOverlay {
    engine: Box<dyn OcrEngine>,
    min_confidence: f32,
}

impl OcrOverlay {
    /// Overlay using `engine` and the default threshold.
    pub fn new(engine: Box<dyn OcrEngine>) -> Self {
        Self {
            engine,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }

    /// Change the confidence threshold.
    pub fn min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Recognize every page image of `pdf` and add the text layer.
    ///
    /// Pages without images are left untouched and reported with no words.
    ///
    /// # Errors
    ///
    /// Returns [`MixError::Ocr`] if the language code is invalid, the PDF
    /// cannot be loaded or is encrypted, or the engine fails.
    pub fn apply(&self, pdf: &[u8], language: &str) -> Result<OcrOutput> {
        validate_language(language)?;

        let mut doc = Document::load_mem(pdf).map_err(|e| ocr(format!("cannot load PDF: {e}")))?;
        if doc.is_encrypted() {
            return Err(ocr("cannot OCR an encrypted PDF"));
        }

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut pages = Vec::new();
        for (page_number, page_id) in doc.get_pages() {
            let media_box = media_box(&doc, page_id);
            let mut accepted = Vec::new();
            let mut rejected = 0;

            for image in page_images(&doc, page_id) {
                let (width, height) = (image.width(), image.height());
                for word in self.engine.recognize(&image, language)? {
                    if word.confidence >= self.min_confidence {
                        accepted.push((word, width, height));
                    } else {
                        rejected += 1;
                    }
                }
            }

            if !accepted.is_empty() {
                let content = text_layer(&accepted, media_box);
                add_text_layer(&mut doc, page_id, font_id, content)?;
            }

            log::debug!(
                "OCR page {page_number}: {} word(s) kept, {rejected} dropped",
                accepted.len()
            );
            pages.push(PageText {
                page: page_number,
                words: accepted.into_iter().map(|(word, _, _)| word).collect(),
                rejected,
            });
        }

        let mut document = Vec::new();
        doc.save_to(&mut document)
            .map_err(|e| ocr(format!("cannot save: {e}")))?;

        Ok(OcrOutput { document, pages })
    }
}

fn validate_language(language: &str) -> Result<()> {
    let valid = !language.is_empty()
        && language
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '+');
    if valid {
        Ok(())
    } else {
        Err(ocr(format!("invalid language code '{language}'")))
    }
}

/// The page `MediaBox`, looked up through ancestors, defaulting to Letter.
fn media_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    let mut node = doc.get_dictionary(page_id).ok();
    while let Some(dict) = node {
        if let Ok(values) = dict.get(b"MediaBox").and_then(Object::as_array) {
            let nums: Vec<f32> = values.iter().filter_map(|v| v.as_float().ok()).collect();
            if let &[x0, y0, x1, y1] = nums.as_slice() {
                return [x0, y0, x1, y1];
            }
        }
        node = dict
            .get(b"Parent")
            .and_then(Object::as_reference)
            .and_then(|id| doc.get_dictionary(id))
            .ok();
    }
    [0.0, 0.0, 612.0, 792.0]
}

fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match obj {
        Object::Dictionary(dict) => Some(dict),
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        _ => None,
    }
}

/// The page `Resources`, looked up through ancestors.
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok();
    while let Some(dict) = node {
        if let Ok(resources) = dict.get(b"Resources") {
            return resolve_dict(doc, resources);
        }
        node = dict
            .get(b"Parent")
            .and_then(Object::as_reference)
            .and_then(|id| doc.get_dictionary(id))
            .ok();
    }
    None
}

/// Decode every image XObject the page references.
fn page_images(doc: &Document, page_id: ObjectId) -> Vec<DynamicImage> {
    let Some(xobjects) = page_resources(doc, page_id)
        .and_then(|res| res.get(b"XObject").ok())
        .and_then(|obj| resolve_dict(doc, obj))
    else {
        return Vec::new();
    };

    xobjects
        .iter()
        .filter_map(|(_, obj)| obj.as_reference().ok())
        .filter_map(|id| doc.get_object(id).and_then(Object::as_stream).ok())
        .filter(|stream| {
            stream
                .dict
                .get(b"Subtype")
                .and_then(Object::as_name)
                .is_ok_and(|name| name == b"Image")
        })
        .filter_map(decode_image)
        .collect()
}

fn decode_image(stream: &Stream) -> Option<DynamicImage> {
    let filters: Vec<Vec<u8>> = match stream.dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_name().ok().map(<[u8]>::to_vec))
            .collect(),
        _ => Vec::new(),
    };

    if filters.iter().any(|f| f == b"DCTDecode") {
        return ::image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg).ok();
    }

    let data = match filters.as_slice() {
        [] => stream.content.clone(),
        [flate] if flate == b"FlateDecode" => stream.decompressed_content().ok()?,
        _ => return None,
    };

    let width = u32::try_from(stream.dict.get(b"Width").and_then(Object::as_i64).ok()?).ok()?;
    let height = u32::try_from(stream.dict.get(b"Height").and_then(Object::as_i64).ok()?).ok()?;
    let bits = stream
        .dict
        .get(b"BitsPerComponent")
        .and_then(Object::as_i64)
        .unwrap_or(8);
    if bits != 8 {
        return None;
    }

    match stream.dict.get(b"ColorSpace").and_then(Object::as_name).ok()? {
        b"DeviceRGB" => RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8),
        b"DeviceGray" => GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8),
        _ => None,
    }
}

/// Build the invisible text operations for the accepted words.
fn text_layer(words: &[(RecognizedWord, u32, u32)], media_box: [f32; 4]) -> Content {
    let [x0, y0, x1, y1] = media_box;
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tr", vec![3.into()]),
    ];

    for (word, image_width, image_height) in words {
        if *image_width == 0 || *image_height == 0 {
            continue;
        }
        let sx = (x1 - x0) / *image_width as f32;
        let sy = (y1 - y0) / *image_height as f32;

        let bbox = word.bbox;
        let font_size = (bbox.height as f32 * sy).max(1.0);
        let x = x0 + bbox.left as f32 * sx;
        let y = y1 - (bbox.top + bbox.height) as f32 * sy;

        let natural = text_width(&word.text, font_size);
        let target = bbox.width as f32 * sx;
        let scale = if natural > 0.0 {
            100.0 * target / natural
        } else {
            100.0
        };

        operations.push(Operation::new(
            "Tf",
            vec![Object::Name(OCR_FONT.to_vec()), font_size.into()],
        ));
        operations.push(Operation::new("Tz", vec![scale.into()]));
        operations.push(Operation::new(
            "Tm",
            vec![1.into(), 0.into(), 0.into(), 1.into(), x.into(), y.into()],
        ));
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(&word.text), StringFormat::Literal)],
        ));
    }

    operations.push(Operation::new("ET", vec![]));
    Content { operations }
}

/// Append `content` to the page, isolated from the existing graphics state.
fn add_text_layer(
    doc: &mut Document,
    page_id: ObjectId,
    font_id: ObjectId,
    content: Content,
) -> Result<()> {
    let mut resources = page_resources(doc, page_id).cloned().unwrap_or_default();
    let mut fonts = resources
        .get(b"Font")
        .ok()
        .and_then(|obj| resolve_dict(doc, obj))
        .cloned()
        .unwrap_or_default();
    fonts.set(OCR_FONT.to_vec(), font_id);
    resources.set("Font", fonts);

    let mut layer = b"Q\n".to_vec();
    layer.extend(content.encode().map_err(|e| ocr(format!("cannot encode text layer: {e}")))?);
    let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let layer_id = doc.add_object(Stream::new(Dictionary::new(), layer));

    let page = doc
        .get_dictionary_mut(page_id)
        .map_err(|e| ocr(format!("page is not a dictionary: {e}")))?;

    let mut contents = vec![Object::Reference(save_id)];
    match page.get(b"Contents") {
        Ok(Object::Reference(id)) => contents.push(Object::Reference(*id)),
        Ok(Object::Array(items)) => contents.extend(items.iter().cloned()),
        _ => {}
    }
    contents.push(Object::Reference(layer_id));

    page.set("Contents", contents);
    page.set("Resources", resources);
    Ok(())
}

fn ocr(reason: impl Into<String>) -> MixError {
    MixError::Ocr {
        reason: reason.into(),
    }
}
