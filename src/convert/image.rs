//! Image (`.png`, `.jpg`, `.jpeg`) to PDF conversion.

use lopdf::{Dictionary, Document, Object, Stream, dictionary};

use super::Converter;
use super::layout::finish_document;
use crate::error::{MixError, Result};

/// Converts a raster image into a single-page PDF.
///
/// The image is decoded, converted to 8-bit RGB and placed on a page whose
/// size in points equals its size in pixels (72 dpi).
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageConverter;

impl ImageConverter {
    /// Create an image converter.
    pub fn new() -> Self {
        Self
    }
}

impl Converter for ImageConverter {
    fn backend(&self) -> &'static str {
        "image-rgb"
    }

    fn convert(&self, content: &[u8]) -> Result<Vec<u8>> {
        let decoded = image::load_from_memory(content)
            .map_err(|e| MixError::other(format!("cannot decode image: {e}")))?;
        let rgb = decoded.to_rgb8();
        let (width, height) = rgb.dimensions();

        if width == 0 || height == 0 {
            return Err(MixError::other("image has no pixels"));
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(width),
                "Height" => i64::from(height),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            rgb.into_raw(),
        ));

        let draw = format!("q {width} 0 0 {height} 0 0 cm /Im1 Do Q");
        let content_id = doc.add_object(Stream::new(Dictionary::new(), draw.into_bytes()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), i64::from(width).into(), i64::from(height).into()],
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im1" => image_id },
            },
            "Contents" => content_id,
        });

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );

        finish_document(doc, pages_id)
    }
}
