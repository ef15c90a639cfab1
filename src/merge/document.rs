//! The merge accumulator.
//!
//! Converted PDFs are appended one at a time. The first successful append
//! becomes the base document; every later one is renumbered past the
//! current highest object id, its objects are moved over and its pages are
//! attached to the base page tree in order.

use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};
use time::OffsetDateTime;
use time::macros::format_description;

use crate::error::{MixError, Result};

/// Page attributes that a page may inherit from its ancestors.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// In-progress merged PDF.
#[derive(Debug, Default)]
pub struct MergedDocument {
    base: Option<Document>,
    sources: usize,
}

impl MergedDocument {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents appended so far.
    pub fn source_count(&self) -> usize {
        self.sources
    }

    /// Number of pages accumulated so far.
    pub fn page_count(&self) -> usize {
        self.base.as_ref().map_or(0, |doc| doc.get_pages().len())
    }

    /// Append every page of a serialized PDF.
    ///
    /// On error the accumulator is left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a loadable PDF, the PDF is
    /// encrypted, has no pages, or its page tree is malformed.
    pub fn append(&mut self, pdf: &[u8]) -> Result<usize> {
        let mut incoming = Document::load_mem(pdf)?;

        if incoming.is_encrypted() {
            return Err(MixError::other("encrypted PDF"));
        }

        let page_count = incoming.get_pages().len();
        if page_count == 0 {
            return Err(MixError::other("PDF has no pages"));
        }

        match self.base.as_mut() {
            None => {
                flatten_page_tree(&mut incoming)?;
                self.base = Some(incoming);
            }
            Some(base) => {
                let mut merged = base.clone();
                incoming.renumber_objects_with(merged.max_id + 1);
                let page_ids: Vec<ObjectId> = incoming.get_pages().into_values().collect();
                inherit_page_attributes(&mut incoming, &page_ids)?;

                merged.max_id = merged.max_id.max(incoming.max_id);
                merged.objects.extend(incoming.objects);
                attach_pages(&mut merged, &page_ids)?;
                *base = merged;
            }
        }

        self.sources += 1;
        Ok(page_count)
    }

    /// Serialize the merged document.
    ///
    /// Returns `None` when nothing was appended.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    pub fn finalize(self) -> Result<Option<Vec<u8>>> {
        let Some(mut doc) = self.base else {
            return Ok(None);
        };

        set_producer_info(&mut doc);
        doc.prune_objects();
        doc.compress();
        doc.renumber_objects();

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)?;
        Ok(Some(buffer))
    }
}

/// Id of the root page tree node.
fn root_pages_id(doc: &Document) -> Result<ObjectId> {
    doc.catalog()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|e| MixError::other(format!("missing page tree: {e}")))
}

/// Make every leaf page a direct child of the root page node.
fn flatten_page_tree(doc: &mut Document) -> Result<()> {
    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
    inherit_page_attributes(doc, &page_ids)?;

    let root_id = root_pages_id(doc)?;
    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();
    let root = doc
        .get_dictionary_mut(root_id)
        .map_err(|e| MixError::other(format!("page tree root is not a dictionary: {e}")))?;
    root.set("Kids", kids);
    root.set("Count", page_ids.len() as i64);

    for id in page_ids {
        if let Ok(page) = doc.get_dictionary_mut(id) {
            page.set("Parent", root_id);
        }
    }
    Ok(())
}

/// Copy inherited attributes from ancestors into each page dictionary so
/// the page renders the same after being re-parented.
fn inherit_page_attributes(doc: &mut Document, page_ids: &[ObjectId]) -> Result<()> {
    for &page_id in page_ids {
        let mut inherited = Dictionary::new();
        let page = doc
            .get_dictionary(page_id)
            .map_err(|e| MixError::other(format!("page is not a dictionary: {e}")))?;

        let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
        let mut depth = 0;
        while let Some(parent_id) = parent {
            let Ok(node) = doc.get_dictionary(parent_id) else {
                break;
            };
            for key in INHERITABLE {
                if !page.has(key) && !inherited.has(key) {
                    if let Ok(value) = node.get(key) {
                        inherited.set(key.to_vec(), value.clone());
                    }
                }
            }
            parent = node.get(b"Parent").and_then(Object::as_reference).ok();
            depth += 1;
            // Guard against cyclic parent links.
            if depth > 64 {
                break;
            }
        }

        if !inherited.is_empty() {
            let page = doc
                .get_dictionary_mut(page_id)
                .map_err(|e| MixError::other(format!("page is not a dictionary: {e}")))?;
            for (key, value) in inherited.into_iter() {
                page.set(key, value);
            }
        }
    }
    Ok(())
}

/// Append `page_ids` to the root page node of `doc`.
fn attach_pages(doc: &mut Document, page_ids: &[ObjectId]) -> Result<()> {
    let root_id = root_pages_id(doc)?;

    let root = doc
        .get_dictionary_mut(root_id)
        .map_err(|e| MixError::other(format!("page tree root is not a dictionary: {e}")))?;

    let kids = root
        .get_mut(b"Kids")
        .and_then(Object::as_array_mut)
        .map_err(|_| MixError::other("page tree root has no Kids array"))?;
    kids.extend(page_ids.iter().map(|&id| Object::Reference(id)));

    let count = root.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
    root.set("Count", count + page_ids.len() as i64);

    for &id in page_ids {
        let page = doc
            .get_dictionary_mut(id)
            .map_err(|e| MixError::other(format!("page is not a dictionary: {e}")))?;
        page.set("Parent", root_id);
    }
    Ok(())
}

fn set_producer_info(doc: &mut Document) {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let date = now
        .format(format_description!("D:[year][month][day][hour][minute][second]Z"))
        .unwrap_or_default();

    let literal = |s: &str| Object::String(s.as_bytes().to_vec(), StringFormat::Literal);
    let mut info = Dictionary::new();
    info.set("Producer", literal(crate::NAME));
    info.set("Creator", literal(crate::NAME));
    info.set("CreationDate", literal(&date));

    let info_id = doc.add_object(info);
    doc.trailer.set("Info", info_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{nested_pdf_bytes, page_widths, pdf_bytes};

    #[test]
    fn test_empty_finalize_is_none() {
        let merged = MergedDocument::new();
        assert!(merged.finalize().unwrap().is_none());
    }

    #[test]
    fn test_single_document_keeps_pages() {
        let mut merged = MergedDocument::new();
        assert_eq!(merged.append(&pdf_bytes(&[100.0, 200.0, 300.0])).unwrap(), 3);

        let bytes = merged.finalize().unwrap().unwrap();
        assert_eq!(page_widths(&bytes), vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn test_append_preserves_order() {
        let mut merged = MergedDocument::new();
        merged.append(&pdf_bytes(&[100.0])).unwrap();
        merged.append(&pdf_bytes(&[200.0, 250.0])).unwrap();
        merged.append(&pdf_bytes(&[300.0])).unwrap();

        assert_eq!(merged.source_count(), 3);
        assert_eq!(merged.page_count(), 4);

        let bytes = merged.finalize().unwrap().unwrap();
        assert_eq!(page_widths(&bytes), vec![100.0, 200.0, 250.0, 300.0]);
    }

    #[test]
    fn test_malformed_append_leaves_accumulator_intact() {
        let mut merged = MergedDocument::new();
        merged.append(&pdf_bytes(&[100.0])).unwrap();

        assert!(merged.append(b"%PDF-1.4 garbage").is_err());
        assert_eq!(merged.page_count(), 1);

        merged.append(&pdf_bytes(&[300.0])).unwrap();
        let bytes = merged.finalize().unwrap().unwrap();
        assert_eq!(page_widths(&bytes), vec![100.0, 300.0]);
    }

    #[test]
    fn test_nested_page_tree_inherits_media_box() {
        let mut merged = MergedDocument::new();
        merged.append(&pdf_bytes(&[100.0])).unwrap();
        merged.append(&nested_pdf_bytes(420.0, 2)).unwrap();

        let bytes = merged.finalize().unwrap().unwrap();
        assert_eq!(page_widths(&bytes), vec![100.0, 420.0, 420.0]);
    }

    #[test]
    fn test_finalize_sets_producer() {
        let mut merged = MergedDocument::new();
        merged.append(&pdf_bytes(&[100.0])).unwrap();
        let bytes = merged.finalize().unwrap().unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = doc.get_dictionary(info_id).unwrap();
        assert_eq!(
            info.get(b"Producer").unwrap().as_str().unwrap(),
            crate::NAME.as_bytes()
        );
    }
}
