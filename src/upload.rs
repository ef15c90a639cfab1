//! The uploaded file data model.

use std::fmt;

/// A named byte source submitted as part of a batch.
///
/// The name is only used to derive the file type and to label report
/// entries. Content is immutable once the file has been received.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    name: String,
    content: Vec<u8>,
}

impl UploadedFile {
    /// Create an uploaded file from a name and its bytes.
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// File name as submitted.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw file content.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Size of the content in bytes.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Whether the content is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Lowercased text after the last `.` of the name.
    ///
    /// A name without a dot has no extension and yields an empty string.
    pub fn extension(&self) -> String {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default()
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("name", &self.name)
            .field("len", &self.content.len())
            .finish()
    }
}
