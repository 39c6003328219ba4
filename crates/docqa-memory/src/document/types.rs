use std::collections::HashMap;

pub const FILENAME_KEY: &str = "filename";
pub const PAGE_KEY: &str = "page";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub source: String,
    pub content_type: String,
    pub extra: HashMap<String, String>,
}

impl DocumentMetadata {
    #[must_use]
    pub fn new(source: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content_type: content_type.into(),
            extra: HashMap::new(),
        }
    }

    /// Path of the uploaded file the text came from, once the chunking stage tagged it.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.extra.get(FILENAME_KEY).map(String::as_str)
    }

    #[must_use]
    pub fn page(&self) -> Option<usize> {
        self.extra.get(PAGE_KEY).and_then(|p| p.parse().ok())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub content: String,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub content: String,
    pub metadata: DocumentMetadata,
    pub chunk_index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_read_extra_keys() {
        let mut meta = DocumentMetadata::new("/tmp/a.pdf", "application/pdf");
        assert!(meta.filename().is_none());
        assert!(meta.page().is_none());

        meta.extra.insert(FILENAME_KEY.into(), "/tmp/a.pdf".into());
        meta.extra.insert(PAGE_KEY.into(), "3".into());
        assert_eq!(meta.filename(), Some("/tmp/a.pdf"));
        assert_eq!(meta.page(), Some(3));
    }

    #[test]
    fn unparsable_page_is_none() {
        let mut meta = DocumentMetadata::new("x", "text/plain");
        meta.extra.insert(PAGE_KEY.into(), "first".into());
        assert!(meta.page().is_none());
    }
}
