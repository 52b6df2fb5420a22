use super::PagedDocument;
use crate::error::{BulkPrintError, Result};
use crate::outline::{Bookmark, Outline};
use std::ops::Range;

/// In-memory document: each page is its text, extraction joins page texts
#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryDocument {
    pub pages: Vec<String>,
    pub bookmarks: Vec<Bookmark>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page and return its index
    pub fn page(&mut self, text: impl Into<String>) -> usize {
        self.pages.push(text.into());
        self.pages.len() - 1
    }

    pub fn bookmark(&mut self, bookmark: Bookmark) -> &mut Self {
        self.bookmarks.push(bookmark);
        self
    }

    /// Decode bytes produced by [`PagedDocument::extract_pages`]
    pub fn decode_extract(bytes: &[u8]) -> Vec<String> {
        String::from_utf8_lossy(bytes)
            .split('\u{c}')
            .map(str::to_string)
            .collect()
    }
}

impl PagedDocument for MemoryDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn outline(&self) -> Result<Outline> {
        Ok(Outline::from_forest(self.bookmarks.clone()))
    }

    fn page_text(&self, page: usize) -> Result<String> {
        self.pages
            .get(page)
            .cloned()
            .ok_or(BulkPrintError::InvalidPageNumber(page))
    }

    fn extract_pages(&self, pages: Range<usize>) -> Result<Vec<u8>> {
        let selected = self
            .pages
            .get(pages.clone())
            .ok_or(BulkPrintError::InvalidPageNumber(pages.end))?;
        Ok(selected.join("\u{c}").into_bytes())
    }
}
