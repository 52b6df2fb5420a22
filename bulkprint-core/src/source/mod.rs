//! Paged document sources
//!
//! The explode pipeline only needs four things from a document: its page
//! count, its outline, the text of a page and a copy of a page range as a
//! standalone document. [`PagedDocument`] captures exactly that so the
//! pipeline can run against the `lopdf` backend or an in-memory fake.

mod pdf;
mod text;

#[cfg(test)]
pub(crate) mod memory;

pub use pdf::PdfSource;

use crate::error::Result;
use crate::outline::Outline;
use std::ops::Range;

/// Read access to a bookmarked, paged document
pub trait PagedDocument {
    /// Total number of pages
    fn page_count(&self) -> usize;

    /// Outline in export order, nested lists following their owners
    fn outline(&self) -> Result<Outline>;

    /// Rendered text of a page (0-based)
    fn page_text(&self, page: usize) -> Result<String>;

    /// Copy pages `[start, end)` into a new document, returned as encoded bytes
    fn extract_pages(&self, pages: Range<usize>) -> Result<Vec<u8>>;
}
