//! BulkPrint Export Builder
//!
//! Builds PDFs shaped like a BulkPrint export: text pages plus an outline of
//! candidate details, resume and error-status bookmarks.

use anyhow::{bail, Context, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::fs;
use std::path::Path;

const LINE_HEIGHT: i64 = 16;

/// A bookmark of the generated outline
#[derive(Debug, Clone)]
pub struct FixtureBookmark {
    pub title: String,
    pub page: usize,
    pub children: Vec<FixtureBookmark>,
}

impl FixtureBookmark {
    pub fn new(title: impl Into<String>, page: usize) -> Self {
        Self {
            title: title.into(),
            page,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: FixtureBookmark) -> Self {
        self.children.push(child);
        self
    }
}

/// How page lines are laid out in the content stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextLayout {
    /// Each line in its own `BT`/`ET` block
    #[default]
    BlockPerLine,
    /// One `BT`/`ET` block per page, lines advanced with `T*`
    SingleBlock,
}

/// Builder for BulkPrint-style test PDFs
#[derive(Debug, Clone, Default)]
pub struct BulkPrintBuilder {
    pages: Vec<Vec<String>>,
    bookmarks: Vec<FixtureBookmark>,
    candidates: usize,
    layout: TextLayout,
}

impl BulkPrintBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the content stream layout used for every page
    pub fn layout(&mut self, layout: TextLayout) -> &mut Self {
        self.layout = layout;
        self
    }

    /// Append a page with one text line per entry, returning its index
    pub fn page<S: AsRef<str>>(&mut self, lines: &[S]) -> usize {
        self.pages
            .push(lines.iter().map(|line| line.as_ref().to_string()).collect());
        self.pages.len() - 1
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Add a top-level bookmark
    pub fn bookmark(&mut self, bookmark: FixtureBookmark) -> &mut Self {
        self.bookmarks.push(bookmark);
        self
    }

    /// Add a details page and its `"<n>. Candidate Details"` bookmark
    pub fn candidate(&mut self, name_line: &str, email: &str) -> usize {
        self.candidates += 1;
        let page = self.page(&[
            name_line,
            "Phone Number:",
            "0400 000 000",
            "Email Address:",
            email,
            "Address:",
            "1 Example Street",
        ]);
        let title = format!("{}. Candidate Details", self.candidates);
        self.bookmark(FixtureBookmark::new(title, page));
        page
    }

    /// Add resume pages and a bookmark titled `file_name` on the first one
    pub fn resume<S: AsRef<str>>(&mut self, file_name: &str, pages: &[S]) -> usize {
        let first = self.pages.len();
        for text in pages {
            self.page(&[text.as_ref()]);
        }
        self.bookmark(FixtureBookmark::new(file_name, first));
        first
    }

    /// Add a placeholder page for a resume BulkPrint failed to merge
    pub fn failed_resume(&mut self, file_name: &str, status: &str) -> usize {
        let page = self.page(&["This document could not be included."]);
        self.bookmark(FixtureBookmark::new(
            format!("{file_name} ({status})"),
            page,
        ));
        page
    }

    /// Encode the document
    pub fn build(&self) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut page_ids = Vec::with_capacity(self.pages.len());
        for lines in &self.pages {
            let content = page_content(lines, self.layout).encode()?;
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
            });
            page_ids.push(page_id);
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => page_ids.iter().map(|&id| Object::Reference(id)).collect::<Vec<_>>(),
                "Count" => page_ids.len() as i64,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );

        let mut catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        };
        if !self.bookmarks.is_empty() {
            let outlines_id = doc.new_object_id();
            let (first, last) = add_items(&mut doc, outlines_id, &self.bookmarks, &page_ids)?;
            let total: usize = self.bookmarks.iter().map(count_all).sum();
            doc.objects.insert(
                outlines_id,
                Object::Dictionary(dictionary! {
                    "Type" => "Outlines",
                    "First" => first,
                    "Last" => last,
                    "Count" => total as i64,
                }),
            );
            catalog.set("Outlines", outlines_id);
        }
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).context("failed to encode test PDF")?;
        Ok(buf)
    }

    /// Encode the document and write it to `path`
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let bytes = self.build()?;
        fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
    }
}

fn page_content(lines: &[String], layout: TextLayout) -> Content {
    let mut operations = Vec::new();
    if layout == TextLayout::SingleBlock {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
        operations.push(Operation::new("TL", vec![LINE_HEIGHT.into()]));
        operations.push(Operation::new("Td", vec![50.into(), 800.into()]));
        for (row, line) in lines.iter().enumerate() {
            if row > 0 {
                operations.push(Operation::new("T*", vec![]));
            }
            operations.push(Operation::new("Tj", vec![Object::string_literal(line.as_str())]));
        }
        operations.push(Operation::new("ET", vec![]));
        return Content { operations };
    }

    for (row, line) in lines.iter().enumerate() {
        let y = 800 - LINE_HEIGHT * row as i64;
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
        operations.push(Operation::new("Td", vec![50.into(), y.into()]));
        operations.push(Operation::new("Tj", vec![Object::string_literal(line.as_str())]));
        operations.push(Operation::new("ET", vec![]));
    }
    Content { operations }
}

fn count_all(bookmark: &FixtureBookmark) -> usize {
    1 + bookmark.children.iter().map(count_all).sum::<usize>()
}

/// Insert sibling outline items under `parent`, returning the first and last ids
fn add_items(
    doc: &mut Document,
    parent: ObjectId,
    items: &[FixtureBookmark],
    page_ids: &[ObjectId],
) -> Result<(ObjectId, ObjectId)> {
    let ids: Vec<ObjectId> = items.iter().map(|_| doc.new_object_id()).collect();

    for (index, item) in items.iter().enumerate() {
        let Some(&page_id) = page_ids.get(item.page) else {
            bail!("bookmark '{}' targets missing page {}", item.title, item.page);
        };

        let mut dict = dictionary! {
            "Title" => Object::string_literal(item.title.as_str()),
            "Parent" => parent,
            "Dest" => vec![Object::Reference(page_id), "Fit".into()],
        };
        if index > 0 {
            dict.set("Prev", ids[index - 1]);
        }
        if let Some(&next) = ids.get(index + 1) {
            dict.set("Next", next);
        }
        if !item.children.is_empty() {
            let (first, last) = add_items(doc, ids[index], &item.children, page_ids)?;
            dict.set("First", first);
            dict.set("Last", last);
            let open: usize = item.children.iter().map(count_all).sum();
            dict.set("Count", open as i64);
        }
        doc.objects.insert(ids[index], Object::Dictionary(dict));
    }

    match (ids.first(), ids.last()) {
        (Some(&first), Some(&last)) => Ok((first, last)),
        _ => bail!("outline level without items"),
    }
}

/// Three candidates: a two-page resume, an unmerged resume and a one-page
/// resume carrying its own nested bookmarks.
pub fn sample_export() -> BulkPrintBuilder {
    let mut builder = BulkPrintBuilder::new();

    builder.candidate("Mr John Quincy Public", "john.public@example.com");
    builder.resume("John_Public_CV.pdf", &["John resume page one", "John resume page two"]);

    builder.candidate("Jane Doe", "jane.doe@example.com");
    builder.failed_resume("Jane_Doe_Resume.pdf", "Error");

    builder.candidate("Dr Alex Smith-Jones", "alex@example.org");
    let first = builder.page(&["Alex resume summary"]);
    builder.bookmark(
        FixtureBookmark::new("Alex_Smith_Jones.pdf", first)
            .with_child(FixtureBookmark::new("Experience", first)),
    );

    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_export_builds() {
        let builder = sample_export();
        assert_eq!(builder.page_count(), 7);
        let bytes = builder.build().unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 7);
        assert!(doc.catalog().unwrap().has(b"Outlines"));
    }

    #[test]
    fn test_single_block_layout_writes_one_text_object() {
        let mut builder = BulkPrintBuilder::new();
        builder.layout(TextLayout::SingleBlock);
        builder.page(&["first", "second"]);
        let content = page_content(&builder.pages[0], TextLayout::SingleBlock);
        let operators: Vec<&str> = content
            .operations
            .iter()
            .map(|op| op.operator.as_str())
            .collect();
        assert_eq!(
            operators,
            vec!["BT", "Tf", "TL", "Td", "Tj", "T*", "Tj", "ET"]
        );
        assert!(builder.build().is_ok());
    }

    #[test]
    fn test_bookmark_to_missing_page_fails() {
        let mut builder = BulkPrintBuilder::new();
        builder.page(&["only page"]);
        builder.bookmark(FixtureBookmark::new("broken.pdf", 4));
        assert!(builder.build().is_err());
    }

    #[test]
    fn test_page_text_lines() {
        let mut builder = BulkPrintBuilder::new();
        builder.page(&["first (line)", "second"]);
        let doc = Document::load_mem(&builder.build().unwrap()).unwrap();
        let text = doc.extract_text(&[1]).unwrap();
        assert!(text.contains("first (line)"), "got {text:?}");
        assert!(text.contains("second"));
    }
}
