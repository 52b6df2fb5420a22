//! Document outline (bookmarks) as exported by BulkPrint
//!
//! The export lays its outline out as a flat sequence of top-level bookmarks
//! where each bookmark that owns children is immediately followed by a
//! nested list holding them. Only the top-level entries carry meaning for the
//! explode pipeline; nested entries belong to embedded resumes and are
//! skipped.

/// A single bookmark (outline item)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    /// Display title
    pub title: String,
    /// Target page (0-based), `None` when the destination could not be resolved
    pub page: Option<usize>,
    /// Child bookmarks
    pub children: Vec<Bookmark>,
}

impl Bookmark {
    /// Create a bookmark pointing at a page
    pub fn new(title: impl Into<String>, page: usize) -> Self {
        Self {
            title: title.into(),
            page: Some(page),
            children: Vec::new(),
        }
    }

    /// Create a bookmark whose destination is unknown
    pub fn unresolved(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            page: None,
            children: Vec::new(),
        }
    }

    /// Add child bookmark
    pub fn with_child(mut self, child: Bookmark) -> Self {
        self.children.push(child);
        self
    }

    /// Count this bookmark and all of its descendants
    pub fn count_all(&self) -> usize {
        1 + self.children.iter().map(Bookmark::count_all).sum::<usize>()
    }
}

/// One element of the flat-with-nesting outline sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutlineEntry {
    /// A top-level bookmark
    Bookmark(Bookmark),
    /// The children of the preceding entry
    Nested(Vec<OutlineEntry>),
}

/// Outline sequence of a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outline {
    entries: Vec<OutlineEntry>,
}

impl Outline {
    /// Create an outline from raw entries
    pub fn new(entries: Vec<OutlineEntry>) -> Self {
        Self { entries }
    }

    /// Lay a bookmark forest out as the export's flat-with-nesting sequence.
    ///
    /// Each root becomes a top-level entry; its children follow it as a
    /// single nested entry, recursively.
    pub fn from_forest(roots: Vec<Bookmark>) -> Self {
        Self {
            entries: flatten(roots),
        }
    }

    /// Raw entries, nested lists included
    pub fn entries(&self) -> &[OutlineEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the top-level bookmarks with their position in the sequence
    pub fn top_level(&self) -> TopLevel<'_> {
        TopLevel {
            entries: &self.entries,
            position: 0,
        }
    }

    /// Find the first top-level bookmark after `position`, skipping nested entries
    pub fn next_top_level(&self, position: usize) -> Option<(usize, &Bookmark)> {
        TopLevel {
            entries: &self.entries,
            position: position.saturating_add(1),
        }
        .next()
    }

    /// Number of nested lists directly following the top-level entry at `position`
    pub fn nested_after(&self, position: usize) -> usize {
        self.entries
            .iter()
            .skip(position.saturating_add(1))
            .take_while(|entry| matches!(entry, OutlineEntry::Nested(_)))
            .map(|entry| match entry {
                OutlineEntry::Nested(children) => count_entries(children),
                OutlineEntry::Bookmark(_) => 0,
            })
            .sum()
    }
}

fn flatten(bookmarks: Vec<Bookmark>) -> Vec<OutlineEntry> {
    let mut entries = Vec::with_capacity(bookmarks.len());
    for mut bookmark in bookmarks {
        let children = std::mem::take(&mut bookmark.children);
        entries.push(OutlineEntry::Bookmark(bookmark));
        if !children.is_empty() {
            entries.push(OutlineEntry::Nested(flatten(children)));
        }
    }
    entries
}

fn count_entries(entries: &[OutlineEntry]) -> usize {
    entries
        .iter()
        .map(|entry| match entry {
            OutlineEntry::Bookmark(_) => 1,
            OutlineEntry::Nested(children) => count_entries(children),
        })
        .sum()
}

/// Iterator over top-level bookmarks, yielding `(position, bookmark)`
pub struct TopLevel<'a> {
    entries: &'a [OutlineEntry],
    position: usize,
}

impl<'a> Iterator for TopLevel<'a> {
    type Item = (usize, &'a Bookmark);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(entry) = self.entries.get(self.position) {
            let position = self.position;
            self.position += 1;
            if let OutlineEntry::Bookmark(bookmark) = entry {
                return Some((position, bookmark));
            }
        }
        None
    }
}
