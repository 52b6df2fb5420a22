//! `lopdf` backed document source
//!
//! Outline reading follows ISO 32000-1 Section 12.3.3: the catalog's
//! `/Outlines` dictionary links to its first item through `/First`, items
//! chain through `/Next`, and an item's children hang off its own `/First`.
//! Destinations are resolved from `/Dest` or a GoTo action's `/D`.

use super::{text, PagedDocument};
use crate::error::{BulkPrintError, Result};
use crate::outline::{Bookmark, Outline};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::path::Path;
use tracing::{debug, warn};

/// Outline items nested deeper than this are dropped
const MAX_OUTLINE_DEPTH: usize = 64;

/// Name trees and named destinations deeper than this are not followed
const MAX_LOOKUP_DEPTH: usize = 32;

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE_KEYS: &[&[u8]] = &[b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// A PDF opened for reading
pub struct PdfSource {
    document: Document,
    page_ids: Vec<ObjectId>,
    page_index: HashMap<ObjectId, usize>,
}

impl PdfSource {
    /// Open a PDF file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(BulkPrintError::InputNotFound(path.to_path_buf()));
        }
        let document = Document::load(path)?;
        debug!(path = %path.display(), "loaded PDF");
        Ok(Self::from_document(document))
    }

    /// Parse a PDF held in memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self::from_document(Document::load_mem(bytes)?))
    }

    fn from_document(document: Document) -> Self {
        let page_ids: Vec<ObjectId> = document.get_pages().into_values().collect();
        let page_index = page_ids
            .iter()
            .enumerate()
            .map(|(index, &id)| (id, index))
            .collect();
        Self {
            document,
            page_ids,
            page_index,
        }
    }

    fn read_bookmarks(&self) -> Result<Vec<Bookmark>> {
        let catalog = catalog(&self.document)?;
        let outlines = match catalog.get(b"Outlines") {
            Ok(obj) => resolve(&self.document, obj)?.as_dict()?,
            Err(_) => return Ok(Vec::new()),
        };
        let first = match outlines.get(b"First") {
            Ok(obj) => obj.as_reference()?,
            Err(_) => return Ok(Vec::new()),
        };

        let mut visited = HashSet::new();
        let bookmarks = self.walk_items(first, 0, &mut visited)?;
        debug!(
            top_level = bookmarks.len(),
            total = bookmarks.iter().map(Bookmark::count_all).sum::<usize>(),
            "read outline"
        );
        Ok(bookmarks)
    }

    fn walk_items(
        &self,
        first: ObjectId,
        depth: usize,
        visited: &mut HashSet<ObjectId>,
    ) -> Result<Vec<Bookmark>> {
        if depth >= MAX_OUTLINE_DEPTH {
            warn!(depth, "outline nested too deeply, ignoring remaining levels");
            return Ok(Vec::new());
        }

        let mut items = Vec::new();
        let mut current = Some(first);

        while let Some(id) = current {
            if !visited.insert(id) {
                warn!(object = id.0, "outline item linked twice, stopping walk");
                break;
            }
            let item = self.document.get_object(id)?.as_dict()?;

            let title = item
                .get(b"Title")
                .ok()
                .and_then(|obj| resolve(&self.document, obj).ok())
                .and_then(decode_text)
                .unwrap_or_default();
            let page = self.destination_page(item);

            let children = match item.get(b"First").and_then(Object::as_reference) {
                Ok(child) => self.walk_items(child, depth + 1, visited)?,
                Err(_) => Vec::new(),
            };

            items.push(Bookmark {
                title,
                page,
                children,
            });

            current = item.get(b"Next").and_then(Object::as_reference).ok();
        }

        Ok(items)
    }

    /// Page targeted by an outline item, via `/Dest` or a GoTo `/A`ction
    fn destination_page(&self, item: &Dictionary) -> Option<usize> {
        if let Ok(dest) = item.get(b"Dest") {
            return self.resolve_destination(dest, 0);
        }

        let action = resolve(&self.document, item.get(b"A").ok()?).ok()?.as_dict().ok()?;
        match action.get(b"S") {
            Ok(Object::Name(kind)) if kind.as_slice() == b"GoTo" => {
                self.resolve_destination(action.get(b"D").ok()?, 0)
            }
            _ => None,
        }
    }

    fn resolve_destination(&self, dest: &Object, depth: usize) -> Option<usize> {
        if depth >= MAX_LOOKUP_DEPTH {
            return None;
        }
        match resolve(&self.document, dest).ok()? {
            Object::Array(array) => match array.first()? {
                Object::Reference(page_id) => self.page_index.get(page_id).copied(),
                Object::Integer(index) => usize::try_from(*index)
                    .ok()
                    .filter(|&index| index < self.page_ids.len()),
                _ => None,
            },
            Object::Dictionary(dict) => self.resolve_destination(dict.get(b"D").ok()?, depth + 1),
            Object::String(name, _) => {
                let target = self.named_destination(name)?;
                self.resolve_destination(target, depth + 1)
            }
            Object::Name(name) => {
                let target = self.named_destination(name)?;
                self.resolve_destination(target, depth + 1)
            }
            _ => None,
        }
    }

    /// Look a destination name up in `/Names → /Dests`, then in the catalog `/Dests`
    fn named_destination(&self, name: &[u8]) -> Option<&Object> {
        let catalog = catalog(&self.document).ok()?;

        let from_tree = catalog
            .get(b"Names")
            .ok()
            .and_then(|obj| resolve(&self.document, obj).ok())
            .and_then(|obj| obj.as_dict().ok())
            .and_then(|names| names.get(b"Dests").ok())
            .and_then(|obj| resolve(&self.document, obj).ok())
            .and_then(|obj| obj.as_dict().ok())
            .and_then(|tree| self.lookup_name_tree(tree, name, 0));
        if from_tree.is_some() {
            return from_tree;
        }

        catalog
            .get(b"Dests")
            .ok()
            .and_then(|obj| resolve(&self.document, obj).ok())
            .and_then(|obj| obj.as_dict().ok())
            .and_then(|dests| dests.get(name).ok())
    }

    fn lookup_name_tree<'a>(
        &'a self,
        node: &'a Dictionary,
        name: &[u8],
        depth: usize,
    ) -> Option<&'a Object> {
        if depth >= MAX_LOOKUP_DEPTH {
            return None;
        }

        if let Some(pairs) = node
            .get(b"Names")
            .ok()
            .and_then(|obj| resolve(&self.document, obj).ok())
            .and_then(|obj| obj.as_array().ok())
        {
            let found = pairs.chunks(2).find_map(|pair| match pair {
                [Object::String(key, _), value] if key.as_slice() == name => Some(value),
                _ => None,
            });
            if found.is_some() {
                return found;
            }
        }

        let kids = node
            .get(b"Kids")
            .ok()
            .and_then(|obj| resolve(&self.document, obj).ok())
            .and_then(|obj| obj.as_array().ok())?;
        kids.iter().find_map(|kid| {
            let kid = resolve(&self.document, kid).ok()?.as_dict().ok()?;
            self.lookup_name_tree(kid, name, depth + 1)
        })
    }

    /// Resource dictionary of a page, inherited from the nearest ancestor that has one
    fn page_resources(&self, page_id: ObjectId) -> Option<&Dictionary> {
        let mut seen = HashSet::new();
        let mut node = Some(page_id);

        while let Some(id) = node {
            if !seen.insert(id) {
                break;
            }
            let dict = self.document.get_object(id).and_then(Object::as_dict).ok()?;
            if let Ok(resources) = dict.get(b"Resources") {
                return resolve(&self.document, resources)
                    .and_then(Object::as_dict)
                    .ok();
            }
            node = dict.get(b"Parent").and_then(Object::as_reference).ok();
        }

        None
    }

    /// Collect inheritable attributes from the page's ancestors, nearest first
    fn inherited_attributes(&self, page_id: ObjectId) -> Vec<(Vec<u8>, Object)> {
        let mut found: Vec<(Vec<u8>, Object)> = Vec::new();
        let mut seen = HashSet::new();
        let mut node = self
            .document
            .get_object(page_id)
            .and_then(Object::as_dict)
            .and_then(|page| page.get(b"Parent"))
            .and_then(Object::as_reference)
            .ok();

        while let Some(id) = node {
            if !seen.insert(id) {
                break;
            }
            let Ok(parent) = self.document.get_object(id).and_then(Object::as_dict) else {
                break;
            };
            for key in INHERITABLE_KEYS {
                if found.iter().all(|(k, _)| k.as_slice() != *key) {
                    if let Ok(value) = parent.get(key) {
                        found.push((key.to_vec(), value.clone()));
                    }
                }
            }
            node = parent.get(b"Parent").and_then(Object::as_reference).ok();
        }

        found
    }
}

impl PagedDocument for PdfSource {
    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn outline(&self) -> Result<Outline> {
        Ok(Outline::from_forest(self.read_bookmarks()?))
    }

    fn page_text(&self, page: usize) -> Result<String> {
        if page >= self.page_ids.len() {
            return Err(BulkPrintError::InvalidPageNumber(page));
        }
        let page_id = self.page_ids[page];
        let content = self.document.get_page_content(page_id)?;
        text::extract_text(&self.document, &content, self.page_resources(page_id))
    }

    fn extract_pages(&self, pages: Range<usize>) -> Result<Vec<u8>> {
        if pages.is_empty() {
            return Err(BulkPrintError::MalformedOutline(format!(
                "empty page range [{}, {})",
                pages.start, pages.end
            )));
        }
        let selected = self
            .page_ids
            .get(pages.clone())
            .ok_or(BulkPrintError::InvalidPageNumber(pages.end))?
            .to_vec();

        let mut extract = Document::with_version(self.document.version.clone());
        extract.max_id = self.document.max_id;
        let pages_id = extract.new_object_id();

        // Inherited attributes are hoisted onto each page since the source
        // page tree nodes are not copied.
        let mut queue = Vec::with_capacity(selected.len());
        for &page_id in &selected {
            let mut page = self.document.get_object(page_id)?.as_dict()?.clone();
            for (key, value) in self.inherited_attributes(page_id) {
                if !page.has(&key) {
                    page.set(key, value);
                }
            }
            page.set("Parent", pages_id);
            extract.objects.insert(page_id, Object::Dictionary(page));
            queue.push(page_id);
        }

        while let Some(id) = queue.pop() {
            let mut references = Vec::new();
            if let Some(object) = extract.objects.get(&id) {
                collect_references(object, &mut references);
            }
            for reference in references {
                if reference == pages_id || extract.objects.contains_key(&reference) {
                    continue;
                }
                match self.document.get_object(reference) {
                    Ok(object) => {
                        extract.objects.insert(reference, object.clone());
                        queue.push(reference);
                    }
                    Err(_) => debug!(object = reference.0, "dangling reference in extracted page"),
                }
            }
        }

        let kids: Vec<Object> = selected.iter().map(|&id| Object::Reference(id)).collect();
        extract.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => selected.len() as i64,
            }),
        );
        let catalog_id = extract.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        extract.trailer.set("Root", catalog_id);
        extract.renumber_objects();

        let mut buffer = Vec::new();
        extract.save_to(&mut buffer)?;
        Ok(buffer)
    }
}

/// Gather the object references held by `object`.
///
/// `/Parent` links are not followed so the source page tree stays behind.
fn collect_references(object: &Object, out: &mut Vec<ObjectId>) {
    match object {
        Object::Reference(id) => out.push(*id),
        Object::Array(items) => {
            for item in items {
                collect_references(item, out);
            }
        }
        Object::Dictionary(dict) => collect_dict_references(dict, out),
        Object::Stream(stream) => collect_dict_references(&stream.dict, out),
        _ => {}
    }
}

fn collect_dict_references(dict: &Dictionary, out: &mut Vec<ObjectId>) {
    for (key, value) in dict.iter() {
        if key.as_slice() != b"Parent" {
            collect_references(value, out);
        }
    }
}

fn catalog(document: &Document) -> Result<&Dictionary> {
    let root = document.trailer.get(b"Root")?;
    Ok(resolve(document, root)?.as_dict()?)
}

pub(super) fn resolve<'a>(document: &'a Document, obj: &'a Object) -> lopdf::Result<&'a Object> {
    match obj {
        Object::Reference(id) => document.get_object(*id),
        other => Ok(other),
    }
}

/// Decode a PDF text string: UTF-16BE or UTF-8 with BOM, else PDFDocEncoding
fn decode_text(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_text_bytes(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

fn decode_text_bytes(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(utf8) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(utf8).into_owned();
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
