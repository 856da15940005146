//! # Preview Derivation
//!
//! The preview is a fresh document. Its catalog holds only a page tree,
//! and the kept pages `1..=P` are deep-copied into it together with the
//! objects they reference. Nothing reachable only from the source catalog
//! or trailer (form fields, outlines, name trees, structure trees, document
//! info) is carried over.
//!
//! While copying:
//! - references to page tree nodes resolve to the copied page when it is
//!   kept and to `null` otherwise;
//! - annotations are copied only when a kept page lists them directly;
//! - `/Parent` links are dropped, so a widget never drags in its field tree;
//! - a page's `/XObject` resources are narrowed to the names its content
//!   actually paints.

use std::collections::{BTreeMap, BTreeSet};

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};

use crate::compose::append_sentinel_page;
use crate::error::PreviewError;
use crate::rule::preview_page_count;

/// Attributes a page inherits from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Bound on page tree depth when resolving inherited attributes.
const MAX_TREE_DEPTH: usize = 64;

/// Stateless preview deriver, for injection where a value is wanted.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreviewGenerator;

impl PreviewGenerator {
    /// See [`derive`].
    pub fn derive(&self, full: &[u8]) -> Result<Vec<u8>, PreviewError> {
        derive(full)
    }
}

fn load(bytes: &[u8]) -> Result<Document, PreviewError> {
    Document::load_mem(bytes).map_err(|e| PreviewError::Parse(e.to_string()))
}

fn type_name(object: &Object) -> Option<&[u8]> {
    let dict = match object {
        Object::Dictionary(dict) => dict,
        _ => return None,
    };
    dict.get(b"Type").and_then(Object::as_name).ok()
}

fn is_page_node(object: &Object) -> bool {
    matches!(type_name(object), Some(b"Page") | Some(b"Pages"))
}

fn is_annotation(object: &Object) -> bool {
    match object {
        Object::Dictionary(dict) => match type_name(object) {
            Some(name) => name == b"Annot",
            None => dict.has(b"Subtype") && dict.has(b"Rect"),
        },
        _ => false,
    }
}

fn resolve_dict<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Dictionary> {
    match object {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

/// Copy inherited attributes from the page's ancestors onto the page.
fn flatten_inherited(source: &Document, page: &mut Dictionary) {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;
    while let Some(id) = parent {
        if depth >= MAX_TREE_DEPTH {
            break;
        }
        let Ok(node) = source.get_dictionary(id) else {
            break;
        };
        for key in INHERITABLE {
            if !page.has(key) {
                if let Ok(value) = node.get(key) {
                    page.set(key.to_vec(), value.clone());
                }
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }
}

/// Keep only the XObjects the page's content invokes with `Do`.
///
/// Pages whose content cannot be decoded keep their resources as they are.
fn narrow_xobjects(source: &Document, page_id: ObjectId, page: &mut Dictionary) {
    let Ok(content) = source.get_and_decode_page_content(page_id) else {
        return;
    };
    let painted: BTreeSet<Vec<u8>> = content
        .operations
        .iter()
        .filter(|op| op.operator == "Do")
        .filter_map(|op| op.operands.first())
        .filter_map(|name| name.as_name().ok())
        .map(<[u8]>::to_vec)
        .collect();

    let Some(mut resources) = page
        .get(b"Resources")
        .ok()
        .and_then(|r| resolve_dict(source, r))
        .cloned()
    else {
        return;
    };
    let Some(xobjects) = resources
        .get(b"XObject")
        .ok()
        .and_then(|x| resolve_dict(source, x))
        .cloned()
    else {
        return;
    };

    let mut narrowed = Dictionary::new();
    for (name, value) in xobjects.iter() {
        if painted.contains(name) {
            narrowed.set(name.clone(), value.clone());
        }
    }
    resources.set("XObject", narrowed);
    page.set("Resources", resources);
}

fn annotation_ids(source: &Document, page: &Dictionary) -> Vec<ObjectId> {
    let annots = match page.get(b"Annots") {
        Ok(Object::Reference(id)) => source.get_object(*id).ok(),
        Ok(other) => Some(other),
        Err(_) => None,
    };
    match annots {
        Some(Object::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_reference().ok())
            .collect(),
        _ => Vec::new(),
    }
}

/// Deep copy of selected pages from one document into another.
struct PageCopier<'a> {
    source: &'a Document,
    target: Document,
    /// Source page id to target page id, for the kept pages.
    pages: BTreeMap<ObjectId, ObjectId>,
    /// Annotations listed directly by a kept page.
    annotations: BTreeSet<ObjectId>,
    /// Source object id to target object id, for everything copied so far.
    copied: BTreeMap<ObjectId, ObjectId>,
}

impl<'a> PageCopier<'a> {
    fn new(source: &'a Document) -> Self {
        Self {
            source,
            target: Document::with_version(source.version.clone()),
            pages: BTreeMap::new(),
            annotations: BTreeSet::new(),
            copied: BTreeMap::new(),
        }
    }

    fn copy_object(&mut self, object: &Object) -> Result<Object, PreviewError> {
        Ok(match object {
            Object::Reference(id) => self.copy_reference(*id)?,
            Object::Array(items) => Object::Array(
                items
                    .iter()
                    .map(|item| self.copy_object(item))
                    .collect::<Result<_, _>>()?,
            ),
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dictionary(dict)?),
            Object::Stream(stream) => {
                let mut copy = stream.clone();
                copy.dict = self.copy_dictionary(&stream.dict)?;
                Object::Stream(copy)
            }
            other => other.clone(),
        })
    }

    fn copy_dictionary(&mut self, dict: &Dictionary) -> Result<Dictionary, PreviewError> {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            if key.as_slice() == b"Parent" {
                continue;
            }
            copy.set(key.clone(), self.copy_object(value)?);
        }
        Ok(copy)
    }

    fn copy_reference(&mut self, id: ObjectId) -> Result<Object, PreviewError> {
        if let Some(target) = self.pages.get(&id).or_else(|| self.copied.get(&id)) {
            return Ok(Object::Reference(*target));
        }
        let source = self.source;
        let Ok(object) = source.get_object(id) else {
            return Ok(Object::Null);
        };
        if is_page_node(object) || (is_annotation(object) && !self.annotations.contains(&id)) {
            return Ok(Object::Null);
        }

        let target_id = self.target.new_object_id();
        self.copied.insert(id, target_id);
        let copy = self.copy_object(object)?;
        self.target.objects.insert(target_id, copy);
        Ok(Object::Reference(target_id))
    }

    /// Copy `kept` under a new page tree root and return the root's id.
    fn copy_pages(&mut self, kept: &[ObjectId]) -> Result<ObjectId, PreviewError> {
        let source = self.source;
        let pages_id = self.target.new_object_id();
        let mut placed = Vec::with_capacity(kept.len());
        for id in kept {
            let target_id = self.target.new_object_id();
            self.pages.insert(*id, target_id);
            let page = source.get_dictionary(*id)?;
            self.annotations.extend(annotation_ids(source, page));
            placed.push((*id, target_id));
        }

        let mut kids = Vec::with_capacity(placed.len());
        for (source_id, target_id) in placed {
            let mut page = source.get_dictionary(source_id)?.clone();
            flatten_inherited(source, &mut page);
            narrow_xobjects(source, source_id, &mut page);
            // Article beads thread through other pages.
            page.remove(b"B");

            let mut copy = self.copy_dictionary(&page)?;
            copy.set("Parent", pages_id);
            self.target.objects.insert(target_id, Object::Dictionary(copy));
            kids.push(Object::Reference(target_id));
        }

        let count = i64::try_from(kids.len())
            .map_err(|_| PreviewError::PageTree("page count out of range".into()))?;
        self.target.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        Ok(pages_id)
    }
}

/// Number of pages in a PDF.
pub fn page_count(bytes: &[u8]) -> Result<u32, PreviewError> {
    let doc = load(bytes)?;
    u32::try_from(doc.get_pages().len())
        .map_err(|_| PreviewError::PageTree("page count out of range".into()))
}

/// Derive the preview of the PDF in `full`.
///
/// The result has exactly `preview_page_count(N) + 1` pages, the last being
/// the sentinel. Identical input yields byte-identical output.
///
/// # Errors
///
/// [`PreviewError::Parse`] when `full` is not a readable PDF, and
/// [`PreviewError::PageTree`] when a kept page is not a dictionary.
pub fn derive(full: &[u8]) -> Result<Vec<u8>, PreviewError> {
    let source = load(full)?;
    let pages = source.get_pages();
    let total = u32::try_from(pages.len())
        .map_err(|_| PreviewError::PageTree("page count out of range".into()))?;
    let keep = preview_page_count(total);
    let kept: Vec<ObjectId> = pages
        .iter()
        .filter(|(number, _)| **number <= keep)
        .map(|(_, id)| *id)
        .collect();

    let mut copier = PageCopier::new(&source);
    let pages_id = copier.copy_pages(&kept)?;
    let mut doc = copier.target;
    append_sentinel_page(&mut doc, pages_id)?;
    let catalog = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog);

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| PreviewError::Serialize(e.to_string()))?;
    tracing::debug!(pages = total, kept = keep, size = out.len(), "preview derived");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_pdf() {
        assert!(matches!(derive(b"not a pdf at all"), Err(PreviewError::Parse(_))));
        assert!(matches!(derive(b""), Err(PreviewError::Parse(_))));
    }

    #[test]
    fn rejects_truncated_pdf() {
        let bytes = crate::text_pdf(&["a", "b"]).unwrap();
        assert!(derive(&bytes[..20]).is_err());
    }

    #[test]
    fn page_count_reads_pages() {
        let bytes = crate::text_pdf(&["a", "b", "c", "d"]).unwrap();
        assert_eq!(page_count(&bytes).unwrap(), 4);
    }
}
