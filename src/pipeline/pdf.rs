//! Shared `lopdf` plumbing: load/save with path-carrying errors, page-tree
//! attribute lookup and page descriptions.

use crate::error::CardCollageError;
use crate::output::{DocumentInfo, PageInfo};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::path::Path;

/// Page attributes a page may inherit from its ancestors in the page tree.
pub const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

// Guards against a malformed tree whose Parent links loop.
const MAX_TREE_DEPTH: usize = 64;

/// Load a PDF, distinguishing "missing" from "unreadable".
pub fn load_document(path: &Path) -> Result<Document, CardCollageError> {
    if !path.exists() {
        return Err(CardCollageError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    Document::load(path).map_err(|e| CardCollageError::PdfLoad {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Serialise `doc` to `path`.
pub fn save_document(doc: &mut Document, path: &Path) -> Result<(), CardCollageError> {
    doc.save(path)
        .map(|_| ())
        .map_err(|e| CardCollageError::PdfWrite {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
}

/// Follow a reference to the object it names; other objects are returned as-is.
pub fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Inheritable attributes `page` does not set itself, taken from the nearest
/// ancestor that does.
pub fn inherited_attributes(doc: &Document, page: &Dictionary) -> Dictionary {
    let mut inherited = Dictionary::new();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;

    while let Some(id) = parent {
        let Ok(node) = doc.get_dictionary(id) else {
            break;
        };
        for key in INHERITABLE {
            if page.has(key) || inherited.has(key) {
                continue;
            }
            if let Ok(value) = node.get(key) {
                inherited.set(key.to_vec(), value.clone());
            }
        }

        depth += 1;
        if depth >= MAX_TREE_DEPTH {
            break;
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    inherited
}

/// The value of `key` on a page, falling back to the page tree.
pub fn page_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let page = doc.get_dictionary(page_id).ok()?;
    match page.get(key) {
        Ok(value) => Some(value.clone()),
        Err(_) => inherited_attributes(doc, page).get(key).ok().cloned(),
    }
}

/// Whether `object` is a `Catalog` or `Pages` node.
pub fn is_tree_node(object: &Object) -> bool {
    matches!(
        object
            .as_dict()
            .and_then(|d| d.get(b"Type"))
            .and_then(Object::as_name),
        Ok(b"Catalog" | b"Pages")
    )
}

/// Number of image XObjects reachable from a page's resources.
pub fn page_image_count(doc: &Document, page_id: ObjectId) -> usize {
    let Some(resources) = page_attribute(doc, page_id, b"Resources") else {
        return 0;
    };
    let Some(Ok(resources)) = resolve(doc, &resources).map(Object::as_dict) else {
        return 0;
    };
    let Some(Ok(xobjects)) = resources
        .get(b"XObject")
        .ok()
        .and_then(|x| resolve(doc, x))
        .map(Object::as_dict)
    else {
        return 0;
    };

    xobjects
        .iter()
        .filter_map(|(_, value)| resolve(doc, value))
        .filter(|object| match object {
            Object::Stream(stream) => matches!(
                stream.dict.get(b"Subtype").and_then(Object::as_name),
                Ok(b"Image")
            ),
            _ => false,
        })
        .count()
}

fn media_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    let mut out = [0.0; 4];
    let Some(Object::Array(values)) = page_attribute(doc, page_id, b"MediaBox")
        .as_ref()
        .and_then(|m| resolve(doc, m))
        .cloned()
    else {
        return out;
    };
    for (slot, value) in out.iter_mut().zip(values.iter()) {
        *slot = value.as_float().unwrap_or(0.0);
    }
    out
}

/// Page count, media boxes and image counts of a loaded document.
pub fn describe_document(doc: &Document) -> DocumentInfo {
    let pages: Vec<PageInfo> = doc
        .get_pages()
        .into_values()
        .map(|page_id| PageInfo {
            media_box: media_box(doc, page_id),
            image_count: page_image_count(doc, page_id),
        })
        .collect();

    DocumentInfo {
        page_count: pages.len(),
        pages,
    }
}
