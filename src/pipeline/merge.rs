//! Document merging: concatenate the pages of several PDFs, in order.
//!
//! Pages are moved, never re-drawn. Each source is renumbered into its own
//! object-id range, its page objects are kept verbatim (content streams,
//! images and resources untouched) and re-parented under one new page tree.
//! The sources' old `Catalog` and `Pages` nodes are dropped, so anything a
//! page inherited from them is copied onto the page first.

use crate::error::CardCollageError;
use crate::pipeline::pdf::{inherited_attributes, is_tree_node};
use lopdf::{dictionary, Document, Object, ObjectId};
use std::collections::BTreeMap;
use tracing::debug;

/// Concatenate every page of every source, sources in the given order and
/// pages within a source in their own order.
///
/// Sources may hold any number of pages.
///
/// # Errors
/// [`CardCollageError::PdfBuild`] when the sources hold no pages at all or a
/// page object cannot be read.
pub fn merge_documents(sources: Vec<Document>) -> Result<Document, CardCollageError> {
    let mut max_id = 1;
    let mut version = String::from("1.5");
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let mut page_ids: Vec<ObjectId> = Vec::new();

    for (n, mut doc) in sources.into_iter().enumerate() {
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;
        if doc.version > version {
            version = doc.version.clone();
        }

        let mut pages = Vec::new();
        for page_id in doc.get_pages().into_values() {
            let mut page = doc
                .get_dictionary(page_id)
                .map_err(|e| CardCollageError::PdfBuild {
                    detail: format!("Source {} page {:?} unreadable: {e}", n + 1, page_id),
                })?
                .clone();
            for (key, value) in inherited_attributes(&doc, &page).iter() {
                page.set(key.clone(), value.clone());
            }
            pages.push((page_id, page));
        }
        debug!("Source {}: {} page(s)", n + 1, pages.len());

        objects.extend(
            doc.objects
                .into_iter()
                .filter(|(_, object)| !is_tree_node(object)),
        );
        for (page_id, page) in pages {
            objects.insert(page_id, Object::Dictionary(page));
            page_ids.push(page_id);
        }
    }

    if page_ids.is_empty() {
        return Err(CardCollageError::PdfBuild {
            detail: "No pages to merge".into(),
        });
    }

    let pages_id = (max_id, 0);
    let catalog_id = (max_id + 1, 0);

    for id in &page_ids {
        if let Some(Object::Dictionary(page)) = objects.get_mut(id) {
            page.set("Parent", pages_id);
        }
    }

    objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|&id| id.into()).collect::<Vec<Object>>(),
            "Count" => page_ids.len() as i64,
        }),
    );
    objects.insert(
        catalog_id,
        Object::Dictionary(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        }),
    );

    let mut merged = Document::with_version(version);
    merged.objects = objects;
    merged.max_id = catalog_id.0;
    merged.trailer.set("Root", catalog_id);

    // Drop whatever only the discarded trees referenced (e.g. old Info dicts).
    let pruned = merged.prune_objects();
    debug!(
        "Merged {} page(s), pruned {} orphan object(s)",
        page_ids.len(),
        pruned.len()
    );

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PageGeometry;
    use crate::pipeline::pdf::describe_document;
    use crate::pipeline::render::page_document;
    use image::{Rgb, RgbImage};

    fn page_doc(shade: u8) -> Document {
        let img = RgbImage::from_pixel(9, 12, Rgb([shade, shade, shade]));
        page_document(&img, &PageGeometry::letter()).unwrap()
    }

    /// Decompressed content stream and raw image stream of every page.
    fn page_payloads(doc: &Document) -> Vec<(Vec<u8>, Vec<u8>)> {
        doc.get_pages()
            .into_values()
            .map(|page_id| {
                let content = doc.get_page_content(page_id).unwrap();
                let page = doc.get_dictionary(page_id).unwrap();
                let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
                let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
                let image_id = xobjects.get(b"Collage").unwrap().as_reference().unwrap();
                let image = doc.get_object(image_id).unwrap().as_stream().unwrap();
                (content, image.content.clone())
            })
            .collect()
    }

    #[test]
    fn pages_keep_source_order() {
        let sources: Vec<Document> = (0..4).map(|i| page_doc(i * 60)).collect();
        let expected: Vec<_> = sources.iter().flat_map(page_payloads).collect();

        let merged = merge_documents(sources).unwrap();
        assert_eq!(merged.get_pages().len(), 4);
        assert_eq!(page_payloads(&merged), expected);
    }

    #[test]
    fn pages_are_reparented_under_one_tree() {
        let merged = merge_documents(vec![page_doc(0), page_doc(255)]).unwrap();
        let root = merged.trailer.get(b"Root").unwrap().as_reference().unwrap();
        let pages_id = merged
            .get_dictionary(root)
            .unwrap()
            .get(b"Pages")
            .unwrap()
            .as_reference()
            .unwrap();

        for page_id in merged.get_pages().into_values() {
            let parent = merged
                .get_dictionary(page_id)
                .unwrap()
                .get(b"Parent")
                .unwrap()
                .as_reference()
                .unwrap();
            assert_eq!(parent, pages_id);
        }

        let tree_nodes = merged.objects.values().filter(|o| is_tree_node(o)).count();
        assert_eq!(tree_nodes, 2, "exactly one Catalog and one Pages node");
    }

    #[test]
    fn multi_page_sources_are_appended_whole() {
        let two = merge_documents(vec![page_doc(10), page_doc(20)]).unwrap();
        let merged = merge_documents(vec![two, page_doc(30)]).unwrap();
        let info = describe_document(&merged);
        assert_eq!(info.page_count, 3);
        assert!(info.pages.iter().all(|p| p.image_count == 1));
    }

    #[test]
    fn inherited_media_box_is_kept() {
        let mut doc = Document::with_version("1.4");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! { "Type" => "Page", "Parent" => pages_id });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1_i64,
                "MediaBox" => vec![0_i64.into(), 0_i64.into(), 300_i64.into(), 400_i64.into()],
            }),
        );
        let catalog = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog);

        let merged = merge_documents(vec![page_doc(0), doc]).unwrap();
        let info = describe_document(&merged);
        assert_eq!(info.pages[0].media_box, [0.0, 0.0, 612.0, 792.0]);
        assert_eq!(info.pages[1].media_box, [0.0, 0.0, 300.0, 400.0]);
    }

    #[test]
    fn merged_document_round_trips_through_bytes() {
        let mut merged = merge_documents(vec![page_doc(1), page_doc(2), page_doc(3)]).unwrap();
        let mut bytes = Vec::new();
        merged.save_to(&mut bytes).unwrap();
        let loaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(loaded.get_pages().len(), 3);
    }

    #[test]
    fn nothing_to_merge() {
        assert!(matches!(
            merge_documents(vec![]),
            Err(CardCollageError::PdfBuild { .. })
        ));
    }
}
