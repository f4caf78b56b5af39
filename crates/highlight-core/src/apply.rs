//! Highlight mutations against a document on disk
//!
//! The three operations of the core: add highlight annotations, erase them
//! by geometric overlap, and undo the most recently appended one. Each
//! operation is one full load → mutate → commit transaction (see `txn`);
//! per-item malformed input is skipped, never escalated.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{Document, Object, ObjectId};
use quad_geom::{coerce_quad, plan_removal, Quad, Rect, Removal, OVERLAP_TOLERANCE};
use tracing::debug;

use crate::annot;
use crate::error::HighlightError;
use crate::operations::{HighlightItem, RemoveOutcome, RemoveTarget};
use crate::txn;

/// Add highlight annotations to the document at `path`. Each item becomes
/// one annotation carrying all of the item's valid quads; items with an
/// out-of-range page, and quads that are not exactly 8 numbers, are skipped
/// silently. Returns the number of quads actually applied.
pub fn apply_add(path: &Path, highlights: &[HighlightItem]) -> Result<u32, HighlightError> {
    let mut doc = txn::load(path)?;
    let pages = doc.get_pages();
    let mut applied: u32 = 0;

    for item in highlights {
        let Some(&page_id) = pages.get(&item.page) else {
            debug!(page = item.page, "page out of range, skipping item");
            continue;
        };
        let quads: Vec<Quad> = item.quads.iter().filter_map(|q| coerce_quad(q)).collect();
        // None means no quad survived validation; nothing to annotate
        let Some(dict) = annot::highlight_dictionary(&quads, item.color_or_default()) else {
            continue;
        };
        let annot_id = doc.add_object(Object::Dictionary(dict));
        push_annotation(&mut doc, page_id, annot_id)?;
        applied += quads.len() as u32;
    }

    txn::commit(&mut doc, path)?;
    Ok(applied)
}

/// Remove highlights overlapping the erase targets. Highlights fully
/// covered by the targets are deleted; partially covered ones keep their
/// surviving quads. Returns the removal counts.
pub fn apply_remove(
    path: &Path,
    targets: &[RemoveTarget],
) -> Result<RemoveOutcome, HighlightError> {
    let mut doc = txn::load(path)?;
    let pages = doc.get_pages();

    // Erase rects grouped by page; invalid pages and quads drop out here
    let mut by_page: BTreeMap<ObjectId, Vec<Rect>> = BTreeMap::new();
    for target in targets {
        let Some(&page_id) = pages.get(&target.page) else {
            debug!(page = target.page, "page out of range, skipping target");
            continue;
        };
        by_page.entry(page_id).or_default().extend(
            target
                .quads
                .iter()
                .filter_map(|q| coerce_quad(q))
                .map(|q| Rect::from_quad(&q)),
        );
    }

    let mut outcome = RemoveOutcome::default();
    for (&page_id, rects) in &by_page {
        if rects.is_empty() {
            continue;
        }
        erase_on_page(&mut doc, page_id, rects, &mut outcome)?;
    }

    txn::commit(&mut doc, path)?;
    Ok(outcome)
}

/// Remove the most recently appended highlight annotation: pages are
/// scanned last to first, annotations within a page last to first, and the
/// first highlight found is deleted whole. Returns 1 if one was removed.
///
/// "Last" is annotation array order, which is append order at write time,
/// not a tracked creation timestamp; a document whose arrays were reordered
/// elsewhere may undo a different annotation than the user's latest action.
pub fn apply_undo_last(path: &Path) -> Result<u32, HighlightError> {
    let mut doc = txn::load(path)?;
    let pages = doc.get_pages();

    for (_, &page_id) in pages.iter().rev() {
        let Some((slot, mut entries)) = annotation_array(&doc, page_id)? else {
            continue;
        };
        let position = entries.iter().rposition(|entry| {
            let dict = match entry {
                Object::Reference(id) => doc.get_dictionary(*id).ok(),
                Object::Dictionary(dict) => Some(dict),
                _ => None,
            };
            dict.map_or(false, annot::is_highlight)
        });
        if let Some(idx) = position {
            entries.remove(idx);
            write_annotation_array(&mut doc, page_id, slot, entries)?;
            txn::commit(&mut doc, path)?;
            return Ok(1);
        }
    }
    // Nothing to undo; the file is left untouched
    Ok(0)
}

/// Where a page keeps its `/Annots` array.
enum AnnotsSlot {
    Inline,
    Indirect(ObjectId),
}

/// Snapshot a page's annotation entries, resolving an indirect `/Annots`
/// reference. `None` when the page has no usable array.
fn annotation_array(
    doc: &Document,
    page_id: ObjectId,
) -> Result<Option<(AnnotsSlot, Vec<Object>)>, HighlightError> {
    let page = doc.get_dictionary(page_id).map_err(op_err)?;
    match page.get(b"Annots") {
        Ok(Object::Array(entries)) => Ok(Some((AnnotsSlot::Inline, entries.clone()))),
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(entries)) => Ok(Some((AnnotsSlot::Indirect(*id), entries.clone()))),
            _ => Ok(None),
        },
        _ => Ok(None),
    }
}

/// Write a filtered annotation array back to its slot. An emptied array
/// drops the `/Annots` key entirely rather than keeping a degenerate empty
/// array around.
fn write_annotation_array(
    doc: &mut Document,
    page_id: ObjectId,
    slot: AnnotsSlot,
    entries: Vec<Object>,
) -> Result<(), HighlightError> {
    if entries.is_empty() {
        let page = doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(op_err)?;
        page.remove(b"Annots");
        return Ok(());
    }
    match slot {
        AnnotsSlot::Inline => {
            let page = doc
                .get_object_mut(page_id)
                .and_then(Object::as_dict_mut)
                .map_err(op_err)?;
            page.set("Annots", Object::Array(entries));
        }
        AnnotsSlot::Indirect(id) => {
            let array = doc
                .get_object_mut(id)
                .and_then(Object::as_array_mut)
                .map_err(op_err)?;
            *array = entries;
        }
    }
    Ok(())
}

/// Append an annotation reference to a page's `/Annots`, creating the
/// array if the page has none yet.
fn push_annotation(
    doc: &mut Document,
    page_id: ObjectId,
    annot_id: ObjectId,
) -> Result<(), HighlightError> {
    // Resolve an indirect array before taking the mutable borrow
    let indirect = {
        let page = doc.get_dictionary(page_id).map_err(op_err)?;
        match page.get(b"Annots") {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        }
    };
    match indirect {
        Some(id) => {
            let array = doc
                .get_object_mut(id)
                .and_then(Object::as_array_mut)
                .map_err(op_err)?;
            array.push(Object::Reference(annot_id));
        }
        None => {
            let page = doc
                .get_object_mut(page_id)
                .and_then(Object::as_dict_mut)
                .map_err(op_err)?;
            if let Ok(Object::Array(array)) = page.get_mut(b"Annots") {
                array.push(Object::Reference(annot_id));
            } else {
                page.set("Annots", Object::Array(vec![Object::Reference(annot_id)]));
            }
        }
    }
    Ok(())
}

/// Apply the erase rects to every highlight on one page.
fn erase_on_page(
    doc: &mut Document,
    page_id: ObjectId,
    rects: &[Rect],
    outcome: &mut RemoveOutcome,
) -> Result<(), HighlightError> {
    let Some((slot, entries)) = annotation_array(doc, page_id)? else {
        return Ok(());
    };

    let mut kept: Vec<Object> = Vec::with_capacity(entries.len());
    // Partial removals on referenced dictionaries, applied after the array
    // is rebuilt so no two borrows of the document overlap
    let mut rewrites: Vec<(ObjectId, Vec<Quad>)> = Vec::new();

    for entry in entries {
        let dict = match &entry {
            Object::Reference(id) => match doc.get_dictionary(*id) {
                Ok(dict) => dict.clone(),
                Err(_) => {
                    kept.push(entry);
                    continue;
                }
            },
            Object::Dictionary(dict) => dict.clone(),
            _ => {
                kept.push(entry);
                continue;
            }
        };
        if !annot::is_highlight(&dict) {
            kept.push(entry);
            continue;
        }

        match annot::quad_points(&dict) {
            Some(quads) => match plan_removal(&quads, rects) {
                Removal::Keep => kept.push(entry),
                Removal::All => {
                    outcome.removed_annots += 1;
                    outcome.removed_quads += quads.len() as u32;
                }
                Removal::Partial { survivors, removed } => {
                    outcome.removed_quads += removed as u32;
                    if let Object::Reference(id) = entry {
                        rewrites.push((id, survivors));
                        kept.push(entry);
                    } else {
                        let mut inline = dict;
                        annot::set_quad_points(&mut inline, &survivors);
                        kept.push(Object::Dictionary(inline));
                    }
                }
            },
            // Legacy highlight without usable quad data: compared by rect
            // alone and removed wholesale on any overlap
            None => match annot::rect_of(&dict) {
                Some(rect) if rects.iter().any(|t| rect.overlaps(t, OVERLAP_TOLERANCE)) => {
                    outcome.removed_annots += 1;
                    outcome.removed_quads += 1;
                }
                _ => kept.push(entry),
            },
        }
    }

    write_annotation_array(doc, page_id, slot, kept)?;
    for (id, survivors) in rewrites {
        let dict = doc
            .get_object_mut(id)
            .and_then(Object::as_dict_mut)
            .map_err(op_err)?;
        annot::set_quad_points(dict, &survivors);
    }
    Ok(())
}

fn op_err(e: lopdf::Error) -> HighlightError {
    HighlightError::Operation(e.to_string())
}
