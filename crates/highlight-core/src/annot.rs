//! Highlight annotation dictionaries
//!
//! Thin adapter between the geometry types and lopdf's object model: build
//! `/Highlight` annotation dictionaries from quads, and read quad/rect data
//! back out of dictionaries found in a page's `/Annots` array. Geometry
//! decisions themselves stay in `quad-geom`.

use lopdf::{Dictionary, Object};
use quad_geom::{Quad, Rect};

/// Build a highlight annotation carrying `quads`, with `/Rect` set to their
/// envelope. Returns `None` for an empty quad set, which is not a valid
/// annotation.
pub fn highlight_dictionary(quads: &[Quad], color: [f64; 3]) -> Option<Dictionary> {
    let rect = Rect::envelope(quads)?;
    let mut annot = Dictionary::new();
    annot.set("Type", Object::Name(b"Annot".to_vec()));
    annot.set("Subtype", Object::Name(b"Highlight".to_vec()));
    annot.set("Rect", rect_array(&rect));
    annot.set("QuadPoints", quad_points_array(quads));
    annot.set(
        "C",
        Object::Array(color.iter().map(|&c| Object::Real(c as f32)).collect()),
    );
    // Print the annotation; no zoom, no move
    annot.set("F", Object::Integer(4));
    Some(annot)
}

pub fn is_highlight(dict: &Dictionary) -> bool {
    matches!(dict.get(b"Subtype"), Ok(Object::Name(name)) if name == b"Highlight")
}

/// Read a well-formed `/QuadPoints` array: length a positive multiple of 8,
/// all entries numeric. Anything else returns `None` and the annotation is
/// treated as the legacy format, compared by `/Rect` alone.
pub fn quad_points(dict: &Dictionary) -> Option<Vec<Quad>> {
    let Ok(Object::Array(values)) = dict.get(b"QuadPoints") else {
        return None;
    };
    if values.is_empty() || values.len() % 8 != 0 {
        return None;
    }
    let mut flat = Vec::with_capacity(values.len());
    for value in values {
        flat.push(number(value)?);
    }
    Some(
        flat.chunks_exact(8)
            .map(|chunk| {
                let mut quad = [0.0; 8];
                quad.copy_from_slice(chunk);
                quad
            })
            .collect(),
    )
}

/// Read `/Rect` as (minX, minY, maxX, maxY).
pub fn rect_of(dict: &Dictionary) -> Option<Rect> {
    let Ok(Object::Array(values)) = dict.get(b"Rect") else {
        return None;
    };
    if values.len() != 4 {
        return None;
    }
    Some(Rect {
        min_x: number(&values[0])?,
        min_y: number(&values[1])?,
        max_x: number(&values[2])?,
        max_y: number(&values[3])?,
    })
}

/// Rewrite `/QuadPoints` with the surviving quads and recompute `/Rect`
/// from them. `quads` must be non-empty; whole-annotation removal is the
/// caller's job.
pub fn set_quad_points(dict: &mut Dictionary, quads: &[Quad]) {
    dict.set("QuadPoints", quad_points_array(quads));
    if let Some(rect) = Rect::envelope(quads) {
        dict.set("Rect", rect_array(&rect));
    }
}

fn quad_points_array(quads: &[Quad]) -> Object {
    Object::Array(
        quads
            .iter()
            .flat_map(|quad| quad.iter().map(|&v| Object::Real(v as f32)))
            .collect(),
    )
}

fn rect_array(rect: &Rect) -> Object {
    Object::Array(vec![
        Object::Real(rect.min_x as f32),
        Object::Real(rect.min_y as f32),
        Object::Real(rect.max_x as f32),
        Object::Real(rect.max_y as f32),
    ])
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Real(v) => Some(*v as f64),
        Object::Integer(v) => Some(*v as f64),
        _ => None,
    }
}
