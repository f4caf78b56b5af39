//! Geometry for highlight quads
//!
//! Pure geometric reasoning over highlight quads: bounding rectangles,
//! tolerance-expanded overlap tests, and the decision of how much of an
//! annotation an erase gesture takes out. No file I/O and no PDF object
//! types live here, so everything is unit-testable in isolation.

use serde::{Deserialize, Serialize};

/// One highlighted glyph-run region: four corner points flattened as
/// (x1,y1,x2,y2,x3,y3,x4,y4) in PDF user-space points.
pub type Quad = [f64; 8];

/// Slack applied to overlap tests, in points. Erase gestures drawn with a
/// pointing device land sub-pixel off from the stored geometry; without the
/// slack, essentially-coincident regions often fail to match.
pub const OVERLAP_TOLERANCE: f64 = 0.5;

/// Axis-aligned rectangle in PDF user-space points (origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    /// Envelope of a quad's four corner points.
    pub fn from_quad(quad: &Quad) -> Self {
        let xs = [quad[0], quad[2], quad[4], quad[6]];
        let ys = [quad[1], quad[3], quad[5], quad[7]];
        Self {
            min_x: xs.iter().copied().fold(f64::INFINITY, f64::min),
            min_y: ys.iter().copied().fold(f64::INFINITY, f64::min),
            max_x: xs.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            max_y: ys.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }

    /// Envelope of many quads, `None` for an empty slice. An annotation's
    /// `/Rect` must always equal this over its current quad set.
    pub fn envelope(quads: &[Quad]) -> Option<Self> {
        quads.iter().map(Rect::from_quad).reduce(|a, b| Rect {
            min_x: a.min_x.min(b.min_x),
            min_y: a.min_y.min(b.min_y),
            max_x: a.max_x.max(b.max_x),
            max_y: a.max_y.max(b.max_y),
        })
    }

    /// Overlap test with both rectangles expanded outward by `tol` on all
    /// sides. Degenerate rectangles (a single point, zero width or height)
    /// are valid operands.
    pub fn overlaps(&self, other: &Rect, tol: f64) -> bool {
        let (ax1, ay1, ax2, ay2) = (
            self.min_x - tol,
            self.min_y - tol,
            self.max_x + tol,
            self.max_y + tol,
        );
        let (bx1, by1, bx2, by2) = (
            other.min_x - tol,
            other.min_y - tol,
            other.max_x + tol,
            other.max_y + tol,
        );
        !(ax2 < bx1 || bx2 < ax1 || ay2 < by1 || by2 < ay1)
    }
}

/// Validate one raw quad from client input: exactly 8 values, or nothing.
/// Anything else is skipped by the caller, never escalated.
pub fn coerce_quad(values: &[f64]) -> Option<Quad> {
    if values.len() != 8 {
        return None;
    }
    let mut quad = [0.0; 8];
    quad.copy_from_slice(values);
    Some(quad)
}

/// Indices of quads whose rect overlaps any of `targets`.
pub fn overlapping_quads(quads: &[Quad], targets: &[Rect]) -> Vec<usize> {
    quads
        .iter()
        .enumerate()
        .filter(|(_, quad)| {
            let rect = Rect::from_quad(quad);
            targets.iter().any(|t| rect.overlaps(t, OVERLAP_TOLERANCE))
        })
        .map(|(i, _)| i)
        .collect()
}

/// Outcome of matching an annotation's quads against erase targets.
#[derive(Debug, Clone, PartialEq)]
pub enum Removal {
    /// No quad overlapped; the annotation stays untouched.
    Keep,
    /// Every quad overlapped; the whole annotation goes. Leaving an
    /// annotation with an empty quad set is not valid.
    All,
    /// Some quads overlapped; the annotation keeps `survivors` in their
    /// original order and its rect must be recomputed from them.
    Partial { survivors: Vec<Quad>, removed: usize },
}

/// Decide how much of an annotation an erase gesture takes out.
pub fn plan_removal(quads: &[Quad], targets: &[Rect]) -> Removal {
    let selected = overlapping_quads(quads, targets);
    if selected.is_empty() {
        return Removal::Keep;
    }
    if selected.len() == quads.len() {
        return Removal::All;
    }
    let survivors = quads
        .iter()
        .enumerate()
        .filter(|(i, _)| !selected.contains(i))
        .map(|(_, quad)| *quad)
        .collect();
    Removal::Partial {
        survivors,
        removed: selected.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn quad(x1: f64, y1: f64, x2: f64, y2: f64) -> Quad {
        // Axis-aligned quad in the order viewers emit: top edge then bottom
        [x1, y2, x2, y2, x1, y1, x2, y1]
    }

    #[test]
    fn test_rect_from_quad_is_min_max_envelope() {
        let q = [10.0, 10.0, 20.0, 10.0, 10.0, 20.0, 20.0, 20.0];
        let rect = Rect::from_quad(&q);
        assert_eq!(
            rect,
            Rect {
                min_x: 10.0,
                min_y: 10.0,
                max_x: 20.0,
                max_y: 20.0
            }
        );
    }

    #[test]
    fn test_rect_from_skewed_quad() {
        // Corners in no particular orientation still produce the envelope
        let q = [5.0, 30.0, 25.0, 2.0, 1.0, 15.0, 18.0, 40.0];
        let rect = Rect::from_quad(&q);
        assert_eq!(rect.min_x, 1.0);
        assert_eq!(rect.min_y, 2.0);
        assert_eq!(rect.max_x, 25.0);
        assert_eq!(rect.max_y, 40.0);
    }

    #[test]
    fn test_envelope_covers_all_quads() {
        let quads = vec![quad(10.0, 10.0, 20.0, 20.0), quad(50.0, 5.0, 70.0, 12.0)];
        let rect = Rect::envelope(&quads).unwrap();
        assert_eq!(
            rect,
            Rect {
                min_x: 10.0,
                min_y: 5.0,
                max_x: 70.0,
                max_y: 20.0
            }
        );
    }

    #[test]
    fn test_envelope_of_empty_slice_is_none() {
        assert_eq!(Rect::envelope(&[]), None);
    }

    #[test]
    fn test_overlap_disjoint_rects() {
        let a = Rect {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 10.0,
            max_y: 10.0,
        };
        let b = Rect {
            min_x: 20.0,
            min_y: 20.0,
            max_x: 30.0,
            max_y: 30.0,
        };
        assert!(!a.overlaps(&b, OVERLAP_TOLERANCE));
    }

    #[test]
    fn test_overlap_within_tolerance() {
        // Gap of 0.8pt closes once both rects expand by 0.5pt
        let a = Rect {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 10.0,
            max_y: 10.0,
        };
        let b = Rect {
            min_x: 10.8,
            min_y: 0.0,
            max_x: 20.0,
            max_y: 10.0,
        };
        assert!(a.overlaps(&b, OVERLAP_TOLERANCE));
        assert!(!a.overlaps(&b, 0.0));
    }

    #[test]
    fn test_overlap_degenerate_point_rect() {
        let point = Rect {
            min_x: 5.0,
            min_y: 5.0,
            max_x: 5.0,
            max_y: 5.0,
        };
        let area = Rect {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 10.0,
            max_y: 10.0,
        };
        assert!(point.overlaps(&area, OVERLAP_TOLERANCE));
        assert!(point.overlaps(&point, 0.0));
    }

    #[test]
    fn test_coerce_quad_accepts_exactly_eight() {
        assert!(coerce_quad(&[1.0; 8]).is_some());
        assert_eq!(coerce_quad(&[1.0; 7]), None);
        assert_eq!(coerce_quad(&[1.0; 9]), None);
        assert_eq!(coerce_quad(&[]), None);
    }

    #[test]
    fn test_overlapping_quads_any_target_matches() {
        let quads = vec![
            quad(0.0, 0.0, 10.0, 10.0),
            quad(100.0, 100.0, 110.0, 110.0),
            quad(200.0, 200.0, 210.0, 210.0),
        ];
        let targets = vec![
            Rect {
                min_x: 5.0,
                min_y: 5.0,
                max_x: 6.0,
                max_y: 6.0,
            },
            Rect {
                min_x: 205.0,
                min_y: 205.0,
                max_x: 206.0,
                max_y: 206.0,
            },
        ];
        assert_eq!(overlapping_quads(&quads, &targets), vec![0, 2]);
    }

    #[test]
    fn test_plan_removal_keep_when_disjoint() {
        let quads = vec![quad(0.0, 0.0, 10.0, 10.0)];
        let targets = vec![Rect {
            min_x: 50.0,
            min_y: 50.0,
            max_x: 60.0,
            max_y: 60.0,
        }];
        assert_eq!(plan_removal(&quads, &targets), Removal::Keep);
    }

    #[test]
    fn test_plan_removal_all_when_fully_covered() {
        let quads = vec![quad(10.0, 10.0, 20.0, 20.0), quad(30.0, 10.0, 40.0, 20.0)];
        let targets = vec![Rect {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 100.0,
            max_y: 100.0,
        }];
        assert_eq!(plan_removal(&quads, &targets), Removal::All);
    }

    #[test]
    fn test_plan_removal_partial_preserves_order() {
        let quads = vec![
            quad(0.0, 0.0, 10.0, 10.0),
            quad(100.0, 0.0, 110.0, 10.0),
            quad(200.0, 0.0, 210.0, 10.0),
        ];
        let targets = vec![Rect {
            min_x: 95.0,
            min_y: 0.0,
            max_x: 115.0,
            max_y: 10.0,
        }];
        let plan = plan_removal(&quads, &targets);
        assert_eq!(
            plan,
            Removal::Partial {
                survivors: vec![quads[0], quads[2]],
                removed: 1,
            }
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_quad() -> impl Strategy<Value = Quad> {
            proptest::array::uniform8(-1000.0f64..1000.0)
        }

        fn arb_rect() -> impl Strategy<Value = Rect> {
            (arb_quad()).prop_map(|q| Rect::from_quad(&q))
        }

        proptest! {
            #[test]
            fn rect_contains_every_corner(q in arb_quad()) {
                let rect = Rect::from_quad(&q);
                for pair in q.chunks_exact(2) {
                    prop_assert!(rect.min_x <= pair[0] && pair[0] <= rect.max_x);
                    prop_assert!(rect.min_y <= pair[1] && pair[1] <= rect.max_y);
                }
            }

            #[test]
            fn overlap_is_symmetric(a in arb_rect(), b in arb_rect()) {
                prop_assert_eq!(
                    a.overlaps(&b, OVERLAP_TOLERANCE),
                    b.overlaps(&a, OVERLAP_TOLERANCE)
                );
            }

            #[test]
            fn removal_conserves_quads(
                quads in proptest::collection::vec(arb_quad(), 1..6),
                targets in proptest::collection::vec(arb_rect(), 0..4),
            ) {
                match plan_removal(&quads, &targets) {
                    Removal::Keep => {}
                    Removal::All => {
                        prop_assert_eq!(overlapping_quads(&quads, &targets).len(), quads.len());
                    }
                    Removal::Partial { survivors, removed } => {
                        prop_assert_eq!(survivors.len() + removed, quads.len());
                        prop_assert!(removed > 0 && removed < quads.len());
                        // Survivors keep their original relative order
                        let mut cursor = 0;
                        for s in &survivors {
                            let pos = quads[cursor..].iter().position(|q| q == s);
                            prop_assert!(pos.is_some());
                            cursor += pos.unwrap() + 1;
                        }
                    }
                }
            }
        }
    }
}
