//! Operation inputs and result counts
//!
//! These types are the wire contract with the HTTP layer that invokes the
//! core: highlight items and erase targets in, applied/removed counts out.
//! Pages are 1-based on the wire; quads are raw number arrays that get
//! validated per item (8 values or the quad is skipped).

use serde::{Deserialize, Serialize};

/// Default highlight color: yellow.
pub const DEFAULT_COLOR: [f64; 3] = [1.0, 1.0, 0.0];

/// One highlight to add: all of its valid quads end up in a single
/// annotation on `page`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HighlightItem {
    /// 1-based page number. Out-of-range items are skipped, not rejected.
    pub page: u32,
    /// RGB channels in [0,1]; yellow when absent.
    #[serde(default)]
    pub color: Option<[f64; 3]>,
    /// Raw quads, each expected to hold exactly 8 numbers.
    pub quads: Vec<Vec<f64>>,
}

impl HighlightItem {
    pub fn color_or_default(&self) -> [f64; 3] {
        self.color.unwrap_or(DEFAULT_COLOR)
    }
}

/// One erase region: existing highlights on `page` overlapping any of
/// these quads get fully or partially removed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoveTarget {
    /// 1-based page number.
    pub page: u32,
    pub quads: Vec<Vec<f64>>,
}

/// Counts returned by a remove operation. A whole-annotation removal bumps
/// `removed_annots` and contributes its full quad count to `removed_quads`;
/// a partial removal contributes only the removed quads.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoveOutcome {
    pub removed_annots: u32,
    pub removed_quads: u32,
}
