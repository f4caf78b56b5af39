//! In-place PDF highlight editing
//!
//! This crate persists highlight annotations directly into a PDF file's
//! bytes using lopdf, rather than keeping them in a side-channel overlay.
//! Three operations are exposed, each a single load → mutate → commit
//! transaction with crash-safe atomic file replacement:
//!
//! - [`apply_add`]: append highlight annotations built from quad regions
//! - [`apply_remove`]: erase highlights fully or partially by overlap
//! - [`apply_undo_last`]: delete the most recently appended highlight
//!
//! Geometry lives in the `quad-geom` crate; nothing in there touches lopdf
//! types or the filesystem.
//!
//! Concurrent operations against the same path are not coordinated here:
//! the atomic rename keeps readers safe, but two concurrent writers can
//! lose one writer's update. Callers needing stronger guarantees must
//! serialize per document path.

pub mod annot;
pub mod apply;
pub mod error;
pub mod operations;
pub mod txn;

pub use apply::{apply_add, apply_remove, apply_undo_last};
pub use error::HighlightError;
pub use operations::{HighlightItem, RemoveOutcome, RemoveTarget, DEFAULT_COLOR};
