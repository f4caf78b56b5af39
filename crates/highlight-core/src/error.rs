use std::path::PathBuf;
use thiserror::Error;

/// Structural and file-level failures. Malformed per-item input (bad quad
/// arity, out-of-range pages) is never an error: those items are skipped
/// and only show up as lower counts in the operation result.
#[derive(Error, Debug)]
pub enum HighlightError {
    /// Target file does not exist. Hard failure, no retry.
    #[error("PDF not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    #[error("PDF operation failed: {0}")]
    Operation(String),

    /// Serialization or the final replace failed after the retry budget.
    /// The original file is untouched in either case.
    #[error("Failed to write PDF: {0}")]
    WriteFailed(String),
}
