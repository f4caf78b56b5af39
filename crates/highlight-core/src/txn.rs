//! Document load/commit cycle with atomic file replacement
//!
//! Every mutation follows the same shape: load the full object graph into a
//! mutable document, change it in memory only, serialize to a temp file in
//! the target's directory, then rename over the original. A crash at any
//! point leaves the original file intact; the worst outcome is an orphaned
//! `annot-*.pdf` temp file next to the document.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

use lopdf::Document;
use tracing::{debug, info, warn};

use crate::error::HighlightError;

/// Retry budget for the final rename. Fixed and specific to filesystem
/// lock contention; deliberately not configurable.
const REPLACE_ATTEMPTS: u32 = 10;
const REPLACE_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Load the document at `path` into a mutable in-memory copy.
///
/// lopdf reads the whole file eagerly and returns with the handle closed,
/// so no read handle survives into the replace step. Loading the full
/// object table also means outlines, metadata and names are preserved on
/// save without a separate clone step.
pub fn load(path: &Path) -> Result<Document, HighlightError> {
    if !path.exists() {
        return Err(HighlightError::NotFound(path.to_path_buf()));
    }
    let doc = Document::load(path).map_err(|e| HighlightError::Parse(e.to_string()))?;
    debug!(
        path = %path.display(),
        objects = doc.objects.len(),
        "loaded document"
    );
    Ok(doc)
}

/// Serialize `doc` and atomically replace `path` with the result.
///
/// The bytes go to a sibling temp file first so the rename stays on one
/// filesystem. A concurrent reader sees either the old or the new file,
/// never a partial one. The temp file is cleaned up on every failure path.
pub fn commit(doc: &mut Document, path: &Path) -> Result<(), HighlightError> {
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| HighlightError::WriteFailed(e.to_string()))?;

    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = tempfile::Builder::new()
        .prefix("annot-")
        .suffix(".pdf")
        .tempfile_in(parent.unwrap_or_else(|| Path::new(".")))
        .map_err(|e| HighlightError::WriteFailed(e.to_string()))?;
    tmp.write_all(&bytes)
        .map_err(|e| HighlightError::WriteFailed(e.to_string()))?;

    // TempPath removes the file on drop if the rename never happened
    let tmp_path = tmp.into_temp_path();
    replace_with_retry(&tmp_path, path)?;
    info!(path = %path.display(), bytes = bytes.len(), "committed document");
    Ok(())
}

/// Rename `tmp` over `dst`, retrying on transient permission errors. On
/// Windows the destination can be momentarily locked by antivirus or a
/// lingering reader handle; a short fixed backoff rides that out.
fn replace_with_retry(tmp: &Path, dst: &Path) -> Result<(), HighlightError> {
    let mut last_err = String::new();
    for attempt in 1..=REPLACE_ATTEMPTS {
        match fs::rename(tmp, dst) {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                warn!(attempt, error = %e, path = %dst.display(), "replace blocked, retrying");
                last_err = e.to_string();
                thread::sleep(REPLACE_RETRY_DELAY);
            }
            Err(e) => return Err(HighlightError::WriteFailed(e.to_string())),
        }
    }
    Err(HighlightError::WriteFailed(format!(
        "replace still blocked after {} attempts: {}",
        REPLACE_ATTEMPTS, last_err
    )))
}
