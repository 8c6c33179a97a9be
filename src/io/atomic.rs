//! Atomic file publication.
//!
//! Outputs are written to a hidden sibling, flushed to disk, then renamed over
//! the target. Readers never observe a half-written file.

use std::fs::{self, File};
use std::path::Path;

use crate::error::AppError;

/// Write `path` through `write`, publishing it only if every step succeeds.
///
/// The temporary file is unique per call, so concurrent writers of one path
/// never share it; the last rename wins.
pub fn write_atomic<F>(path: &Path, write: F) -> Result<(), AppError>
where
    F: FnOnce(&File) -> Result<(), AppError>,
{
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::Io(format!("Failed to create directory '{}': {e}", parent.display())))?;
            parent
        }
        None => Path::new("."),
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());

    // Dropping `tmp` on any early return removes the partial file.
    let tmp = tempfile::Builder::new()
        .prefix(&format!(".{name}."))
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| AppError::Io(format!("Failed to create a temporary file in '{}': {e}", dir.display())))?;

    write(tmp.as_file())?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| AppError::Io(format!("Failed to sync '{}': {e}", tmp.path().display())))?;

    let tmp_display = tmp.path().display().to_string();
    tmp.persist(path).map_err(|e| {
        AppError::Io(format!(
            "Failed to move '{tmp_display}' into place at '{}': {}",
            path.display(),
            e.error
        ))
    })?;
    Ok(())
}
