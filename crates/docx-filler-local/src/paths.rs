use std::io;
use std::path::{Path, PathBuf};

use docx_filler_core::StoreError;

/// Validate a single path segment taken from user input (list, library,
/// item or template names).
pub fn segment(name: &str) -> Result<&str, StoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains('/')
        || trimmed.contains('\\')
    {
        return Err(StoreError::Invalid(format!("invalid name '{}'", name)));
    }
    Ok(trimmed)
}

/// Turn a `/`-separated relative name into a path below `base`.
pub fn relative_to(base: &Path, name: &str) -> Result<PathBuf, StoreError> {
    let mut path = base.to_path_buf();
    for part in name.split('/') {
        path.push(segment(part)?);
    }
    Ok(path)
}

/// Map an I/O error on `path` to a store error.
pub fn io_error(path: &Path, e: io::Error) -> StoreError {
    if e.kind() == io::ErrorKind::NotFound {
        StoreError::NotFound(path.display().to_string())
    } else {
        StoreError::Io(format!("{}: {}", path.display(), e))
    }
}
