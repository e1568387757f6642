//! Input checks applied before any parsing starts.
use std::path::Path;

use crate::error::{Result, SlurperError};

/// Largest source accepted for in-memory parsing.
pub const MAX_SOURCE_BYTES: usize = 10 * 1024 * 1024;
pub const MAX_PATH_BYTES: usize = 4096;

pub fn validate_source(source: &str) -> Result<()> {
    if source.trim().is_empty() {
        return Err(SlurperError::invalid_configuration("source content cannot be empty or whitespace"));
    }
    if source.len() > MAX_SOURCE_BYTES {
        return Err(SlurperError::invalid_configuration(format!(
            "source content is too large ({} bytes); maximum is {} MiB",
            source.len(),
            MAX_SOURCE_BYTES / (1024 * 1024)
        )));
    }
    Ok(())
}

pub fn validate_file_path(path: &Path) -> Result<()> {
    let raw = path.as_os_str();
    if raw.is_empty() || path.to_string_lossy().trim().is_empty() {
        return Err(SlurperError::invalid_configuration("file path cannot be empty"));
    }
    if raw.len() > MAX_PATH_BYTES {
        return Err(SlurperError::invalid_configuration(format!(
            "file path is too long; maximum is {MAX_PATH_BYTES} bytes"
        )));
    }
    if path.to_string_lossy().contains('\0') {
        return Err(SlurperError::invalid_configuration(format!(
            "file path contains a NUL byte: {}",
            path.display()
        )));
    }
    Ok(())
}
