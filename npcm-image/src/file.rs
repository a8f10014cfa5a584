//! Whole-file I/O with path-tagged errors

use crate::error::{ImageError, Result};
use std::path::Path;

/// Read every byte of `path`
pub fn read_file(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    std::fs::read(path).map_err(|e| ImageError::input_io(path, e))
}

/// Create or truncate `path` and write `data` to it
///
/// If writing fails part way the file contents are undefined.
pub fn write_file(path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, data).map_err(|e| ImageError::output_io(path, e))
}
