//! Small read helpers with path-carrying errors

use std::fs;

use crate::{DatasetPath, Error, Result};

/// Read text content from a file.
pub fn read_text(path: &DatasetPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Read text content if the file exists, `None` otherwise.
pub fn read_text_if_exists(path: &DatasetPath) -> Result<Option<String>> {
    match fs::read_to_string(path.to_native()) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(path.to_native(), e)),
    }
}
