use crate::constants::{MAX_INPUT_FILE_SIZE, SUPPORTED_IMAGE_EXTENSIONS};
use crate::error::{CompressionError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Validate an input file before reading it into memory.
pub fn validate_input_path(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Err(CompressionError::FileNotFound(path.to_path_buf()));
    }

    if !path.is_file() {
        return Err(CompressionError::NotAnImage(format!(
            "{} is not a file",
            path.display()
        )));
    }

    let metadata = fs::metadata(path)?;
    if metadata.len() > MAX_INPUT_FILE_SIZE {
        return Err(CompressionError::FileTooLarge(metadata.len(), MAX_INPUT_FILE_SIZE));
    }

    path.canonicalize()
        .map_err(|_| CompressionError::FileNotFound(path.to_path_buf()))
}

/// Reads a validated input file.
pub fn read_image_file(path: &Path) -> Result<Vec<u8>> {
    let canonical = validate_input_path(path)?;
    Ok(fs::read(canonical)?)
}

/// Check if the file extension indicates a supported raster image.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Upload filter: only `image/*` MIME types are accepted.
pub fn is_image_mime_type(mime_type: &str) -> bool {
    mime_type
        .trim()
        .to_ascii_lowercase()
        .starts_with("image/")
}

/// Why a stored-image reference was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceRejection {
    Empty,
    Traversal,
    InvalidName,
}

/// Reduces a filename or URL to the bare basename of a stored image.
///
/// Query strings and fragments are dropped. References containing a `..`
/// segment anywhere are refused outright rather than collapsed, as are
/// empty, `.` and `..` basenames.
pub fn sanitize_reference(reference: &str) -> std::result::Result<String, ReferenceRejection> {
    let without_query = reference
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim();

    if without_query.is_empty() {
        return Err(ReferenceRejection::Empty);
    }

    let segments: Vec<&str> = without_query.split(['/', '\\']).collect();
    if segments.iter().any(|segment| *segment == "..") {
        return Err(ReferenceRejection::Traversal);
    }

    let basename = segments.last().copied().unwrap_or_default();
    if basename.is_empty() || basename == "." || basename.contains('\0') {
        return Err(ReferenceRejection::InvalidName);
    }

    Ok(basename.to_string())
}
