//! Blob-name safety checks for the site publisher (§4.H): nothing that
//! leaves the container prefix, no shell metacharacters, bounded length.

use crate::error::StorageError;

const MAX_BLOB_NAME_LEN: usize = 256;
const FORBIDDEN_CHARS: &[char] = &[';', '|', '&', '$', '`', '\n', '\r', '\0'];

/// Reject blob names that could escape the container prefix or carry
/// shell-significant characters. `allowed_suffix`, if given, is required
/// (e.g. `Some(".md")` for markdown deploy keys).
pub fn validate_blob_name(name: &str, allowed_suffix: Option<&str>) -> Result<(), StorageError> {
    if name.is_empty() {
        return Err(StorageError::InvalidBlobName("empty blob name".into()));
    }
    if name.len() > MAX_BLOB_NAME_LEN {
        return Err(StorageError::InvalidBlobName(format!(
            "blob name exceeds {MAX_BLOB_NAME_LEN} characters"
        )));
    }
    if name.starts_with('/') || name.starts_with('\\') {
        return Err(StorageError::InvalidBlobName("absolute paths are not allowed".into()));
    }
    if name.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(StorageError::InvalidBlobName("parent-directory segments are not allowed".into()));
    }
    if name.chars().any(|c| FORBIDDEN_CHARS.contains(&c)) {
        return Err(StorageError::InvalidBlobName("blob name contains forbidden characters".into()));
    }
    if let Some(suffix) = allowed_suffix {
        if !name.ends_with(suffix) {
            return Err(StorageError::InvalidBlobName(format!("blob name must end with {suffix}")));
        }
    }
    Ok(())
}
