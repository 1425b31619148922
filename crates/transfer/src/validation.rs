use std::path::{Component, Path};

use crate::TransferError;

/// Validates a file name received from the peer before it is used on disk.
///
/// The name must be a single plain path component. Rejects:
/// - Empty names, `.` and `..`
/// - Absolute paths (Unix `/` or Windows `C:\`)
/// - Anything with a directory part, including backslash separators
/// - NUL bytes
pub fn validate_file_name(file_name: &str) -> Result<(), TransferError> {
    if file_name.is_empty() {
        return Err(TransferError::InvalidPath("empty file name".into()));
    }
    if file_name.contains('\0') {
        return Err(TransferError::InvalidPath(format!(
            "NUL byte in file name: {file_name:?}"
        )));
    }
    if file_name.contains(['/', '\\']) {
        return Err(TransferError::InvalidPath(format!(
            "directory separator not allowed: {file_name}"
        )));
    }

    let path = Path::new(file_name);
    if path.is_absolute() {
        return Err(TransferError::InvalidPath(format!(
            "absolute path not allowed: {file_name}"
        )));
    }

    // Separators are already excluded; this catches `.`, `..` and prefixes.
    let mut components = path.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        (Some(Component::ParentDir), None) | (Some(Component::CurDir), None) => Err(
            TransferError::InvalidPath(format!("not a file name: {file_name}")),
        ),
        _ => Err(TransferError::InvalidPath(format!(
            "directory components not allowed: {file_name}"
        ))),
    }
}
