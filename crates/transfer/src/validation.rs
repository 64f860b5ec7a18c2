use std::path::{Component, Path};

use crate::TransferError;

/// Validates a received `fileName` before it is joined onto an output
/// directory.
///
/// The name comes straight off the wire, so it must stay inside the
/// directory. Rejects:
/// - Empty names
/// - Absolute paths (Unix `/` or Windows `C:\`)
/// - Parent directory traversal (`..`)
/// - Windows prefix components (`C:`, `\\server`)
pub fn validate_file_name(name: &str) -> Result<(), TransferError> {
    if name.is_empty() {
        return Err(TransferError::InvalidName("empty file name".into()));
    }

    let path = Path::new(name);
    if path.is_absolute() {
        return Err(TransferError::InvalidName(format!(
            "absolute path not allowed: {name}"
        )));
    }

    for component in path.components() {
        match component {
            Component::ParentDir => {
                return Err(TransferError::InvalidName(format!(
                    "parent directory traversal not allowed: {name}"
                )));
            }
            Component::Prefix(_) | Component::RootDir => {
                return Err(TransferError::InvalidName(format!(
                    "absolute path not allowed: {name}"
                )));
            }
            Component::CurDir | Component::Normal(_) => {}
        }
    }

    if path.file_name().is_none() {
        return Err(TransferError::InvalidName(format!(
            "no file name component: {name}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_name() {
        assert!(validate_file_name("").is_err());
    }

    #[test]
    fn rejects_traversal() {
        assert!(validate_file_name("../../.ssh/authorized_keys").is_err());
        assert!(validate_file_name("uploads/../../escape.png").is_err());
        assert!(validate_file_name("..").is_err());
    }

    #[test]
    fn rejects_absolute_path() {
        assert!(validate_file_name("/etc/passwd").is_err());
    }

    #[test]
    fn rejects_bare_current_dir() {
        assert!(validate_file_name(".").is_err());
    }

    #[test]
    fn accepts_plain_names() {
        assert!(validate_file_name("cat.png").is_ok());
        assert!(validate_file_name("Screenshot 2024-05-01 at 10.00.00.png").is_ok());
        assert!(validate_file_name(".env.example").is_ok());
        assert!(validate_file_name("./notes.txt").is_ok());
    }
}
