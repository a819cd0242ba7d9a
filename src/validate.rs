use crate::error::{Error, Result};
use crate::uinput::UINPUT_MAX_NAME_SIZE;
use std::path::Path;

/// Longest name the kernel accepts, leaving room for the NUL terminator.
pub const MAX_NAME_LEN: usize = UINPUT_MAX_NAME_SIZE - 1;

pub fn validate_path(path: &Path) -> Result<()> {
    let invalid = |reason: String| Error::InvalidPath {
        path: path.to_path_buf(),
        reason,
    };

    if path.as_os_str().is_empty() {
        return Err(invalid("path is empty".to_string()));
    }
    let metadata = std::fs::metadata(path).map_err(|e| invalid(e.to_string()))?;
    if metadata.is_dir() {
        return Err(invalid("path is a directory".to_string()));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidName("name is empty".to_string()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(Error::InvalidName(format!(
            "name is {} bytes, at most {} allowed",
            name.len(),
            MAX_NAME_LEN
        )));
    }
    if name.contains('\0') {
        return Err(Error::InvalidName("name contains a NUL byte".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_bounded() {
        assert!(validate_name("Hot gophers in your area").is_ok());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN)).is_ok());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN + 1)).is_err());
        assert!(validate_name("").is_err());
        assert!(validate_name("a\0b").is_err());
    }

    #[test]
    fn paths_must_exist_and_not_be_directories() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("uinput");
        std::fs::write(&file, b"").unwrap();

        assert!(validate_path(&file).is_ok());
        assert!(validate_path(dir.path()).is_err());
        assert!(validate_path(&dir.path().join("missing")).is_err());
        assert!(validate_path(Path::new("")).is_err());
    }
}
