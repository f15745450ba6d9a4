use std::path::{Path, PathBuf};

/// Adds the given base `directory` to the `path`, if it's not already absolute.
pub fn normalize_path(path: &Path, directory: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        [directory, path].into_iter().collect()
    }
}

pub fn path_has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Creates the parent directory of `path` (including missing ancestors).
/// Returns the directory, if it had to be created.
pub fn ensure_parent_dir(path: &Path) -> crate::Result<Option<&Path>> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.is_dir() => {
            std::fs::create_dir_all(dir)?;
            Ok(Some(dir))
        }
        _ => Ok(None),
    }
}

/// Directory of the running executable.
pub fn executable_dir() -> Option<PathBuf> {
    let executable = std::env::current_exe().ok()?;
    executable.parent().map(|dir| dir.to_path_buf())
}
