//! Path encoding for very long paths.
//!
//! Windows refuses paths over `MAX_PATH` (260) unless they use the
//! extended-length `\\?\` form. Everything that opens or walks files inside a
//! resource folder goes through [`long_path`]; on other targets it is a no-op.

use std::path::{Path, PathBuf};

#[cfg(windows)]
pub fn long_path(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let raw = absolute.to_string_lossy();

    if raw.starts_with(r"\\?\") {
        return absolute;
    }
    if let Some(unc) = raw.strip_prefix(r"\\") {
        return PathBuf::from(format!(r"\\?\UNC\{unc}"));
    }
    PathBuf::from(format!(r"\\?\{raw}"))
}

#[cfg(not(windows))]
pub fn long_path(path: &Path) -> PathBuf {
    path.to_path_buf()
}

/// Map a path found under `long_root` back onto the caller's `root`.
pub fn restore_path(root: &Path, long_root: &Path, found: &Path) -> PathBuf {
    match found.strip_prefix(long_root) {
        Ok(rel) if rel.as_os_str().is_empty() => root.to_path_buf(),
        Ok(rel) => root.join(rel),
        Err(_) => found.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(windows))]
    #[test]
    fn long_path_is_identity_off_windows() {
        let p = Path::new("some/relative/dir");
        assert_eq!(long_path(p), p.to_path_buf());
    }

    #[cfg(windows)]
    #[test]
    fn long_path_adds_extended_prefix() {
        let p = long_path(Path::new(r"C:\data\page_files"));
        assert_eq!(p, PathBuf::from(r"\\?\C:\data\page_files"));

        let unc = long_path(Path::new(r"\\server\share\page_files"));
        assert_eq!(unc, PathBuf::from(r"\\?\UNC\server\share\page_files"));

        let already = long_path(Path::new(r"\\?\C:\x"));
        assert_eq!(already, PathBuf::from(r"\\?\C:\x"));
    }

    #[test]
    fn restore_path_rebases_onto_original_root() {
        let root = Path::new("short");
        let long_root = Path::new("/very/long/short");
        let found = Path::new("/very/long/short/a/b.png");
        assert_eq!(restore_path(root, long_root, found), PathBuf::from("short/a/b.png"));
        assert_eq!(restore_path(root, long_root, long_root), PathBuf::from("short"));
    }
}
