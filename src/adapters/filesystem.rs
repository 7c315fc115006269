use crate::domain::FsEntry;
use crate::platform::{long_path, restore_path};
use crate::ports::FileSystemPort;
use ignore::{DirEntry, WalkBuilder};
use std::path::Path;
use tracing::debug;

/// Walks saved-page trees. Symlinks are never followed and only regular
/// files and directories are reported, matching the checksum pass.
#[derive(Debug, Clone, Copy)]
pub struct FileSystemAdapter;

impl FileSystemAdapter {
    pub fn new() -> Self {
        Self
    }

    fn walker(&self, root: &Path, walk_depth: Option<usize>) -> ignore::Walk {
        let mut builder = WalkBuilder::new(root);
        // Saved pages are plain files: no hidden/.gitignore filtering.
        builder
            .standard_filters(false)
            .follow_links(false)
            .max_depth(walk_depth)
            .sort_by_file_name(|a, b| a.cmp(b));
        builder.build()
    }

    fn to_entry(root: &Path, long_root: &Path, entry: &DirEntry) -> Option<FsEntry> {
        let file_type = entry.file_type()?;
        if !file_type.is_file() && !file_type.is_dir() {
            return None;
        }
        let size = if file_type.is_dir() {
            None
        } else {
            entry.metadata().ok().map(|m| m.len())
        };
        Some(FsEntry {
            path: restore_path(root, long_root, entry.path()),
            is_dir: file_type.is_dir(),
            size,
        })
    }
}

impl Default for FileSystemAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystemPort for FileSystemAdapter {
    fn scan_entries(&self, root: &Path, max_depth: Option<usize>) -> Vec<FsEntry> {
        if !root.is_dir() {
            return Vec::new();
        }

        let long_root = long_path(root);
        // The walker counts the root itself as depth 0.
        let walk_depth = max_depth.map(|d| d + 1);

        self.walker(&long_root, walk_depth)
            .filter_map(|entry| match entry {
                Ok(entry) if entry.depth() == 0 => None,
                Ok(entry) => Self::to_entry(root, &long_root, &entry),
                Err(err) => {
                    debug!("skipping unreadable entry under {}: {}", root.display(), err);
                    None
                }
            })
            .collect()
    }

    fn tree_files(&self, dir: &Path) -> Vec<FsEntry> {
        let long_dir = long_path(dir);
        if !long_dir.is_dir() {
            return Vec::new();
        }

        self.walker(&long_dir, None)
            .filter_map(|entry| match entry {
                Ok(entry) => Self::to_entry(dir, &long_dir, &entry).filter(|e| !e.is_dir),
                Err(err) => {
                    debug!("skipping unreadable entry under {}: {}", dir.display(), err);
                    None
                }
            })
            .collect()
    }
}
