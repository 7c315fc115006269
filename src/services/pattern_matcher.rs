use crate::domain::{PatternType, is_html_path};
use crate::ports::FileSystemPort;
use std::path::{Path, PathBuf};

/// Pairs an HTML file with the resource folder a browser saved next to it.
pub struct PatternMatcher<'a, F> {
    filesystem: &'a F,
}

impl<'a, F: FileSystemPort> PatternMatcher<'a, F> {
    pub fn new(filesystem: &'a F) -> Self {
        Self { filesystem }
    }

    pub fn is_html_file(&self, path: &Path) -> bool {
        is_html_path(path) && path.is_file()
    }

    /// First sibling directory named `<stem><suffix>`, in pattern priority order.
    pub fn find_matching_folder(&self, html_file: &Path) -> Option<(PathBuf, PatternType)> {
        if !self.is_html_file(html_file) {
            return None;
        }
        let stem = html_file.file_stem()?.to_string_lossy();
        let parent = html_file.parent()?;

        PatternType::ALL.into_iter().find_map(|pattern| {
            let candidate = parent.join(format!("{}{}", stem, pattern.suffix()));
            candidate.is_dir().then_some((candidate, pattern))
        })
    }

    /// `(total_size_bytes, file_count)`; unreadable entries are skipped.
    pub fn folder_stats(&self, folder: &Path) -> (u64, usize) {
        let files = self.filesystem.tree_files(folder);
        let size = files.iter().filter_map(|f| f.size).sum();
        (size, files.len())
    }
}
