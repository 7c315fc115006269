use crate::domain::{
    ArchivePair, FsEntry, OrphanedItem, PatternType, REASON_NO_FOLDER, REASON_NO_HTML,
    ScanConfig, ScanReport, ScanStatistics, is_html_path,
};
use crate::ports::FileSystemPort;
use crate::services::pattern_matcher::PatternMatcher;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Curly quotes that archivers tend to rewrite in stored names.
pub const PROBLEMATIC_CHARS: [(char, &str); 4] = [
    ('\u{2018}', "\u{2018} (U+2018 LEFT SINGLE QUOTATION MARK)"),
    ('\u{2019}', "\u{2019} (U+2019 RIGHT SINGLE QUOTATION MARK)"),
    ('\u{201C}', "\u{201C} (U+201C LEFT DOUBLE QUOTATION MARK)"),
    ('\u{201D}', "\u{201D} (U+201D RIGHT DOUBLE QUOTATION MARK)"),
];

/// Describe every problematic character in `path`, or `None` if it is clean.
pub fn problematic_chars(path: &Path) -> Option<String> {
    let full = path.to_string_lossy();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let found: Vec<String> = PROBLEMATIC_CHARS
        .iter()
        .filter(|(c, _)| full.contains(*c))
        .map(|(c, description)| {
            let location = if name.contains(*c) {
                format!("filename: {name}")
            } else {
                let parent = path.parent().unwrap_or(Path::new(""));
                format!("path: {}", parent.display())
            };
            format!("{description} in {location}")
        })
        .collect();

    (!found.is_empty()).then(|| found.join("; "))
}

fn path_len(path: &Path) -> usize {
    path.to_string_lossy().chars().count()
}

/// Finds HTML + resource folder pairs and orphans under a root directory.
pub struct ScannerService<F> {
    filesystem: F,
}

impl<F: FileSystemPort> ScannerService<F> {
    pub fn new(filesystem: F) -> Self {
        Self { filesystem }
    }

    pub fn scan(&self, config: &ScanConfig) -> ScanReport {
        let root = &config.root;
        if !root.is_dir() {
            debug!("scan root {} is not a directory", root.display());
            return ScanReport::empty(root.clone(), config.max_depth);
        }

        let matcher = PatternMatcher::new(&self.filesystem);
        let entries = self.filesystem.scan_entries(root, config.max_depth);

        // Pass 1: every HTML file within the depth bound, no exclusions.
        let html_files: Vec<&FsEntry> = entries
            .iter()
            .filter(|e| !e.is_dir && is_html_path(&e.path))
            .collect();

        // Pass 2: pairs.
        let mut pairs = Vec::new();
        let mut paired_html: HashSet<&Path> = HashSet::new();
        let mut processed_folders: HashSet<PathBuf> = HashSet::new();
        let mut paired_resource_folders: Vec<PathBuf> = Vec::new();

        for html in &html_files {
            let Some((folder, pattern)) = matcher.find_matching_folder(&html.path) else {
                continue;
            };
            let pair = self.build_pair(&matcher, html, folder, pattern);
            debug!(
                "pair {} -> {} ({} files, max path {} chars)",
                pair.html_file.display(),
                pair.folder_name(),
                pair.file_count,
                pair.max_path_length
            );
            if pair.has_problematic_chars {
                debug!("problematic characters: {}", pair.problematic_details);
            }

            paired_html.insert(html.path.as_path());
            if processed_folders.insert(pair.folder_path.clone()) {
                paired_resource_folders.push(pair.folder_path.clone());
            }
            pairs.push(pair);
        }

        // Pass 3: orphaned HTML, skipping copies embedded in a paired folder.
        let mut orphans: Vec<OrphanedItem> = html_files
            .iter()
            .filter(|html| !paired_html.contains(html.path.as_path()))
            .filter(|html| {
                !paired_resource_folders
                    .iter()
                    .any(|folder| html.path.starts_with(folder))
            })
            .map(|html| OrphanedItem {
                path: html.path.clone(),
                is_html: true,
                size: html.size.unwrap_or(0),
                reason: REASON_NO_FOLDER.to_string(),
            })
            .collect();

        // Pass 4: resource-looking folders nobody claimed.
        let orphaned_folders: Vec<OrphanedItem> = entries
            .iter()
            .filter(|e| e.is_dir && !processed_folders.contains(&e.path))
            .filter(|e| {
                e.path
                    .file_name()
                    .and_then(|n| PatternType::from_folder_name(&n.to_string_lossy()))
                    .is_some()
            })
            .map(|dir| {
                let (size, _) = matcher.folder_stats(&dir.path);
                OrphanedItem {
                    path: dir.path.clone(),
                    is_html: false,
                    size,
                    reason: REASON_NO_HTML.to_string(),
                }
            })
            .collect();

        let directories_scanned = processed_folders.len() + orphaned_folders.len();
        orphans.extend(orphaned_folders);

        let stats =
            ScanStatistics::from_results(&pairs, &orphans, html_files.len(), directories_scanned);
        info!(
            "scanned {}: {} pairs, {} orphans",
            root.display(),
            stats.pairs_found,
            stats.total_orphans()
        );

        ScanReport {
            pairs,
            orphans,
            stats,
            scan_root: root.clone(),
            max_depth: config.max_depth,
        }
    }

    fn build_pair(
        &self,
        matcher: &PatternMatcher<'_, F>,
        html: &FsEntry,
        folder: PathBuf,
        pattern_type: PatternType,
    ) -> ArchivePair {
        let html_size = html
            .size
            .or_else(|| fs::metadata(&html.path).ok().map(|m| m.len()))
            .unwrap_or(0);
        let (folder_size, file_count) = matcher.folder_stats(&folder);
        let folder_files = self.filesystem.tree_files(&folder);

        let max_path_length = folder_files
            .iter()
            .map(|f| path_len(&f.path))
            .chain(std::iter::once(path_len(&html.path)))
            .max()
            .unwrap_or(0);

        let problematic = problematic_chars(&html.path)
            .or_else(|| problematic_chars(&folder))
            .or_else(|| folder_files.iter().find_map(|f| problematic_chars(&f.path)));

        ArchivePair {
            html_file: html.path.clone(),
            folder_path: folder,
            pattern_type,
            html_size,
            folder_size,
            file_count,
            max_path_length,
            has_problematic_chars: problematic.is_some(),
            problematic_details: problematic.unwrap_or_default(),
        }
    }
}
