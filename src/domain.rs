use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Archive name suffix placed between the sanitized base name and the extension.
pub const ARCHIVE_SUFFIX: &str = "_web_archive";

/// Reference path-length ceiling (Windows `MAX_PATH`).
pub const DEFAULT_PATH_LIMIT: usize = 260;

pub const DEFAULT_COMPRESSION_LEVEL: u8 = 5;

pub const HTML_EXTENSIONS: [&str; 3] = ["html", "htm", "xhtml"];

/// Browser save conventions for the resource folder next to a saved page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternType {
    /// `page_files/` (Chrome, Edge, Firefox)
    ChromeFiles,
    /// `page_file/`
    ChromeFile,
    /// `page.files/` (Internet Explorer)
    IeFiles,
    /// `pageFiles/`
    GenericFiles,
}

impl PatternType {
    /// Lookup table in matching priority order.
    pub const ALL: [PatternType; 4] = [
        PatternType::ChromeFiles,
        PatternType::ChromeFile,
        PatternType::IeFiles,
        PatternType::GenericFiles,
    ];

    pub fn suffix(&self) -> &'static str {
        match self {
            PatternType::ChromeFiles => "_files",
            PatternType::ChromeFile => "_file",
            PatternType::IeFiles => ".files",
            PatternType::GenericFiles => "Files",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::ChromeFiles => "CHROME_FILES",
            PatternType::ChromeFile => "CHROME_FILE",
            PatternType::IeFiles => "IE_FILES",
            PatternType::GenericFiles => "GENERIC_FILES",
        }
    }

    /// Pattern whose suffix ends the given folder name, first in priority order.
    pub fn from_folder_name(name: &str) -> Option<PatternType> {
        Self::ALL.into_iter().find(|p| name.ends_with(p.suffix()))
    }
}

/// An HTML file and the resource folder saved alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivePair {
    pub html_file: PathBuf,
    pub folder_path: PathBuf,
    pub pattern_type: PatternType,
    pub html_size: u64,
    pub folder_size: u64,
    pub file_count: usize,
    pub max_path_length: usize,
    pub has_problematic_chars: bool,
    pub problematic_details: String,
}

impl ArchivePair {
    pub fn total_size(&self) -> u64 {
        self.html_size + self.folder_size
    }

    /// HTML file name without its extension.
    pub fn base_name(&self) -> String {
        self.html_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn folder_name(&self) -> String {
        self.folder_path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Path-length check once the archive suffix and extension are added.
    pub fn path_length_check(&self, archive_extension: &str, limit: usize) -> PathLengthCheck {
        let suffix_len = ARCHIVE_SUFFIX.chars().count() + 1 + archive_extension.chars().count();
        PathLengthCheck {
            max_path_length: self.max_path_length,
            suffix_length: suffix_len,
            effective_length: self.max_path_length + suffix_len,
            limit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathLengthCheck {
    pub max_path_length: usize,
    pub suffix_length: usize,
    pub effective_length: usize,
    pub limit: usize,
}

impl PathLengthCheck {
    pub fn exceeds(&self) -> bool {
        self.effective_length > self.limit
    }

    pub fn excess(&self) -> usize {
        self.effective_length.saturating_sub(self.limit)
    }
}

pub const REASON_NO_FOLDER: &str = "no matching resource folder found";
pub const REASON_NO_HTML: &str = "no matching HTML file found";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanedItem {
    pub path: PathBuf,
    pub is_html: bool,
    pub size: u64,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStatistics {
    pub pairs_found: usize,
    pub orphaned_html_count: usize,
    pub orphaned_folder_count: usize,
    pub total_size_bytes: u64,
    pub files_scanned: usize,
    pub directories_scanned: usize,
}

impl ScanStatistics {
    pub fn from_results(
        pairs: &[ArchivePair],
        orphans: &[OrphanedItem],
        files_scanned: usize,
        directories_scanned: usize,
    ) -> Self {
        Self {
            pairs_found: pairs.len(),
            orphaned_html_count: orphans.iter().filter(|o| o.is_html).count(),
            orphaned_folder_count: orphans.iter().filter(|o| !o.is_html).count(),
            total_size_bytes: pairs.iter().map(|p| p.total_size()).sum(),
            files_scanned,
            directories_scanned,
        }
    }

    pub fn total_orphans(&self) -> usize {
        self.orphaned_html_count + self.orphaned_folder_count
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub pairs: Vec<ArchivePair>,
    pub orphans: Vec<OrphanedItem>,
    pub stats: ScanStatistics,
    pub scan_root: PathBuf,
    pub max_depth: Option<usize>,
}

impl ScanReport {
    pub fn empty(scan_root: PathBuf, max_depth: Option<usize>) -> Self {
        Self {
            pairs: Vec::new(),
            orphans: Vec::new(),
            stats: ScanStatistics::default(),
            scan_root,
            max_depth,
        }
    }

    pub fn has_pairs(&self) -> bool {
        !self.pairs.is_empty()
    }

    pub fn has_orphans(&self) -> bool {
        !self.orphans.is_empty()
    }
}

/// Result of one archive creation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveOutcome {
    pub archive_path: PathBuf,
    pub success: bool,
    pub error_message: String,
    pub original_size_bytes: u64,
    pub compressed_size_bytes: u64,
}

impl ArchiveOutcome {
    /// Percentage of the original size saved by compression.
    pub fn compression_ratio(&self) -> f64 {
        if self.original_size_bytes == 0 {
            return 0.0;
        }
        (1.0 - self.compressed_size_bytes as f64 / self.original_size_bytes as f64) * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationCheck {
    Integrity,
    FileCount,
    Crc,
}

impl VerificationCheck {
    pub fn label(&self) -> &'static str {
        match self {
            VerificationCheck::Integrity => "Integrity test",
            VerificationCheck::FileCount => "File count",
            VerificationCheck::Crc => "CRC check",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrcMismatch {
    pub key: String,
    /// Checksums of every file that maps to `key`, sorted; empty when absent.
    pub original: Vec<Option<u32>>,
    pub archived: Vec<Option<u32>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub passed: bool,
    pub integrity_ok: bool,
    pub file_count_ok: bool,
    pub crc_ok: bool,
    pub expected_file_count: usize,
    pub archived_file_count: usize,
    pub crc_mismatch_count: usize,
    pub error_message: String,
    /// Set when the checksum pass stopped on a cancel request.
    #[serde(default)]
    pub cancelled: bool,
    /// Checks that actually ran, in protocol order.
    pub checks_run: Vec<VerificationCheck>,
    pub mismatches: Vec<CrcMismatch>,
}

impl VerificationOutcome {
    pub fn ran(&self, check: VerificationCheck) -> bool {
        self.checks_run.contains(&check)
    }

    /// Per-check status for rendering: `None` when the check did not run.
    pub fn check_status(&self, check: VerificationCheck) -> Option<bool> {
        if !self.ran(check) {
            return None;
        }
        Some(match check {
            VerificationCheck::Integrity => self.integrity_ok,
            VerificationCheck::FileCount => self.file_count_ok,
            VerificationCheck::Crc => self.crc_ok,
        })
    }
}

/// One entry reported by an archiver listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub path: String,
    pub is_dir: bool,
    pub size: Option<u64>,
    pub crc: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveListing {
    pub entries: Vec<ArchiveEntry>,
    /// `(files, folders)` from the archiver's summary line when present.
    pub summary: Option<(usize, usize)>,
}

impl ArchiveListing {
    pub fn file_count(&self) -> usize {
        match self.summary {
            Some((files, _)) => files,
            None => self.entries.iter().filter(|e| !e.is_dir).count(),
        }
    }

    pub fn folder_count(&self) -> usize {
        match self.summary {
            Some((_, folders)) => folders,
            None => self.entries.iter().filter(|e| e.is_dir).count(),
        }
    }

    pub fn files(&self) -> impl Iterator<Item = &ArchiveEntry> {
        self.entries.iter().filter(|e| !e.is_dir)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum PairStatus {
    Archived,
    DryRun,
    Skipped(String),
    ArchiveFailed(String),
    VerificationFailed(String),
    Cancelled,
}

impl PairStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, PairStatus::Archived | PairStatus::DryRun)
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            PairStatus::ArchiveFailed(_) | PairStatus::VerificationFailed(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairOutcome {
    pub pair: ArchivePair,
    pub archive_path: PathBuf,
    pub status: PairStatus,
    pub creation: Option<ArchiveOutcome>,
    pub verification: Option<VerificationOutcome>,
    pub path_check: PathLengthCheck,
    pub source_deleted: bool,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub outcomes: Vec<PairOutcome>,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cancelled: usize,
    pub total: usize,
    pub dry_run: bool,
}

impl BatchReport {
    pub fn new(outcomes: Vec<PairOutcome>, dry_run: bool) -> Self {
        let successful = outcomes.iter().filter(|o| o.status.is_success()).count();
        let failed = outcomes.iter().filter(|o| o.status.is_failure()).count();
        let skipped = outcomes
            .iter()
            .filter(|o| matches!(o.status, PairStatus::Skipped(_)))
            .count();
        let cancelled = outcomes
            .iter()
            .filter(|o| o.status == PairStatus::Cancelled)
            .count();
        let total = outcomes.len();
        Self {
            outcomes,
            successful,
            failed,
            skipped,
            cancelled,
            total,
            dry_run,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub root: PathBuf,
    pub max_depth: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            max_depth: None,
        }
    }
}

impl ScanConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    pub seven_zip: Option<PathBuf>,
    pub compression_level: u8,
    pub skip_crc: bool,
    pub delete_source: bool,
    pub dry_run: bool,
    pub jobs: usize,
    pub path_limit: usize,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            seven_zip: None,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            skip_crc: false,
            delete_source: false,
            dry_run: false,
            jobs: 1,
            path_limit: DEFAULT_PATH_LIMIT,
        }
    }
}

impl ArchiveConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seven_zip(mut self, path: PathBuf) -> Self {
        self.seven_zip = Some(path);
        self
    }

    pub fn with_compression_level(mut self, level: u8) -> Self {
        self.compression_level = level;
        self
    }

    pub fn with_skip_crc(mut self, skip: bool) -> Self {
        self.skip_crc = skip;
        self
    }

    pub fn with_delete_source(mut self, delete: bool) -> Self {
        self.delete_source = delete;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn with_path_limit(mut self, limit: usize) -> Self {
        self.path_limit = limit;
        self
    }
}

/// File or directory seen by a filesystem walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEntry {
    pub path: PathBuf,
    pub is_dir: bool,
    /// `None` when metadata could not be read.
    pub size: Option<u64>,
}

pub fn is_html_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| HTML_EXTENSIONS.iter().any(|h| e.eq_ignore_ascii_case(h)))
        .unwrap_or(false)
}
