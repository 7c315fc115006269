use crate::domain::{
    ArchiveListing, ArchivePair, BatchReport, FsEntry, PathLengthCheck, ScanReport,
};
use crate::error::{ArchiverError, ChecksumError};
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

pub trait FileSystemPort {
    /// Files and directories under `root` whose depth is within `max_depth`.
    /// Depth 0 is a direct child of `root`. Unreadable entries are skipped.
    fn scan_entries(&self, root: &Path, max_depth: Option<usize>) -> Vec<FsEntry>;

    /// Every file below `dir`, recursively, tolerant of very long paths.
    fn tree_files(&self, dir: &Path) -> Vec<FsEntry>;
}

pub trait ChecksumPort {
    fn checksum_file(&self, path: &Path) -> Result<u32, ChecksumError>;

    /// CRC-32 of every readable file under `root`, keyed by path relative to `root`.
    /// `cancel` is polled between files.
    fn checksum_tree(
        &self,
        root: &Path,
        cancel: Option<&AtomicBool>,
    ) -> Result<BTreeMap<PathBuf, u32>, ChecksumError>;
}

/// Create / test / list capability of an external archiver.
pub trait ArchiverPort {
    /// Native archive extension, without the dot.
    fn extension(&self) -> &str;

    fn create(
        &self,
        html_file: &Path,
        folder: &Path,
        output: &Path,
        compression_level: u8,
    ) -> Result<(), ArchiverError>;

    /// `true` when the archiver reports the container structurally sound.
    fn test(&self, archive: &Path) -> Result<bool, ArchiverError>;

    fn list(&self, archive: &Path) -> Result<ArchiveListing, ArchiverError>;
}

/// Per-pair decisions for risky cases, taken before any archiving starts.
pub trait DecisionPort {
    fn confirm_problematic_chars(&self, pair: &ArchivePair) -> Result<bool>;
    fn confirm_long_path(&self, pair: &ArchivePair, check: &PathLengthCheck) -> Result<bool>;
}

pub trait OutputPort {
    fn write_scan(&self, report: &ScanReport) -> Result<()>;
    fn write_batch(&self, report: &BatchReport) -> Result<()>;
}

pub trait ProgressPort {
    fn start(&self, total: u64);
    fn update(&self, processed: u64);
    fn message(&self, line: &str);
    fn finish(&self);
}
