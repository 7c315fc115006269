use crate::domain::{ArchiveListing, CrcMismatch, VerificationCheck, VerificationOutcome};
use crate::error::ChecksumError;
use crate::ports::{ArchiverPort, ChecksumPort, FileSystemPort};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing::{debug, warn};
use unicode_normalization::UnicodeNormalization;

/// Canonical key for comparing stored names: `/` separators, NFKC, and
/// curly quotes folded to straight ones.
pub fn normalize_key(raw: &str) -> String {
    raw.replace('\\', "/")
        .nfkc()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            other => other,
        })
        .collect()
}

/// Checksums grouped by normalized name. Distinct files can normalize to the
/// same key, so each key holds one entry per file.
pub type ChecksumIndex = BTreeMap<String, Vec<Option<u32>>>;

fn index_checksums(items: impl IntoIterator<Item = (String, Option<u32>)>) -> ChecksumIndex {
    let mut index = ChecksumIndex::new();
    for (key, crc) in items {
        index.entry(key).or_default().push(crc);
    }
    for crcs in index.values_mut() {
        crcs.sort_unstable();
    }
    index
}

/// Compare original and archived checksums key by key. A key is clean only
/// when both sides hold the same checksums, as many times, with none missing.
pub fn reconcile(original: &ChecksumIndex, archived: &ChecksumIndex) -> Vec<CrcMismatch> {
    let keys: BTreeSet<&String> = original.keys().chain(archived.keys()).collect();
    keys.into_iter()
        .filter_map(|key| {
            let left = original.get(key).cloned().unwrap_or_default();
            let right = archived.get(key).cloned().unwrap_or_default();
            let clean = left == right && left.iter().all(Option::is_some);
            (!clean).then(|| CrcMismatch {
                key: key.clone(),
                original: left,
                archived: right,
            })
        })
        .collect()
}

fn format_crcs(crcs: &[Option<u32>]) -> String {
    crcs.iter()
        .map(|crc| crc.map_or_else(|| "-".to_string(), |c| format!("{c:08X}")))
        .collect::<Vec<_>>()
        .join(",")
}

/// Three-level archive verification: integrity test, file count, per-file CRC.
/// Stops at the first failed level.
pub struct VerifierService<'a, A: ?Sized, C: ?Sized, F: ?Sized> {
    archiver: &'a A,
    checksum: &'a C,
    filesystem: &'a F,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a, A, C, F> VerifierService<'a, A, C, F>
where
    A: ArchiverPort + ?Sized,
    C: ChecksumPort + ?Sized,
    F: FileSystemPort + ?Sized,
{
    pub fn new(archiver: &'a A, checksum: &'a C, filesystem: &'a F) -> Self {
        Self {
            archiver,
            checksum,
            filesystem,
            cancel: None,
        }
    }

    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn verify(
        &self,
        archive: &Path,
        html_file: &Path,
        folder: &Path,
        skip_crc: bool,
    ) -> VerificationOutcome {
        let mut outcome = VerificationOutcome::default();

        // Level 1
        outcome.checks_run.push(VerificationCheck::Integrity);
        match self.archiver.test(archive) {
            Ok(true) => outcome.integrity_ok = true,
            Ok(false) => {
                outcome.error_message = "archive integrity test failed".to_string();
                return outcome;
            }
            Err(err) => {
                outcome.error_message = format!("archive integrity test failed: {err}");
                return outcome;
            }
        }

        // Level 2
        outcome.checks_run.push(VerificationCheck::FileCount);
        outcome.expected_file_count = 1 + self.filesystem.tree_files(folder).len();
        let listing = match self.archiver.list(archive) {
            Ok(listing) => listing,
            Err(err) => {
                outcome.error_message = format!("failed to list archive: {err}");
                return outcome;
            }
        };
        outcome.archived_file_count = listing.file_count();
        debug!(
            "file count: expected {}, archived {}",
            outcome.expected_file_count, outcome.archived_file_count
        );
        if outcome.expected_file_count != outcome.archived_file_count {
            outcome.error_message = format!(
                "file count mismatch: expected {}, got {}",
                outcome.expected_file_count, outcome.archived_file_count
            );
            return outcome;
        }
        outcome.file_count_ok = true;

        // Level 3
        if skip_crc {
            outcome.crc_ok = true;
            outcome.passed = true;
            return outcome;
        }
        outcome.checks_run.push(VerificationCheck::Crc);

        let original = match self.original_checksums(html_file, folder) {
            Ok(original) => original,
            Err(err) => {
                outcome.cancelled = matches!(err, ChecksumError::Cancelled);
                outcome.error_message = format!("CRC check aborted: {err}");
                return outcome;
            }
        };
        let archived = archived_checksums(&listing);
        let mismatches = reconcile(&original, &archived);
        for m in &mismatches {
            if m.archived.is_empty() {
                warn!("file not found in archive: {}", m.key);
            } else if m.original.is_empty() {
                warn!("archive holds unexpected file: {}", m.key);
            } else if m.original.contains(&None) || m.archived.contains(&None) {
                warn!("checksum unavailable for {}", m.key);
            } else {
                warn!(
                    "CRC mismatch for {}: [{}] vs [{}]",
                    m.key,
                    format_crcs(&m.original),
                    format_crcs(&m.archived)
                );
            }
        }

        outcome.crc_mismatch_count = mismatches.len();
        outcome.mismatches = mismatches;
        if outcome.crc_mismatch_count > 0 {
            outcome.error_message = format!("CRC mismatch: {} files differ", outcome.crc_mismatch_count);
            return outcome;
        }
        outcome.crc_ok = true;
        outcome.passed = true;
        outcome
    }

    /// HTML keyed by its own name, folder files by `<folder>/<relative path>`.
    fn original_checksums(
        &self,
        html_file: &Path,
        folder: &Path,
    ) -> Result<ChecksumIndex, ChecksumError> {
        let mut sums = Vec::new();

        let html_name = html_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let html_crc = match self.checksum.checksum_file(html_file) {
            Ok(crc) => Some(crc),
            Err(err) => {
                warn!("could not checksum {}: {}", html_file.display(), err);
                None
            }
        };
        sums.push((normalize_key(&html_name), html_crc));

        let folder_name = folder
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tree = self.checksum.checksum_tree(folder, self.cancel.as_deref())?;
        for (relative, crc) in tree {
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            sums.push((normalize_key(&format!("{folder_name}/{relative}")), Some(crc)));
        }
        Ok(index_checksums(sums))
    }
}

fn archived_checksums(listing: &ArchiveListing) -> ChecksumIndex {
    index_checksums(
        listing
            .files()
            .map(|entry| (normalize_key(&entry.path), entry.crc)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(items: &[(&str, Option<u32>)]) -> ChecksumIndex {
        index_checksums(items.iter().map(|(k, v)| (k.to_string(), *v)))
    }

    #[test]
    fn normalize_folds_curly_quotes_and_separators() {
        assert_eq!(normalize_key("Don\u{2019}t_files\\a.css"), "Don't_files/a.css");
        assert_eq!(normalize_key("\u{201C}x\u{201D}.html"), "\"x\".html");
    }

    #[test]
    fn normalize_applies_nfkc() {
        // "e" + combining acute composes; the "fi" ligature decomposes.
        assert_eq!(normalize_key("cafe\u{301}"), "caf\u{e9}");
        assert_eq!(normalize_key("\u{FB01}le.txt"), "file.txt");
    }

    #[test]
    fn reconcile_counts_each_kind_of_mismatch() {
        let original = map(&[("a", Some(1)), ("b", Some(2)), ("c", Some(3)), ("d", None)]);
        let archived = map(&[("a", Some(1)), ("b", Some(9)), ("d", Some(4)), ("e", Some(5))]);
        let mismatches = reconcile(&original, &archived);
        let keys: Vec<&str> = mismatches.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, vec!["b", "c", "d", "e"]);
    }

    #[test]
    fn reconcile_treats_missing_checksums_on_both_sides_as_mismatch() {
        let original = map(&[("x", None)]);
        let archived = map(&[("x", None)]);
        assert_eq!(reconcile(&original, &archived).len(), 1);
    }

    #[test]
    fn reconcile_of_identical_maps_is_clean() {
        let both = map(&[("p.html", Some(10)), ("p_files/a", Some(0))]);
        assert!(reconcile(&both, &both).is_empty());
    }

    #[test]
    fn reconcile_compares_colliding_keys_as_multisets() {
        let original = map(&[("f/a'.css", Some(1)), ("f/a'.css", Some(2))]);

        let reordered = map(&[("f/a'.css", Some(2)), ("f/a'.css", Some(1))]);
        assert!(reconcile(&original, &reordered).is_empty());

        let corrupted = map(&[("f/a'.css", Some(1)), ("f/a'.css", Some(7))]);
        let mismatches = reconcile(&original, &corrupted);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].original, vec![Some(1), Some(2)]);
        assert_eq!(mismatches[0].archived, vec![Some(1), Some(7)]);

        let one_copy = map(&[("f/a'.css", Some(1))]);
        assert_eq!(reconcile(&original, &one_copy).len(), 1);
    }

    #[test]
    fn reconcile_reports_absent_side_as_empty() {
        let mismatches = reconcile(&map(&[("only_here", Some(3))]), &map(&[]));
        assert_eq!(mismatches[0].original, vec![Some(3)]);
        assert!(mismatches[0].archived.is_empty());
    }
}
