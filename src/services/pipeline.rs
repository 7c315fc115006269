use crate::domain::{
    ArchiveConfig, ArchivePair, BatchReport, PairOutcome, PairStatus, PathLengthCheck, ScanReport,
};
use crate::platform::long_path;
use crate::ports::{ArchiverPort, ChecksumPort, DecisionPort, FileSystemPort, ProgressPort};
use crate::services::archiver::{archive_path_for, create_archive};
use crate::services::verifier::VerifierService;
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{info, info_span, warn};

pub const SKIP_PROBLEMATIC: &str = "problematic characters; declined";
pub const SKIP_LONG_PATH: &str = "path length exceeds limit; declined";

#[derive(Debug, Clone)]
enum Decision {
    Process,
    Skip(&'static str),
}

#[derive(Debug, Clone)]
struct PlannedPair {
    pair: ArchivePair,
    path_check: PathLengthCheck,
    decision: Decision,
}

/// Drives archive creation, verification and source deletion for a scan.
pub struct ArchivePipeline<A, C, F> {
    archiver: A,
    checksum: C,
    filesystem: F,
    config: ArchiveConfig,
    cancel: Arc<AtomicBool>,
}

impl<A, C, F> ArchivePipeline<A, C, F>
where
    A: ArchiverPort + Sync,
    C: ChecksumPort + Sync,
    F: FileSystemPort + Sync,
{
    pub fn new(archiver: A, checksum: C, filesystem: F, config: ArchiveConfig) -> Self {
        Self {
            archiver,
            checksum,
            filesystem,
            config,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Ask about risky pairs up front so processing can run unattended.
    fn plan<D: DecisionPort + ?Sized>(
        &self,
        pairs: &[ArchivePair],
        decisions: &D,
    ) -> Result<Vec<PlannedPair>> {
        let extension = self.archiver.extension();
        let mut planned = Vec::with_capacity(pairs.len());

        for pair in pairs {
            let path_check = pair.path_length_check(extension, self.config.path_limit);
            let mut decision = Decision::Process;

            if pair.has_problematic_chars {
                warn!(
                    "problematic characters in {}: {}",
                    pair.folder_path.display(),
                    pair.problematic_details
                );
                if !decisions.confirm_problematic_chars(pair)? {
                    decision = Decision::Skip(SKIP_PROBLEMATIC);
                }
            }

            if matches!(decision, Decision::Process) && path_check.exceeds() {
                warn!(
                    "path length {} exceeds limit {} by {} for {}",
                    path_check.effective_length,
                    path_check.limit,
                    path_check.excess(),
                    pair.folder_path.display()
                );
                if !decisions.confirm_long_path(pair, &path_check)? {
                    decision = Decision::Skip(SKIP_LONG_PATH);
                }
            }

            planned.push(PlannedPair {
                pair: pair.clone(),
                path_check,
                decision,
            });
        }
        Ok(planned)
    }

    pub fn run<D, P>(&self, report: &ScanReport, decisions: &D, progress: &P) -> Result<BatchReport>
    where
        D: DecisionPort + ?Sized,
        P: ProgressPort + Sync + ?Sized,
    {
        let planned = self.plan(&report.pairs, decisions)?;
        let to_process = planned
            .iter()
            .filter(|p| matches!(p.decision, Decision::Process))
            .count();

        progress.start(to_process as u64);
        let done = AtomicUsize::new(0);
        let handle = |item: &PlannedPair| -> PairOutcome {
            match item.decision {
                Decision::Skip(reason) => self.skipped(item, reason),
                Decision::Process => {
                    let outcome = self.process_pair(&item.pair, item.path_check);
                    let n = done.fetch_add(1, Ordering::SeqCst) + 1;
                    progress.message(&status_line(&outcome));
                    progress.update(n as u64);
                    outcome
                }
            }
        };

        let outcomes: Vec<PairOutcome> = if self.config.jobs <= 1 {
            planned.iter().map(handle).collect()
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.jobs)
                .thread_name(|i| format!("webarc-worker-{i}"))
                .build()
                .context("failed to build worker pool")?;
            pool.install(|| planned.par_iter().map(handle).collect())
        };
        progress.finish();

        let batch = BatchReport::new(outcomes, self.config.dry_run);
        info!(
            "batch finished: {} ok, {} failed, {} skipped, {} cancelled",
            batch.successful, batch.failed, batch.skipped, batch.cancelled
        );
        Ok(batch)
    }

    fn skipped(&self, planned: &PlannedPair, reason: &str) -> PairOutcome {
        info!("skipping {}: {}", planned.pair.html_file.display(), reason);
        PairOutcome {
            archive_path: archive_path_for(&planned.pair, self.archiver.extension()),
            pair: planned.pair.clone(),
            status: PairStatus::Skipped(reason.to_string()),
            creation: None,
            verification: None,
            path_check: planned.path_check,
            source_deleted: false,
            warnings: Vec::new(),
        }
    }

    pub fn process_pair(&self, pair: &ArchivePair, path_check: PathLengthCheck) -> PairOutcome {
        let _span = info_span!("pair", html = %pair.html_file.display()).entered();
        let archive_path = archive_path_for(pair, self.archiver.extension());
        let mut outcome = PairOutcome {
            pair: pair.clone(),
            archive_path: archive_path.clone(),
            status: PairStatus::Cancelled,
            creation: None,
            verification: None,
            path_check,
            source_deleted: false,
            warnings: Vec::new(),
        };

        if self.is_cancelled() {
            return outcome;
        }
        if self.config.dry_run {
            outcome.status = PairStatus::DryRun;
            return outcome;
        }
        if archive_path.exists() {
            outcome.status = PairStatus::ArchiveFailed(format!(
                "archive already exists: {}",
                archive_path.display()
            ));
            return outcome;
        }

        let creation = create_archive(
            &self.archiver,
            &self.filesystem,
            &pair.html_file,
            &pair.folder_path,
            &archive_path,
            self.config.compression_level,
        );
        let created = creation.success;
        let creation_error = creation.error_message.clone();
        outcome.creation = Some(creation);
        if !created {
            discard_archive(&archive_path, &mut outcome.warnings);
            outcome.status = PairStatus::ArchiveFailed(creation_error);
            return outcome;
        }

        let verification = VerifierService::new(&self.archiver, &self.checksum, &self.filesystem)
            .with_cancel_flag(self.cancel_flag())
            .verify(
                &archive_path,
                &pair.html_file,
                &pair.folder_path,
                self.config.skip_crc,
            );
        let passed = verification.passed;
        let cancelled = verification.cancelled;
        let verification_error = verification.error_message.clone();
        outcome.verification = Some(verification);
        if !passed {
            discard_archive(&archive_path, &mut outcome.warnings);
            outcome.status = if cancelled {
                PairStatus::Cancelled
            } else {
                PairStatus::VerificationFailed(verification_error)
            };
            return outcome;
        }

        if self.config.delete_source {
            match delete_sources(pair) {
                Ok(()) => outcome.source_deleted = true,
                Err(err) => {
                    warn!("{:#}", err);
                    outcome
                        .warnings
                        .push(format!("failed to delete source files: {err:#}"));
                }
            }
        }

        outcome.status = PairStatus::Archived;
        outcome
    }
}

/// Remove a verified pair's HTML file and resource folder.
pub fn delete_sources(pair: &ArchivePair) -> Result<()> {
    fs::remove_file(long_path(&pair.html_file))
        .with_context(|| format!("failed to remove {}", pair.html_file.display()))?;
    fs::remove_dir_all(long_path(&pair.folder_path))
        .with_context(|| format!("failed to remove {}", pair.folder_path.display()))?;
    info!("deleted sources for {}", pair.html_file.display());
    Ok(())
}

/// Remove an archive this run wrote but could not vouch for, so a rerun is
/// not blocked by the existing-archive guard.
fn discard_archive(archive_path: &Path, warnings: &mut Vec<String>) {
    let target = long_path(archive_path);
    if !target.exists() {
        return;
    }
    match fs::remove_file(&target) {
        Ok(()) => info!("removed unverified archive {}", archive_path.display()),
        Err(err) => {
            warn!("failed to remove {}: {}", archive_path.display(), err);
            warnings.push(format!(
                "failed to remove unverified archive {}: {err}",
                archive_path.display()
            ));
        }
    }
}

fn status_line(outcome: &PairOutcome) -> String {
    let name = outcome
        .pair
        .html_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match &outcome.status {
        PairStatus::Archived => format!("archived {name}"),
        PairStatus::DryRun => format!("would archive {name}"),
        PairStatus::Skipped(reason) => format!("skipped {name}: {reason}"),
        PairStatus::ArchiveFailed(msg) => format!("FAILED {name}: {msg}"),
        PairStatus::VerificationFailed(msg) => format!("VERIFICATION FAILED {name}: {msg}"),
        PairStatus::Cancelled => format!("cancelled {name}"),
    }
}
