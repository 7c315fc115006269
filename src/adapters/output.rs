use crate::domain::{BatchReport, PairStatus, ScanReport, VerificationCheck};
use crate::ports::OutputPort;
use anyhow::{Context, Result};
use console::style;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

struct OutputWriter {
    output_file: Option<PathBuf>,
}

impl OutputWriter {
    fn new() -> Self {
        Self { output_file: None }
    }

    fn with_file(path: &Path) -> Self {
        Self {
            output_file: Some(path.to_path_buf()),
        }
    }

    fn write_content(&self, content: &str) -> Result<()> {
        match &self.output_file {
            Some(path) => {
                let plain = console::strip_ansi_codes(content);
                fs::write(path, plain.as_bytes())
                    .with_context(|| format!("failed to write {}", path.display()))?;
            }
            None => {
                print!("{}", content);
            }
        }
        Ok(())
    }
}

/// Human-readable byte count, binary units.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit])
    }
}

fn mark(ok: bool) -> String {
    if ok {
        style("✓").green().to_string()
    } else {
        style("✗").red().to_string()
    }
}

pub struct ConsoleOutputAdapter {
    summary_only: bool,
    writer: OutputWriter,
}

impl ConsoleOutputAdapter {
    pub fn new() -> Self {
        Self {
            summary_only: false,
            writer: OutputWriter::new(),
        }
    }

    pub fn with_file(path: &Path) -> Self {
        Self {
            summary_only: false,
            writer: OutputWriter::with_file(path),
        }
    }

    pub fn with_summary_only(mut self, summary_only: bool) -> Self {
        self.summary_only = summary_only;
        self
    }

    pub fn render_scan(&self, report: &ScanReport) -> String {
        let mut out = String::new();
        let stats = &report.stats;
        let _ = writeln!(out, "\n{}", style("=== Web Archive Scan Results ===").bold());
        let _ = writeln!(out, "Scan root: {}", report.scan_root.display());
        if let Some(depth) = report.max_depth {
            let _ = writeln!(out, "Max depth: {}", depth);
        }
        let _ = writeln!(out, "HTML files scanned: {}", stats.files_scanned);
        let _ = writeln!(out, "Resource folders seen: {}", stats.directories_scanned);
        let _ = writeln!(out, "Pairs found: {}", stats.pairs_found);
        let _ = writeln!(out, "Orphaned HTML files: {}", stats.orphaned_html_count);
        let _ = writeln!(out, "Orphaned folders: {}", stats.orphaned_folder_count);
        let _ = writeln!(out, "Total size of pairs: {}", format_size(stats.total_size_bytes));

        if !report.has_pairs() && !report.has_orphans() {
            let _ = writeln!(out, "\nNo saved web pages found.");
            return out;
        }
        if self.summary_only {
            return out;
        }

        if report.has_pairs() {
            let _ = writeln!(out, "\n{}", style("=== Pairs ===").bold());
            for (i, pair) in report.pairs.iter().enumerate() {
                let _ = writeln!(out, "\n[{}] {}", i + 1, pair.html_file.display());
                let _ = writeln!(
                    out,
                    "    folder: {} ({})",
                    pair.folder_name(),
                    pair.pattern_type.as_str()
                );
                let _ = writeln!(
                    out,
                    "    {} files, {} total, longest path {} chars",
                    pair.file_count,
                    format_size(pair.total_size()),
                    pair.max_path_length
                );
                if pair.has_problematic_chars {
                    let _ = writeln!(
                        out,
                        "    {} {}",
                        style("problematic characters:").yellow(),
                        pair.problematic_details
                    );
                }
            }
        }

        if report.has_orphans() {
            let _ = writeln!(out, "\n{}", style("=== Orphans ===").bold());
            for orphan in &report.orphans {
                let kind = if orphan.is_html { "html" } else { "folder" };
                let _ = writeln!(
                    out,
                    "  [{}] {} ({}): {}",
                    kind,
                    orphan.path.display(),
                    format_size(orphan.size),
                    orphan.reason
                );
            }
        }
        out
    }

    pub fn render_batch(&self, report: &BatchReport) -> String {
        let mut out = String::new();
        let title = if report.dry_run {
            "=== Archive Results (dry run) ==="
        } else {
            "=== Archive Results ==="
        };
        let _ = writeln!(out, "\n{}", style(title).bold());

        if !self.summary_only {
            for (i, outcome) in report.outcomes.iter().enumerate() {
                let head = format!("[{}/{}] {}", i + 1, report.total, outcome.pair.html_file.display());
                let status = match &outcome.status {
                    PairStatus::Archived => style("archived".to_string()).green(),
                    PairStatus::DryRun => style("would archive".to_string()).cyan(),
                    PairStatus::Skipped(reason) => style(format!("skipped ({reason})")).yellow(),
                    PairStatus::ArchiveFailed(msg) => style(format!("FAILED: {msg}")).red(),
                    PairStatus::VerificationFailed(msg) => {
                        style(format!("VERIFICATION FAILED: {msg}")).red()
                    }
                    PairStatus::Cancelled => style("cancelled".to_string()).dim(),
                };
                let _ = writeln!(out, "\n{} {}", head, status);
                let _ = writeln!(out, "    -> {}", outcome.archive_path.display());

                if let Some(creation) = &outcome.creation {
                    if creation.success {
                        let _ = writeln!(
                            out,
                            "    {} -> {} ({:.1}% saved)",
                            format_size(creation.original_size_bytes),
                            format_size(creation.compressed_size_bytes),
                            creation.compression_ratio()
                        );
                    }
                }
                if let Some(verification) = &outcome.verification {
                    for check in [
                        VerificationCheck::Integrity,
                        VerificationCheck::FileCount,
                        VerificationCheck::Crc,
                    ] {
                        if let Some(ok) = verification.check_status(check) {
                            let _ = writeln!(out, "    {} {}", mark(ok), check.label());
                        }
                    }
                }
                if outcome.source_deleted {
                    let _ = writeln!(out, "    sources deleted");
                }
                for warning in &outcome.warnings {
                    let _ = writeln!(out, "    {} {}", style("warning:").yellow(), warning);
                }
            }
        }

        let _ = writeln!(out, "\n{}", style("=== Summary ===").bold());
        let _ = writeln!(out, "Total pairs: {}", report.total);
        let _ = writeln!(out, "Successful: {}", report.successful);
        let _ = writeln!(out, "Failed: {}", report.failed);
        let _ = writeln!(out, "Skipped: {}", report.skipped);
        if report.cancelled > 0 {
            let _ = writeln!(out, "Cancelled: {}", report.cancelled);
        }

        let long: Vec<_> = report
            .outcomes
            .iter()
            .filter(|o| o.path_check.exceeds())
            .collect();
        if !long.is_empty() {
            let _ = writeln!(out, "\n{}", style("Long paths:").yellow());
            for o in long {
                let _ = writeln!(
                    out,
                    "  {} ({} chars, limit {}, over by {})",
                    o.pair.folder_path.display(),
                    o.path_check.effective_length,
                    o.path_check.limit,
                    o.path_check.excess()
                );
            }
        }

        let risky: Vec<_> = report
            .outcomes
            .iter()
            .filter(|o| o.pair.has_problematic_chars)
            .collect();
        if !risky.is_empty() {
            let _ = writeln!(out, "\n{}", style("Problematic characters:").yellow());
            for o in risky {
                let _ = writeln!(out, "  {}: {}", o.pair.html_file.display(), o.pair.problematic_details);
            }
        }
        out
    }
}

impl Default for ConsoleOutputAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputPort for ConsoleOutputAdapter {
    fn write_scan(&self, report: &ScanReport) -> Result<()> {
        self.writer.write_content(&self.render_scan(report))
    }

    fn write_batch(&self, report: &BatchReport) -> Result<()> {
        self.writer.write_content(&self.render_batch(report))
    }
}

pub struct JsonOutputAdapter {
    writer: OutputWriter,
}

impl JsonOutputAdapter {
    pub fn with_file(path: &Path) -> Self {
        Self {
            writer: OutputWriter::with_file(path),
        }
    }

    pub fn with_stdout() -> Self {
        Self {
            writer: OutputWriter::new(),
        }
    }
}

impl OutputPort for JsonOutputAdapter {
    fn write_scan(&self, report: &ScanReport) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        self.writer.write_content(&format!("{}\n", json))
    }

    fn write_batch(&self, report: &BatchReport) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        self.writer.write_content(&format!("{}\n", json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArchivePair, PairOutcome, PathLengthCheck, PatternType, VerificationOutcome};
    use tempfile::tempdir;

    fn pair() -> ArchivePair {
        ArchivePair {
            html_file: PathBuf::from("/saved/page.html"),
            folder_path: PathBuf::from("/saved/page_files"),
            pattern_type: PatternType::ChromeFiles,
            html_size: 10,
            folder_size: 20,
            file_count: 2,
            max_path_length: 30,
            has_problematic_chars: false,
            problematic_details: String::new(),
        }
    }

    fn outcome(status: PairStatus) -> PairOutcome {
        PairOutcome {
            pair: pair(),
            archive_path: PathBuf::from("/saved/page_web_archive.7z"),
            status,
            creation: None,
            verification: None,
            path_check: PathLengthCheck {
                max_path_length: 30,
                suffix_length: 15,
                effective_length: 45,
                limit: 260,
            },
            source_deleted: false,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn format_size_uses_binary_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
    }

    #[test]
    fn batch_rendering_lists_only_checks_that_ran() {
        let mut failed = outcome(PairStatus::VerificationFailed("file count mismatch".into()));
        failed.verification = Some(VerificationOutcome {
            integrity_ok: true,
            checks_run: vec![VerificationCheck::Integrity, VerificationCheck::FileCount],
            ..Default::default()
        });
        let report = BatchReport::new(vec![failed, outcome(PairStatus::Archived)], false);
        let text = console::strip_ansi_codes(&ConsoleOutputAdapter::new().render_batch(&report))
            .into_owned();

        assert!(text.contains("Integrity test"));
        assert!(text.contains("File count"));
        assert!(!text.contains("CRC check"));
        assert!(text.contains("Successful: 1"));
        assert!(text.contains("Failed: 1"));
    }

    #[test]
    fn summary_only_omits_pair_lines() {
        let report = BatchReport::new(vec![outcome(PairStatus::DryRun)], true);
        let text = ConsoleOutputAdapter::new()
            .with_summary_only(true)
            .render_batch(&report);
        assert!(!text.contains("page_web_archive.7z"));
        assert!(text.contains("dry run"));
    }

    #[test]
    fn json_file_output_is_parseable() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("report.json");
        let report = BatchReport::new(vec![outcome(PairStatus::Skipped("declined".into()))], false);
        JsonOutputAdapter::with_file(&path).write_batch(&report).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["skipped"], 1);
        assert_eq!(value["outcomes"][0]["status"]["status"], "skipped");
    }
}
