use crate::domain::{ArchiveEntry, ArchiveListing};
use crate::error::ArchiverError;
use crate::ports::ArchiverPort;
use std::env;
use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{debug, info, warn};

pub const SEVEN_ZIP_ENV: &str = "WEBARC_7Z";
const DEFAULT_BINARIES: [&str; 3] = ["7z", "7zz", "7za"];
const INTEGRITY_OK_MARKER: &str = "Everything is Ok";

/// Archiver adapter that shells out to a 7-Zip compatible binary.
pub struct SevenZipArchiver {
    program: PathBuf,
}

impl SevenZipArchiver {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Resolve the binary from an explicit setting, `WEBARC_7Z`, or `PATH`.
    ///
    /// An unresolvable binary is kept as-is; every call then reports
    /// [`ArchiverError::ToolMissing`].
    pub fn resolve(configured: Option<&Path>) -> Self {
        let from_env = env::var(SEVEN_ZIP_ENV)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        if let Some(requested) = configured.map(Path::to_path_buf).or(from_env) {
            if requested.is_file() {
                return Self::new(requested);
            }
            return match which::which(&requested) {
                Ok(found) => Self::new(found),
                Err(_) => {
                    warn!("7-Zip binary {} not found", requested.display());
                    Self::new(requested)
                }
            };
        }

        for name in DEFAULT_BINARIES {
            if let Ok(found) = which::which(name) {
                debug!("using 7-Zip binary {}", found.display());
                return Self::new(found);
            }
        }

        #[cfg(windows)]
        {
            let installed = PathBuf::from(r"C:\Program Files\7-Zip\7z.exe");
            if installed.is_file() {
                return Self::new(installed);
            }
        }

        Self::new(DEFAULT_BINARIES[0])
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn is_available(&self) -> bool {
        self.program.is_file() || which::which(&self.program).is_ok()
    }

    fn run(&self, args: &[&OsStr]) -> Result<Output, ArchiverError> {
        debug!("running {} {:?}", self.program.display(), args);
        let output = Command::new(&self.program).args(args).output().map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                ArchiverError::ToolMissing {
                    tool: self.program.display().to_string(),
                }
            } else {
                ArchiverError::Spawn(err)
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let stderr = if stderr.is_empty() {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            } else {
                stderr
            };
            return Err(ArchiverError::ToolFailed {
                status: output.status.to_string(),
                stderr,
            });
        }
        Ok(output)
    }
}

impl ArchiverPort for SevenZipArchiver {
    fn extension(&self) -> &str {
        "7z"
    }

    fn create(
        &self,
        html_file: &Path,
        folder: &Path,
        output: &Path,
        compression_level: u8,
    ) -> Result<(), ArchiverError> {
        if compression_level > 9 {
            return Err(ArchiverError::InvalidCompressionLevel(compression_level));
        }
        let level = format!("-mx={compression_level}");
        info!("creating archive {}", output.display());
        self.run(&[
            OsStr::new("a"),
            OsStr::new(&level),
            OsStr::new("-y"),
            output.as_os_str(),
            html_file.as_os_str(),
            folder.as_os_str(),
        ])?;
        Ok(())
    }

    fn test(&self, archive: &Path) -> Result<bool, ArchiverError> {
        let output = self.run(&[OsStr::new("t"), OsStr::new("-sccUTF-8"), archive.as_os_str()])?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let ok = stdout.contains(INTEGRITY_OK_MARKER);
        if !ok {
            warn!("integrity test of {} gave an unclear result", archive.display());
        }
        Ok(ok)
    }

    fn list(&self, archive: &Path) -> Result<ArchiveListing, ArchiverError> {
        let output = self.run(&[
            OsStr::new("l"),
            OsStr::new("-slt"),
            OsStr::new("-sccUTF-8"),
            archive.as_os_str(),
        ])?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let listing = parse_listing(&stdout);
        if listing.entries.is_empty() && listing.summary.is_none() {
            return Err(ArchiverError::UnreadableListing(format!(
                "no entries found in listing of {}",
                archive.display()
            )));
        }
        Ok(listing)
    }
}

/// Parse `7z l -slt` output.
///
/// The archive's own properties come before the `----------` separator; each
/// entry after it is a block of `Key = Value` lines ended by a blank line.
pub fn parse_listing(output: &str) -> ArchiveListing {
    let mut listing = ArchiveListing::default();
    let mut in_entries = false;
    let mut current: Option<ArchiveEntry> = None;

    for raw in output.lines() {
        let line = raw.trim_end_matches('\r');

        if let Some(summary) = parse_summary(line) {
            listing.summary = Some(summary);
            continue;
        }
        if !in_entries {
            in_entries = line.trim() == "----------";
            continue;
        }
        if line.trim().is_empty() {
            if let Some(entry) = current.take() {
                listing.entries.push(finish_entry(entry));
            }
            continue;
        }

        if let Some(path) = line.strip_prefix("Path = ") {
            if let Some(entry) = current.take() {
                listing.entries.push(finish_entry(entry));
            }
            current = Some(ArchiveEntry {
                path: path.to_string(),
                is_dir: false,
                size: None,
                crc: None,
            });
            continue;
        }

        let Some(entry) = current.as_mut() else {
            continue;
        };
        if line.starts_with("Folder = +") {
            entry.is_dir = true;
        } else if let Some(attrs) = line.strip_prefix("Attributes = ") {
            if attrs.trim_start().starts_with('D') {
                entry.is_dir = true;
            }
        } else if let Some(size) = line.strip_prefix("Size = ") {
            entry.size = size.trim().parse().ok();
        } else if let Some(crc) = line.strip_prefix("CRC = ") {
            let crc = crc.trim();
            if !crc.is_empty() {
                match u32::from_str_radix(crc, 16) {
                    Ok(value) => entry.crc = Some(value),
                    Err(_) => warn!("invalid CRC value in listing: {}", crc),
                }
            }
        }
    }

    if let Some(entry) = current.take() {
        listing.entries.push(finish_entry(entry));
    }
    listing
}

// 7-Zip stores no CRC for empty files.
fn finish_entry(mut entry: ArchiveEntry) -> ArchiveEntry {
    if entry.is_dir {
        entry.crc = None;
    } else if entry.crc.is_none() && entry.size == Some(0) {
        entry.crc = Some(0);
    }
    entry
}

/// Parse a summary line such as `5 files, 1 folders` (possibly preceded by
/// date and size columns).
pub fn parse_summary(line: &str) -> Option<(usize, usize)> {
    if line.contains('=') {
        return None;
    }
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let mut files = None;
    let mut folders = None;

    for pair in tokens.windows(2) {
        let Ok(count) = pair[0].parse::<usize>() else {
            continue;
        };
        match pair[1].trim_end_matches(',') {
            "files" | "file" => files = Some(count),
            "folders" | "folder" => folders = Some(count),
            _ => {}
        }
    }

    files.map(|f| (f, folders.unwrap_or(0)))
}
