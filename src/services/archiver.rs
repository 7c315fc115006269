use crate::domain::{ARCHIVE_SUFFIX, ArchiveOutcome, ArchivePair};
use crate::ports::{ArchiverPort, FileSystemPort};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

const INVALID_NAME_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Make a base name safe to use as an archive file name on any platform.
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_replaced = false;
    for ch in name.chars() {
        if ch.is_control() || INVALID_NAME_CHARS.contains(&ch) {
            if !prev_replaced {
                out.push('_');
            }
            prev_replaced = true;
        } else {
            out.push(ch);
            prev_replaced = false;
        }
    }
    let trimmed = out.trim_end_matches(['.', ' ']).trim_start();
    if trimmed.is_empty() {
        "page".to_string()
    } else {
        trimmed.to_string()
    }
}

/// `<dir of html>/<sanitized base name>_web_archive.<extension>`
pub fn archive_path_for(pair: &ArchivePair, extension: &str) -> PathBuf {
    let name = format!("{}{}.{}", sanitize_name(&pair.base_name()), ARCHIVE_SUFFIX, extension);
    match pair.html_file.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

/// Archive `html_file` and `folder` into `output`. Never fails: tool errors
/// come back as an unsuccessful [`ArchiveOutcome`].
pub fn create_archive<A, F>(
    archiver: &A,
    filesystem: &F,
    html_file: &Path,
    folder: &Path,
    output: &Path,
    compression_level: u8,
) -> ArchiveOutcome
where
    A: ArchiverPort + ?Sized,
    F: FileSystemPort + ?Sized,
{
    let html_size = fs::metadata(html_file).map(|m| m.len()).unwrap_or(0);
    let folder_size: u64 = filesystem
        .tree_files(folder)
        .iter()
        .filter_map(|f| f.size)
        .sum();
    let original_size_bytes = html_size + folder_size;

    match archiver.create(html_file, folder, output, compression_level) {
        Ok(()) => {
            let compressed_size_bytes = fs::metadata(output).map(|m| m.len()).unwrap_or(0);
            info!(
                "archive created: {} ({} bytes)",
                output.display(),
                compressed_size_bytes
            );
            ArchiveOutcome {
                archive_path: output.to_path_buf(),
                success: true,
                error_message: String::new(),
                original_size_bytes,
                compressed_size_bytes,
            }
        }
        Err(err) => {
            error!("archive creation failed for {}: {}", output.display(), err);
            ArchiveOutcome {
                archive_path: output.to_path_buf(),
                success: false,
                error_message: err.to_string(),
                original_size_bytes,
                compressed_size_bytes: 0,
            }
        }
    }
}
