#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use webarc::adapters::FileSystemAdapter;
use webarc::domain::{ArchiveEntry, ArchiveListing};
use webarc::error::ArchiverError;
use webarc::ports::{ArchiverPort, FileSystemPort};

pub fn write_bytes(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// `<root>/<stem>.html` plus `<root>/<stem>_files/` holding `files`.
pub fn saved_page(root: &Path, stem: &str, files: &[(&str, &[u8])]) {
    write_bytes(&root.join(format!("{stem}.html")), b"<html><body>saved</body></html>");
    let folder = root.join(format!("{stem}_files"));
    fs::create_dir_all(&folder).unwrap();
    for (name, content) in files {
        write_bytes(&folder.join(name), content);
    }
}

/// Stands in for 7-Zip. The "archive" is a JSON manifest of the entries a
/// real archiver would store, with CRCs taken from the source bytes.
#[derive(Debug, Default, Clone)]
pub struct FakeArchiver {
    /// Store names with curly apostrophes folded, like some archivers do.
    pub fold_quotes: bool,
    pub fail_create: bool,
    /// With `fail_create`, leave a truncated archive behind before failing.
    pub write_partial: bool,
    /// Store wrong CRCs for the resource files.
    pub corrupt_crc: bool,
    pub fail_test: bool,
    /// Raised while listing, as if the user hit Ctrl-C mid-verification.
    pub cancel_on_list: Option<Arc<AtomicBool>>,
    /// Leave the last entry out of listings.
    pub drop_entry_on_list: bool,
}

impl FakeArchiver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_manifest(archive: &Path) -> Vec<ArchiveEntry> {
        serde_json::from_str(&fs::read_to_string(archive).unwrap()).unwrap()
    }

    pub fn write_manifest(archive: &Path, entries: &[ArchiveEntry]) {
        fs::write(archive, serde_json::to_string(entries).unwrap()).unwrap();
    }

    fn stored_name(&self, name: String) -> String {
        if self.fold_quotes {
            name.replace('\u{2019}', "'")
        } else {
            name
        }
    }
}

impl ArchiverPort for FakeArchiver {
    fn extension(&self) -> &str {
        "7z"
    }

    fn create(
        &self,
        html_file: &Path,
        folder: &Path,
        output: &Path,
        _compression_level: u8,
    ) -> Result<(), ArchiverError> {
        if self.fail_create {
            if self.write_partial {
                fs::write(output, b"7z\xBC\xAF\x27\x1C")?;
            }
            return Err(ArchiverError::ToolFailed {
                status: "exit status: 2".into(),
                stderr: "simulated failure".into(),
            });
        }

        let html_bytes = fs::read(html_file)?;
        let mut entries = vec![ArchiveEntry {
            path: self.stored_name(html_file.file_name().unwrap().to_string_lossy().into_owned()),
            is_dir: false,
            size: Some(html_bytes.len() as u64),
            crc: Some(crc32fast::hash(&html_bytes)),
        }];

        let folder_name = folder.file_name().unwrap().to_string_lossy().into_owned();
        entries.push(ArchiveEntry {
            path: self.stored_name(folder_name.clone()),
            is_dir: true,
            size: None,
            crc: None,
        });
        let crc_mask = if self.corrupt_crc { 0xFF } else { 0 };
        for file in FileSystemAdapter::new().tree_files(folder) {
            let bytes = fs::read(&file.path)?;
            let relative = file.path.strip_prefix(folder).unwrap();
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            entries.push(ArchiveEntry {
                path: self.stored_name(format!("{folder_name}/{key}")),
                is_dir: false,
                size: Some(bytes.len() as u64),
                crc: Some(crc32fast::hash(&bytes) ^ crc_mask),
            });
        }

        Self::write_manifest(output, &entries);
        Ok(())
    }

    fn test(&self, archive: &Path) -> Result<bool, ArchiverError> {
        Ok(!self.fail_test && archive.is_file())
    }

    fn list(&self, archive: &Path) -> Result<ArchiveListing, ArchiverError> {
        let raw = fs::read_to_string(archive)?;
        let mut entries: Vec<ArchiveEntry> = serde_json::from_str(&raw)
            .map_err(|e| ArchiverError::UnreadableListing(e.to_string()))?;
        if let Some(flag) = &self.cancel_on_list {
            flag.store(true, Ordering::SeqCst);
        }
        if self.drop_entry_on_list {
            entries.pop();
        }
        Ok(ArchiveListing {
            entries,
            summary: None,
        })
    }
}
