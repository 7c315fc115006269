use crate::error::ChecksumError;
use crate::platform::long_path;
use crate::ports::ChecksumPort;
use crc32fast::Hasher;
use ignore::WalkBuilder;
use memmap2::MmapOptions;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

pub const CHUNK_SIZE: usize = 1024 * 1024;

/// CRC-32 (ISO 3309 / zlib polynomial) over files and directory trees.
pub struct Crc32Checksummer {
    mmap_threshold: u64,
}

impl Crc32Checksummer {
    pub fn new() -> Self {
        Self {
            mmap_threshold: 256 * 1024 * 1024,
        }
    }

    pub fn with_mmap_threshold(mut self, threshold: u64) -> Self {
        self.mmap_threshold = threshold;
        self
    }

    fn io_error(path: &Path, source: std::io::Error) -> ChecksumError {
        ChecksumError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn checksum_with_mmap(&self, path: &Path, file: &File) -> Result<u32, ChecksumError> {
        let mmap = unsafe { MmapOptions::new().map(file) }.map_err(|e| Self::io_error(path, e))?;
        let mut hasher = Hasher::new();
        for chunk in mmap.chunks(CHUNK_SIZE) {
            hasher.update(chunk);
        }
        Ok(hasher.finalize())
    }

    fn checksum_buffered(&self, path: &Path, file: File) -> Result<u32, ChecksumError> {
        let mut reader = BufReader::with_capacity(CHUNK_SIZE, file);
        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut hasher = Hasher::new();
        loop {
            let read = reader.read(&mut buffer).map_err(|e| Self::io_error(path, e))?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }
        Ok(hasher.finalize())
    }
}

impl Default for Crc32Checksummer {
    fn default() -> Self {
        Self::new()
    }
}

impl ChecksumPort for Crc32Checksummer {
    fn checksum_file(&self, path: &Path) -> Result<u32, ChecksumError> {
        let target = long_path(path);
        let file = File::open(&target).map_err(|e| Self::io_error(path, e))?;
        let size = file.metadata().map_err(|e| Self::io_error(path, e))?.len();

        if size > 0 && size >= self.mmap_threshold {
            self.checksum_with_mmap(path, &file)
        } else {
            self.checksum_buffered(path, file)
        }
    }

    fn checksum_tree(
        &self,
        root: &Path,
        cancel: Option<&AtomicBool>,
    ) -> Result<BTreeMap<PathBuf, u32>, ChecksumError> {
        let long_root = long_path(root);
        let mut sums = BTreeMap::new();

        let walker = WalkBuilder::new(&long_root)
            .standard_filters(false)
            .follow_links(false)
            .build();

        for entry in walker {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                return Err(ChecksumError::Cancelled);
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("skipping unreadable entry under {}: {}", root.display(), err);
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&long_root) else {
                continue;
            };

            match self.checksum_file(entry.path()) {
                Ok(crc) => {
                    sums.insert(relative.to_path_buf(), crc);
                }
                Err(err) => warn!("skipping file in checksum pass: {}", err),
            }
        }

        debug!("checksummed {} files under {}", sums.len(), root.display());
        Ok(sums)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn matches_known_crc32_vector() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("check.txt");
        fs::write(&path, "123456789").unwrap();
        assert_eq!(Crc32Checksummer::new().checksum_file(&path).unwrap(), 0xCBF4_3926);
    }

    #[test]
    fn mmap_and_buffered_paths_agree() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("data.bin");
        let data: Vec<u8> = (0..(3 * CHUNK_SIZE + 17)).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &data).unwrap();

        let buffered = Crc32Checksummer::new().checksum_file(&path).unwrap();
        let mapped = Crc32Checksummer::new()
            .with_mmap_threshold(1)
            .checksum_file(&path)
            .unwrap();
        assert_eq!(buffered, mapped);
        assert_eq!(buffered, crc32fast::hash(&data));
    }

    #[test]
    fn empty_file_checksums_to_zero() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("empty");
        fs::write(&path, "").unwrap();
        assert_eq!(Crc32Checksummer::new().checksum_file(&path).unwrap(), 0);
    }

    #[test]
    fn missing_file_is_an_error() {
        let tmp = tempdir().unwrap();
        let err = Crc32Checksummer::new()
            .checksum_file(&tmp.path().join("missing"))
            .unwrap_err();
        assert!(matches!(err, ChecksumError::Io { .. }));
    }

    #[test]
    fn tree_pass_stops_when_cancelled() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("a.css"), "a").unwrap();
        let cancel = AtomicBool::new(true);
        let result = Crc32Checksummer::new().checksum_tree(tmp.path(), Some(&cancel));
        assert!(matches!(result, Err(ChecksumError::Cancelled)));
    }
}
