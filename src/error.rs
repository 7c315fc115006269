use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiverError {
    #[error("archiver binary not found: {tool}")]
    ToolMissing { tool: String },

    #[error("archiver exited with {status}: {stderr}")]
    ToolFailed { status: String, stderr: String },

    #[error("failed to run archiver: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("compression level must be 0-9, got {0}")]
    InvalidCompressionLevel(u8),

    #[error("unreadable archive listing: {0}")]
    UnreadableListing(String),
}

#[derive(Debug, Error)]
pub enum ChecksumError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("checksum pass cancelled")]
    Cancelled,
}
