pub mod archiver;
pub mod pattern_matcher;
pub mod pipeline;
pub mod scanner;
pub mod verifier;

pub use archiver::{archive_path_for, create_archive, sanitize_name};
pub use pattern_matcher::PatternMatcher;
pub use pipeline::ArchivePipeline;
pub use scanner::ScannerService;
pub use verifier::VerifierService;
