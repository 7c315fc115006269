pub mod checksum;
pub mod filesystem;
pub mod output;
pub mod progress;
pub mod prompt;
pub mod sevenzip;

pub use checksum::Crc32Checksummer;
pub use filesystem::FileSystemAdapter;
pub use output::{ConsoleOutputAdapter, JsonOutputAdapter};
pub use progress::ProgressBarAdapter;
pub use prompt::{FixedDecisionAdapter, InteractiveDecisionAdapter};
pub use sevenzip::SevenZipArchiver;
