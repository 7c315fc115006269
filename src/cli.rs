use crate::domain::{ArchiveConfig, DEFAULT_COMPRESSION_LEVEL, DEFAULT_PATH_LIMIT, ScanConfig};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "webarc")]
#[command(about = "Find saved web pages and pack them into verified 7-Zip archives")]
#[command(version)]
pub struct Cli {
    #[arg(
        short = 'v',
        long = "verbose",
        help = "Increase log verbosity (repeatable)",
        action = clap::ArgAction::Count,
        global = true
    )]
    pub verbose: u8,

    #[arg(long = "log-file", help = "Also write logs to this file", global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Report HTML + resource folder pairs and orphans without changing anything
    Scan(ScanArgs),
    /// Archive and verify every pair found under a directory
    Archive(ArchiveArgs),
}

/// Options shared by both subcommands.
#[derive(Args, Debug)]
pub struct CommonArgs {
    #[arg(help = "Directory to scan")]
    pub path: PathBuf,

    #[arg(
        short = 'd',
        long = "max-depth",
        help = "Maximum depth below the root (0 = direct children only)"
    )]
    pub max_depth: Option<usize>,

    #[arg(
        short = 'f',
        long = "format",
        help = "Output format",
        value_enum,
        default_value = "text"
    )]
    pub output_format: OutputFormat,

    #[arg(
        short = 'o',
        long = "output",
        help = "Output file path (stdout if not specified)"
    )]
    pub output_file: Option<PathBuf>,

    #[arg(
        long = "summary-only",
        help = "Show only summary statistics, not per-pair details"
    )]
    pub summary_only: bool,
}

impl CommonArgs {
    pub fn to_scan_config(&self) -> ScanConfig {
        let mut config = ScanConfig::new(self.path.clone());
        if let Some(max_depth) = self.max_depth {
            config = config.with_max_depth(max_depth);
        }
        config
    }
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args, Debug)]
pub struct ArchiveArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[arg(
        long = "delete-source",
        help = "Delete the HTML file and folder after the archive verifies"
    )]
    pub delete_source: bool,

    #[arg(long = "skip-crc", help = "Skip the per-file CRC comparison")]
    pub skip_crc: bool,

    #[arg(
        short = 'n',
        long = "dry-run",
        help = "Show what would be archived without creating anything"
    )]
    pub dry_run: bool,

    #[arg(
        long = "seven-zip",
        help = "Path to the 7-Zip binary (default: WEBARC_7Z, then PATH)"
    )]
    pub seven_zip: Option<PathBuf>,

    #[arg(
        short = 'm',
        long = "compression-level",
        help = "7-Zip compression level",
        default_value_t = DEFAULT_COMPRESSION_LEVEL,
        value_parser = clap::value_parser!(u8).range(0..=9)
    )]
    pub compression_level: u8,

    #[arg(
        short = 'j',
        long = "jobs",
        help = "Number of pairs to archive in parallel",
        default_value = "1"
    )]
    pub jobs: usize,

    #[arg(
        long = "path-limit",
        help = "Path length that triggers a long-path confirmation",
        default_value_t = DEFAULT_PATH_LIMIT
    )]
    pub path_limit: usize,

    #[arg(
        short = 'y',
        long = "yes",
        help = "Archive risky pairs without asking",
        conflicts_with = "no_risky"
    )]
    pub yes: bool,

    #[arg(
        long = "no-risky",
        help = "Skip risky pairs without asking"
    )]
    pub no_risky: bool,

    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress progress output"
    )]
    pub quiet: bool,
}

impl ArchiveArgs {
    pub fn to_archive_config(&self) -> ArchiveConfig {
        let mut config = ArchiveConfig::new()
            .with_compression_level(self.compression_level)
            .with_skip_crc(self.skip_crc)
            .with_delete_source(self.delete_source)
            .with_dry_run(self.dry_run)
            .with_jobs(self.jobs)
            .with_path_limit(self.path_limit);

        if let Some(ref seven_zip) = self.seven_zip {
            config = config.with_seven_zip(seven_zip.clone());
        }
        config
    }
}
