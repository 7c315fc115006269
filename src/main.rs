use clap::Parser;
use console::Term;
use std::path::Path;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};
use webarc::adapters::{
    ConsoleOutputAdapter, Crc32Checksummer, FileSystemAdapter, FixedDecisionAdapter,
    InteractiveDecisionAdapter, JsonOutputAdapter, ProgressBarAdapter, SevenZipArchiver,
};
use webarc::cli::{ArchiveArgs, Cli, Command, CommonArgs, OutputFormat, ScanArgs};
use webarc::logging::init_logging;
use webarc::ports::{DecisionPort, OutputPort};
use webarc::services::{ArchivePipeline, ScannerService};

const EXIT_FAILURE: i32 = 1;
const EXIT_CANCELLED: i32 = 130;

fn main() {
    let args = Cli::parse();
    let guard = match init_logging(args.verbose, args.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error initializing logging: {:#}", e);
            process::exit(EXIT_FAILURE);
        }
    };

    let code = match &args.command {
        Command::Scan(scan) => run_scan(scan),
        Command::Archive(archive) => run_archive(archive),
    }
    .unwrap_or_else(|e| {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        EXIT_FAILURE
    });

    // process::exit skips destructors; flush the file log first.
    drop(guard);
    process::exit(code);
}

fn build_output(common: &CommonArgs) -> Box<dyn OutputPort> {
    match (common.output_format, &common.output_file) {
        (OutputFormat::Text, None) => {
            Box::new(ConsoleOutputAdapter::new().with_summary_only(common.summary_only))
        }
        (OutputFormat::Text, Some(path)) => {
            Box::new(ConsoleOutputAdapter::with_file(path).with_summary_only(common.summary_only))
        }
        (OutputFormat::Json, None) => Box::new(JsonOutputAdapter::with_stdout()),
        (OutputFormat::Json, Some(path)) => Box::new(JsonOutputAdapter::with_file(path)),
    }
}

fn check_root(root: &Path) -> bool {
    if root.is_dir() {
        return true;
    }
    eprintln!("Error: {} is not a directory", root.display());
    false
}

fn run_scan(args: &ScanArgs) -> anyhow::Result<i32> {
    let config = args.common.to_scan_config();
    if !check_root(&config.root) {
        return Ok(EXIT_FAILURE);
    }

    let scanner = ScannerService::new(FileSystemAdapter::new());
    let report = scanner.scan(&config);
    build_output(&args.common).write_scan(&report)?;
    Ok(0)
}

fn run_archive(args: &ArchiveArgs) -> anyhow::Result<i32> {
    let scan_config = args.common.to_scan_config();
    let config = args.to_archive_config();
    if !check_root(&scan_config.root) {
        return Ok(EXIT_FAILURE);
    }

    let archiver = SevenZipArchiver::resolve(config.seven_zip.as_deref());
    if !config.dry_run && !archiver.is_available() {
        eprintln!(
            "Error: 7-Zip not found ({}). Install it, set WEBARC_7Z, or pass --seven-zip.",
            archiver.program().display()
        );
        return Ok(EXIT_FAILURE);
    }
    info!("using archiver {}", archiver.program().display());

    let cancel = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&cancel);
    if let Err(e) = ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
        let _ = Term::stderr().show_cursor();
    }) {
        warn!("could not install Ctrl-C handler: {}", e);
    }

    let scanner = ScannerService::new(FileSystemAdapter::new());
    let report = scanner.scan(&scan_config);
    if !report.has_pairs() {
        println!("No HTML + resource folder pairs found under {}", scan_config.root.display());
        return Ok(0);
    }

    let decisions: Box<dyn DecisionPort> = if args.yes {
        Box::new(FixedDecisionAdapter::accept_all())
    } else if args.no_risky {
        Box::new(FixedDecisionAdapter::reject_all())
    } else if console::user_attended_stderr() {
        Box::new(InteractiveDecisionAdapter::new())
    } else {
        warn!("no terminal attached; risky pairs will be skipped");
        Box::new(FixedDecisionAdapter::reject_all())
    };

    let progress = ProgressBarAdapter::new().with_quiet(args.quiet);
    let pipeline = ArchivePipeline::new(
        archiver,
        Crc32Checksummer::new(),
        FileSystemAdapter::new(),
        config,
    )
    .with_cancel_flag(Arc::clone(&cancel));

    let batch = pipeline.run(&report, decisions.as_ref(), &progress)?;
    build_output(&args.common).write_batch(&batch)?;

    if cancel.load(Ordering::SeqCst) {
        eprintln!("Cancelled: {} pairs were not processed", batch.cancelled);
        return Ok(EXIT_CANCELLED);
    }
    Ok(if batch.has_failures() { EXIT_FAILURE } else { 0 })
}
