use crate::ports::ProgressPort;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;

pub struct ProgressBarAdapter {
    bar: Arc<ProgressBar>,
    quiet: bool,
}

impl ProgressBarAdapter {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        match ProgressStyle::default_bar().template(
            "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>4}/{len:4} {percent:>3}% {msg} (ETA: {eta})",
        ) {
            Ok(progress_style) => bar.set_style(progress_style.progress_chars("█▉▊▋▌▍▎▏ ")),
            Err(_) => bar.set_style(ProgressStyle::default_bar()),
        }
        Self {
            bar: Arc::new(bar),
            quiet: false,
        }
    }

    pub fn new_quiet() -> Self {
        Self {
            bar: Arc::new(ProgressBar::hidden()),
            quiet: true,
        }
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        if quiet {
            self.bar = Arc::new(ProgressBar::hidden());
        }
        self
    }
}

impl Default for ProgressBarAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressPort for ProgressBarAdapter {
    fn start(&self, total: u64) {
        if self.quiet {
            return;
        }

        self.bar.set_length(total);
        self.bar.set_message("Archiving pairs...");
        self.bar.enable_steady_tick(std::time::Duration::from_millis(100));
    }

    fn update(&self, processed: u64) {
        if self.quiet {
            return;
        }

        self.bar.set_position(processed);
        if Some(processed) == self.bar.length() {
            self.bar.set_message("Finishing...");
        } else {
            self.bar.set_message("Archiving and verifying...");
        }
    }

    fn message(&self, line: &str) {
        if self.quiet {
            return;
        }
        self.bar.println(line);
    }

    fn finish(&self) {
        if self.quiet {
            return;
        }

        self.bar.disable_steady_tick();
        self.bar.finish_with_message("✓ Done");
    }
}
