use crate::domain::{ArchivePair, PathLengthCheck};
use crate::ports::DecisionPort;
use anyhow::Result;
use console::{Term, style};
use dialoguer::{Confirm, theme::ColorfulTheme};

/// Asks on the terminal before archiving a risky pair.
pub struct InteractiveDecisionAdapter {
    term: Term,
}

impl InteractiveDecisionAdapter {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }

    fn ensure_cursor_visible(&self) {
        let _ = self.term.show_cursor();
    }

    fn ask(&self, prompt: &str) -> Result<bool> {
        let answer = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact_on(&self.term);
        self.ensure_cursor_visible();
        Ok(answer?)
    }
}

impl Default for InteractiveDecisionAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionPort for InteractiveDecisionAdapter {
    fn confirm_problematic_chars(&self, pair: &ArchivePair) -> Result<bool> {
        let _ = self.term.write_line(&format!(
            "\n{} {}",
            style("Problematic characters:").yellow().bold(),
            pair.html_file.display()
        ));
        let _ = self.term.write_line(&format!("  {}", pair.problematic_details));
        let _ = self.term.write_line(
            "  The archiver may store these names differently, which can fail verification.",
        );
        self.ask("Archive this pair anyway?")
    }

    fn confirm_long_path(&self, pair: &ArchivePair, check: &PathLengthCheck) -> Result<bool> {
        let _ = self.term.write_line(&format!(
            "\n{} {}",
            style("Long path:").yellow().bold(),
            pair.folder_path.display()
        ));
        let _ = self.term.write_line(&format!(
            "  longest path {} + {} suffix = {} chars, limit {} (over by {})",
            check.max_path_length,
            check.suffix_length,
            check.effective_length,
            check.limit,
            check.excess()
        ));
        self.ask("Archive this pair anyway?")
    }
}

/// Answers every question the same way. Used for `--yes`, `--no-risky` and
/// unattended runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedDecisionAdapter {
    accept: bool,
}

impl FixedDecisionAdapter {
    pub fn accept_all() -> Self {
        Self { accept: true }
    }

    pub fn reject_all() -> Self {
        Self { accept: false }
    }
}

impl DecisionPort for FixedDecisionAdapter {
    fn confirm_problematic_chars(&self, _pair: &ArchivePair) -> Result<bool> {
        Ok(self.accept)
    }

    fn confirm_long_path(&self, _pair: &ArchivePair, _check: &PathLengthCheck) -> Result<bool> {
        Ok(self.accept)
    }
}
