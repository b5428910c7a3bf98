//! Progress reporting using indicatif.
//!
//! Bars are drawn on stderr only when it is a terminal, so piped output and
//! tests stay clean.

use indicatif::{ProgressBar, ProgressStyle};

fn file_progress_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// Progress over a known number of files.
#[derive(Clone)]
pub struct ProgressTracker {
    bar: ProgressBar,
}

impl ProgressTracker {
    /// Create a visible progress tracker with the given total count.
    pub fn new(total: usize, message: &str) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(file_progress_style());
        bar.set_message(message.to_string());
        Self { bar }
    }

    /// Create a hidden progress tracker (for non-TTY output).
    pub fn hidden(total: usize) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_length(total as u64);
        Self { bar }
    }

    /// Visible when stderr is a terminal and `enabled` is set, hidden otherwise.
    pub fn for_terminal(total: usize, message: &str, enabled: bool) -> Self {
        if enabled && is_tty() {
            Self::new(total, message)
        } else {
            Self::hidden(total)
        }
    }

    /// Move the bar to an absolute position.
    pub fn set_position(&self, position: usize) {
        self.bar.set_position(position as u64);
    }

    /// Current position.
    pub fn position(&self) -> usize {
        self.bar.position() as usize
    }

    /// Finish and clear the progress bar.
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

/// Check if stderr is a TTY.
pub fn is_tty() -> bool {
    use std::io::IsTerminal;
    std::io::stderr().is_terminal()
}
