// src/commands/progress.rs

//! Terminal progress bar for package extraction

use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal};
use std::time::Duration;

use opam2buck::progress::{LogProgress, ProgressTracker, SilentProgress};

/// Progress bar on stderr
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new(total: u64, operation: &str) -> Self {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{prefix} ({pos}/{len}) [{bar:40.green/dim}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );
        bar.set_prefix(operation.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }
}

impl ProgressTracker for BarProgress {
    fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    fn increment(&self, amount: u64) {
        self.bar.inc(amount);
    }

    fn finish_with_message(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

/// How extraction progress is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    /// A progress bar when stderr is a terminal, log lines otherwise
    Auto,
    Quiet,
}

/// Pick a tracker for `total` packages
pub fn tracker(mode: ProgressMode, total: u64) -> Box<dyn ProgressTracker> {
    match mode {
        ProgressMode::Quiet => Box::new(SilentProgress::new()),
        ProgressMode::Auto if io::stderr().is_terminal() => {
            Box::new(BarProgress::new(total, "Extracting"))
        }
        ProgressMode::Auto => Box::new(LogProgress::new("Extracting", total)),
    }
}
