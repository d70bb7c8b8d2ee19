// src/progress.rs

//! Progress tracking for package extraction
//!
//! Extraction issues several subprocess round-trips per package and can take
//! minutes on a large switch. The extractor reports through the
//! `ProgressTracker` trait; implementations include:
//! - `LogProgress`: logs percentages to tracing
//! - `SilentProgress`: no-op for quiet mode and tests
//! - `commands::progress::BarProgress`: an indicatif progress bar

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Core trait for progress tracking
///
/// Implementations must be thread-safe: packages may be extracted in
/// parallel.
pub trait ProgressTracker: Send + Sync {
    /// Set the current status message
    fn set_message(&self, message: &str);

    /// Increment progress by the given amount
    fn increment(&self, amount: u64);

    /// Finish progress with a message
    fn finish_with_message(&self, message: &str);
}

/// Silent progress tracker (no-op)
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl SilentProgress {
    pub fn new() -> Self {
        Self
    }
}

impl ProgressTracker for SilentProgress {
    fn set_message(&self, _message: &str) {}

    fn increment(&self, _amount: u64) {}

    fn finish_with_message(&self, _message: &str) {}
}

/// Logging progress tracker
///
/// Logs at info level roughly every tenth of the work.
#[derive(Debug)]
pub struct LogProgress {
    name: String,
    position: AtomicU64,
    length: u64,
    log_interval: u64,
}

impl LogProgress {
    pub fn new(name: impl Into<String>, length: u64) -> Self {
        Self {
            name: name.into(),
            position: AtomicU64::new(0),
            length,
            log_interval: std::cmp::max(1, length / 10),
        }
    }

    /// Whether moving from `old_pos` to `new_pos` crosses a log boundary
    fn crosses_interval(&self, old_pos: u64, new_pos: u64) -> bool {
        self.length > 0 && new_pos / self.log_interval > old_pos / self.log_interval
    }
}

impl ProgressTracker for LogProgress {
    fn set_message(&self, _message: &str) {}

    fn increment(&self, amount: u64) {
        let old_pos = self.position.fetch_add(amount, Ordering::Relaxed);
        let new_pos = old_pos + amount;

        if self.crosses_interval(old_pos, new_pos) {
            let percent = (new_pos * 100) / self.length;
            info!("{}: {}% ({}/{})", self.name, percent, new_pos, self.length);
        }
    }

    fn finish_with_message(&self, message: &str) {
        info!("{}: {}", self.name, message);
    }
}
