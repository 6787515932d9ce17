//! Progress reporting for dataset runs.
//!
//! Progress output is cosmetic; nothing here affects the dataset.

use std::time::Instant;

/// Receives progress updates while a dataset is written.
pub trait ProgressReporter {
    /// Called once before the first row.
    fn start(&mut self, _total: u64) {}

    /// Called after each row with the number of rows written so far.
    fn advance(&mut self, written: u64);

    /// Called once after the last row.
    fn finish(&mut self) {}
}

/// Discards progress updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn advance(&mut self, _written: u64) {}
}

/// Logs a line every `step_percent` percent through the `log` facade.
#[derive(Debug, Clone)]
pub struct LogProgress {
    label: String,
    step_percent: u64,
    total: u64,
    next_percent: u64,
    started: Option<Instant>,
}

impl LogProgress {
    /// Log every 10%.
    pub fn new(label: &str) -> Self {
        Self::with_step(label, 10)
    }

    /// Log every `step_percent` percent (clamped to 1..=100).
    pub fn with_step(label: &str, step_percent: u64) -> Self {
        Self {
            label: label.to_string(),
            step_percent: step_percent.clamp(1, 100),
            total: 0,
            next_percent: 0,
            started: None,
        }
    }

    /// Next percentage that will be logged.
    pub fn next_percent(&self) -> u64 {
        self.next_percent
    }
}

impl ProgressReporter for LogProgress {
    fn start(&mut self, total: u64) {
        self.total = total;
        self.next_percent = self.step_percent;
        self.started = Some(Instant::now());
        log::info!("{}: 0/{}", self.label, total);
    }

    fn advance(&mut self, written: u64) {
        if self.total == 0 {
            return;
        }
        let percent = written.saturating_mul(100) / self.total;
        if percent >= self.next_percent {
            log::info!("{}: {}/{} ({}%)", self.label, written, self.total, percent);
            while self.next_percent <= percent {
                self.next_percent += self.step_percent;
            }
        }
    }

    fn finish(&mut self) {
        let elapsed = self.started.map(|s| s.elapsed()).unwrap_or_default();
        log::info!("{}: done in {:.2?}", self.label, elapsed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_progress_steps() {
        let mut progress = LogProgress::with_step("test", 25);
        progress.start(200);
        assert_eq!(progress.next_percent(), 25);

        progress.advance(49);
        assert_eq!(progress.next_percent(), 25);
        progress.advance(50);
        assert_eq!(progress.next_percent(), 50);

        // jumping past several marks only logs once
        progress.advance(180);
        assert_eq!(progress.next_percent(), 100);
        progress.advance(200);
        assert_eq!(progress.next_percent(), 125);
        progress.finish();
    }

    #[test]
    fn test_log_progress_empty_run() {
        let mut progress = LogProgress::new("empty");
        progress.start(0);
        progress.advance(0);
        progress.finish();
    }

    #[test]
    fn test_step_clamped() {
        let mut progress = LogProgress::with_step("x", 0);
        progress.start(10);
        assert_eq!(progress.next_percent(), 1);
    }
}
