use crate::outcome::Outcome;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Receives one callback per finished work item, on the engine's task
pub trait ProgressObserver: Send {
    fn start(&mut self, _total: usize) {}

    fn advance(&mut self, outcome: &Outcome);

    fn finish(&mut self) {}
}

/// Discards all progress
#[derive(Debug, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn advance(&mut self, _outcome: &Outcome) {}
}

/// Periodic progress lines in the log, for non-interactive runs.
///
/// Logs every `interval` items and once at the end, grouping failures by
/// category in the closing summary.
pub struct LogProgress {
    total: usize,
    done: usize,
    succeeded: usize,
    failed: usize,
    interval: usize,
    last_logged: usize,
    start_time: Instant,
    error_counts: HashMap<&'static str, usize>,
}

impl LogProgress {
    pub fn new(interval: usize) -> Self {
        Self {
            total: 0,
            done: 0,
            succeeded: 0,
            failed: 0,
            interval: interval.max(1),
            last_logged: 0,
            start_time: Instant::now(),
            error_counts: HashMap::new(),
        }
    }

    fn rate(&self, elapsed: Duration) -> f64 {
        if elapsed.as_secs_f64() > 0.0 {
            self.done as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new(25)
    }
}

impl ProgressObserver for LogProgress {
    fn start(&mut self, total: usize) {
        self.total = total;
        self.start_time = Instant::now();
        if total > 0 {
            info!("Starting transfer: {} items to process", total);
        }
    }

    fn advance(&mut self, outcome: &Outcome) {
        self.done += 1;
        match outcome.error() {
            None => self.succeeded += 1,
            Some(error) => {
                self.failed += 1;
                *self.error_counts.entry(error.category()).or_insert(0) += 1;
            }
        }

        if self.done - self.last_logged >= self.interval || self.done == self.total {
            let rate = self.rate(self.start_time.elapsed());
            info!(
                "Progress: {}/{} ({:.1} items/sec) | Succeeded: {} | Failed: {}",
                self.done, self.total, rate, self.succeeded, self.failed
            );
            self.last_logged = self.done;
        }
    }

    fn finish(&mut self) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if self.failed == 0 {
            info!(
                "Transfer finished: {} of {} in {:.1}s | Succeeded: {}",
                self.done, self.total, elapsed, self.succeeded
            );
            return;
        }

        warn!(
            "Transfer finished: {} of {} in {:.1}s | Succeeded: {} | Failed: {}",
            self.done, self.total, elapsed, self.succeeded, self.failed
        );
        let mut breakdown: Vec<_> = self.error_counts.iter().collect();
        breakdown.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
        let summary: Vec<String> = breakdown
            .iter()
            .map(|(category, count)| format!("{}: {}", category, count))
            .collect();
        info!("Error breakdown: {}", summary.join(", "));
    }
}
