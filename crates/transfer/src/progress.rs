use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

/// Receives progress updates as a percentage in `[0, 100]`.
///
/// Purely observational: nothing a sink does feeds back into the transfer.
pub trait ProgressSink: Send + Sync {
    fn report(&self, percent: f64);
}

impl<F> ProgressSink for F
where
    F: Fn(f64) + Send + Sync,
{
    fn report(&self, percent: f64) {
        self(percent)
    }
}

/// Discards progress updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _percent: f64) {}
}

// ---------------------------------------------------------------------------
// ProgressCounter
// ---------------------------------------------------------------------------

/// Counts finished chunks of one transfer.
///
/// The count only grows and never passes `total`, so the reported
/// percentage is monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressCounter {
    done: u32,
    total: u32,
}

impl ProgressCounter {
    pub fn new(total: u32) -> Self {
        Self { done: 0, total }
    }

    /// Counts one more chunk and returns the new percentage.
    pub fn advance(&mut self) -> f64 {
        if self.done < self.total {
            self.done += 1;
        }
        self.percentage()
    }

    /// Returns `done / total` as a percentage; an empty transfer is 100 %.
    pub fn percentage(&self) -> f64 {
        percentage(self.done, self.total)
    }
}

/// `done / total` as a percentage in `[0, 100]`.
pub(crate) fn percentage(done: u32, total: u32) -> f64 {
    if total == 0 {
        return 100.0;
    }
    (done.min(total) as f64 / total as f64) * 100.0
}

// ---------------------------------------------------------------------------
// ThroughputMeter
// ---------------------------------------------------------------------------

struct Sample {
    bytes: u64,
    timestamp: Instant,
}

/// Estimates throughput from a sliding window of samples.
///
/// Uses tokio's clock, so it follows a paused test clock.
pub struct ThroughputMeter {
    samples: VecDeque<Sample>,
    max_samples: usize,
    window: Duration,
}

impl ThroughputMeter {
    /// Creates a meter.
    ///
    /// - `window`: time window for the estimate (default 5 s).
    /// - `max_samples`: maximum retained samples (default 100).
    pub fn new(window: Option<Duration>, max_samples: Option<usize>) -> Self {
        Self {
            samples: VecDeque::new(),
            max_samples: max_samples.unwrap_or(100),
            window: window.unwrap_or(Duration::from_secs(5)),
        }
    }

    /// Records `bytes` moved at the current instant.
    pub fn add_sample(&mut self, bytes: u64) {
        let now = Instant::now();
        self.samples.push_back(Sample {
            bytes,
            timestamp: now,
        });

        while let Some(front) = self.samples.front() {
            if now.duration_since(front.timestamp) > self.window {
                self.samples.pop_front();
            } else {
                break;
            }
        }
        while self.samples.len() > self.max_samples {
            self.samples.pop_front();
        }
    }

    /// Average bytes/second within the window; 0.0 with fewer than 2 samples.
    pub fn bytes_per_second(&self) -> f64 {
        let (Some(first), Some(last)) = (self.samples.front(), self.samples.back()) else {
            return 0.0;
        };
        let elapsed = last.timestamp.duration_since(first.timestamp);
        if self.samples.len() < 2 || elapsed.is_zero() {
            return 0.0;
        }
        let total: u64 = self.samples.iter().map(|s| s.bytes).sum();
        total as f64 / elapsed.as_secs_f64()
    }

    /// Estimates the time left for `remaining_bytes`; `None` without a rate.
    pub fn eta(&self, remaining_bytes: u64) -> Option<Duration> {
        let speed = self.bytes_per_second();
        if speed <= 0.0 {
            return None;
        }
        Some(Duration::from_secs_f64(remaining_bytes as f64 / speed))
    }
}
