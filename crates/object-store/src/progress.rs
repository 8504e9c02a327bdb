//! Upload progress accounting.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use dropcode_protocol::TransferProgress;

/// Time window for the speed estimate.
const WINDOW: Duration = Duration::from_secs(5);

/// Maximum retained samples.
const MAX_SAMPLES: usize = 100;

struct Sample {
    bytes: u64,
    timestamp: Instant,
}

/// Calculates transfer speed using a sliding window of samples.
pub struct SpeedCalculator {
    samples: Mutex<Vec<Sample>>,
}

impl SpeedCalculator {
    pub fn new() -> Self {
        Self {
            samples: Mutex::new(Vec::new()),
        }
    }

    /// Records a sample of `bytes` transferred at the current instant.
    pub fn add_sample(&self, bytes: u64) {
        let mut samples = self.samples.lock().unwrap();
        let now = Instant::now();
        samples.push(Sample {
            bytes,
            timestamp: now,
        });

        // Prune samples outside the window.
        let cutoff = now - WINDOW;
        samples.retain(|s| s.timestamp >= cutoff);

        if samples.len() > MAX_SAMPLES {
            let excess = samples.len() - MAX_SAMPLES;
            samples.drain(..excess);
        }
    }

    /// Returns the average speed in bytes/second within the window.
    ///
    /// Returns 0.0 with fewer than 2 samples.
    pub fn bytes_per_second(&self) -> f64 {
        let samples = self.samples.lock().unwrap();
        if samples.len() < 2 {
            return 0.0;
        }

        let first = &samples[0];
        let last = &samples[samples.len() - 1];
        let elapsed = last.timestamp.duration_since(first.timestamp);
        if elapsed.is_zero() {
            return 0.0;
        }

        let total_bytes: u64 = samples.iter().map(|s| s.bytes).sum();
        total_bytes as f64 / elapsed.as_secs_f64()
    }

    /// Clears all recorded samples.
    pub fn reset(&self) {
        self.samples.lock().unwrap().clear();
    }
}

impl Default for SpeedCalculator {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds one progress payload from the byte counters.
///
/// An empty payload counts as fully transferred.
pub(crate) fn snapshot(loaded: u64, total: u64, speed: f64) -> TransferProgress {
    let percentage = if total == 0 {
        100
    } else {
        ((loaded as f64 / total as f64) * 100.0).round() as u8
    };
    TransferProgress {
        loaded,
        total,
        percentage,
        speed,
    }
}
