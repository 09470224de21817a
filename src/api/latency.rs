//! In-memory latency histogram for draw feed requests.
//! Records the round trip of each upstream fetch.

use std::sync::Mutex;
use std::time::Duration;

/// Shared latency stats. Draw service records, API reads.
/// Values stored in microseconds.
pub struct LatencyStats {
    inner: Mutex<hdrhistogram::Histogram<u64>>,
}

impl LatencyStats {
    /// Tracks 1us to 100s, 3 significant figures.
    pub fn new() -> Self {
        let histogram = hdrhistogram::Histogram::new_with_bounds(1, 100_000_000, 3)
            .expect("valid histogram bounds");
        Self {
            inner: Mutex::new(histogram),
        }
    }

    pub fn record(&self, d: Duration) {
        let us = d.as_micros().clamp(1, 100_000_000) as u64;
        if let Ok(mut h) = self.inner.lock() {
            let _ = h.record(us);
        }
    }

    /// (p50, p95, p99) in milliseconds. None if no samples.
    pub fn percentiles_ms(&self) -> Option<(f64, f64, f64)> {
        let h = self.inner.lock().ok()?;
        if h.len() == 0 {
            return None;
        }
        let ms = |q: f64| h.value_at_quantile(q) as f64 / 1_000.0;
        Some((ms(0.5), ms(0.95), ms(0.99)))
    }

    pub fn len(&self) -> u64 {
        self.inner.lock().map(|h| h.len()).unwrap_or(0)
    }
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_histogram_has_no_percentiles() {
        let stats = LatencyStats::new();
        assert_eq!(stats.len(), 0);
        assert!(stats.percentiles_ms().is_none());
    }

    #[test]
    fn records_fetch_durations() {
        let stats = LatencyStats::new();
        for ms in [100, 200, 300] {
            stats.record(Duration::from_millis(ms));
        }
        assert_eq!(stats.len(), 3);
        let (p50, _, p99) = stats.percentiles_ms().unwrap();
        assert!((199.0..=201.0).contains(&p50));
        assert!(p99 >= p50);
    }
}
