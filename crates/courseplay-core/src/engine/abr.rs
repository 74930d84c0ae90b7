//! Throughput-based level selection

use crate::manifest::LevelInfo;
use std::time::Duration;
use tracing::debug;

/// EWMA weight of the newest sample
const EWMA_ALPHA: f64 = 0.2;

/// Downloads shorter than this carry no usable throughput signal
const MIN_SAMPLE_DURATION: Duration = Duration::from_millis(1);

/// Bandwidth estimate fed by download timings
#[derive(Debug, Clone)]
pub struct ThroughputEstimator {
    estimate: u64,
    safety_factor: f64,
    samples: u32,
}

impl ThroughputEstimator {
    pub fn new(initial_estimate: u64, safety_factor: f64) -> Self {
        Self {
            estimate: initial_estimate,
            safety_factor: safety_factor.clamp(0.1, 1.0),
            samples: 0,
        }
    }

    /// Record a download of `bytes` that took `elapsed`
    pub fn record(&mut self, bytes: usize, elapsed: Duration) {
        if elapsed < MIN_SAMPLE_DURATION {
            return;
        }
        let sample = ((bytes as f64 * 8.0) / elapsed.as_secs_f64()) as u64;

        self.estimate = if self.samples == 0 {
            sample
        } else {
            ((self.estimate as f64 * (1.0 - EWMA_ALPHA)) + (sample as f64 * EWMA_ALPHA)) as u64
        };
        self.samples += 1;

        debug!(
            bytes,
            elapsed_ms = elapsed.as_millis(),
            sample_kbps = sample / 1000,
            estimate_kbps = self.estimate / 1000,
            "Bandwidth sample"
        );
    }

    /// Current estimate in bits per second
    pub fn estimate(&self) -> u64 {
        self.estimate
    }

    /// Highest level that fits the discounted estimate, else the cheapest one
    pub fn select(&self, levels: &[LevelInfo]) -> Option<usize> {
        let budget = (self.estimate as f64 * self.safety_factor) as u64;

        levels
            .iter()
            .enumerate()
            .filter(|(_, l)| l.bandwidth <= budget)
            .max_by_key(|(_, l)| l.bandwidth)
            .or_else(|| levels.iter().enumerate().min_by_key(|(_, l)| l.bandwidth))
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Resolution;
    use url::Url;

    fn levels() -> Vec<LevelInfo> {
        [(800_000, 360), (2_800_000, 720), (5_000_000, 1080)]
            .into_iter()
            .map(|(bandwidth, height)| LevelInfo {
                bandwidth,
                resolution: Some(Resolution::new(height * 16 / 9, height)),
                codecs: None,
                frame_rate: None,
                uri: Url::parse(&format!("https://example.com/{height}p.m3u8")).unwrap(),
            })
            .collect()
    }

    #[test]
    fn test_selection_by_budget() {
        let high = ThroughputEstimator::new(10_000_000, 0.8);
        assert_eq!(high.select(&levels()), Some(2));

        let mid = ThroughputEstimator::new(4_000_000, 0.8);
        assert_eq!(mid.select(&levels()), Some(1));

        // Nothing fits: fall back to the cheapest level
        let starved = ThroughputEstimator::new(100_000, 0.8);
        assert_eq!(starved.select(&levels()), Some(0));

        assert_eq!(starved.select(&[]), None);
    }

    #[test]
    fn test_first_sample_replaces_default() {
        let mut est = ThroughputEstimator::new(500_000, 0.8);
        // 1 MB in 1 s = 8 Mbps
        est.record(1_000_000, Duration::from_secs(1));
        assert_eq!(est.estimate(), 8_000_000);

        // Second sample is smoothed
        est.record(125_000, Duration::from_secs(1));
        assert!(est.estimate().abs_diff(6_600_000) <= 1);
    }

    #[test]
    fn test_instant_downloads_ignored() {
        let mut est = ThroughputEstimator::new(500_000, 0.8);
        est.record(1_000_000, Duration::ZERO);
        assert_eq!(est.estimate(), 500_000);
    }
}
