//! Period statistics for simulated sessions.
//!
//! Summarizes the raw samples of one or more sessions independently of the
//! histogram range, so sessions aborted for out-of-range samples still show
//! where their periods actually fell.

use jitter_common::config::TICK_RATE_HZ;
use jitter_core::tick::PeriodSample;

/// Running min/max/mean over period samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodStats {
    pub min: u16,
    pub max: u16,
    pub sum: u64,
    pub count: u64,
}

impl Default for PeriodStats {
    fn default() -> Self {
        Self::new()
    }
}

impl PeriodStats {
    /// Creates an empty tracker. `min` starts at `u16::MAX` so the first
    /// sample replaces it.
    pub fn new() -> Self {
        Self {
            min: u16::MAX,
            max: 0,
            sum: 0,
            count: 0,
        }
    }

    pub fn from_samples(samples: &[PeriodSample]) -> Self {
        let mut stats = Self::new();
        for &sample in samples {
            stats.update(sample);
        }
        stats
    }

    pub fn update(&mut self, sample: PeriodSample) {
        self.min = self.min.min(sample);
        self.max = self.max.max(sample);
        self.sum += u64::from(sample);
        self.count += 1;
    }

    /// Folds another tracker into this one.
    pub fn merge(&mut self, other: &PeriodStats) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.sum += other.sum;
        self.count += other.count;
    }

    /// Mean period in ticks, or 0.0 with no samples.
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum as f64 / self.count as f64
        }
    }

    /// Signal frequency implied by the mean period.
    pub fn frequency_hz(&self) -> f64 {
        let mean = self.mean();
        if mean == 0.0 {
            0.0
        } else {
            f64::from(TICK_RATE_HZ) / mean
        }
    }

    pub fn print_report(&self) {
        let us_per_tick = 1_000_000.0 / f64::from(TICK_RATE_HZ);
        println!("\nPeriod Metrics");
        println!("Samples: {}", self.count);
        if self.count == 0 {
            return;
        }
        println!("Min:   {:.2} us", f64::from(self.min) * us_per_tick);
        println!("Avg:   {:.2} us", self.mean() * us_per_tick);
        println!("Max:   {:.2} us", f64::from(self.max) * us_per_tick);
        println!("Freq:  {:.3} Hz", self.frequency_hz());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_extremes_and_mean() {
        let stats = PeriodStats::from_samples(&[1000, 999, 1001, 1000]);
        assert_eq!(stats.min, 999);
        assert_eq!(stats.max, 1001);
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean(), 1000.0);
        assert_eq!(stats.frequency_hz(), 1000.0);
    }

    #[test]
    fn merge_combines_sessions() {
        let mut a = PeriodStats::from_samples(&[10, 20]);
        let b = PeriodStats::from_samples(&[5, 45]);
        a.merge(&b);
        assert_eq!((a.min, a.max, a.count), (5, 45, 4));
        assert_eq!(a.mean(), 20.0);
    }

    #[test]
    fn empty_stats_are_zero() {
        let stats = PeriodStats::new();
        assert_eq!(stats.mean(), 0.0);
        assert_eq!(stats.frequency_hz(), 0.0);
    }
}
