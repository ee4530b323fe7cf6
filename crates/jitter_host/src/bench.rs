use crate::signal::{SignalGenerator, SimulatedTimer};
use crate::stats::PeriodStats;
use anyhow::{Result, anyhow};
use jitter_common::config::{NUM_SAMPLES, RANGE_LOWER, RANGE_SPREAD, RANGE_UPPER};
use jitter_core::CaptureError;
use jitter_core::capture::CaptureController;
use jitter_core::histogram::HistogramAggregator;
use rayon::prelude::*;
use std::time::Instant;

/// Result of one headless session.
pub struct SessionOutcome {
    pub stats: PeriodStats,
    /// Non-empty histogram bins, or the aggregation error.
    pub bins: Result<Vec<(u16, u32)>, CaptureError>,
}

/// Runs one full capture and aggregation without an operator.
///
/// Edges are delivered synchronously, so the session is deterministic for
/// a given seed.
pub fn simulate_session(period: u16, jitter: u16, seed: u64) -> Result<SessionOutcome> {
    let capture: CaptureController<NUM_SAMPLES> = CaptureController::new();
    let timer = SimulatedTimer::new();
    let mut signal = SignalGenerator::new(period, jitter, seed);

    capture.arm(&timer).map_err(|e| anyhow!("arm failed: {}", e))?;
    while !capture.is_complete() {
        let tick = signal
            .next()
            .ok_or_else(|| anyhow!("signal ended mid-session"))?;
        timer.latch(tick);
        capture.on_edge_captured(tick, &timer);
    }

    let samples = capture
        .samples()
        .ok_or_else(|| anyhow!("session finished without samples"))?;
    let stats = PeriodStats::from_samples(&samples);

    let mut histogram: HistogramAggregator<RANGE_SPREAD> = HistogramAggregator::new();
    let bins = histogram
        .build(&samples, RANGE_LOWER, RANGE_UPPER)
        .map(|_| histogram.report().collect());

    Ok(SessionOutcome { stats, bins })
}

/// Runs `sessions` independent seeded sessions in parallel and prints a
/// merged report.
pub fn run_bench(sessions: usize, period: u16, jitter: u16, seed: u64) -> Result<()> {
    println!("PERIOD HISTOGRAM BENCH");
    println!("Sessions: {}", sessions);
    println!("Signal: {} ticks +/- {}", period, jitter);
    println!("Range: [{}, {})", RANGE_LOWER, RANGE_UPPER);
    println!("-------------------------------");

    let start = Instant::now();
    let outcomes: Vec<SessionOutcome> = (0..sessions)
        .into_par_iter()
        .map(|i| simulate_session(period, jitter, seed.wrapping_add(i as u64)))
        .collect::<Result<_>>()?;
    let elapsed = start.elapsed();

    let mut merged = [0u64; RANGE_SPREAD];
    let mut stats = PeriodStats::new();
    let mut completed = 0;
    let mut aborted = 0;

    for (i, outcome) in outcomes.iter().enumerate() {
        stats.merge(&outcome.stats);
        match &outcome.bins {
            Ok(bins) => {
                completed += 1;
                for &(value, count) in bins {
                    merged[usize::from(value - RANGE_LOWER)] += u64::from(count);
                }
            }
            Err(err) => {
                aborted += 1;
                tracing::warn!(session = i, %err, "session aborted");
            }
        }
    }

    println!(
        "Completed: {} | Aborted: {} | Time: {:?}",
        completed, aborted, elapsed
    );
    stats.print_report();

    println!("\nMerged histogram (completed sessions):");
    for (bin, &count) in merged.iter().enumerate() {
        if count > 0 {
            println!("{}:{}", RANGE_LOWER as usize + bin, count);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_range_signal_completes() {
        let outcome = simulate_session(1000, 10, 3).unwrap();
        let bins = outcome.bins.unwrap();
        let total: u32 = bins.iter().map(|&(_, c)| c).sum();
        assert_eq!(total as usize, NUM_SAMPLES);
        assert!(bins.windows(2).all(|w| w[0].0 < w[1].0));
        assert_eq!(outcome.stats.count as usize, NUM_SAMPLES);
    }

    #[test]
    fn wide_jitter_aborts_with_out_of_range() {
        let outcome = simulate_session(1000, 400, 3).unwrap();
        assert!(matches!(
            outcome.bins,
            Err(CaptureError::OutOfRangeSample { .. })
        ));
        assert!(outcome.stats.min < RANGE_LOWER || outcome.stats.max >= RANGE_UPPER);
    }

    #[test]
    fn sessions_are_reproducible() {
        let a = simulate_session(1000, 20, 11).unwrap();
        let b = simulate_session(1000, 20, 11).unwrap();
        assert_eq!(a.stats, b.stats);
        assert_eq!(a.bins, b.bins);
    }
}
