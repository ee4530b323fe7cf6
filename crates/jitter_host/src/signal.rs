//! Simulated capture timer and input signal.
//!
//! Stands in for the hardware on the host: [`SimulatedTimer`] implements the
//! capture timer contract with atomics, [`SignalGenerator`] produces jittered
//! rising-edge timestamps on the wrapping 16-bit counter, and
//! [`drive_edges`] plays the role of the capture interrupt on its own thread.

use jitter_core::capture::CaptureController;
use jitter_core::tick::{EdgeTick, TickSource};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Atomic model of the capture timer registers.
#[derive(Default)]
pub struct SimulatedTimer {
    counter: AtomicU16,
    capture_enabled: AtomicBool,
    acknowledged: AtomicU64,
}

impl SimulatedTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latches an edge timestamp into the counter, as the capture hardware does.
    pub fn latch(&self, tick: EdgeTick) {
        self.counter.store(tick, Ordering::Relaxed);
    }

    pub fn capture_enabled(&self) -> bool {
        self.capture_enabled.load(Ordering::Acquire)
    }

    /// Number of capture events cleared so far.
    pub fn acknowledged(&self) -> u64 {
        self.acknowledged.load(Ordering::Relaxed)
    }
}

impl TickSource for SimulatedTimer {
    fn now(&self) -> EdgeTick {
        self.counter.load(Ordering::Relaxed)
    }

    fn set_capture_enabled(&self, enabled: bool) {
        self.capture_enabled.store(enabled, Ordering::Release);
    }

    fn acknowledge_capture(&self) {
        self.acknowledged.fetch_add(1, Ordering::Relaxed);
    }
}

/// Seeded source of rising-edge timestamps.
///
/// Each period is `period` ticks plus a uniform offset in `[-jitter, jitter]`,
/// never shorter than one tick. Timestamps accumulate on a wrapping `u16`.
pub struct SignalGenerator {
    rng: StdRng,
    period: u16,
    jitter: u16,
    tick: EdgeTick,
}

impl SignalGenerator {
    pub fn new(period: u16, jitter: u16, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            period,
            jitter,
            tick: 0,
        }
    }

    /// Length of the next period in ticks.
    fn next_period(&mut self) -> u16 {
        let jitter = i32::from(self.jitter);
        let offset = if jitter == 0 {
            0
        } else {
            self.rng.gen_range(-jitter..=jitter)
        };
        (i32::from(self.period) + offset).clamp(1, i32::from(u16::MAX)) as u16
    }
}

impl Iterator for SignalGenerator {
    type Item = EdgeTick;

    fn next(&mut self) -> Option<EdgeTick> {
        let period = self.next_period();
        self.tick = self.tick.wrapping_add(period);
        Some(self.tick)
    }
}

/// Delivers edges to the controller while capture is enabled.
///
/// Runs until `running` is cleared. Edges are only delivered while the
/// capture interrupt is enabled, matching a masked interrupt line. With a
/// non-zero `interval` each edge is paced by a busy-wait, like the hardware
/// signal would be.
pub fn drive_edges<const N: usize>(
    capture: &CaptureController<N>,
    timer: &SimulatedTimer,
    mut signal: SignalGenerator,
    interval: Duration,
    running: &AtomicBool,
) {
    while running.load(Ordering::Relaxed) {
        if !timer.capture_enabled() {
            thread::sleep(Duration::from_millis(1));
            continue;
        }

        let start = Instant::now();
        let Some(tick) = signal.next() else {
            break;
        };
        timer.latch(tick);
        capture.on_edge_captured(tick, timer);

        while start.elapsed() < interval {
            std::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steady_signal_has_exact_periods() {
        let edges: Vec<_> = SignalGenerator::new(1000, 0, 1).take(3).collect();
        assert_eq!(edges, vec![1000, 2000, 3000]);
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let mut signal = SignalGenerator::new(1000, 5, 42);
        let mut prev = 0u16;
        for _ in 0..10_000 {
            let tick = signal.next().unwrap();
            let period = tick.wrapping_sub(prev);
            assert!((995..=1005).contains(&period), "period {}", period);
            prev = tick;
        }
    }

    #[test]
    fn same_seed_same_signal() {
        let a: Vec<_> = SignalGenerator::new(1000, 50, 7).take(100).collect();
        let b: Vec<_> = SignalGenerator::new(1000, 50, 7).take(100).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn driven_session_completes() {
        let capture: CaptureController<100> = CaptureController::new();
        let timer = SimulatedTimer::new();
        let running = AtomicBool::new(true);
        capture.arm(&timer).unwrap();

        thread::scope(|scope| {
            scope.spawn(|| {
                drive_edges(
                    &capture,
                    &timer,
                    SignalGenerator::new(1000, 3, 9),
                    Duration::ZERO,
                    &running,
                )
            });
            while !capture.is_complete() {
                std::hint::spin_loop();
            }
            running.store(false, Ordering::Relaxed);
        });

        let samples = capture.samples().unwrap();
        assert_eq!(samples.len(), 100);
        assert!(samples.iter().all(|s| (997..=1003).contains(s)));
        assert!(!timer.capture_enabled());
        assert!(timer.acknowledged() >= 102);
    }
}
