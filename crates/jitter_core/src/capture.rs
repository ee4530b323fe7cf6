//! Interrupt-driven period capture.
//!
//! [`CaptureController`] turns a stream of edge-capture interrupts into
//! exactly `N` period samples. It is shared between two execution contexts:
//! the capture interrupt handler, which calls [`CaptureController::on_edge_captured`],
//! and the foreground loop, which arms the controller, polls for completion
//! and reads the samples back.
//!
//! Ownership of the sample window follows the phase:
//!
//! * `Idle`, `Done`: nobody writes. The foreground may read samples in `Done`.
//! * `Armed`: the foreground has claimed the window and is clearing it.
//! * `AwaitingFirstEdge`, `Collecting`: the interrupt handler is the only writer.
//!
//! Every hand-over is an atomic store of the phase with `Release`, observed
//! with `Acquire` by the other side before it touches the window.

use crate::CaptureError;
use crate::fixed_buffer::FixedBuffer;
use crate::tick::{EdgeTick, PeriodSample, TickSource, period_between};
use core::cell::UnsafeCell;
use core::ops::Deref;
use core::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

/// Observable state of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// No session; capture interrupts are ignored.
    Idle,
    /// The foreground is preparing a new session.
    Armed,
    /// Capture is enabled and the reference edge has not arrived yet.
    AwaitingFirstEdge,
    /// Samples are being collected; carries the number stored so far.
    Collecting(usize),
    /// Exactly `N` samples are available.
    Done,
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle = 0,
    Armed = 1,
    AwaitingFirstEdge = 2,
    Collecting = 3,
    Done = 4,
}

impl Phase {
    fn from_bits(bits: u8) -> Self {
        match bits {
            1 => Phase::Armed,
            2 => Phase::AwaitingFirstEdge,
            3 => Phase::Collecting,
            4 => Phase::Done,
            _ => Phase::Idle,
        }
    }
}

struct CaptureWindow<const N: usize> {
    /// Tick of the last captured edge; `None` until the reference edge.
    previous: Option<EdgeTick>,
    samples: FixedBuffer<PeriodSample, N>,
}

/// Collects `N` period samples from edge-capture interrupts.
///
/// Designed to live in a `static` for the whole program: all storage is
/// inline and reused across sessions.
pub struct CaptureController<const N: usize> {
    phase: AtomicU8,
    /// Samples stored so far, mirrored for progress reporting.
    collected: AtomicUsize,
    /// Outstanding [`SampleView`]s. The window cannot be re-armed while non-zero.
    readers: AtomicUsize,
    window: UnsafeCell<CaptureWindow<N>>,
}

// The window is only accessed by the owner of the current phase; see the
// module documentation.
unsafe impl<const N: usize> Sync for CaptureController<N> {}

impl<const N: usize> Default for CaptureController<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> CaptureController<N> {
    pub const fn new() -> Self {
        Self {
            phase: AtomicU8::new(Phase::Idle as u8),
            collected: AtomicUsize::new(0),
            readers: AtomicUsize::new(0),
            window: UnsafeCell::new(CaptureWindow {
                previous: None,
                samples: FixedBuffer::new(),
            }),
        }
    }

    /// Number of samples in one session.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Starts a new session and enables the capture interrupt.
    ///
    /// Clears the sample window and publishes `AwaitingFirstEdge`; from then
    /// on the interrupt handler owns the window until the session completes.
    /// Fails with `SessionInProgress` if a session is being collected or its
    /// samples are still being read.
    pub fn arm(&self, source: &impl TickSource) -> Result<(), CaptureError> {
        self.claim()?;
        unsafe {
            // Safety: the phase is Armed and no views are outstanding, so the
            // foreground is the only party touching the window.
            let window = self.window_mut();
            window.previous = None;
            window.samples.clear();
        }
        self.collected.store(0, Ordering::Relaxed);
        self.phase
            .store(Phase::AwaitingFirstEdge as u8, Ordering::Release);
        source.set_capture_enabled(true);
        Ok(())
    }

    /// Handles one edge-capture event. Call only from the capture interrupt.
    ///
    /// Runs in constant time and never blocks. The first edge of a session
    /// only records the reference tick; each following edge stores one
    /// sample. The edge arriving after the buffer is full stores nothing: it
    /// disables capture and marks the session done. Events outside an active
    /// session are acknowledged and otherwise ignored.
    pub fn on_edge_captured(&self, tick: EdgeTick, source: &impl TickSource) {
        match Phase::from_bits(self.phase.load(Ordering::Acquire)) {
            Phase::AwaitingFirstEdge => {
                unsafe {
                    // Safety: the handler owns the window while capture is enabled.
                    self.window_mut().previous = Some(tick);
                }
                self.phase.store(Phase::Collecting as u8, Ordering::Release);
            }
            Phase::Collecting => {
                // Safety: as above.
                let window = unsafe { self.window_mut() };
                let previous = window.previous.unwrap_or(tick);
                if window.samples.push(period_between(previous, tick)).is_ok() {
                    window.previous = Some(tick);
                    self.collected
                        .store(window.samples.len(), Ordering::Relaxed);
                } else {
                    source.set_capture_enabled(false);
                    self.phase.store(Phase::Done as u8, Ordering::Release);
                }
            }
            Phase::Idle | Phase::Armed | Phase::Done => {}
        }
        source.acknowledge_capture();
    }

    /// True once all `N` samples have been collected.
    pub fn is_complete(&self) -> bool {
        self.phase.load(Ordering::Acquire) == Phase::Done as u8
    }

    /// Current session state.
    pub fn state(&self) -> CaptureState {
        match Phase::from_bits(self.phase.load(Ordering::Acquire)) {
            Phase::Idle => CaptureState::Idle,
            Phase::Armed => CaptureState::Armed,
            Phase::AwaitingFirstEdge => CaptureState::AwaitingFirstEdge,
            Phase::Collecting => {
                CaptureState::Collecting(self.collected.load(Ordering::Relaxed))
            }
            Phase::Done => CaptureState::Done,
        }
    }

    /// Read-only view of the collected samples, or `None` before completion.
    ///
    /// The controller cannot be re-armed or reset while a view is alive.
    pub fn samples(&self) -> Option<SampleView<'_, N>> {
        self.readers.fetch_add(1, Ordering::SeqCst);
        if self.phase.load(Ordering::SeqCst) != Phase::Done as u8 {
            self.readers.fetch_sub(1, Ordering::SeqCst);
            return None;
        }
        Some(SampleView { controller: self })
    }

    /// Returns the controller to `Idle` with an empty window.
    ///
    /// Only a finished (or never started) session can be reset; there is no
    /// way to abort a session once armed.
    pub fn reset(&self) -> Result<(), CaptureError> {
        self.claim()?;
        unsafe {
            // Safety: claimed, see `arm`.
            let window = self.window_mut();
            window.previous = None;
            window.samples.clear();
        }
        self.collected.store(0, Ordering::Relaxed);
        self.phase.store(Phase::Idle as u8, Ordering::Release);
        Ok(())
    }

    /// Moves `Idle` or `Done` to `Armed`, giving the foreground the window.
    fn claim(&self) -> Result<(), CaptureError> {
        let claimed = [Phase::Idle, Phase::Done].into_iter().find_map(|from| {
            self.phase
                .compare_exchange(
                    from as u8,
                    Phase::Armed as u8,
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                )
                .ok()
                .map(|_| from)
        });
        let Some(from) = claimed else {
            return Err(CaptureError::SessionInProgress);
        };
        if self.readers.load(Ordering::SeqCst) != 0 {
            self.phase.store(from as u8, Ordering::SeqCst);
            return Err(CaptureError::SessionInProgress);
        }
        Ok(())
    }

    #[allow(clippy::mut_from_ref)]
    unsafe fn window_mut(&self) -> &mut CaptureWindow<N> {
        unsafe { &mut *self.window.get() }
    }
}

/// Borrowed, read-only access to a completed session's samples.
pub struct SampleView<'a, const N: usize> {
    controller: &'a CaptureController<N>,
}

impl<const N: usize> Deref for SampleView<'_, N> {
    type Target = [PeriodSample];

    fn deref(&self) -> &Self::Target {
        unsafe {
            // Safety: the view exists only in Done, and `claim` refuses to
            // leave Done while readers are registered.
            (*self.controller.window.get()).samples.as_slice()
        }
    }
}

impl<const N: usize> Drop for SampleView<'_, N> {
    fn drop(&mut self) {
        self.controller.readers.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::AtomicBool;
    use proptest::prelude::*;

    #[derive(Default)]
    struct RecordingSource {
        enabled: AtomicBool,
        acks: AtomicUsize,
    }

    impl TickSource for RecordingSource {
        fn now(&self) -> EdgeTick {
            0
        }

        fn set_capture_enabled(&self, enabled: bool) {
            self.enabled.store(enabled, Ordering::SeqCst);
        }

        fn acknowledge_capture(&self) {
            self.acks.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn feed<const N: usize>(
        capture: &CaptureController<N>,
        source: &RecordingSource,
        ticks: &[u16],
    ) {
        for &tick in ticks {
            capture.on_edge_captured(tick, source);
        }
    }

    #[test]
    fn first_edge_only_sets_reference() {
        let capture: CaptureController<4> = CaptureController::new();
        let source = RecordingSource::default();
        capture.arm(&source).unwrap();
        assert!(source.enabled.load(Ordering::SeqCst));
        assert_eq!(capture.state(), CaptureState::AwaitingFirstEdge);

        feed(&capture, &source, &[100]);
        assert_eq!(capture.state(), CaptureState::Collecting(0));

        feed(&capture, &source, &[1100]);
        assert_eq!(capture.state(), CaptureState::Collecting(1));
        assert_eq!(source.acks.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn completes_on_edge_after_buffer_fills() {
        let capture: CaptureController<4> = CaptureController::new();
        let source = RecordingSource::default();
        capture.arm(&source).unwrap();

        feed(&capture, &source, &[0, 1000, 2000, 2999, 4000]);
        assert_eq!(capture.state(), CaptureState::Collecting(4));
        assert!(!capture.is_complete());
        assert!(capture.samples().is_none());

        feed(&capture, &source, &[9999]);
        assert!(capture.is_complete());
        assert!(!source.enabled.load(Ordering::SeqCst));

        let samples = capture.samples().unwrap();
        assert_eq!(&*samples, &[1000, 1000, 999, 1001]);
    }

    #[test]
    fn edges_after_done_are_acknowledged_only() {
        let capture: CaptureController<2> = CaptureController::new();
        let source = RecordingSource::default();
        capture.arm(&source).unwrap();
        feed(&capture, &source, &[0, 10, 20, 30, 40, 50]);

        assert_eq!(&*capture.samples().unwrap(), &[10, 10]);
        assert_eq!(source.acks.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn wraparound_sample() {
        let capture: CaptureController<1> = CaptureController::new();
        let source = RecordingSource::default();
        capture.arm(&source).unwrap();
        feed(&capture, &source, &[65530, 5, 6]);
        assert_eq!(&*capture.samples().unwrap(), &[11]);
    }

    #[test]
    fn spurious_edge_while_idle_is_ignored() {
        let capture: CaptureController<2> = CaptureController::new();
        let source = RecordingSource::default();
        feed(&capture, &source, &[1, 2, 3]);
        assert_eq!(capture.state(), CaptureState::Idle);
        assert_eq!(source.acks.load(Ordering::SeqCst), 3);
        assert!(!source.enabled.load(Ordering::SeqCst));
    }

    #[test]
    fn cannot_rearm_or_reset_mid_session() {
        let capture: CaptureController<2> = CaptureController::new();
        let source = RecordingSource::default();
        capture.arm(&source).unwrap();
        assert_eq!(capture.arm(&source), Err(CaptureError::SessionInProgress));
        feed(&capture, &source, &[0, 5]);
        assert_eq!(capture.reset(), Err(CaptureError::SessionInProgress));
        assert_eq!(capture.state(), CaptureState::Collecting(1));
    }

    #[test]
    fn reset_waits_for_readers() {
        let capture: CaptureController<1> = CaptureController::new();
        let source = RecordingSource::default();
        capture.arm(&source).unwrap();
        feed(&capture, &source, &[0, 7, 8]);

        let view = capture.samples().unwrap();
        assert_eq!(capture.reset(), Err(CaptureError::SessionInProgress));
        assert!(capture.is_complete());
        drop(view);

        capture.reset().unwrap();
        assert_eq!(capture.state(), CaptureState::Idle);
        assert!(capture.samples().is_none());
    }

    #[test]
    fn rearm_starts_from_empty_window() {
        let capture: CaptureController<2> = CaptureController::new();
        let source = RecordingSource::default();
        capture.arm(&source).unwrap();
        feed(&capture, &source, &[0, 3, 6, 9]);
        capture.reset().unwrap();

        capture.arm(&source).unwrap();
        feed(&capture, &source, &[500, 501, 503, 600]);
        assert_eq!(&*capture.samples().unwrap(), &[1, 2]);
    }

    #[test]
    fn concurrent_handler_fills_exactly_capacity() {
        let capture: CaptureController<1000> = CaptureController::new();
        let source = RecordingSource::default();
        capture.arm(&source).unwrap();

        std::thread::scope(|scope| {
            scope.spawn(|| {
                let mut tick: u16 = 64_000;
                for _ in 0..1005 {
                    capture.on_edge_captured(tick, &source);
                    tick = tick.wrapping_add(997);
                }
            });
            while !capture.is_complete() {
                core::hint::spin_loop();
            }
        });

        let samples = capture.samples().unwrap();
        assert_eq!(samples.len(), 1000);
        assert!(samples.iter().all(|&s| s == 997));
    }

    proptest! {
        #[test]
        fn samples_are_wrapping_differences(ticks in proptest::collection::vec(any::<u16>(), 17)) {
            let capture: CaptureController<16> = CaptureController::new();
            let source = RecordingSource::default();
            capture.arm(&source).unwrap();
            feed(&capture, &source, &ticks);
            prop_assert!(!capture.is_complete());

            feed(&capture, &source, &[0]);
            let samples = capture.samples().unwrap();
            prop_assert_eq!(samples.len(), 16);
            for (i, pair) in ticks.windows(2).enumerate() {
                prop_assert_eq!(samples[i], pair[1].wrapping_sub(pair[0]));
            }
        }
    }
}
