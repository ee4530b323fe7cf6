//! Operator-driven measurement sessions.
//!
//! [`SessionLoop`] sequences arm, collect, aggregate, report and reset over
//! a [`Terminal`], repeating until the operator quits. It does no
//! measurement work itself.

use crate::CaptureError;
use crate::capture::CaptureController;
use crate::histogram::HistogramAggregator;
use crate::terminal::{Terminal, TerminalWriter};
use crate::tick::TickSource;
use core::fmt::Write;
use jitter_common::config::{PROGRESS_INTERVAL, RANGE_LOWER, RANGE_UPPER};
use jitter_common::prompt;

/// Where the sequencer currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Arming,
    Collecting,
    Aggregating,
    Reporting,
    Terminated,
}

/// Histogram range and progress cadence for each session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub lower: u16,
    pub upper: u16,
    /// Busy-wait iterations between progress dots. Zero disables the dots.
    pub progress_interval: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lower: RANGE_LOWER,
            upper: RANGE_UPPER,
            progress_interval: PROGRESS_INTERVAL,
        }
    }
}

/// Outcome counts for one run of the operator loop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: u32,
    pub aborted: u32,
}

pub struct SessionLoop<'a, const N: usize, const BINS: usize, T, S> {
    capture: &'a CaptureController<N>,
    source: S,
    terminal: T,
    histogram: HistogramAggregator<BINS>,
    config: SessionConfig,
    phase: SessionPhase,
}

impl<'a, const N: usize, const BINS: usize, T, S> SessionLoop<'a, N, BINS, T, S>
where
    T: Terminal,
    S: TickSource,
{
    pub fn new(
        capture: &'a CaptureController<N>,
        source: S,
        terminal: T,
        config: SessionConfig,
    ) -> Self {
        Self {
            capture,
            source,
            terminal,
            histogram: HistogramAggregator::new(),
            config,
            phase: SessionPhase::Idle,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Gives the terminal back, e.g. to inspect a transcript.
    pub fn into_terminal(self) -> T {
        self.terminal
    }

    /// Runs the operator loop until `q` is pressed at a prompt.
    ///
    /// A session that fails aggregation is reported, discarded and counted
    /// as aborted; the operator is then offered another run.
    pub fn run(&mut self) -> RunSummary {
        let mut summary = RunSummary::default();

        self.say(prompt::BEGIN);
        if prompt::is_quit(self.terminal.get_char()) {
            self.terminate();
            return summary;
        }

        loop {
            match self.run_session() {
                Ok(()) => summary.completed += 1,
                Err(err) => {
                    summary.aborted += 1;
                    let _ = writeln!(
                        TerminalWriter(&mut self.terminal),
                        "{}{}",
                        prompt::ABORTED,
                        err
                    );
                    self.say(prompt::DISCARDED);
                }
            }
            self.end_session();

            self.say(prompt::REPEAT);
            if prompt::is_quit(self.terminal.get_char()) {
                self.terminate();
                return summary;
            }
        }
    }

    /// Runs one arm, collect, aggregate, report cycle.
    ///
    /// Leaves the capture and histogram state for [`Self::end_session`].
    pub fn run_session(&mut self) -> Result<(), CaptureError> {
        self.phase = SessionPhase::Arming;
        self.capture.arm(&self.source)?;
        self.terminal.put_str(prompt::COLLECTING);

        self.phase = SessionPhase::Collecting;
        self.await_completion();
        self.say("");
        self.say(prompt::COLLECTED);

        self.phase = SessionPhase::Aggregating;
        self.say(prompt::COMPILING);
        {
            let samples = self
                .capture
                .samples()
                .ok_or(CaptureError::SessionInProgress)?;
            self.histogram
                .build(&samples, self.config.lower, self.config.upper)?;
        }
        self.say(prompt::COMPILED);
        self.terminal.get_char();

        self.phase = SessionPhase::Reporting;
        self.say(prompt::REPORT_HEADER);
        self.say(prompt::REPORT_RULE);
        for (value, count) in self.histogram.report() {
            let _ = writeln!(TerminalWriter(&mut self.terminal), "{}:{}", value, count);
            self.terminal.get_char();
        }
        self.say(prompt::REPORT_RULE);
        Ok(())
    }

    /// Clears the histogram and returns the capture controller to idle.
    pub fn end_session(&mut self) {
        self.histogram.reset();
        // Only fails if arming never succeeded, leaving nothing to clear.
        let _ = self.capture.reset();
        self.phase = SessionPhase::Idle;
    }

    /// Deliberate busy-wait: the target has no scheduler to block on, and a
    /// session cannot be cancelled once armed.
    fn await_completion(&mut self) {
        let mut wait: u32 = 0;
        while !self.capture.is_complete() {
            if self.config.progress_interval != 0 {
                wait += 1;
                if wait >= self.config.progress_interval {
                    wait = 0;
                    self.terminal.put_char(prompt::PROGRESS);
                }
            }
            core::hint::spin_loop();
        }
    }

    fn terminate(&mut self) {
        self.say(prompt::EXIT);
        self.phase = SessionPhase::Terminated;
    }

    fn say(&mut self, line: &str) {
        self.terminal.put_str(line);
        self.terminal.put_str("\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tick::EdgeTick;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    const REPORT: &str = "999:1\r\n1000:2\r\n1001:1\r\n";
    const EDGES: [u16; 6] = [0, 1000, 2000, 2999, 4000, 5000];

    struct ScriptedTerminal {
        input: VecDeque<u8>,
        output: Vec<u8>,
    }

    impl ScriptedTerminal {
        fn new(keys: &[u8]) -> Self {
            Self {
                input: keys.iter().copied().collect(),
                output: Vec::new(),
            }
        }

        fn transcript(&self) -> String {
            String::from_utf8(self.output.clone()).unwrap()
        }
    }

    impl Terminal for ScriptedTerminal {
        fn put_char(&mut self, byte: u8) {
            self.output.push(byte);
        }

        fn get_char(&mut self) -> u8 {
            self.input.pop_front().expect("script ran out of keys")
        }
    }

    #[derive(Default)]
    struct RecordingSource {
        enabled: AtomicBool,
        enables: AtomicUsize,
    }

    impl TickSource for RecordingSource {
        fn now(&self) -> EdgeTick {
            0
        }

        fn set_capture_enabled(&self, enabled: bool) {
            if enabled {
                self.enables.fetch_add(1, Ordering::SeqCst);
            }
            self.enabled.store(enabled, Ordering::SeqCst);
        }

        fn acknowledge_capture(&self) {}
    }

    /// Plays one edge sequence per session from a separate "interrupt" thread.
    fn run_with_edges(
        capture: &CaptureController<4>,
        source: &RecordingSource,
        keys: &[u8],
        sessions: &[&[u16]],
    ) -> (RunSummary, String) {
        let config = SessionConfig {
            lower: 950,
            upper: 1050,
            progress_interval: 0,
        };
        std::thread::scope(|scope| {
            scope.spawn(|| {
                for edges in sessions {
                    while !source.enabled.load(Ordering::SeqCst) {
                        std::hint::spin_loop();
                    }
                    for &tick in *edges {
                        capture.on_edge_captured(tick, source);
                    }
                }
            });
            let mut session: SessionLoop<'_, 4, 100, _, _> =
                SessionLoop::new(capture, source, ScriptedTerminal::new(keys), config);
            let summary = session.run();
            assert_eq!(session.phase(), SessionPhase::Terminated);
            (summary, session.into_terminal().transcript())
        })
    }

    #[test]
    fn quit_at_first_prompt_does_no_work() {
        let capture: CaptureController<4> = CaptureController::new();
        let source = RecordingSource::default();
        let (summary, transcript) = run_with_edges(&capture, &source, b"q", &[]);

        assert_eq!(summary, RunSummary::default());
        assert_eq!(source.enables.load(Ordering::SeqCst), 0);
        assert_eq!(capture.state(), crate::capture::CaptureState::Idle);
        assert_eq!(
            transcript,
            "Press any key to begin data collection or q to quit...\r\nExiting program now\r\n"
        );
    }

    #[test]
    fn single_session_reports_bins_in_order() {
        let capture: CaptureController<4> = CaptureController::new();
        let source = RecordingSource::default();
        let (summary, transcript) =
            run_with_edges(&capture, &source, b"xk123Q", &[&EDGES]);

        assert_eq!(summary, RunSummary { completed: 1, aborted: 0 });
        assert!(transcript.contains("Collecting data\r\nData collection complete.\r\n"));
        assert!(transcript.contains(
            "Period in micro-seconds : occurances\r\n------------------------------------\r\n999:1\r\n1000:2\r\n1001:1\r\n------------------------------------\r\n"
        ));
        assert!(transcript.ends_with("Press any key to repeat or q to quit...\r\nExiting program now\r\n"));
        assert_eq!(capture.state(), crate::capture::CaptureState::Idle);
    }

    #[test]
    fn repeated_session_matches_fresh_one() {
        let capture: CaptureController<4> = CaptureController::new();
        let source = RecordingSource::default();
        let (summary, transcript) =
            run_with_edges(&capture, &source, b"xk123rk123q", &[&EDGES, &EDGES]);

        assert_eq!(summary, RunSummary { completed: 2, aborted: 0 });
        assert_eq!(transcript.matches(REPORT).count(), 2);
        assert!(!transcript.contains("1000:4"));
    }

    #[test]
    fn out_of_range_session_is_discarded() {
        let capture: CaptureController<4> = CaptureController::new();
        let source = RecordingSource::default();
        let wide: &[u16] = &[0, 1000, 2000, 3000, 10_000, 10_001];
        let (summary, transcript) =
            run_with_edges(&capture, &source, b"xrk123q", &[wide, &EDGES]);

        assert_eq!(summary, RunSummary { completed: 1, aborted: 1 });
        assert!(transcript.contains(
            "Histogram aborted: sample 3 is 7000 ticks, outside [950, 1050)\r\nSession discarded.\r\n"
        ));
        assert_eq!(transcript.matches(REPORT).count(), 1);
    }

    #[test]
    fn progress_dots_follow_busy_wait_cadence() {
        let capture: CaptureController<4> = CaptureController::new();
        let source = RecordingSource::default();
        let config = SessionConfig {
            progress_interval: 1,
            ..SessionConfig::default()
        };
        let transcript = std::thread::scope(|scope| {
            scope.spawn(|| {
                while !source.enabled.load(Ordering::SeqCst) {
                    std::hint::spin_loop();
                }
                std::thread::sleep(std::time::Duration::from_millis(5));
                for tick in EDGES {
                    capture.on_edge_captured(tick, &source);
                }
            });
            let mut session: SessionLoop<'_, 4, 100, _, _> =
                SessionLoop::new(&capture, &source, ScriptedTerminal::new(b"k123"), config);
            session.run_session().unwrap();
            session.end_session();
            session.into_terminal().transcript()
        });
        assert!(transcript.starts_with("Collecting data."));
    }
}
