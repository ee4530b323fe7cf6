use crate::console::StdioTerminal;
use crate::signal::{self, SignalGenerator, SimulatedTimer};
use anyhow::{Result, anyhow};
use jitter_common::config::{NUM_SAMPLES, RANGE_SPREAD};
use jitter_core::capture::CaptureController;
use jitter_core::session::{SessionConfig, SessionLoop};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Process-lifetime capture storage, as on the target.
static CAPTURE: CaptureController<NUM_SAMPLES> = CaptureController::new();

/// Runs the operator loop on stdio against a simulated input signal.
///
/// A dedicated thread stands in for the capture interrupt and feeds edges
/// into the shared controller whenever capture is enabled; the calling
/// thread is the foreground loop.
pub fn run_interactive(
    period: u16,
    jitter: u16,
    seed: u64,
    edge_interval_us: u64,
    progress_interval: u32,
) -> Result<()> {
    tracing::info!(
        period,
        jitter,
        seed,
        edge_interval_us,
        "starting simulated capture"
    );

    let timer = Arc::new(SimulatedTimer::new());
    let running = Arc::new(AtomicBool::new(true));

    let irq = {
        let timer = timer.clone();
        let running = running.clone();
        let signal = SignalGenerator::new(period, jitter, seed);
        let interval = Duration::from_micros(edge_interval_us);
        thread::Builder::new()
            .name("capture-irq".into())
            .spawn(move || signal::drive_edges(&CAPTURE, &timer, signal, interval, &running))?
    };

    let config = SessionConfig {
        progress_interval,
        ..SessionConfig::default()
    };
    let mut session: SessionLoop<'_, NUM_SAMPLES, RANGE_SPREAD, _, _> =
        SessionLoop::new(&CAPTURE, &*timer, StdioTerminal::new(), config);
    let summary = session.run();

    running.store(false, Ordering::Relaxed);
    irq.join().map_err(|_| anyhow!("capture thread panicked"))?;

    tracing::info!(
        completed = summary.completed,
        aborted = summary.aborted,
        acknowledged = timer.acknowledged(),
        "operator loop finished"
    );
    Ok(())
}
