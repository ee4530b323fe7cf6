#![no_std]
#![no_main]

use core::arch::global_asm;
use drivers::capture_timer::CaptureTimer;
use drivers::plic;
use jitter_common::config::{
    CAPTURE_IRQ, NUM_SAMPLES, RANGE_LOWER, RANGE_SPREAD, RANGE_UPPER, TICK_RATE_HZ,
};
use jitter_core::capture::CaptureController;
use jitter_core::session::{SessionConfig, SessionLoop};
use panic_halt as _;
use riscv::register::{mie, mstatus};

mod console;
mod drivers;
mod trap;

global_asm!(include_str!("entry.S"));

/// Capture state shared by the trap handler and the operator loop.
pub static CAPTURE: CaptureController<NUM_SAMPLES> = CaptureController::new();

/// Entry point for hart 0, called from `entry.S` with a stack and a trap
/// vector installed. Other harts are parked before reaching here.
#[unsafe(no_mangle)]
pub extern "C" fn kmain() -> ! {
    console::init();
    console::println!("[BOOT] Core 0 Online");

    let timer = CaptureTimer;
    timer.init();
    plic::enable(CAPTURE_IRQ);
    unsafe {
        mie::set_mext();
        mstatus::set_mie();
    }
    console::println!(
        "[BOOT] Capture timer {} Hz, {} samples, range [{}, {})",
        TICK_RATE_HZ,
        NUM_SAMPLES,
        RANGE_LOWER,
        RANGE_UPPER
    );

    let mut session: SessionLoop<'_, NUM_SAMPLES, RANGE_SPREAD, _, _> =
        SessionLoop::new(&CAPTURE, timer, console::Uart, SessionConfig::default());
    let summary = session.run();

    console::println!(
        "[HALT] {} sessions completed, {} aborted",
        summary.completed,
        summary.aborted
    );
    loop {
        unsafe { riscv::asm::wfi() };
    }
}
