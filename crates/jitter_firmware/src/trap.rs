//! RISC-V trap and interrupt handler.
//!
//! Machine external interrupts are drained from the PLIC; capture timer
//! interrupts are forwarded to the global capture controller. Everything
//! else is ignored.

use crate::CAPTURE;
use crate::drivers::capture_timer::CaptureTimer;
use crate::drivers::plic;
use jitter_common::config::CAPTURE_IRQ;
use riscv::register::mcause;

/// Interrupt code of the machine external interrupt in `mcause`.
const MACHINE_EXTERNAL: usize = 11;

/// Trap handler called from the assembly trap vector.
///
/// Runs with interrupts disabled, so the capture handler never nests on
/// itself. It must stay short: no printing, no waiting on peripherals.
///
/// # Safety
///
/// Exported unmangled for the trap vector in `entry.S`, which saves the
/// caller-saved registers around the call. Must not be called from Rust.
#[unsafe(no_mangle)]
pub extern "C" fn rust_trap_handler() {
    let cause = mcause::read();
    if !cause.is_interrupt() || cause.code() != MACHINE_EXTERNAL {
        return;
    }

    while let Some(irq) = plic::claim() {
        if irq == CAPTURE_IRQ {
            let timer = CaptureTimer;
            CAPTURE.on_edge_captured(timer.captured_tick(), &timer);
        }
        plic::complete(irq);
    }
}
