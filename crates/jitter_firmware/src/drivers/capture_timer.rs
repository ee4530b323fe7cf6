//! Input-capture timer driver.
//!
//! The timer block runs a free-running 16-bit counter off the bus clock
//! through a prescaler. Channel 1 latches the counter into its capture
//! register on each rising edge of the input pin, sets its flag bit and,
//! when enabled, raises `CAPTURE_IRQ` at the PLIC. The flag is cleared by
//! writing 1 to it.

use jitter_common::config::PRESCALE;
use jitter_common::mmio::CAPTURE_TIMER_BASE;
use jitter_core::tick::{EdgeTick, TickSource};

/// Timer enable (bit 0) and prescaler (bits 8..16).
const REG_CONTROL: usize = 0x00;
/// Free-running counter.
const REG_COUNTER: usize = 0x04;
/// Edge selection for channel 1.
const REG_EDGE_SELECT: usize = 0x08;
/// Counter value latched at the last channel 1 edge.
const REG_CAPTURE: usize = 0x0C;
/// Pending flags, write 1 to clear.
const REG_FLAGS: usize = 0x10;
/// Interrupt enable mask.
const REG_IRQ_ENABLE: usize = 0x14;

const CONTROL_ENABLE: u32 = 1;
const CONTROL_PRESCALE_SHIFT: u32 = 8;
const EDGE_RISING: u32 = 0b01;
const CHANNEL_1: u32 = 1 << 1;

#[inline(always)]
fn read_reg(offset: usize) -> u32 {
    unsafe { ((CAPTURE_TIMER_BASE + offset) as *const u32).read_volatile() }
}

#[inline(always)]
fn write_reg(offset: usize, value: u32) {
    unsafe { ((CAPTURE_TIMER_BASE + offset) as *mut u32).write_volatile(value) }
}

/// Handle to the capture timer registers.
///
/// Zero-sized: the foreground and the trap handler each construct their
/// own handle to the same peripheral.
#[derive(Clone, Copy)]
pub struct CaptureTimer;

impl CaptureTimer {
    /// Starts the counter at `TICK_RATE_HZ` with rising-edge capture on
    /// channel 1. The capture interrupt stays masked until a session arms it.
    pub fn init(&self) {
        write_reg(REG_CONTROL, PRESCALE << CONTROL_PRESCALE_SHIFT);
        write_reg(REG_COUNTER, 0);
        write_reg(REG_EDGE_SELECT, EDGE_RISING);
        write_reg(REG_IRQ_ENABLE, 0);
        write_reg(REG_FLAGS, CHANNEL_1);
        write_reg(REG_CONTROL, (PRESCALE << CONTROL_PRESCALE_SHIFT) | CONTROL_ENABLE);
    }

    /// Counter value latched at the most recent edge.
    #[inline(always)]
    pub fn captured_tick(&self) -> EdgeTick {
        (read_reg(REG_CAPTURE) & 0xFFFF) as EdgeTick
    }
}

impl TickSource for CaptureTimer {
    fn now(&self) -> EdgeTick {
        (read_reg(REG_COUNTER) & 0xFFFF) as EdgeTick
    }

    fn set_capture_enabled(&self, enabled: bool) {
        let mask = read_reg(REG_IRQ_ENABLE);
        let mask = if enabled {
            mask | CHANNEL_1
        } else {
            mask & !CHANNEL_1
        };
        write_reg(REG_IRQ_ENABLE, mask);
    }

    fn acknowledge_capture(&self) {
        write_reg(REG_FLAGS, CHANNEL_1);
    }
}
