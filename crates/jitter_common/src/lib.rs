//! Common definitions and constants shared across the period histogram system.
//!
//! This module provides memory-mapped I/O addresses for the serial port and
//! input-capture timer, the fixed measurement configuration (tick rate,
//! sample count, histogram range), and the operator prompt texts used by
//! firmware and the host-side simulator alike.

#![no_std]

// Memory-mapped I/O address space definitions for the system-on-chip.
//
// Defines the physical address layout for the peripherals the firmware
// drives directly. These addresses must match the platform memory map and
// are only dereferenced by the firmware crate.
pub mod mmio {
    /// Base address of the 16550-compatible UART on QEMU's 'virt' machine.
    ///
    /// Used as the operator terminal. Registers are byte-wide at consecutive
    /// offsets (RBR/THR at 0, LSR at 5, etc.).
    pub const UART0_BASE: usize = 0x1000_0000;

    /// Base address of the input-capture timer block.
    ///
    /// A free-running 16-bit counter with a single capture channel that
    /// latches the counter value on a configured edge of the input pin and
    /// raises an interrupt through the PLIC.
    pub const CAPTURE_TIMER_BASE: usize = 0x1000_2000;

    /// Base address of the PLIC (Platform-Level Interrupt Controller).
    ///
    /// Routes external interrupt sources, including the capture timer, to
    /// the hart's machine external interrupt line.
    pub const PLIC_BASE: usize = 0x0C00_0000;

    /// Base address of main RAM.
    pub const RAM_BASE: usize = 0x8000_0000;
}

/// Fixed measurement configuration.
///
/// Capacity and histogram range are compile-time constants: storage for
/// both is sized from them and never reallocated.
pub mod config {
    /// Peripheral bus clock feeding the timer and the UART, in Hz.
    pub const BUS_CLK_FREQ: u32 = 2_000_000;

    /// Timer prescaler. Divides the bus clock down to the tick rate.
    pub const PRESCALE: u32 = 2;

    /// Capture timer tick rate in Hz. One tick is one microsecond.
    pub const TICK_RATE_HZ: u32 = BUS_CLK_FREQ / PRESCALE;

    /// Serial link speed (8 data bits, no parity, 1 stop bit).
    pub const BAUD_RATE: u32 = 9600;

    /// Number of period samples collected per session.
    pub const NUM_SAMPLES: usize = 1000;

    /// Inclusive lower bound of the histogram range, in ticks.
    pub const RANGE_LOWER: u16 = 950;

    /// Exclusive upper bound of the histogram range, in ticks.
    pub const RANGE_UPPER: u16 = 1050;

    /// Number of bins in the histogram table.
    pub const RANGE_SPREAD: usize = (RANGE_UPPER - RANGE_LOWER) as usize;

    /// Busy-wait iterations between progress dots while collecting.
    pub const PROGRESS_INTERVAL: u32 = 10_000;

    /// PLIC interrupt source id of the capture timer's channel 1.
    pub const CAPTURE_IRQ: u32 = 9;
}

/// Operator-facing texts written to the terminal.
///
/// Line terminators are added by the terminal writer, which expands `\n`
/// to `\r\n` for serial terminals.
pub mod prompt {
    pub const BEGIN: &str = "Press any key to begin data collection or q to quit...";
    pub const REPEAT: &str = "Press any key to repeat or q to quit...";
    pub const EXIT: &str = "Exiting program now";
    pub const COLLECTING: &str = "Collecting data";
    pub const PROGRESS: u8 = b'.';
    pub const COLLECTED: &str = "Data collection complete.";
    pub const COMPILING: &str = "Compiling histogram...";
    pub const COMPILED: &str = "Histogram compiled. Press any key to show results...";
    pub const REPORT_HEADER: &str = "Period in micro-seconds : occurances";
    pub const REPORT_RULE: &str = "------------------------------------";
    pub const ABORTED: &str = "Histogram aborted: ";
    pub const DISCARDED: &str = "Session discarded.";

    /// Returns true when the operator's keypress asks to quit.
    pub fn is_quit(key: u8) -> bool {
        key == b'q' || key == b'Q'
    }
}
