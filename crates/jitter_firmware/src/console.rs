//! UART console and operator terminal.
//!
//! Drives the 16550-compatible UART on QEMU's virt machine with polled I/O:
//! every transmit waits for the holding register to empty and every receive
//! waits for data ready. There is no timeout, so a disconnected line stalls
//! the caller.

use core::fmt;
use jitter_common::config::{BAUD_RATE, BUS_CLK_FREQ};
use jitter_common::mmio::UART0_BASE;
use jitter_core::terminal::Terminal;

/// Receive buffer (read) / transmit holding (write) register.
const RBR_THR: usize = 0;
/// Divisor latch low byte, while DLAB is set.
const DLL: usize = 0;
/// Divisor latch high byte, while DLAB is set.
const DLM: usize = 1;
/// FIFO control register.
const FCR: usize = 2;
/// Line control register.
const LCR: usize = 3;
/// Line status register.
const LSR: usize = 5;

const LCR_DLAB: u8 = 0x80;
/// 8 data bits, no parity, 1 stop bit.
const LCR_8N1: u8 = 0x03;
const FCR_ENABLE_AND_CLEAR: u8 = 0x07;
const LSR_DATA_READY: u8 = 0x01;
const LSR_THR_EMPTY: u8 = 0x20;

/// Baud rate divisor: bus clock / (16 * baud).
const DIVISOR: u32 = BUS_CLK_FREQ / (16 * BAUD_RATE);

#[inline(always)]
fn read_reg(offset: usize) -> u8 {
    unsafe { ((UART0_BASE + offset) as *const u8).read_volatile() }
}

#[inline(always)]
fn write_reg(offset: usize, value: u8) {
    unsafe { ((UART0_BASE + offset) as *mut u8).write_volatile(value) }
}

/// Polled UART device.
///
/// Implements [`Terminal`] for the operator loop and `fmt::Write` for the
/// boot log.
pub struct Uart;

impl Terminal for Uart {
    fn put_char(&mut self, byte: u8) {
        while read_reg(LSR) & LSR_THR_EMPTY == 0 {
            core::hint::spin_loop();
        }
        write_reg(RBR_THR, byte);
    }

    fn get_char(&mut self) -> u8 {
        while read_reg(LSR) & LSR_DATA_READY == 0 {
            core::hint::spin_loop();
        }
        read_reg(RBR_THR)
    }
}

impl fmt::Write for Uart {
    /// Writes a string, converting `\n` to `\r\n` for serial terminals.
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.put_str(s);
        Ok(())
    }
}

/// Programs the UART for 8N1 at `BAUD_RATE`.
pub fn init() {
    write_reg(LCR, LCR_DLAB);
    write_reg(DLL, (DIVISOR & 0xFF) as u8);
    write_reg(DLM, ((DIVISOR >> 8) & 0xFF) as u8);
    write_reg(LCR, LCR_8N1);
    write_reg(FCR, FCR_ENABLE_AND_CLEAR);
}

/// Internal function for printing formatted arguments.
///
/// Called by the println! macro. Must not be used from the trap handler:
/// the capture interrupt never blocks on the UART.
#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
    use fmt::Write;
    let _ = Uart.write_fmt(args);
}

/// Macro for printing a line to the console.
///
/// # Example
///
/// ```ignore
/// println!("Value: {}", 42);
/// ```
#[macro_export]
macro_rules! println {
    ($($arg:tt)*) => ({
        $crate::console::_print(format_args!($($arg)*));
        $crate::console::_print(format_args!("\n"));
    });
}
pub use println;
