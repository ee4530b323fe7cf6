//! Blocking byte terminal used for operator prompts and report output.

use core::fmt;

/// A byte-in/byte-out serial terminal.
///
/// Both operations block until the transfer is possible and never fail;
/// a stuck line stalls the caller.
pub trait Terminal {
    /// Sends one byte, waiting for the transmitter to become ready.
    fn put_char(&mut self, byte: u8);

    /// Waits for and returns the next received byte.
    fn get_char(&mut self) -> u8;

    /// Sends a string, expanding `\n` to `\r\n`.
    fn put_str(&mut self, s: &str) {
        for byte in s.bytes() {
            if byte == b'\n' {
                self.put_char(b'\r');
            }
            self.put_char(byte);
        }
    }
}

impl<T: Terminal + ?Sized> Terminal for &mut T {
    fn put_char(&mut self, byte: u8) {
        (**self).put_char(byte)
    }

    fn get_char(&mut self) -> u8 {
        (**self).get_char()
    }
}

/// Adapts a [`Terminal`] to `core::fmt::Write` so reports can use `write!`.
pub struct TerminalWriter<'a, T: Terminal + ?Sized>(pub &'a mut T);

impl<T: Terminal + ?Sized> fmt::Write for TerminalWriter<'_, T> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.put_str(s);
        Ok(())
    }
}
