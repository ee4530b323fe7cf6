//! Operator terminal over the process's stdin and stdout.

use jitter_core::terminal::Terminal;
use std::io::{self, Read, Write};

/// Blocking terminal on stdio.
///
/// Stdin is line-buffered on most hosts, so line terminators are skipped
/// and the first other byte of a line counts as the keypress. End of input
/// reads as `q` so a piped script always terminates the operator loop.
pub struct StdioTerminal {
    stdin: io::Stdin,
    stdout: io::Stdout,
}

impl Default for StdioTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl StdioTerminal {
    pub fn new() -> Self {
        Self {
            stdin: io::stdin(),
            stdout: io::stdout(),
        }
    }
}

impl Terminal for StdioTerminal {
    fn put_char(&mut self, byte: u8) {
        let mut out = self.stdout.lock();
        if out.write_all(&[byte]).and_then(|_| out.flush()).is_err() {
            tracing::debug!("stdout closed, dropping output");
        }
    }

    fn get_char(&mut self) -> u8 {
        let _ = self.stdout.lock().flush();
        let mut input = self.stdin.lock();
        let mut byte = [0u8; 1];
        loop {
            match input.read(&mut byte) {
                Ok(0) => return b'q',
                Ok(_) if byte[0] == b'\n' || byte[0] == b'\r' => continue,
                Ok(_) => return byte[0],
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    tracing::warn!(%err, "stdin read failed, treating as quit");
                    return b'q';
                }
            }
        }
    }
}
