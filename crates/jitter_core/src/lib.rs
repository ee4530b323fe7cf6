//! Core period capture and histogram pipeline.
//!
//! This crate provides the interrupt-side capture state machine, the
//! fixed-range histogram and the operator session sequencer, together with
//! the timer and terminal contracts they run against. Nothing here
//! allocates: all storage is sized by const generics so it can live in
//! statics on the firmware and be exercised unchanged by the host simulator.

#![cfg_attr(not(test), no_std)]

use core::fmt;

/// Edge-capture state machine producing period samples.
///
/// Shared between the capture interrupt handler and the foreground loop.
/// Phase transitions are published through atomics so each context knows
/// when it owns the sample window.
pub mod capture;

/// Fixed-capacity, append-only storage for interrupt-filled data.
pub mod fixed_buffer;

/// Occurrence table binning period samples over a fixed range.
pub mod histogram;

/// Operator session sequencer: arm, collect, aggregate, report, reset.
pub mod session;

/// Blocking byte terminal contract and formatting adapter.
pub mod terminal;

/// Timer tick types, wraparound arithmetic and the capture timer contract.
pub mod tick;

/// Error types returned by capture and aggregation operations.
///
/// None of these are fatal to the program: the session loop reports the
/// error, discards the session and offers the operator another run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureError {
    /// A captured period falls outside the histogram range.
    ///
    /// `index` is the position of the sample within the session. The
    /// histogram is left empty.
    OutOfRangeSample {
        index: usize,
        sample: u16,
        lower: u16,
        upper: u16,
    },

    /// A fixed-size buffer has reached its capacity limit.
    BufferOverflow,

    /// The capture controller is collecting, or its samples are still
    /// borrowed, so it cannot be armed or reset.
    SessionInProgress,

    /// The histogram range is empty or wider than the table.
    InvalidRange { lower: u16, upper: u16 },
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            CaptureError::OutOfRangeSample {
                index,
                sample,
                lower,
                upper,
            } => write!(
                f,
                "sample {} is {} ticks, outside [{}, {})",
                index, sample, lower, upper
            ),
            CaptureError::BufferOverflow => f.write_str("sample buffer full"),
            CaptureError::SessionInProgress => f.write_str("capture session in progress"),
            CaptureError::InvalidRange { lower, upper } => {
                write!(f, "invalid histogram range [{}, {})", lower, upper)
            }
        }
    }
}
