//! Hardware driver modules for firmware peripherals.
//!
//! Each driver wraps the memory-mapped registers of one peripheral behind
//! volatile accesses.

pub mod capture_timer;
pub mod plic;
