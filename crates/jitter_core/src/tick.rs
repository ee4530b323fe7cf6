//! Timer tick types and the capture timer contract.

/// Counter snapshot latched by the capture hardware at a rising edge.
///
/// The counter is 16 bits wide and wraps from `u16::MAX` back to zero.
pub type EdgeTick = u16;

/// Elapsed ticks between two consecutive captured edges.
pub type PeriodSample = u16;

/// Computes the period between two edge ticks modulo 2^16.
///
/// A single counter rollover between the edges is absorbed by the wrapping
/// subtraction, so `(65530, 5)` yields 11 rather than an underflowed value.
#[inline(always)]
pub fn period_between(previous: EdgeTick, current: EdgeTick) -> PeriodSample {
    current.wrapping_sub(previous)
}

/// A free-running timer with one edge-capture channel.
///
/// All methods take `&self`: on hardware they are volatile register
/// accesses, and both the interrupt context and the foreground hold a
/// handle to the same peripheral.
pub trait TickSource {
    /// Current value of the free-running counter.
    fn now(&self) -> EdgeTick;

    /// Enables or disables the edge-capture interrupt.
    fn set_capture_enabled(&self, enabled: bool);

    /// Clears the pending edge-capture flag.
    ///
    /// Must be called once for every capture event delivered, including
    /// spurious ones, or the interrupt fires again immediately.
    fn acknowledge_capture(&self);
}

impl<S: TickSource + ?Sized> TickSource for &S {
    fn now(&self) -> EdgeTick {
        (**self).now()
    }

    fn set_capture_enabled(&self, enabled: bool) {
        (**self).set_capture_enabled(enabled)
    }

    fn acknowledge_capture(&self) {
        (**self).acknowledge_capture()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_absorbs_counter_rollover() {
        assert_eq!(period_between(65530, 5), 11);
        assert_eq!(period_between(u16::MAX, 0), 1);
    }

    #[test]
    fn period_without_rollover() {
        assert_eq!(period_between(2000, 2999), 999);
        assert_eq!(period_between(42, 42), 0);
    }
}
