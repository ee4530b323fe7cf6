//! Fixed-range occurrence table over period samples.

use crate::CaptureError;
use crate::tick::PeriodSample;

/// Occurrence counts for sample values in `[lower, upper)`.
///
/// The table holds `BINS` counters inline and is reused for every session.
/// Samples are binned at `sample - lower`; the offset is validated as a
/// signed value before it is used as an index, so a sample outside the
/// range is reported instead of landing in a neighbouring bin.
pub struct HistogramAggregator<const BINS: usize> {
    counts: [u32; BINS],
    lower: u16,
    total: u32,
}

impl<const BINS: usize> Default for HistogramAggregator<BINS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const BINS: usize> HistogramAggregator<BINS> {
    pub const fn new() -> Self {
        Self {
            counts: [0; BINS],
            lower: 0,
            total: 0,
        }
    }

    /// Bins every sample into the table.
    ///
    /// Returns the number of samples counted. Any previous contents are
    /// discarded first. If a sample is out of range, or the range itself is
    /// empty or wider than the table, the table is left cleared and the
    /// error describes the offending value.
    pub fn build(
        &mut self,
        samples: &[PeriodSample],
        lower: u16,
        upper: u16,
    ) -> Result<u32, CaptureError> {
        self.reset();
        if upper <= lower || usize::from(upper - lower) > BINS {
            return Err(CaptureError::InvalidRange { lower, upper });
        }
        self.lower = lower;

        let span = i32::from(upper) - i32::from(lower);
        for (index, &sample) in samples.iter().enumerate() {
            let offset = i32::from(sample) - i32::from(lower);
            if !(0..span).contains(&offset) {
                self.reset();
                return Err(CaptureError::OutOfRangeSample {
                    index,
                    sample,
                    lower,
                    upper,
                });
            }
            // span <= BINS, so the offset is a valid index.
            self.counts[offset as usize] += 1;
            self.total += 1;
        }
        Ok(self.total)
    }

    /// Non-empty bins as `(value, count)` pairs in ascending value order.
    pub fn report(&self) -> impl Iterator<Item = (u16, u32)> + '_ {
        let lower = self.lower;
        self.counts
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count > 0)
            .map(move |(bin, &count)| (lower + bin as u16, count))
    }

    /// Sum of all bin counts.
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Count recorded for one sample value; zero outside the table.
    pub fn count_of(&self, value: u16) -> u32 {
        value
            .checked_sub(self.lower)
            .and_then(|offset| self.counts.get(usize::from(offset)))
            .copied()
            .unwrap_or(0)
    }

    /// Clears every bin.
    pub fn reset(&mut self) {
        self.counts.fill(0);
        self.total = 0;
    }
}
