//! Byte-radix digit histogram.
//!
//! One pass over the records counts how many carry each of the 256
//! possible digits; an exclusive prefix sum then turns the counts into the
//! first output slot of each bucket.

use cuneiform::cuneiform;

use crate::transform::DigitReader;

/// Number of buckets for a byte-wise radix (one per byte value).
pub const RADIX_BUCKETS: usize = 256;

/// Cache-aligned digit counts with 64-bit entries.
///
/// Before [`prefix_sum`](Self::prefix_sum) entry `i` is the number of
/// records whose digit is `i`; afterwards it is the number of records whose
/// digit is strictly less than `i`.
#[cuneiform]
pub struct DigitHistogram {
    counts: [u64; RADIX_BUCKETS],
}

impl DigitHistogram {
    pub fn new() -> Self {
        Self {
            counts: [0; RADIX_BUCKETS],
        }
    }

    /// Counts the digit `reader` extracts from each `stride`-byte record.
    ///
    /// A trailing partial record is ignored.
    pub fn count(&mut self, records: &[u8], stride: usize, reader: &DigitReader) {
        records.chunks_exact(stride).for_each(|record| {
            self.counts[reader.read(record) as usize] += 1;
        });
    }

    /// Builds a histogram over `records` in one call.
    pub fn build(records: &[u8], stride: usize, reader: &DigitReader) -> Self {
        let mut histogram = Self::new();
        histogram.count(records, stride, reader);
        histogram
    }

    /// Returns `true` if all `total` records share one digit, in which case
    /// scattering on this digit would not move anything.
    pub fn is_degenerate(&self, total: u64) -> bool {
        self.counts.iter().any(|&count| count == total)
    }

    /// Replaces each count with the sum of the counts before it.
    pub fn prefix_sum(&mut self) {
        let mut sum = 0u64;
        self.counts.iter_mut().for_each(|entry| {
            let count = *entry;
            *entry = sum;
            sum += count;
        });
    }

    /// Claims the next output slot for `digit` after [`prefix_sum`](Self::prefix_sum).
    #[inline(always)]
    pub fn next_slot(&mut self, digit: u8) -> usize {
        let entry = &mut self.counts[digit as usize];
        let slot = *entry;
        *entry += 1;
        slot as usize
    }

    pub fn get(&self, digit: u8) -> u64 {
        self.counts[digit as usize]
    }

    pub fn as_slice(&self) -> &[u64; RADIX_BUCKETS] {
        &self.counts
    }
}

impl Default for DigitHistogram {
    fn default() -> Self {
        Self::new()
    }
}
