//! Stable LSD radix sort over strided records.
//!
//! Records are fixed-size byte blocks with a primitive key at a fixed
//! offset. Each pass sorts by one key byte, least significant first:
//!
//! 1. Count the transformed digit of every record ([`DigitHistogram`]).
//! 2. Turn the counts into bucket start offsets (exclusive prefix sum).
//! 3. Scatter whole records into the other buffer in input order, which
//!    keeps records with equal digits in their relative order.
//! 4. Swap the roles of the two buffers.
//!
//! A pass whose histogram puts every record into one bucket would copy the
//! records unchanged, so it is skipped. If the sorted records end up in the
//! scratch buffer they are copied back at the end.
//!
//! The main entry points are [`radix_sort`] and [`try_radix_sort`].

use std::mem;
use std::slice;

use tracing::{debug, trace};

use crate::arena::BumpAlloc;
use crate::core::{KeyType, RadixKey, RecordLayout, SortOrder};
use crate::error::{Buffer, SortError};
use crate::histogram::DigitHistogram;
use crate::transform::{DigitReader, key_bits, ordered_bits};

/// Alignment of scratch buffers drawn from an allocator.
const SCRATCH_ALIGN: usize = 16;

/// Sorts `count` records in `base` by their `key_type` key.
///
/// `scratch` must hold at least `count * layout.stride` bytes; its contents
/// afterwards are unspecified. The sort is stable and never allocates.
///
/// # Panics
///
/// Panics on any precondition violation reported by [`try_radix_sort`].
///
/// # Examples
///
/// ```
/// use stratum::{radix_sort, KeyType, RecordLayout, SortOrder};
///
/// let keys: [i32; 4] = [7, -3, 0, -40];
/// let mut base: Vec<u8> = keys.iter().flat_map(|k| k.to_ne_bytes()).collect();
/// let mut scratch = vec![0u8; base.len()];
///
/// radix_sort(
///     &mut base,
///     &mut scratch,
///     keys.len(),
///     RecordLayout::packed(KeyType::I32),
///     KeyType::I32,
///     SortOrder::Ascending,
/// );
///
/// let sorted: Vec<i32> = base
///     .chunks_exact(4)
///     .map(|b| i32::from_ne_bytes(b.try_into().unwrap()))
///     .collect();
/// assert_eq!(sorted, vec![-40, -3, 0, 7]);
/// ```
#[track_caller]
pub fn radix_sort(
    base: &mut [u8],
    scratch: &mut [u8],
    count: usize,
    layout: RecordLayout,
    key_type: KeyType,
    order: SortOrder,
) {
    if let Err(err) = try_radix_sort(base, scratch, count, layout, key_type, order) {
        panic!("radix_sort: {err}");
    }
}

/// Checked form of [`radix_sort`]: validates the layout and buffer sizes
/// before touching any data.
///
/// `base` and `scratch` may be longer than `count` records; only the
/// leading `count * layout.stride` bytes are used.
pub fn try_radix_sort(
    base: &mut [u8],
    scratch: &mut [u8],
    count: usize,
    layout: RecordLayout,
    key_type: KeyType,
    order: SortOrder,
) -> Result<(), SortError> {
    let bytes = layout.byte_len(count, key_type)?;
    check_len(Buffer::Base, base.len(), bytes)?;
    check_len(Buffer::Scratch, scratch.len(), bytes)?;

    debug!(
        count,
        stride = layout.stride,
        key_offset = layout.key_offset,
        ?key_type,
        ?order,
        "radix sort"
    );

    if count < 2 {
        return Ok(());
    }

    lsd_sort(
        &mut base[..bytes],
        &mut scratch[..bytes],
        count,
        layout,
        key_type,
        order,
    );
    Ok(())
}

fn check_len(which: Buffer, actual: usize, needed: usize) -> Result<(), SortError> {
    if actual < needed {
        return Err(SortError::BufferTooSmall {
            which,
            needed,
            actual,
        });
    }
    Ok(())
}

/// Runs every byte pass over exactly `count` records in `base`.
fn lsd_sort(
    base: &mut [u8],
    scratch: &mut [u8],
    count: usize,
    layout: RecordLayout,
    key_type: KeyType,
    order: SortOrder,
) {
    let stride = layout.stride;
    let mut src: &mut [u8] = base;
    let mut dst: &mut [u8] = scratch;
    let mut in_scratch = false;

    for significance in 0..key_type.width() {
        let reader = DigitReader::new(key_type, order, layout.key_offset, significance);
        let mut histogram = DigitHistogram::build(src, stride, &reader);

        if histogram.is_degenerate(count as u64) {
            trace!(significance, "skipping radix pass with a single bucket");
            continue;
        }

        histogram.prefix_sum();
        scatter(src, dst, stride, &reader, &mut histogram);
        mem::swap(&mut src, &mut dst);
        in_scratch = !in_scratch;
    }

    if in_scratch {
        // `src` holds the result in scratch; `dst` is the caller's base.
        dst.copy_from_slice(src);
    }
}

/// Moves every record of `src` to its bucket slot in `dst`.
fn scatter(
    src: &[u8],
    dst: &mut [u8],
    stride: usize,
    reader: &DigitReader,
    histogram: &mut DigitHistogram,
) {
    src.chunks_exact(stride).for_each(|record| {
        let start = histogram.next_slot(reader.read(record)) * stride;
        dst[start..start + stride].copy_from_slice(record);
    });
}

/// Sorts with a scratch buffer drawn from `alloc`.
///
/// The scratch allocation is left in place; release it with the
/// allocator's reset.
///
/// ```
/// use stratum::{radix_sort_with, Arena, KeyType, RecordLayout, SortOrder};
///
/// let mut arena = Arena::new(1024).unwrap();
/// let mut base = vec![3u8, 1, 2];
///
/// radix_sort_with(
///     &mut arena,
///     &mut base,
///     3,
///     RecordLayout::packed(KeyType::U8),
///     KeyType::U8,
///     SortOrder::Descending,
/// )
/// .unwrap();
///
/// assert_eq!(base, vec![3, 2, 1]);
/// ```
pub fn radix_sort_with<A: BumpAlloc + ?Sized>(
    alloc: &mut A,
    base: &mut [u8],
    count: usize,
    layout: RecordLayout,
    key_type: KeyType,
    order: SortOrder,
) -> Result<(), SortError> {
    let bytes = layout.byte_len(count, key_type)?;
    check_len(Buffer::Base, base.len(), bytes)?;

    let scratch = alloc
        .alloc_bytes(bytes, SCRATCH_ALIGN)
        .ok_or(SortError::ScratchUnavailable { bytes })?;
    try_radix_sort(base, scratch, count, layout, key_type, order)
}

/// Sorts a slice of primitive keys, allocating its own scratch buffer.
///
/// # Examples
///
/// ```
/// use stratum::{radix_sort_slice, SortOrder};
///
/// let mut data = vec![2.5f64, -1.0, f64::INFINITY, -0.0, 0.0];
/// radix_sort_slice(&mut data, SortOrder::Ascending);
///
/// assert_eq!(data[0], -1.0);
/// assert!(data[1].is_sign_negative() && data[1] == 0.0);
/// assert_eq!(data[4], f64::INFINITY);
/// ```
pub fn radix_sort_slice<K: RadixKey>(data: &mut [K], order: SortOrder) {
    let count = data.len();
    if count < 2 {
        return;
    }

    let bytes = mem::size_of_val(data);
    // SAFETY: `RadixKey` is sealed to primitives with no padding and no
    // invalid bit patterns. The sort only permutes whole keys, so every
    // element still holds a valid `K` afterwards.
    let base = unsafe { slice::from_raw_parts_mut(data.as_mut_ptr().cast::<u8>(), bytes) };
    let mut scratch = vec![0u8; bytes];

    radix_sort(
        base,
        &mut scratch,
        count,
        RecordLayout::packed(K::KEY_TYPE),
        K::KEY_TYPE,
        order,
    );
}

/// Checks whether `count` records in `records` are ordered by their key.
///
/// Floats are compared by IEEE total order, so NaNs must sit at the ends
/// where [`radix_sort`] leaves them (negative NaNs first, positive last).
pub fn is_sorted(
    records: &[u8],
    count: usize,
    layout: RecordLayout,
    key_type: KeyType,
    order: SortOrder,
) -> Result<bool, SortError> {
    let bytes = layout.byte_len(count, key_type)?;
    check_len(Buffer::Base, records.len(), bytes)?;

    let keys = records[..bytes]
        .chunks_exact(layout.stride)
        .map(|record| ordered_bits(key_type, key_bits(key_type, record, layout.key_offset)));

    Ok(match order {
        SortOrder::Ascending => keys.is_sorted_by(|a, b| a <= b),
        SortOrder::Descending => keys.is_sorted_by(|a, b| a >= b),
    })
}
