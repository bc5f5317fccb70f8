//! Aligned address arithmetic.
//!
//! Every allocator in this crate funnels its alignment math through these
//! helpers. Alignments must be non-zero powers of two; anything else is a
//! programmer error and panics.
//!
//! ```text
//!   align_down(13, 8)     align_up(13, 8)
//!          │                     │
//!          ▼                     ▼
//!   ───────┬────────────┬────────┬──────
//!          8     13 ▲           16
//! ```

/// Returns `true` if `align` is a non-zero power of two.
///
/// This is the sole validator for alignment arguments.
#[inline(always)]
pub const fn is_power_of_two(align: usize) -> bool {
    align != 0 && align & (align - 1) == 0
}

/// Panics unless `align` is a non-zero power of two.
#[inline(always)]
#[track_caller]
pub const fn assert_power_of_two(align: usize) {
    assert!(
        is_power_of_two(align),
        "alignment must be a non-zero power of two"
    );
}

/// Rounds `addr` up to the next multiple of `align`.
///
/// Returns `None` if the rounded address would not fit in a `usize`.
///
/// # Panics
///
/// Panics if `align` is not a power of two.
#[inline(always)]
#[track_caller]
pub const fn checked_align_up(addr: usize, align: usize) -> Option<usize> {
    assert_power_of_two(align);
    let mask = align - 1;
    match addr.checked_add(mask) {
        Some(bumped) => Some(bumped & !mask),
        None => None,
    }
}

/// Rounds `addr` up to the smallest multiple of `align` that is `>= addr`.
///
/// # Panics
///
/// Panics if `align` is not a power of two or the result overflows.
///
/// # Examples
///
/// ```
/// use stratum::align::align_up;
///
/// assert_eq!(align_up(13, 8), 16);
/// assert_eq!(align_up(16, 8), 16);
/// ```
#[inline(always)]
#[track_caller]
pub const fn align_up(addr: usize, align: usize) -> usize {
    match checked_align_up(addr, align) {
        Some(aligned) => aligned,
        None => panic!("align_up overflowed usize"),
    }
}

/// Rounds `addr` down to the largest multiple of `align` that is `<= addr`.
///
/// # Panics
///
/// Panics if `align` is not a power of two.
#[inline(always)]
#[track_caller]
pub const fn align_down(addr: usize, align: usize) -> usize {
    assert_power_of_two(align);
    addr & !(align - 1)
}

/// Returns `true` if `addr` is a multiple of `align`.
#[inline(always)]
#[track_caller]
pub const fn is_aligned(addr: usize, align: usize) -> bool {
    assert_power_of_two(align);
    addr & (align - 1) == 0
}
