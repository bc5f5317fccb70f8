//! Sign and float transforms that make an unsigned byte-radix sort order
//! signed integers and IEEE-754 floats correctly.
//!
//! Transforms are applied while reading digits; record bytes are never
//! rewritten. For each key type the transformed key is:
//!
//! | key      | sign bit clear          | sign bit set            |
//! |----------|-------------------------|-------------------------|
//! | unsigned | identity                | identity                |
//! | signed   | top byte `^ 0x80`       | top byte `^ 0x80`       |
//! | float    | top byte `^ 0x80`       | every byte `^ 0xFF`     |
//!
//! Descending order then inverts every digit (`255 - digit`). The order of
//! the two steps is fixed: type transform first, inversion second. Because
//! the type transform is monotonic over the whole key and inversion is
//! monotonically decreasing per byte, every key type sorts correctly in
//! both directions, including mixed-sign floats.
//!
//! For floats the result is the IEEE total order used by
//! [`f64::total_cmp`]: `-NaN < -∞ < … < -0 < +0 < … < +∞ < +NaN`.

use crate::core::{KeyType, SortOrder};

/// Physical position of the byte with the given significance inside a
/// `width`-byte key stored in native byte order.
#[inline(always)]
pub const fn byte_index(significance: usize, width: usize) -> usize {
    if cfg!(target_endian = "little") {
        significance
    } else {
        width - 1 - significance
    }
}

/// Extracts one transformed digit per record for a single radix pass.
///
/// The masks are resolved once per pass from the key type, so reading a
/// digit is two byte loads, a select and two XORs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DigitReader {
    /// Offset of the digit byte within the record.
    byte: usize,
    /// Offset of the key's most significant byte within the record.
    sign_byte: usize,
    nonneg_mask: u8,
    neg_mask: u8,
    invert: u8,
}

impl DigitReader {
    /// Reader for the byte of `significance` (0 = least significant) of a
    /// `key_type` key starting `key_offset` bytes into each record.
    ///
    /// # Panics
    ///
    /// Panics if `significance >= key_type.width()`.
    #[track_caller]
    pub fn new(
        key_type: KeyType,
        order: SortOrder,
        key_offset: usize,
        significance: usize,
    ) -> Self {
        let width = key_type.width();
        assert!(
            significance < width,
            "byte {significance} out of range for a {width}-byte key"
        );

        let top = significance == width - 1;
        let (nonneg_mask, neg_mask) = if key_type.is_float() {
            (if top { 0x80 } else { 0x00 }, 0xFF)
        } else if key_type.is_signed_int() && top {
            (0x80, 0x80)
        } else {
            (0x00, 0x00)
        };

        Self {
            byte: key_offset + byte_index(significance, width),
            sign_byte: key_offset + byte_index(width - 1, width),
            nonneg_mask,
            neg_mask,
            invert: match order {
                SortOrder::Ascending => 0x00,
                SortOrder::Descending => 0xFF,
            },
        }
    }

    /// Reader that returns the raw byte at `byte` with no transform.
    pub const fn identity(byte: usize) -> Self {
        Self {
            byte,
            sign_byte: byte,
            nonneg_mask: 0,
            neg_mask: 0,
            invert: 0,
        }
    }

    /// Transformed digit of `record`.
    #[inline(always)]
    pub fn read(&self, record: &[u8]) -> u8 {
        let mask = if record[self.sign_byte] & 0x80 == 0 {
            self.nonneg_mask
        } else {
            self.neg_mask
        };
        record[self.byte] ^ mask ^ self.invert
    }
}

/// Reads the `key_type` key at `key_offset` in `record` as raw bits,
/// zero-extended to 64 bits.
///
/// # Panics
///
/// Panics if the key does not fit in `record`.
pub fn key_bits(key_type: KeyType, record: &[u8], key_offset: usize) -> u64 {
    let raw = &record[key_offset..key_offset + key_type.width()];
    match key_type.width() {
        1 => u64::from(raw[0]),
        2 => u64::from(u16::from_ne_bytes([raw[0], raw[1]])),
        4 => u64::from(u32::from_ne_bytes([raw[0], raw[1], raw[2], raw[3]])),
        _ => u64::from_ne_bytes([
            raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7],
        ]),
    }
}

/// Whole-key form of the digit transform: maps raw key bits to an unsigned
/// value whose natural order is the key's order.
///
/// Byte `s` of the result equals the ascending [`DigitReader`] digit of
/// significance `s`.
pub fn ordered_bits(key_type: KeyType, bits: u64) -> u64 {
    let width_bits = key_type.width() as u32 * 8;
    let mask = u64::MAX >> (64 - width_bits);
    let sign = 1u64 << (width_bits - 1);
    let bits = bits & mask;

    if key_type.is_float() {
        if bits & sign == 0 { bits ^ sign } else { !bits & mask }
    } else if key_type.is_signed_int() {
        bits ^ sign
    } else {
        bits
    }
}
