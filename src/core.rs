//! Core types for the radix sort.
//!
//! This module defines:
//! - [`KeyType`]: the ten primitive key encodings the sort understands.
//! - [`SortOrder`]: ascending or descending.
//! - [`RecordLayout`]: where the key lives inside each fixed-size record.
//! - [`RadixKey`]: maps a Rust primitive to its [`KeyType`].

use crate::error::SortError;

/// Encoding of the key field, stored in native byte order.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyType {
    U8 = 0,
    I8 = 1,
    U16 = 2,
    I16 = 3,
    U32 = 4,
    I32 = 5,
    U64 = 6,
    I64 = 7,
    /// IEEE-754 binary32.
    F32 = 8,
    /// IEEE-754 binary64.
    F64 = 9,
}

impl KeyType {
    pub const ALL: [KeyType; 10] = [
        KeyType::U8,
        KeyType::I8,
        KeyType::U16,
        KeyType::I16,
        KeyType::U32,
        KeyType::I32,
        KeyType::U64,
        KeyType::I64,
        KeyType::F32,
        KeyType::F64,
    ];

    /// Key width in bytes; also the number of radix passes.
    pub const fn width(self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
        }
    }

    /// Two's-complement integer keys.
    pub const fn is_signed_int(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }
}

impl TryFrom<u32> for KeyType {
    type Error = SortError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .get(raw as usize)
            .copied()
            .ok_or(SortError::UnknownKeyType(raw))
    }
}

#[repr(u32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SortOrder {
    #[default]
    Ascending = 0,
    Descending = 1,
}

impl TryFrom<u32> for SortOrder {
    type Error = SortError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Self::Ascending),
            1 => Ok(Self::Descending),
            other => Err(SortError::UnknownOrder(other)),
        }
    }
}

/// Shape of the records being sorted: every record is `stride` bytes and
/// its key starts `key_offset` bytes in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordLayout {
    pub stride: usize,
    pub key_offset: usize,
}

impl RecordLayout {
    pub const fn new(stride: usize, key_offset: usize) -> Self {
        Self { stride, key_offset }
    }

    /// Layout of a bare key array: the record is the key.
    pub const fn packed(key_type: KeyType) -> Self {
        Self::new(key_type.width(), 0)
    }

    /// Checks that a `key_type` key fits every record and returns the byte
    /// length of `count` records.
    pub fn byte_len(&self, count: usize, key_type: KeyType) -> Result<usize, SortError> {
        if self.stride == 0 {
            return Err(SortError::ZeroStride);
        }
        let key_end = self.key_offset.checked_add(key_type.width());
        if key_end.is_none_or(|end| end > self.stride) {
            return Err(SortError::KeyOutOfBounds {
                key_offset: self.key_offset,
                key_size: key_type.width(),
                stride: self.stride,
            });
        }
        if i64::try_from(count).is_err() {
            return Err(SortError::CountTooLarge(count));
        }
        count
            .checked_mul(self.stride)
            .ok_or(SortError::SizeOverflow)
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A primitive that can be sorted directly by
/// [`radix_sort_slice`](crate::algo::radix_sort_slice).
///
/// Implemented for every integer and float type that has a [`KeyType`].
/// Sealed: each implementor is plain old data with no padding and no
/// invalid bit patterns.
pub trait RadixKey: Copy + sealed::Sealed {
    const KEY_TYPE: KeyType;
}

macro_rules! radix_key {
    ($($ty:ty => $key:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl RadixKey for $ty {
                const KEY_TYPE: KeyType = KeyType::$key;
            }
        )*
    };
}

radix_key! {
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    u64 => U64,
    i64 => I64,
    f32 => F32,
    f64 => F64,
}
