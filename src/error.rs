//! Error types for allocator construction and the checked sort entry point.
//!
//! Allocation itself never returns these: an exhausted arena or pool hands
//! back `None`, mirroring the null-pointer contract of the C surface.

use thiserror::Error;

/// Invalid [`ArenaConfig`](crate::config::ArenaConfig) values.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// The first block must hold at least one byte.
    #[error("initial arena capacity must be non-zero")]
    ZeroCapacity,

    /// Block sizes must never shrink, so the factor must be finite and `>= 1`.
    #[error("growth factor must be finite and at least 1.0, got {0}")]
    GrowthFactor(f64),

    /// Blocks are requested from the system with this alignment.
    #[error("block alignment must be a non-zero power of two, got {0}")]
    BlockAlign(usize),
}

/// Failures while setting up a growable [`Arena`](crate::arena::Arena).
#[derive(Clone, Debug, Error, PartialEq)]
pub enum AllocError {
    #[error("invalid arena configuration: {0}")]
    Config(#[from] ConfigError),

    /// The system allocator refused the initial block.
    #[error("system allocator refused a block of {requested} bytes")]
    OutOfMemory { requested: usize },
}

/// Failures while partitioning a caller buffer into a [`Pool`](crate::pool::Pool).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    /// Each free slot stores the next-pointer in its first machine word.
    #[error("slot size {slot_size} is smaller than a pointer ({min} bytes)")]
    SlotTooSmall { slot_size: usize, min: usize },

    #[error("pool must have at least one slot")]
    NoSlots,

    #[error("slot_size * slot_count overflows usize")]
    SizeOverflow,

    #[error("pool buffer holds {actual} bytes, {needed} required")]
    BufferTooSmall { needed: usize, actual: usize },

    #[error("pool buffer is not aligned to {align} bytes")]
    Misaligned { align: usize },
}

/// Which of the two sort buffers a [`SortError`] refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Buffer {
    Base,
    Scratch,
}

impl std::fmt::Display for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Base => f.write_str("base"),
            Self::Scratch => f.write_str("scratch"),
        }
    }
}

/// Precondition violations detected by [`try_radix_sort`](crate::algo::try_radix_sort).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SortError {
    #[error("record stride must be non-zero")]
    ZeroStride,

    #[error("key of {key_size} bytes at offset {key_offset} does not fit a {stride}-byte record")]
    KeyOutOfBounds {
        key_offset: usize,
        key_size: usize,
        stride: usize,
    },

    #[error("count * stride overflows usize")]
    SizeOverflow,

    #[error("count {0} does not fit in a signed 64-bit integer")]
    CountTooLarge(usize),

    #[error("{which} buffer holds {actual} bytes, {needed} required")]
    BufferTooSmall {
        which: Buffer,
        needed: usize,
        actual: usize,
    },

    #[error("unknown key type discriminant {0}")]
    UnknownKeyType(u32),

    #[error("unknown sort order discriminant {0}")]
    UnknownOrder(u32),

    /// The bound allocator could not provide the double buffer.
    #[error("allocator could not provide {bytes} bytes of scratch")]
    ScratchUnavailable { bytes: usize },
}
