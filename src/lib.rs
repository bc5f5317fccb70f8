//! # Stratum
//!
//! `stratum` is a foundation library for programs that prefer explicit
//! control over memory: three bump/freelist allocators and a stable,
//! allocation-free LSD radix sort over fixed-size records.
//!
//! ## Key Features
//!
//! - **[`Arena`]**: growable bump allocator over a chain of blocks whose
//!   sizes never shrink. Reset keeps the blocks, so a repeated workload
//!   stops talking to the system allocator after its first run.
//! - **[`StaticArena`]**: the same bump allocator over a caller buffer. It
//!   never grows; exhaustion is reported as `None`.
//! - **[`Pool`]**: O(1) fixed-size slots over a caller buffer, with the
//!   freelist threaded through the free slots themselves.
//! - **[`radix_sort`]**: sorts records by a 1/2/4/8-byte key at any offset,
//!   for unsigned, signed and IEEE-754 keys, ascending or descending,
//!   using a caller-supplied scratch buffer for double-buffering.
//!
//! ## Usage
//!
//! ### Sorting records
//!
//! ```rust
//! use stratum::{radix_sort, KeyType, RecordLayout, SortOrder};
//!
//! // 8-byte records: [tag: u32][score: f32]
//! let rows: [(u32, f32); 3] = [(1, 2.5), (2, -1.0), (3, 0.25)];
//! let mut base: Vec<u8> = rows
//!     .iter()
//!     .flat_map(|(tag, score)| [tag.to_ne_bytes(), score.to_ne_bytes()].concat())
//!     .collect();
//! let mut scratch = vec![0u8; base.len()];
//!
//! radix_sort(
//!     &mut base,
//!     &mut scratch,
//!     rows.len(),
//!     RecordLayout::new(8, 4),
//!     KeyType::F32,
//!     SortOrder::Descending,
//! );
//!
//! let tags: Vec<u32> = base
//!     .chunks_exact(8)
//!     .map(|r| u32::from_ne_bytes([r[0], r[1], r[2], r[3]]))
//!     .collect();
//! assert_eq!(tags, vec![1, 3, 2]);
//! ```
//!
//! ### Arena allocation
//!
//! ```rust
//! use stratum::Arena;
//!
//! let mut arena = Arena::new(4096).unwrap();
//! let a = arena.alloc(128, 16).unwrap();
//! assert_eq!(a.as_ptr() as usize % 16, 0);
//!
//! arena.reset();
//! assert_eq!(arena.alloc(128, 16), Some(a)); // same memory, no new block
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   stratum
//!   ├── align         - power-of-two alignment arithmetic
//!   ├── config        - ArenaConfig
//!   ├── error         - ConfigError, AllocError, PoolError, SortError
//!   ├── arena         - Arena, ArenaMark, BumpAlloc
//!   ├── static_arena  - StaticArena
//!   ├── pool          - Pool
//!   ├── core          - KeyType, SortOrder, RecordLayout, RadixKey
//!   ├── transform     - sign/float digit transforms (DigitReader)
//!   ├── histogram     - DigitHistogram
//!   ├── algo          - radix_sort and friends
//!   └── ffi           - C ABI surface
//! ```
//!
//! ## Limitations
//!
//! - **Single-threaded**: no type here is `Send` or `Sync`.
//! - **Not a general-purpose heap**: arenas free in bulk, pools free
//!   fixed-size slots only.
//! - **Primitive keys only**: no multi-field or variable-length keys.

pub mod algo;
pub mod align;
pub mod arena;
mod block;
pub mod config;
pub mod core;
pub mod error;
pub mod ffi;
pub mod histogram;
pub mod pool;
pub mod static_arena;
pub mod transform;

pub use algo::{is_sorted, radix_sort, radix_sort_slice, radix_sort_with, try_radix_sort};
pub use arena::{Arena, ArenaMark, BumpAlloc};
pub use config::ArenaConfig;
pub use crate::core::{KeyType, RadixKey, RecordLayout, SortOrder};
pub use error::{AllocError, ConfigError, PoolError, SortError};
pub use pool::Pool;
pub use static_arena::StaticArena;

pub mod prelude {
    pub use crate::algo::{radix_sort, radix_sort_slice, radix_sort_with, try_radix_sort};
    pub use crate::arena::{Arena, BumpAlloc};
    pub use crate::core::{KeyType, RadixKey, RecordLayout, SortOrder};
    pub use crate::pool::Pool;
    pub use crate::static_arena::StaticArena;
}
