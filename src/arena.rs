//! Growable bump-pointer arena with block-chained backing.
//!
//! ```text
//!   Arena (blocks oldest → youngest, capacities never shrink)
//!
//!   ┌────────────┐   ┌────────────────────┐   ┌──────────────────────────────┐
//!   │ 50 B, full │ → │ 100 B, full        │ → │ 200 B  [used | free      ]   │
//!   └────────────┘   └────────────────────┘   └──────────────▲───────────────┘
//!                                                            │
//!                                                       bump cursor
//! ```
//!
//! A request that does not fit the current block moves on to the next
//! retained block (after a reset or rewind) or asks the system for a new
//! one of `max(growth_factor × youngest, size + padding)` bytes.
//!
//! [`Arena::reset`] keeps every block and restarts from the oldest one, so
//! replaying an allocation sequence that fit before the reset returns the
//! same addresses without touching the system allocator.

use std::alloc::Layout;
use std::ptr::NonNull;
use std::slice;

use tracing::{debug, trace, warn};

use crate::align::assert_power_of_two;
use crate::block::Block;
use crate::config::ArenaConfig;
use crate::error::AllocError;

/// Bump allocation over memory that is released in bulk.
///
/// Implemented by [`Arena`] and [`StaticArena`](crate::static_arena::StaticArena);
/// [`radix_sort_with`](crate::algo::radix_sort_with) draws its scratch buffer
/// through this trait.
pub trait BumpAlloc {
    /// Allocates `size` bytes aligned to `align`, or `None` when exhausted.
    ///
    /// # Panics
    ///
    /// Panics if `align` is not a power of two.
    fn alloc(&mut self, size: usize, align: usize) -> Option<NonNull<u8>>;

    /// Releases every allocation at once.
    fn reset(&mut self);

    fn alloc_layout(&mut self, layout: Layout) -> Option<NonNull<u8>> {
        self.alloc(layout.size(), layout.align())
    }

    /// Allocates a zero-filled byte slice borrowed from the allocator.
    fn alloc_bytes(&mut self, len: usize, align: usize) -> Option<&mut [u8]> {
        let ptr = self.alloc(len, align)?;
        // SAFETY: the allocator just vended `len` writable bytes at `ptr`,
        // which stay valid until the next reset. Resetting needs `&mut self`,
        // so the returned borrow cannot outlive them.
        unsafe {
            ptr.as_ptr().write_bytes(0, len);
            Some(slice::from_raw_parts_mut(ptr.as_ptr(), len))
        }
    }
}

/// A saved bump position, restored with [`Arena::rewind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArenaMark {
    block: usize,
    used: usize,
}

/// Growable arena allocator.
///
/// Pointers it returns stay valid until the next [`reset`](Self::reset),
/// [`rewind`](Self::rewind) past them, or until the arena is dropped.
#[derive(Debug)]
pub struct Arena {
    /// Oldest first. Every block after `current` has nothing in use.
    blocks: Vec<Block>,
    current: usize,
    config: ArenaConfig,
}

impl Arena {
    /// Creates an arena whose first block holds `initial_capacity` bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use stratum::Arena;
    ///
    /// let mut arena = Arena::new(64).unwrap();
    /// let ptr = arena.alloc(24, 8).unwrap();
    /// assert_eq!(ptr.as_ptr() as usize % 8, 0);
    /// ```
    pub fn new(initial_capacity: usize) -> Result<Self, AllocError> {
        Self::with_config(ArenaConfig::new(initial_capacity))
    }

    pub fn with_config(config: ArenaConfig) -> Result<Self, AllocError> {
        config.validate()?;

        let Some(first) = Block::allocate(config.initial_capacity, config.block_align) else {
            warn!(
                capacity = config.initial_capacity,
                "system allocator refused initial arena block"
            );
            return Err(AllocError::OutOfMemory {
                requested: config.initial_capacity,
            });
        };

        debug!(
            capacity = config.initial_capacity,
            growth_factor = config.growth_factor,
            "arena created"
        );

        Ok(Self {
            blocks: vec![first],
            current: 0,
            config,
        })
    }

    /// Allocates `size` bytes aligned to `align`.
    ///
    /// Returns `None` only when the system allocator refuses a new block;
    /// nothing is partially allocated in that case.
    ///
    /// # Panics
    ///
    /// Panics if `align` is not a power of two.
    #[track_caller]
    pub fn alloc(&mut self, size: usize, align: usize) -> Option<NonNull<u8>> {
        assert_power_of_two(align);

        if let Some(ptr) = self.blocks[self.current].bump(size, align) {
            return Some(ptr);
        }

        // Blocks kept from before a reset or rewind are reused in order.
        while self.current + 1 < self.blocks.len() {
            self.current += 1;
            if let Some(ptr) = self.blocks[self.current].bump(size, align) {
                return Some(ptr);
            }
        }

        self.grow(size, align)
    }

    fn grow(&mut self, size: usize, align: usize) -> Option<NonNull<u8>> {
        let youngest = self
            .blocks
            .last()
            .map_or(self.config.initial_capacity, Block::capacity);
        let padding = align.saturating_sub(self.config.block_align);
        let needed = size.checked_add(padding)?;
        let capacity = self.config.next_capacity(youngest).max(needed);

        let Some(block) = Block::allocate(capacity, self.config.block_align) else {
            warn!(capacity, "system allocator refused arena block");
            return None;
        };

        trace!(capacity, blocks = self.blocks.len() + 1, "arena grew");
        self.blocks.push(block);
        self.current = self.blocks.len() - 1;
        self.blocks[self.current].bump(size, align)
    }

    /// Releases every allocation while keeping all blocks for reuse.
    pub fn reset(&mut self) {
        self.blocks.iter_mut().for_each(Block::reset);
        self.current = 0;
        debug!(
            blocks = self.blocks.len(),
            capacity = self.capacity(),
            "arena reset"
        );
    }

    /// Returns every block to the system allocator.
    ///
    /// Equivalent to dropping the arena.
    pub fn destroy(self) {
        debug!(blocks = self.blocks.len(), "arena destroyed");
    }

    /// Saves the current bump position.
    pub fn mark(&self) -> ArenaMark {
        ArenaMark {
            block: self.current,
            used: self.blocks[self.current].used(),
        }
    }

    /// Releases everything allocated since `mark` was taken.
    ///
    /// # Panics
    ///
    /// Panics if `mark` refers to a block this arena does not have.
    #[track_caller]
    pub fn rewind(&mut self, mark: ArenaMark) {
        assert!(
            mark.block < self.blocks.len(),
            "arena mark does not belong to this arena"
        );
        self.blocks[mark.block + 1..]
            .iter_mut()
            .for_each(Block::reset);
        self.blocks[mark.block].set_used(mark.used);
        self.current = mark.block;
    }

    /// Runs `f` and then releases whatever it allocated.
    ///
    /// ```
    /// use stratum::Arena;
    ///
    /// let mut arena = Arena::new(128).unwrap();
    /// let before = arena.used();
    /// arena.scope(|arena| {
    ///     arena.alloc(64, 8).unwrap();
    /// });
    /// assert_eq!(arena.used(), before);
    /// ```
    pub fn scope<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let mark = self.mark();
        let out = f(self);
        self.rewind(mark);
        out
    }

    /// Bytes consumed across all blocks, alignment padding included.
    pub fn used(&self) -> usize {
        self.blocks.iter().map(Block::used).sum()
    }

    /// Bytes reserved from the system across all blocks.
    pub fn capacity(&self) -> usize {
        self.blocks.iter().map(Block::capacity).sum()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if `ptr` points into one of the arena's blocks.
    pub fn contains(&self, ptr: *const u8) -> bool {
        self.blocks.iter().any(|block| block.contains(ptr))
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }
}

impl BumpAlloc for Arena {
    fn alloc(&mut self, size: usize, align: usize) -> Option<NonNull<u8>> {
        Arena::alloc(self, size, align)
    }

    fn reset(&mut self) {
        Arena::reset(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    #[test]
    fn test_alloc_is_aligned() {
        let mut arena = Arena::new(256).unwrap();
        for align in [1, 2, 4, 8, 16, 32, 64, 128] {
            let ptr = arena.alloc(3, align).unwrap();
            assert_eq!(ptr.as_ptr() as usize % align, 0, "align {align}");
        }
    }

    #[test]
    fn test_grows_with_non_decreasing_blocks() {
        let config = ArenaConfig::new(16).with_growth_factor(1.5);
        let mut arena = Arena::with_config(config).unwrap();

        for _ in 0..200 {
            arena.alloc(8, 8).unwrap();
        }

        assert!(arena.block_count() > 1);
        let caps: Vec<usize> = arena.blocks.iter().map(Block::capacity).collect();
        assert!(caps.windows(2).all(|w| w[0] <= w[1]), "{caps:?}");
        assert!(arena.used() <= arena.capacity());
    }

    #[test]
    fn test_oversized_request_gets_its_own_block() {
        let mut arena = Arena::new(16).unwrap();
        let ptr = arena.alloc(1000, 256).unwrap();
        assert_eq!(ptr.as_ptr() as usize % 256, 0);
        assert!(arena.blocks.last().unwrap().capacity() >= 1000);
    }

    #[test]
    fn test_values_survive_growth() {
        let mut arena = Arena::new(32).unwrap();
        let ptrs: Vec<NonNull<u8>> = (0..64u64)
            .map(|i| {
                let ptr = arena.alloc(8, 8).unwrap();
                unsafe { ptr.cast::<u64>().write(i * 3) };
                ptr
            })
            .collect();

        for (i, ptr) in ptrs.iter().enumerate() {
            assert_eq!(unsafe { ptr.cast::<u64>().read() }, i as u64 * 3);
        }
    }

    #[test]
    fn test_reset_replays_addresses() {
        let mut arena = Arena::new(50).unwrap();
        let sizes = [7usize, 33, 1, 64, 9, 120, 3, 500, 16];

        let first: Vec<usize> = sizes
            .iter()
            .map(|&s| arena.alloc(s, 8).unwrap().as_ptr() as usize)
            .collect();
        let blocks = arena.block_count();

        arena.reset();
        assert_eq!(arena.used(), 0);

        let second: Vec<usize> = sizes
            .iter()
            .map(|&s| arena.alloc(s, 8).unwrap().as_ptr() as usize)
            .collect();

        assert_eq!(first, second);
        assert_eq!(arena.block_count(), blocks);
    }

    #[test]
    fn test_rewind_releases_tail() {
        let mut arena = Arena::new(64).unwrap();
        arena.alloc(16, 8).unwrap();
        let mark = arena.mark();
        let used = arena.used();

        let spilled = arena.alloc(256, 8).unwrap();
        assert!(arena.block_count() > 1);

        arena.rewind(mark);
        assert_eq!(arena.used(), used);

        // The spilled block is kept and handed out again.
        arena.alloc(48, 8).unwrap();
        assert_eq!(arena.alloc(256, 8).unwrap(), spilled);
    }

    #[test]
    fn test_scope_returns_value() {
        let mut arena = Arena::new(64).unwrap();
        let len = arena.scope(|arena| arena.alloc_bytes(40, 1).unwrap().len());
        assert_eq!(len, 40);
        assert_eq!(arena.used(), 0);
    }

    #[test]
    fn test_alloc_bytes_is_zeroed_after_reuse() {
        let mut arena = Arena::new(64).unwrap();
        arena.alloc_bytes(32, 1).unwrap().fill(0xFF);
        arena.reset();
        assert!(arena.alloc_bytes(32, 1).unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_refused_block_returns_none() {
        let mut arena = Arena::new(64).unwrap();
        assert!(arena.alloc(usize::MAX / 2, 8).is_none());
        assert!(arena.alloc(usize::MAX, 1).is_none());
        // The arena is still usable afterwards.
        assert!(arena.alloc(8, 8).is_some());
    }

    #[test]
    fn test_invalid_config() {
        assert_eq!(
            Arena::new(0).unwrap_err(),
            AllocError::Config(ConfigError::ZeroCapacity)
        );
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn test_bad_alignment_is_fatal() {
        let mut arena = Arena::new(64).unwrap();
        arena.alloc(8, 3);
    }
}
