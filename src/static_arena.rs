//! Fixed-capacity bump arena over a caller-supplied buffer.
//!
//! [`StaticArena`] never grows: once the buffer is exhausted `alloc`
//! returns `None`. It owns no memory, so destroying it leaves the buffer
//! untouched.

use std::marker::PhantomData;
use std::ptr::NonNull;

use tracing::debug;

use crate::align::assert_power_of_two;
use crate::arena::BumpAlloc;
use crate::block::Block;

/// Bump allocator over a borrowed byte buffer.
///
/// # Examples
///
/// ```
/// use stratum::StaticArena;
///
/// let mut buffer = [0u8; 64];
/// let mut arena = StaticArena::new(&mut buffer);
///
/// assert!(arena.alloc(48, 8).is_some());
/// assert!(arena.alloc(32, 8).is_none()); // exhausted, never grows
///
/// arena.reset();
/// assert!(arena.alloc(32, 8).is_some());
/// ```
#[derive(Debug)]
pub struct StaticArena<'a> {
    block: Block,
    _buffer: PhantomData<&'a mut [u8]>,
}

impl<'a> StaticArena<'a> {
    pub fn new(buffer: &'a mut [u8]) -> Self {
        let len = buffer.len();
        let base = NonNull::from(buffer).cast::<u8>();
        // SAFETY: `base` comes from a live `&'a mut [u8]` of `len` bytes that
        // the arena borrows for `'a`.
        unsafe { Self::from_raw_parts(base, len) }
    }

    /// Builds an arena over raw memory.
    ///
    /// # Safety
    ///
    /// `base` must be valid for reads and writes of `len` bytes for `'a`,
    /// and nothing else may access that memory while the arena hands it out.
    pub unsafe fn from_raw_parts(base: NonNull<u8>, len: usize) -> Self {
        debug!(capacity = len, "static arena created");
        Self {
            // SAFETY: forwarded from the caller.
            block: unsafe { Block::borrowed(base, len) },
            _buffer: PhantomData,
        }
    }

    /// Allocates `size` bytes aligned to `align`, or `None` if the buffer
    /// cannot fit them.
    ///
    /// # Panics
    ///
    /// Panics if `align` is not a power of two.
    #[track_caller]
    pub fn alloc(&mut self, size: usize, align: usize) -> Option<NonNull<u8>> {
        assert_power_of_two(align);
        self.block.bump(size, align)
    }

    pub fn reset(&mut self) {
        self.block.reset();
    }

    /// Invalidates the arena. The buffer is not freed.
    pub fn destroy(self) {
        debug!(capacity = self.block.capacity(), "static arena destroyed");
    }

    /// Saves the current bump offset.
    pub fn mark(&self) -> usize {
        self.block.used()
    }

    /// Releases everything allocated since [`mark`](Self::mark) returned `mark`.
    pub fn rewind(&mut self, mark: usize) {
        debug_assert!(mark <= self.block.used(), "rewind past the cursor");
        self.block.set_used(mark.min(self.block.used()));
    }

    pub fn used(&self) -> usize {
        self.block.used()
    }

    pub fn capacity(&self) -> usize {
        self.block.capacity()
    }

    pub fn remaining(&self) -> usize {
        self.block.capacity() - self.block.used()
    }

    pub fn contains(&self, ptr: *const u8) -> bool {
        self.block.contains(ptr)
    }
}

impl BumpAlloc for StaticArena<'_> {
    fn alloc(&mut self, size: usize, align: usize) -> Option<NonNull<u8>> {
        StaticArena::alloc(self, size, align)
    }

    fn reset(&mut self) {
        StaticArena::reset(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhaustion_returns_none() {
        let mut buffer = [0u8; 32];
        let mut arena = StaticArena::new(&mut buffer);

        for _ in 0..4 {
            assert!(arena.alloc(8, 1).is_some());
        }
        assert!(arena.alloc(1, 1).is_none());
        assert_eq!(arena.remaining(), 0);
    }

    #[test]
    fn test_alignment_is_by_address() {
        let mut buffer = [0u64; 16];
        let bytes = unsafe {
            std::slice::from_raw_parts_mut(buffer.as_mut_ptr().cast::<u8>(), 128)
        };
        let mut arena = StaticArena::new(bytes);

        arena.alloc(1, 1).unwrap();
        let ptr = arena.alloc(4, 32).unwrap();
        assert_eq!(ptr.as_ptr() as usize % 32, 0);
        assert!(arena.contains(ptr.as_ptr()));
    }

    #[test]
    fn test_reset_reuses_same_addresses() {
        let mut buffer = [0u8; 64];
        let mut arena = StaticArena::new(&mut buffer);
        let first = arena.alloc(16, 4).unwrap();
        arena.alloc(16, 4).unwrap();

        arena.reset();
        assert_eq!(arena.used(), 0);
        assert_eq!(arena.alloc(16, 4).unwrap(), first);
    }

    #[test]
    fn test_mark_and_rewind() {
        let mut buffer = [0u8; 64];
        let mut arena = StaticArena::new(&mut buffer);
        arena.alloc(10, 1).unwrap();
        let mark = arena.mark();
        arena.alloc(40, 1).unwrap();
        arena.rewind(mark);
        assert_eq!(arena.used(), 10);
    }

    #[test]
    fn test_destroy_keeps_buffer() {
        let mut buffer = [0u8; 16];
        {
            let mut arena = StaticArena::new(&mut buffer);
            let ptr = arena.alloc(4, 1).unwrap();
            unsafe { ptr.as_ptr().write_bytes(7, 4) };
            arena.destroy();
        }
        assert_eq!(&buffer[..4], &[7, 7, 7, 7]);
    }

    #[test]
    fn test_empty_buffer() {
        let mut buffer: [u8; 0] = [];
        let mut arena = StaticArena::new(&mut buffer);
        assert!(arena.alloc(1, 1).is_none());
        assert!(arena.alloc(0, 1).is_some());
    }
}
