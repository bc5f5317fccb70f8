use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::align::checked_align_up;

/// One contiguous region of backing memory with a bump cursor.
///
/// `used` never exceeds `capacity`. When `layout` is set the region came from
/// the system allocator with `layout` and is returned to it on drop;
/// otherwise it aliases a caller buffer and drop does nothing.
#[derive(Debug)]
pub(crate) struct Block {
    base: NonNull<u8>,
    capacity: usize,
    used: usize,
    layout: Option<Layout>,
}

impl Block {
    /// Requests a fresh block from the system allocator.
    ///
    /// Returns `None` if the layout is invalid or the allocator refuses.
    pub fn allocate(capacity: usize, align: usize) -> Option<Self> {
        let layout = Layout::from_size_align(capacity.max(1), align).ok()?;
        // SAFETY: `layout` has a non-zero size.
        let raw = unsafe { alloc::alloc(layout) };
        let base = NonNull::new(raw)?;
        Some(Self {
            base,
            capacity,
            used: 0,
            layout: Some(layout),
        })
    }

    /// Wraps caller memory without taking ownership of it.
    ///
    /// # Safety
    ///
    /// `base` must be valid for reads and writes of `capacity` bytes for as
    /// long as the block is used.
    pub const unsafe fn borrowed(base: NonNull<u8>, capacity: usize) -> Self {
        Self {
            base,
            capacity,
            used: 0,
            layout: None,
        }
    }

    /// Bumps the cursor past an aligned region of `size` bytes.
    ///
    /// Alignment is applied to the absolute address, so requests stricter
    /// than the block's own alignment still land correctly.
    pub fn bump(&mut self, size: usize, align: usize) -> Option<NonNull<u8>> {
        let cursor = (self.base.as_ptr() as usize).checked_add(self.used)?;
        let start = checked_align_up(cursor, align)?;
        let offset = self.used.checked_add(start - cursor)?;
        let end = offset.checked_add(size)?;
        if end > self.capacity {
            return None;
        }
        self.used = end;
        // SAFETY: `offset <= end <= capacity`, so the result stays inside
        // (or one past the end of) the block.
        Some(unsafe { self.base.add(offset) })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn used(&self) -> usize {
        self.used
    }

    /// Moves the cursor back to `used`. Callers only ever rewind.
    pub fn set_used(&mut self, used: usize) {
        debug_assert!(used <= self.capacity);
        self.used = used.min(self.capacity);
    }

    pub fn reset(&mut self) {
        self.used = 0;
    }

    pub fn contains(&self, ptr: *const u8) -> bool {
        let start = self.base.as_ptr() as usize;
        let addr = ptr as usize;
        addr >= start && addr - start < self.capacity
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        if let Some(layout) = self.layout {
            // SAFETY: the block was allocated in `Block::allocate` with this
            // exact layout and is released only here.
            unsafe { alloc::dealloc(self.base.as_ptr(), layout) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bump_respects_alignment() {
        let mut block = Block::allocate(256, 16).unwrap();

        let a = block.bump(3, 1).unwrap();
        let b = block.bump(8, 8).unwrap();
        let c = block.bump(1, 64).unwrap();

        assert_eq!(a, block.base);
        assert_eq!(b.as_ptr() as usize % 8, 0);
        assert_eq!(c.as_ptr() as usize % 64, 0);
        assert!(b.as_ptr() as usize >= a.as_ptr() as usize + 3);
        assert!(block.used() <= block.capacity());
    }

    #[test]
    fn test_bump_refuses_overflow() {
        let mut block = Block::allocate(16, 16).unwrap();
        assert!(block.bump(16, 1).is_some());
        assert!(block.bump(1, 1).is_none());
        assert_eq!(block.used(), 16);

        block.reset();
        assert_eq!(block.used(), 0);
        assert!(block.bump(usize::MAX, 1).is_none());
    }

    #[test]
    fn test_borrowed_block_leaves_buffer_alone() {
        let mut buffer = [0u8; 32];
        let base = NonNull::new(buffer.as_mut_ptr()).unwrap();
        {
            let mut block = unsafe { Block::borrowed(base, buffer.len()) };
            let ptr = block.bump(4, 1).unwrap();
            unsafe { ptr.as_ptr().write_bytes(0xAB, 4) };
            assert!(block.contains(ptr.as_ptr()));
        }
        assert_eq!(&buffer[..4], &[0xAB; 4]);
    }
}
