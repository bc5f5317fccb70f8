//! Fixed-size object pool over a caller-supplied buffer.
//!
//! The buffer is cut into equal slots. Free slots form an intrusive
//! singly-linked list: the first machine word of each free slot holds the
//! address of the next free slot.
//!
//! ```text
//!   head
//!    │
//!    ▼
//!   ┌──────┬──────┬──────┬──────┬──────┐
//!   │ next─┼──►   │ live │ next─┼──► ∅ │
//!   └──────┴──┬───┴──────┴──▲───┴──────┘
//!             └─────────────┘
//! ```
//!
//! `alloc` pops the head and `free` pushes onto it, so the most recently
//! freed slot is the next one handed out.

use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};

use tracing::debug;

use crate::align::{checked_align_up, is_aligned};
use crate::error::PoolError;

/// Slot alignment: that of a pointer, since free slots store one.
pub const SLOT_ALIGN: usize = mem::align_of::<*mut u8>();

/// Smallest usable slot size.
pub const MIN_SLOT_SIZE: usize = mem::size_of::<*mut u8>();

/// Freelist allocator of fixed-size slots.
///
/// # Examples
///
/// ```
/// use stratum::Pool;
///
/// let mut buffer = [0u64; 4];
/// let bytes = unsafe {
///     std::slice::from_raw_parts_mut(buffer.as_mut_ptr().cast::<u8>(), 32)
/// };
/// let mut pool = Pool::new(8, 4, bytes).unwrap();
///
/// let a = pool.alloc().unwrap();
/// pool.free(a);
/// assert_eq!(pool.alloc(), Some(a));
/// ```
#[derive(Debug)]
pub struct Pool<'a> {
    base: NonNull<u8>,
    slot_size: usize,
    slot_count: usize,
    head: Option<NonNull<u8>>,
    live: usize,
    _buffer: PhantomData<&'a mut [u8]>,
}

impl<'a> Pool<'a> {
    /// Partitions `buffer` into `slot_count` slots of `slot_size` bytes.
    ///
    /// `slot_size` is rounded up to [`SLOT_ALIGN`]; the buffer must hold
    /// `slot_count` rounded slots and be pointer-aligned.
    pub fn new(
        slot_size: usize,
        slot_count: usize,
        buffer: &'a mut [u8],
    ) -> Result<Self, PoolError> {
        let len = buffer.len();
        let base = NonNull::from(buffer).cast::<u8>();
        // SAFETY: `base` comes from a live `&'a mut [u8]` of `len` bytes.
        unsafe { Self::from_raw_parts(slot_size, slot_count, base, len) }
    }

    /// Builds a pool over raw memory.
    ///
    /// # Safety
    ///
    /// `base` must be valid for reads and writes of `len` bytes for `'a`,
    /// and nothing else may access that memory except through slots the
    /// pool hands out.
    pub unsafe fn from_raw_parts(
        slot_size: usize,
        slot_count: usize,
        base: NonNull<u8>,
        len: usize,
    ) -> Result<Self, PoolError> {
        if slot_size < MIN_SLOT_SIZE {
            return Err(PoolError::SlotTooSmall {
                slot_size,
                min: MIN_SLOT_SIZE,
            });
        }
        if slot_count == 0 {
            return Err(PoolError::NoSlots);
        }

        let slot_size = checked_align_up(slot_size, SLOT_ALIGN).ok_or(PoolError::SizeOverflow)?;
        let needed = slot_size
            .checked_mul(slot_count)
            .ok_or(PoolError::SizeOverflow)?;
        if len < needed {
            return Err(PoolError::BufferTooSmall {
                needed,
                actual: len,
            });
        }
        if !is_aligned(base.as_ptr() as usize, SLOT_ALIGN) {
            return Err(PoolError::Misaligned { align: SLOT_ALIGN });
        }

        let mut pool = Self {
            base,
            slot_size,
            slot_count,
            head: None,
            live: 0,
            _buffer: PhantomData,
        };

        // Thread back to front so the list runs in address order.
        for index in (0..slot_count).rev() {
            let slot = pool.slot(index);
            // SAFETY: `slot` lies inside the validated buffer.
            unsafe { pool.push(slot) };
        }

        debug!(slot_size, slot_count, "pool created");
        Ok(pool)
    }

    fn slot(&self, index: usize) -> NonNull<u8> {
        debug_assert!(index < self.slot_count);
        // SAFETY: `index * slot_size < slot_count * slot_size <= len`.
        unsafe { self.base.add(index * self.slot_size) }
    }

    /// Writes the current head into `slot` and makes `slot` the head.
    ///
    /// # Safety
    ///
    /// `slot` must be a slot boundary of this pool that nobody else is using.
    unsafe fn push(&mut self, slot: NonNull<u8>) {
        let next = self.head.map_or(ptr::null_mut(), NonNull::as_ptr);
        // SAFETY: slots are pointer-aligned and at least a pointer wide.
        unsafe { slot.cast::<*mut u8>().write(next) };
        self.head = Some(slot);
    }

    /// Pops a free slot, or returns `None` if every slot is live.
    ///
    /// The slot's contents are unspecified, including the bytes that held
    /// the freelist link.
    pub fn alloc(&mut self) -> Option<NonNull<u8>> {
        let slot = self.head?;
        // SAFETY: `slot` is free, so its first word is a link written by `push`.
        let next = unsafe { slot.cast::<*mut u8>().read() };
        self.head = NonNull::new(next);
        self.live += 1;
        Some(slot)
    }

    /// Returns `ptr` to the pool; it becomes the next slot handed out.
    ///
    /// # Panics
    ///
    /// Panics if `ptr` is not a slot boundary inside this pool's buffer.
    /// Freeing a slot twice is not detected and corrupts the freelist.
    #[track_caller]
    pub fn free(&mut self, ptr: NonNull<u8>) {
        assert!(
            self.slot_index(ptr.as_ptr()).is_some(),
            "pointer {ptr:p} was not vended by this pool"
        );
        debug_assert!(self.live > 0, "free with no live slots");
        // SAFETY: `ptr` is a slot boundary inside the buffer.
        unsafe { self.push(ptr) };
        self.live = self.live.saturating_sub(1);
    }

    /// Invalidates the pool. The buffer is not freed.
    pub fn destroy(self) {
        debug!(live = self.live, "pool destroyed");
    }

    /// Index of the slot starting at `ptr`, if `ptr` is a slot boundary.
    pub fn slot_index(&self, ptr: *const u8) -> Option<usize> {
        let offset = (ptr as usize).checked_sub(self.base.as_ptr() as usize)?;
        let index = offset / self.slot_size;
        (offset % self.slot_size == 0 && index < self.slot_count).then_some(index)
    }

    /// Returns `true` if `ptr` points anywhere inside the pool's slots.
    pub fn contains(&self, ptr: *const u8) -> bool {
        (ptr as usize)
            .checked_sub(self.base.as_ptr() as usize)
            .is_some_and(|offset| offset < self.slot_size * self.slot_count)
    }

    /// Slot size after rounding to [`SLOT_ALIGN`].
    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    pub fn live(&self) -> usize {
        self.live
    }

    pub fn available(&self) -> usize {
        self.slot_count - self.live
    }
}
