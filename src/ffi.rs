//! C ABI entry points.
//!
//! Each allocator is reached through a caller-owned [`Handle`], a single
//! pointer-sized cell (`void*` on the C side). Create/init functions fill
//! the cell and return a [`Status`]; destroy functions free the header and
//! null the cell. Allocation functions return null on exhaustion.
//!
//! Programmer errors (non-power-of-two alignment, freeing a foreign pointer,
//! undersized or overlapping sort buffers) panic, and a panic cannot unwind
//! through `extern "C"`, so the process aborts.
//!
//! ```c
//! void *arena = NULL;
//! if (arena_init(&arena, 4096) != 0) { /* handle error */ }
//! double *xs = arena_alloc(&arena, 16 * sizeof(double), _Alignof(double));
//! arena_reset(&arena);
//! arena_destroy(&arena);
//! ```

use std::ptr::{self, NonNull};
use std::slice;

use crate::algo::radix_sort as sort_records;
use crate::arena::Arena;
use crate::core::{KeyType, RecordLayout, SortOrder};
use crate::error::{AllocError, PoolError, SortError};
use crate::pool::Pool;
use crate::static_arena::StaticArena;

/// C-compatible status code returned by create/init functions.
///
/// `Ok` = 0, all errors are negative. Values are ABI-stable.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Ok = 0,
    /// An argument is null, out of range, or otherwise invalid.
    InvalidArgument = -1,
    /// The system allocator refused the initial block.
    AllocationFailed = -2,
}

impl From<&AllocError> for Status {
    fn from(err: &AllocError) -> Self {
        match err {
            AllocError::Config(_) => Self::InvalidArgument,
            AllocError::OutOfMemory { .. } => Self::AllocationFailed,
        }
    }
}

impl From<&PoolError> for Status {
    fn from(_: &PoolError) -> Self {
        Self::InvalidArgument
    }
}

/// Caller-owned cell pointing at a heap-allocated allocator header.
#[repr(C)]
#[derive(Debug)]
pub struct Handle<T> {
    inner: *mut T,
}

impl<T> Handle<T> {
    pub const fn null() -> Self {
        Self {
            inner: ptr::null_mut(),
        }
    }

    pub fn is_null(&self) -> bool {
        self.inner.is_null()
    }
}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Self::null()
    }
}

/// Stores `value` behind the handle, or nulls the handle on error.
///
/// # Safety
///
/// `handle` must be null or valid for writes.
unsafe fn install<T>(handle: *mut Handle<T>, value: Result<T, Status>) -> Status {
    // SAFETY: forwarded from the caller.
    let Some(handle) = (unsafe { handle.as_mut() }) else {
        return Status::InvalidArgument;
    };
    match value {
        Ok(value) => {
            handle.inner = Box::into_raw(Box::new(value));
            Status::Ok
        }
        Err(status) => {
            handle.inner = ptr::null_mut();
            status
        }
    }
}

/// Borrows the header behind a live handle.
///
/// # Safety
///
/// `handle` must be null or point at a handle filled by this module.
unsafe fn resolve<'h, T>(handle: *mut Handle<T>) -> Option<&'h mut T> {
    // SAFETY: forwarded from the caller.
    let handle = unsafe { handle.as_mut() }?;
    debug_assert!(!handle.inner.is_null(), "use of a destroyed handle");
    // SAFETY: a non-null `inner` was produced by `Box::into_raw` in `install`.
    unsafe { handle.inner.as_mut() }
}

/// Frees the header behind `handle` and nulls it. Destroying twice is a no-op.
///
/// # Safety
///
/// `handle` must be null or point at a handle filled by this module.
unsafe fn release<T>(handle: *mut Handle<T>) -> Option<T> {
    // SAFETY: forwarded from the caller.
    let handle = unsafe { handle.as_mut() }?;
    let inner = std::mem::replace(&mut handle.inner, ptr::null_mut());
    // SAFETY: a non-null `inner` was produced by `Box::into_raw` in `install`
    // and has just been detached from the handle.
    NonNull::new(inner).map(|inner| *unsafe { Box::from_raw(inner.as_ptr()) })
}

fn into_raw(ptr: Option<NonNull<u8>>) -> *mut u8 {
    ptr.map_or(ptr::null_mut(), NonNull::as_ptr)
}

/// Creates a growable arena whose first block holds `capacity` bytes.
///
/// # Safety
///
/// `handle` must be null or valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn arena_init(handle: *mut Handle<Arena>, capacity: usize) -> Status {
    // SAFETY: forwarded from the caller.
    unsafe { install(handle, Arena::new(capacity).map_err(|err| Status::from(&err))) }
}

/// # Safety
///
/// `handle` must come from [`arena_init`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn arena_alloc(
    handle: *mut Handle<Arena>,
    size: usize,
    align: usize,
) -> *mut u8 {
    // SAFETY: forwarded from the caller.
    match unsafe { resolve(handle) } {
        Some(arena) => into_raw(arena.alloc(size, align)),
        None => ptr::null_mut(),
    }
}

/// # Safety
///
/// `handle` must come from [`arena_init`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn arena_reset(handle: *mut Handle<Arena>) {
    // SAFETY: forwarded from the caller.
    if let Some(arena) = unsafe { resolve(handle) } {
        arena.reset();
    }
}

/// # Safety
///
/// `handle` must come from [`arena_init`]; pointers the arena returned are
/// dangling afterwards.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn arena_destroy(handle: *mut Handle<Arena>) {
    // SAFETY: forwarded from the caller.
    if let Some(arena) = unsafe { release(handle) } {
        arena.destroy();
    }
}

/// Creates a fixed arena over `size` bytes at `buffer`.
///
/// # Safety
///
/// `handle` must be null or valid for writes. `buffer` must be valid for
/// reads and writes of `size` bytes until [`static_arena_destroy`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn static_arena_create(
    handle: *mut Handle<StaticArena<'static>>,
    size: usize,
    buffer: *mut u8,
) -> Status {
    let base = match NonNull::new(buffer) {
        Some(base) => base,
        None if size == 0 => NonNull::dangling(),
        None => return Status::InvalidArgument,
    };
    // SAFETY: the caller guarantees `buffer` covers `size` bytes.
    let arena = unsafe { StaticArena::from_raw_parts(base, size) };
    // SAFETY: forwarded from the caller.
    unsafe { install(handle, Ok(arena)) }
}

/// # Safety
///
/// `handle` must come from [`static_arena_create`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn static_arena_alloc(
    handle: *mut Handle<StaticArena<'static>>,
    size: usize,
    align: usize,
) -> *mut u8 {
    // SAFETY: forwarded from the caller.
    match unsafe { resolve(handle) } {
        Some(arena) => into_raw(arena.alloc(size, align)),
        None => ptr::null_mut(),
    }
}

/// # Safety
///
/// `handle` must come from [`static_arena_create`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn static_arena_reset(handle: *mut Handle<StaticArena<'static>>) {
    // SAFETY: forwarded from the caller.
    if let Some(arena) = unsafe { resolve(handle) } {
        arena.reset();
    }
}

/// Invalidates the handle. The caller's buffer is left untouched.
///
/// # Safety
///
/// `handle` must come from [`static_arena_create`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn static_arena_destroy(handle: *mut Handle<StaticArena<'static>>) {
    // SAFETY: forwarded from the caller.
    if let Some(arena) = unsafe { release(handle) } {
        arena.destroy();
    }
}

/// Partitions `buffer` into `slot_count` slots of `slot_size` bytes.
///
/// # Safety
///
/// `handle` must be null or valid for writes. `buffer` must be valid for
/// reads and writes of `slot_size * slot_count` bytes until [`pool_destroy`].
///
/// Slots are laid out at pointer-aligned strides, so a `slot_size` that is
/// not a multiple of the pointer size needs more than that and is rejected
/// with [`Status::InvalidArgument`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pool_create(
    handle: *mut Handle<Pool<'static>>,
    slot_size: usize,
    slot_count: usize,
    buffer: *mut u8,
) -> Status {
    let Some(base) = NonNull::new(buffer) else {
        return Status::InvalidArgument;
    };
    // SAFETY: the caller guarantees the buffer covers `buffer_len` bytes;
    // the pool refuses any geometry that needs more.
    let pool = unsafe {
        Pool::from_raw_parts(slot_size, slot_count, base, buffer_len(slot_size, slot_count))
    };
    // SAFETY: forwarded from the caller.
    unsafe { install(handle, pool.map_err(|err| Status::from(&err))) }
}

/// Bytes the caller promised for a pool. On overflow the rounded slot
/// geometry overflows as well, which the pool reports.
fn buffer_len(slot_size: usize, slot_count: usize) -> usize {
    slot_size.checked_mul(slot_count).unwrap_or(usize::MAX)
}

/// Pops a free slot, or returns null when the pool is exhausted.
///
/// # Safety
///
/// `handle` must come from [`pool_create`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pool_alloc(handle: *mut Handle<Pool<'static>>) -> *mut u8 {
    // SAFETY: forwarded from the caller.
    match unsafe { resolve(handle) } {
        Some(pool) => into_raw(pool.alloc()),
        None => ptr::null_mut(),
    }
}

/// Returns a slot to the pool. Freeing null does nothing.
///
/// # Safety
///
/// `handle` must come from [`pool_create`]; `ptr` must be null or a slot
/// vended by that pool and not yet freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pool_free(handle: *mut Handle<Pool<'static>>, ptr: *mut u8) {
    let Some(ptr) = NonNull::new(ptr) else {
        return;
    };
    // SAFETY: forwarded from the caller.
    if let Some(pool) = unsafe { resolve(handle) } {
        pool.free(ptr);
    }
}

/// Invalidates the handle. The caller's buffer is left untouched.
///
/// # Safety
///
/// `handle` must come from [`pool_create`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pool_destroy(handle: *mut Handle<Pool<'static>>) {
    // SAFETY: forwarded from the caller.
    if let Some(pool) = unsafe { release(handle) } {
        pool.destroy();
    }
}

#[track_caller]
fn trap(err: SortError) -> ! {
    panic!("radix_sort: {err}");
}

/// Sorts `count` records of `stride` bytes at `base` by the key at
/// `key_offset`. `key_type` and `order` are [`KeyType`] and [`SortOrder`]
/// discriminants.
///
/// Aborts on unknown discriminants, a key that does not fit the record,
/// null buffers, or overlapping `base` and `scratch`.
///
/// # Safety
///
/// `base` and `scratch` must each be valid for reads and writes of
/// `count * stride` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn radix_sort(
    base: *mut u8,
    count: usize,
    key_offset: usize,
    stride: usize,
    scratch: *mut u8,
    key_type: u32,
    order: u32,
) {
    let key_type = KeyType::try_from(key_type).unwrap_or_else(|err| trap(err));
    let order = SortOrder::try_from(order).unwrap_or_else(|err| trap(err));
    let layout = RecordLayout::new(stride, key_offset);
    let bytes = layout
        .byte_len(count, key_type)
        .unwrap_or_else(|err| trap(err));

    if count == 0 {
        return;
    }
    assert!(
        !base.is_null() && !scratch.is_null(),
        "radix_sort: null buffer"
    );
    let (b, s) = (base as usize, scratch as usize);
    assert!(
        b.saturating_add(bytes) <= s || s.saturating_add(bytes) <= b,
        "radix_sort: base and scratch overlap"
    );

    // SAFETY: both regions are valid for `bytes` bytes per the caller and
    // were just checked to be disjoint.
    let (base, scratch) = unsafe {
        (
            slice::from_raw_parts_mut(base, bytes),
            slice::from_raw_parts_mut(scratch, bytes),
        )
    };
    sort_records(base, scratch, count, layout, key_type, order);
}
