//! Storage backends owning the raw bytes of a held value.
//!
//! A [`Storage`] is a small state machine that is either empty or holding a
//! block of memory large enough for exactly one value. The container core in
//! [`RawAny`] decides what lives in that memory; the storage only reserves,
//! exposes and releases it.
//!
//! Three backends are provided:
//!
//! - [`HeapStorage`]: one heap allocation per occupancy. Ownership can always
//!   be exchanged in O(1) by swapping pointers.
//! - [`InlineStorage<N>`]: an embedded buffer of `N` bytes. Requests that do
//!   not fit are a fatal error, and the bytes can never be exchanged without
//!   moving the value itself.
//! - [`SmallBufferStorage<N>`]: an embedded buffer of `N` bytes with a heap
//!   fallback for values that do not fit. Ownership can be exchanged in O(1)
//!   only while both sides are heap-resident.
//!
//! [`RawAny`]: crate::RawAny

mod heap;
mod inline;
mod small_buffer;

use alloc::alloc::{alloc, dealloc, handle_alloc_error};
use core::{alloc::Layout, ptr::NonNull};

pub use self::{
    heap::HeapStorage,
    inline::InlineStorage,
    small_buffer::{DEFAULT_INLINE_CAPACITY, SmallBufferStorage},
};

/// Common contract of the storage backends.
///
/// # Safety
///
/// Implementors must guarantee:
///
/// 1. A pointer returned by [`allocate`](Storage::allocate) is non-null,
///    aligned to `layout.align()` and valid for reads and writes of
///    `layout.size()` bytes until [`free`](Storage::free) is called or the
///    storage is moved.
/// 2. [`get_storage`](Storage::get_storage) and
///    [`get_storage_mut`](Storage::get_storage_mut) return `None` while empty
///    and otherwise the address of the reserved block at the storage's
///    current location. The pointer returned by `get_storage_mut` may be
///    written through. The pointer returned by `get_storage` may be written
///    through for bytes inside an `UnsafeCell` of the held value, so shared
///    access permits interior mutability.
/// 3. A successful [`try_swap`](Storage::try_swap) exchanges the two reserved
///    blocks, including their emptiness, without touching their contents.
/// 4. If [`CAN_ALWAYS_SWAP`](Storage::CAN_ALWAYS_SWAP) is `true`,
///    `try_swap` always succeeds.
pub unsafe trait Storage: Default + 'static {
    /// Whether [`try_swap`](Storage::try_swap) succeeds unconditionally.
    const CAN_ALWAYS_SWAP: bool;

    /// Reserves a block for a value with the given layout and returns its
    /// address.
    ///
    /// # Panics
    ///
    /// Panics if the storage is not empty, or if the backend cannot hold a
    /// value with this layout.
    fn allocate(&mut self, layout: Layout) -> NonNull<u8>;

    /// Releases the reserved block and returns to the empty state.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The storage is not empty.
    /// 2. `layout` is the layout passed to the [`allocate`](Storage::allocate)
    ///    call that reserved the block.
    /// 3. The block no longer holds a live value.
    unsafe fn free(&mut self, layout: Layout);

    /// Address of the reserved block for reading, or `None` when empty.
    fn get_storage(&self) -> Option<NonNull<u8>>;

    /// Address of the reserved block for writing, or `None` when empty.
    fn get_storage_mut(&mut self) -> Option<NonNull<u8>>;

    /// Attempts an O(1) exchange of ownership with `other`.
    ///
    /// Returns whether the exchange happened. On failure neither side is
    /// modified.
    fn try_swap(&mut self, other: &mut Self) -> bool;

    /// Returns `true` if no block is reserved.
    #[inline]
    fn is_empty(&self) -> bool {
        self.get_storage().is_none()
    }
}

/// Allocates a heap block for `layout`.
///
/// Zero-sized layouts are served by a dangling, suitably aligned address and
/// never reach the allocator.
pub(crate) fn heap_allocate(layout: Layout) -> NonNull<u8> {
    if layout.size() == 0 {
        let dangling = core::ptr::without_provenance_mut::<u8>(layout.align());
        // SAFETY: Alignments are non-zero, so the address is non-null.
        return unsafe { NonNull::new_unchecked(dangling) };
    }

    // SAFETY: The layout has a non-zero size.
    let ptr = unsafe { alloc(layout) };
    match NonNull::new(ptr) {
        Some(ptr) => ptr,
        None => handle_alloc_error(layout),
    }
}

/// Releases a block obtained from [`heap_allocate`].
///
/// # Safety
///
/// `ptr` must have been returned by `heap_allocate(layout)` with the same
/// `layout` and must not have been released already.
pub(crate) unsafe fn heap_deallocate(ptr: NonNull<u8>, layout: Layout) {
    if layout.size() != 0 {
        // SAFETY: The block was allocated by the global allocator with this layout,
        // as guaranteed by the caller.
        unsafe {
            dealloc(ptr.as_ptr(), layout);
        }
    }
}
