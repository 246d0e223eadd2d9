//! Hybrid small-buffer storage backend.

use core::{alloc::Layout, cell::UnsafeCell, mem::MaybeUninit, ptr::NonNull};

use super::{Storage, heap_allocate, heap_deallocate};
use crate::util::trace_event;

/// Inline capacity that makes a container built on
/// [`SmallBufferStorage`] exactly three pointers wide: two pointers of
/// storage, minus the state byte, plus one pointer for the operations table.
pub const DEFAULT_INLINE_CAPACITY: usize = 2 * core::mem::size_of::<usize>() - 1;

/// Where the value of a [`SmallBufferStorage`] currently lives.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
enum State {
    /// Nothing is reserved.
    Empty,
    /// The value lives in the inline buffer.
    Local,
    /// The value lives on the heap; the buffer holds its address.
    Heap,
}

/// Storage that keeps values of up to `N` bytes inline and falls back to the
/// heap for larger or over-aligned values.
///
/// While heap-resident, the heap address is kept in the first bytes of the
/// inline buffer, so `N` must be at least the size of a pointer. Ownership
/// can be exchanged in O(1) only when both sides are heap-resident.
///
/// As with [`InlineStorage`](super::InlineStorage), the buffer sits in an
/// [`UnsafeCell`] so that local values with interior mutability can be
/// mutated through a shared borrow.
#[repr(C)]
pub struct SmallBufferStorage<const N: usize = DEFAULT_INLINE_CAPACITY> {
    /// Forces pointer alignment of the buffer, which sits at offset zero.
    _align: [usize; 0],
    /// Inline value bytes, or the heap address while `state == Heap`.
    bytes: UnsafeCell<[MaybeUninit<u8>; N]>,
    /// Current residency of the value.
    state: State,
}

impl<const N: usize> SmallBufferStorage<N> {
    /// Number of bytes available for an inline value.
    pub const CAPACITY: usize = N;

    /// Returns `true` if a value with `layout` is kept inline.
    #[inline]
    #[must_use]
    pub const fn fits_inline(layout: Layout) -> bool {
        layout.size() <= N && layout.align() <= core::mem::align_of::<usize>()
    }

    /// Returns `true` if the held value lives in the inline buffer.
    #[inline]
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.state == State::Local
    }

    /// Returns `true` if the held value lives on the heap.
    #[inline]
    #[must_use]
    pub fn is_heap(&self) -> bool {
        self.state == State::Heap
    }

    /// Address of the buffer.
    #[inline]
    fn buffer(&self) -> NonNull<u8> {
        // SAFETY: `UnsafeCell::get` returns the address of a field, which is never
        // null.
        unsafe { NonNull::new_unchecked(self.bytes.get().cast::<u8>()) }
    }

    /// Reads the heap address stored in the buffer.
    ///
    /// # Safety
    ///
    /// The state must be [`State::Heap`].
    #[inline]
    unsafe fn heap_ptr(&self) -> NonNull<u8> {
        debug_assert_eq!(self.state, State::Heap);
        let slot = self.bytes.get().cast::<NonNull<u8>>();
        // SAFETY: In the heap state the first pointer-sized bytes of the buffer hold
        // an initialized `NonNull<u8>` written by `set_heap_ptr`. The buffer is at
        // offset zero of a pointer-aligned `#[repr(C)]` struct, so the read is
        // aligned.
        unsafe { slot.read() }
    }

    /// Stores a heap address in the buffer.
    #[inline]
    fn set_heap_ptr(&mut self, ptr: NonNull<u8>) {
        let slot = self.bytes.get_mut().as_mut_ptr().cast::<NonNull<u8>>();
        // SAFETY: `N >= size_of::<usize>()` is checked when the storage is created
        // and the buffer is pointer-aligned, so the write is in bounds and aligned.
        unsafe {
            slot.write(ptr);
        }
    }
}

impl<const N: usize> Default for SmallBufferStorage<N> {
    #[inline]
    fn default() -> Self {
        const {
            assert!(
                N >= core::mem::size_of::<usize>(),
                "SmallBufferStorage needs room for a heap pointer"
            );
        }
        Self {
            _align: [],
            bytes: UnsafeCell::new([MaybeUninit::uninit(); N]),
            state: State::Empty,
        }
    }
}

// SAFETY:
// 1. Local blocks are the pointer-aligned buffer, used only for layouts that fit
//    it; other layouts receive a block from `heap_allocate`, which stays valid
//    until `free` regardless of moves.
// 2. Both accessors return `None` in the empty state, the buffer address taken
//    through its `UnsafeCell` in the local state, and the stored heap address in
//    the heap state.
// 3. `try_swap` only succeeds when both sides are heap-resident and then
//    exchanges the two heap addresses.
// 4. `CAN_ALWAYS_SWAP` is `false`.
unsafe impl<const N: usize> Storage for SmallBufferStorage<N> {
    const CAN_ALWAYS_SWAP: bool = false;

    #[track_caller]
    fn allocate(&mut self, layout: Layout) -> NonNull<u8> {
        assert_eq!(
            self.state,
            State::Empty,
            "allocate called on an occupied SmallBufferStorage"
        );
        if Self::fits_inline(layout) {
            self.state = State::Local;
            self.buffer()
        } else {
            trace_event!(
                size = layout.size(),
                align = layout.align(),
                capacity = N,
                "value does not fit the inline buffer, allocating on the heap"
            );
            let ptr = heap_allocate(layout);
            self.set_heap_ptr(ptr);
            self.state = State::Heap;
            ptr
        }
    }

    unsafe fn free(&mut self, layout: Layout) {
        if self.state == State::Heap {
            // SAFETY: The state is `Heap`.
            let ptr = unsafe { self.heap_ptr() };
            // SAFETY: The address came from `heap_allocate(layout)` in `allocate`, and
            // the caller passes the same layout.
            unsafe {
                heap_deallocate(ptr, layout);
            }
        }
        self.state = State::Empty;
    }

    #[inline]
    fn get_storage(&self) -> Option<NonNull<u8>> {
        match self.state {
            State::Empty => None,
            State::Local => Some(self.buffer()),
            // SAFETY: The state is `Heap`.
            State::Heap => Some(unsafe { self.heap_ptr() }),
        }
    }

    #[inline]
    fn get_storage_mut(&mut self) -> Option<NonNull<u8>> {
        match self.state {
            State::Empty => None,
            State::Local => Some(self.buffer()),
            // SAFETY: The state is `Heap`.
            State::Heap => Some(unsafe { self.heap_ptr() }),
        }
    }

    fn try_swap(&mut self, other: &mut Self) -> bool {
        if self.state != State::Heap || other.state != State::Heap {
            return false;
        }
        // SAFETY: The state is `Heap`.
        let mine = unsafe { self.heap_ptr() };
        // SAFETY: The state of `other` is `Heap`.
        let theirs = unsafe { other.heap_ptr() };
        self.set_heap_ptr(theirs);
        other.set_heap_ptr(mine);
        true
    }
}
