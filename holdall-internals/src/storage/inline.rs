//! Fixed-capacity inline storage backend.

use core::{alloc::Layout, cell::UnsafeCell, mem::MaybeUninit, ptr::NonNull};

use super::Storage;

/// Storage that embeds a pointer-aligned buffer of `N` bytes.
///
/// Values must fit in `N` bytes and must not require more than pointer
/// alignment; anything else is rejected with a panic. The bytes live inside
/// the storage itself, so ownership can never be exchanged without moving the
/// value.
///
/// The buffer sits in an [`UnsafeCell`], so a value with interior mutability
/// may be mutated through the address returned by
/// [`get_storage`](Storage::get_storage).
#[repr(C)]
pub struct InlineStorage<const N: usize> {
    /// Forces pointer alignment of the buffer, which sits at offset zero.
    _align: [usize; 0],
    /// The embedded buffer.
    bytes: UnsafeCell<[MaybeUninit<u8>; N]>,
    /// Whether the buffer is reserved.
    occupied: bool,
}

impl<const N: usize> InlineStorage<N> {
    /// Number of bytes available for a value.
    pub const CAPACITY: usize = N;

    /// Returns `true` if a value with `layout` fits in this storage.
    #[inline]
    #[must_use]
    pub const fn fits(layout: Layout) -> bool {
        layout.size() <= N && layout.align() <= core::mem::align_of::<usize>()
    }

    /// Address of the buffer.
    #[inline]
    fn buffer(&self) -> NonNull<u8> {
        // SAFETY: `UnsafeCell::get` returns the address of a field, which is never
        // null.
        unsafe { NonNull::new_unchecked(self.bytes.get().cast::<u8>()) }
    }
}

impl<const N: usize> Default for InlineStorage<N> {
    #[inline]
    fn default() -> Self {
        Self {
            _align: [],
            bytes: UnsafeCell::new([MaybeUninit::uninit(); N]),
            occupied: false,
        }
    }
}

// SAFETY:
// 1. The buffer is at offset zero of a `#[repr(C)]` struct aligned to `usize`,
//    and `allocate` rejects layouts larger than `N` or more aligned than
//    `usize`. The address is valid until the storage moves.
// 2. Both accessors return `None` unless `occupied`, and otherwise the address
//    of the buffer taken through its `UnsafeCell`, which permits writes even
//    when reached from a shared borrow.
// 3. `try_swap` never succeeds.
// 4. `CAN_ALWAYS_SWAP` is `false`.
unsafe impl<const N: usize> Storage for InlineStorage<N> {
    const CAN_ALWAYS_SWAP: bool = false;

    #[track_caller]
    fn allocate(&mut self, layout: Layout) -> NonNull<u8> {
        assert!(!self.occupied, "allocate called on an occupied InlineStorage");
        if !Self::fits(layout) {
            capacity_exceeded(layout, N);
        }
        self.occupied = true;
        self.buffer()
    }

    #[inline]
    unsafe fn free(&mut self, _layout: Layout) {
        self.occupied = false;
    }

    #[inline]
    fn get_storage(&self) -> Option<NonNull<u8>> {
        self.occupied.then(|| self.buffer())
    }

    #[inline]
    fn get_storage_mut(&mut self) -> Option<NonNull<u8>> {
        self.occupied.then(|| self.buffer())
    }

    #[inline]
    fn try_swap(&mut self, _other: &mut Self) -> bool {
        false
    }
}

#[cold]
#[inline(never)]
#[track_caller]
fn capacity_exceeded(layout: Layout, capacity: usize) -> ! {
    panic!(
        "value of size {} and alignment {} does not fit in inline storage of {capacity} bytes",
        layout.size(),
        layout.align()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_storage_lifecycle() {
        let layout = Layout::new::<u64>();
        let mut storage = InlineStorage::<16>::default();
        assert!(storage.is_empty());

        let ptr = storage.allocate(layout);
        assert_eq!(storage.get_storage(), Some(ptr));
        assert_eq!(ptr.as_ptr() as usize % layout.align(), 0);

        // SAFETY: The buffer is reserved and holds no live value.
        unsafe {
            storage.free(layout);
        }
        assert!(storage.is_empty());
    }

    #[test]
    fn test_inline_storage_value_mutable_through_shared_address() {
        use core::cell::RefCell;

        let layout = Layout::new::<RefCell<u32>>();
        let mut storage = InlineStorage::<16>::default();
        let ptr = storage.allocate(layout).cast::<RefCell<u32>>();
        // SAFETY: The buffer is reserved for a `RefCell<u32>` and uninitialized.
        unsafe {
            ptr.write(RefCell::new(1));
        }

        let shared = &storage;
        let address = shared.get_storage().expect("the buffer is reserved");
        // SAFETY: The buffer holds a live `RefCell<u32>`.
        let cell = unsafe { address.cast::<RefCell<u32>>().as_ref() };
        *cell.borrow_mut() += 1;
        assert_eq!(*cell.borrow(), 2);

        // SAFETY: Reserved with `layout`; `RefCell<u32>` has no destructor.
        unsafe {
            storage.free(layout);
        }
    }

    #[test]
    fn test_inline_storage_never_swaps() {
        let layout = Layout::new::<u8>();
        let mut a = InlineStorage::<8>::default();
        let mut b = InlineStorage::<8>::default();
        a.allocate(layout);
        assert!(!a.try_swap(&mut b));
        assert!(!a.is_empty());
        assert!(b.is_empty());
    }

    #[test]
    fn test_inline_storage_fits() {
        assert!(InlineStorage::<8>::fits(Layout::new::<u64>()));
        assert!(!InlineStorage::<8>::fits(Layout::new::<[u64; 2]>()));
        assert!(InlineStorage::<0>::fits(Layout::new::<()>()));

        #[repr(align(64))]
        struct OverAligned;
        assert!(!InlineStorage::<64>::fits(Layout::new::<OverAligned>()));
    }

    #[test]
    #[should_panic(expected = "does not fit in inline storage of 4 bytes")]
    fn test_inline_storage_overflow() {
        let mut storage = InlineStorage::<4>::default();
        storage.allocate(Layout::new::<u64>());
    }
}
