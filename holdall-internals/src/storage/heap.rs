//! Heap-only storage backend.

use core::{alloc::Layout, ptr::NonNull};

use super::{Storage, heap_allocate, heap_deallocate};

/// Storage that places every value in its own heap allocation.
///
/// The footprint is a single pointer. Exchanging ownership with another
/// [`HeapStorage`] is a pointer swap and always succeeds.
#[derive(Default)]
pub struct HeapStorage {
    /// Address of the reserved block, if any.
    ///
    /// # Safety
    ///
    /// When `Some`, the pointer was returned by `heap_allocate` for the layout
    /// of the value the owning container currently holds.
    ptr: Option<NonNull<u8>>,
}

// SAFETY:
// 1. `allocate` returns the block produced by `heap_allocate`, which stays valid
//    until `free`. Moving a `HeapStorage` does not move the block.
// 2. Both accessors return the stored pointer, which is `None` exactly when
//    empty.
// 3. `try_swap` exchanges the two pointers.
// 4. `try_swap` always succeeds.
unsafe impl Storage for HeapStorage {
    const CAN_ALWAYS_SWAP: bool = true;

    #[track_caller]
    fn allocate(&mut self, layout: Layout) -> NonNull<u8> {
        assert!(
            self.ptr.is_none(),
            "allocate called on an occupied HeapStorage"
        );
        let ptr = heap_allocate(layout);
        self.ptr = Some(ptr);
        ptr
    }

    unsafe fn free(&mut self, layout: Layout) {
        if let Some(ptr) = self.ptr.take() {
            // SAFETY: The pointer came from `heap_allocate(layout)` as guaranteed by
            // the field invariant and the caller.
            unsafe {
                heap_deallocate(ptr, layout);
            }
        }
    }

    #[inline]
    fn get_storage(&self) -> Option<NonNull<u8>> {
        self.ptr
    }

    #[inline]
    fn get_storage_mut(&mut self) -> Option<NonNull<u8>> {
        self.ptr
    }

    #[inline]
    fn try_swap(&mut self, other: &mut Self) -> bool {
        core::mem::swap(&mut self.ptr, &mut other.ptr);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heap_storage_size() {
        assert_eq!(
            core::mem::size_of::<HeapStorage>(),
            core::mem::size_of::<usize>()
        );
    }

    #[test]
    fn test_heap_storage_lifecycle() {
        let layout = Layout::new::<u64>();
        let mut storage = HeapStorage::default();
        assert!(storage.is_empty());

        let ptr = storage.allocate(layout);
        assert_eq!(storage.get_storage(), Some(ptr));
        assert_eq!(ptr.as_ptr() as usize % layout.align(), 0);

        // SAFETY: The block is occupied and holds no live value.
        unsafe {
            storage.free(layout);
        }
        assert!(storage.is_empty());
    }

    #[test]
    fn test_heap_storage_swap() {
        let layout = Layout::new::<u32>();
        let mut a = HeapStorage::default();
        let mut b = HeapStorage::default();
        let ptr = a.allocate(layout);

        assert!(a.try_swap(&mut b));
        assert!(a.is_empty());
        assert_eq!(b.get_storage(), Some(ptr));

        // SAFETY: `b` now owns the block and it holds no live value.
        unsafe {
            b.free(layout);
        }
    }

    #[test]
    fn test_heap_storage_zero_sized() {
        #[repr(align(32))]
        struct Aligned;

        let layout = Layout::new::<Aligned>();
        let mut storage = HeapStorage::default();
        let ptr = storage.allocate(layout);
        assert_eq!(ptr.as_ptr() as usize % 32, 0);
        // SAFETY: The block is occupied and holds no live value.
        unsafe {
            storage.free(layout);
        }
    }

    #[test]
    #[should_panic(expected = "occupied")]
    fn test_heap_storage_double_allocate() {
        let layout = Layout::new::<u8>();
        let mut storage = HeapStorage::default();
        storage.allocate(layout);
        storage.allocate(layout);
    }
}
