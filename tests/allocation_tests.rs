//! Heap traffic of the storage backends, observed through a counting global
//! allocator.
//!
//! Counters are thread-local so that tests running in parallel do not see
//! each other's allocations.

use std::{
    alloc::{GlobalAlloc, Layout, System},
    cell::Cell,
};

use holdall::{
    AnyBase, CopyableAny, HeapAny, InlineAny, MovableAny, SmallAny,
    markers::{CopyAndMove, MoveOnly, NoCopyOrMove},
    storage::SmallBufferStorage,
};

struct CountingAllocator;

thread_local! {
    static ALLOCATIONS: Cell<usize> = const { Cell::new(0) };
    static DEALLOCATIONS: Cell<usize> = const { Cell::new(0) };
}

fn bump(counter: &'static std::thread::LocalKey<Cell<usize>>) {
    let _ = counter.try_with(|count| count.set(count.get() + 1));
}

// SAFETY: Every request is forwarded unchanged to the system allocator.
unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        bump(&ALLOCATIONS);
        // SAFETY: Forwarded from the caller.
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        bump(&DEALLOCATIONS);
        // SAFETY: Forwarded from the caller.
        unsafe { System.dealloc(ptr, layout) }
    }
}

#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator;

/// Allocations and deallocations made by this thread so far.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
struct Traffic {
    allocations: usize,
    deallocations: usize,
}

fn traffic() -> Traffic {
    Traffic {
        allocations: ALLOCATIONS.with(Cell::get),
        deallocations: DEALLOCATIONS.with(Cell::get),
    }
}

/// Runs `f` and returns the traffic it caused.
fn measure(f: impl FnOnce()) -> Traffic {
    let before = traffic();
    f();
    let after = traffic();
    Traffic {
        allocations: after.allocations - before.allocations,
        deallocations: after.deallocations - before.deallocations,
    }
}

const NONE: Traffic = Traffic {
    allocations: 0,
    deallocations: 0,
};

const ONE_BLOCK: Traffic = Traffic {
    allocations: 1,
    deallocations: 1,
};

#[test]
fn test_small_buffer_inline_value_never_allocates() {
    let traffic = measure(|| {
        let mut any = CopyableAny::new();
        any.emplace([7u8; 15]);
        any.emplace(3u64);
        any.set(4u64);
        let copy = any.clone();
        assert_eq!(*copy.value::<u64>(), 4);
        any.reset();
    });
    assert_eq!(traffic, NONE);
}

#[test]
fn test_small_buffer_large_value_allocates_once() {
    let mut any = CopyableAny::new();
    let emplaced = measure(|| {
        any.emplace([7u8; 16]);
    });
    assert_eq!(
        emplaced,
        Traffic {
            allocations: 1,
            deallocations: 0,
        }
    );

    let reset = measure(|| any.reset());
    assert_eq!(
        reset,
        Traffic {
            allocations: 0,
            deallocations: 1,
        }
    );

    let dropped = measure(|| {
        let mut any = SmallAny::<NoCopyOrMove>::new();
        any.emplace([1u64; 4]);
    });
    assert_eq!(dropped, ONE_BLOCK);
}

#[test]
fn test_small_buffer_custom_capacity() {
    let traffic = measure(|| {
        let mut any = AnyBase::<SmallBufferStorage<64>, MoveOnly>::new();
        any.emplace([1u64; 8]);
    });
    assert_eq!(traffic, NONE);
}

#[test]
fn test_inline_storage_never_allocates() {
    let traffic = measure(|| {
        let mut a = InlineAny::<32, MoveOnly>::from_value([1u64; 4]);
        let mut b = InlineAny::<32, MoveOnly>::from_value(2u8);
        a.swap(&mut b);
        b.move_from(&mut a);
    });
    assert_eq!(traffic, NONE);
}

#[test]
fn test_heap_storage_allocates_per_value() {
    let traffic = measure(|| {
        let mut any = HeapAny::<MoveOnly>::new();
        any.emplace(1u32);
    });
    assert_eq!(traffic, ONE_BLOCK);

    let zero_sized = measure(|| {
        let mut any = HeapAny::<MoveOnly>::new();
        any.emplace(());
    });
    assert_eq!(zero_sized, NONE);
}

#[test]
fn test_same_type_assignment_reuses_storage() {
    let mut any = HeapAny::<CopyAndMove>::from_value(1u32);
    let same = measure(|| {
        any.set(2u32);
        any.set_cloned(&3u32);
    });
    assert_eq!(same, NONE);

    let other = measure(|| {
        any.set(4u64);
    });
    assert_eq!(other, ONE_BLOCK);
}

#[test]
fn test_swap_heap_does_not_allocate() {
    let mut a = HeapAny::<NoCopyOrMove>::new();
    let mut b = HeapAny::<NoCopyOrMove>::new();
    a.emplace([1u8; 100]);
    b.emplace([2u8; 100]);

    let traffic = measure(|| a.swap(&mut b));
    assert_eq!(traffic, NONE);
    assert_eq!(a.value::<[u8; 100]>()[0], 2);
}

#[test]
fn test_small_buffer_swap_of_heap_values_does_not_allocate() {
    let mut a = MovableAny::from_value([1u64; 4]);
    let mut b = MovableAny::from_value([2u64; 4]);

    let traffic = measure(|| a.swap(&mut b));
    assert_eq!(traffic, NONE);
    assert_eq!(a.value::<[u64; 4]>()[0], 2);
}
