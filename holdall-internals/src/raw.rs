//! The type-erased container core.
//!
//! This module encapsulates the fields of [`RawAny`], ensuring they are only
//! visible within this module. This visibility restriction guarantees the
//! safety invariant: **the operations table is present exactly when the
//! storage holds a block, and that block then holds a live value of the type
//! described by the table, reserved with the table's layout**.
//!
//! Every method below preserves this invariant on all exits, including
//! unwinding out of a user-supplied constructor or destructor.
//!
//! # Moves
//!
//! Rust values are relocated by copying their bytes. A value moved out of a
//! [`RawAny`] is therefore never destroyed at its old address: the source
//! block is released without running the destructor.

use core::{alloc::Layout, marker::PhantomData, mem::ManuallyDrop, ptr::NonNull};

use crate::{descriptor::TypeDescriptor, storage::Storage, type_ops::TypeOps, util::trace_event};

/// A type-erased holder for at most one value, generic over its storage
/// backend.
///
/// [`RawAny`] implements every container algorithm but performs no
/// capability gating: whether a value may be copied or moved is decided by
/// the safe wrapper in the `holdall` crate.
pub struct RawAny<S: Storage> {
    /// Backend owning the bytes of the held value.
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. The storage is non-empty if and only if `ops` is `Some`.
    /// 2. When non-empty, the block was reserved with `ops.layout()` and holds
    ///    a live value of the type described by `ops`.
    storage: S,
    /// Operations table of the held value.
    ops: Option<&'static TypeOps>,
    /// The held value may be neither `Send` nor `Sync`.
    _not_thread_safe: PhantomData<*const ()>,
}

impl<S: Storage> RawAny<S> {
    /// Creates an empty container.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage: S::default(),
            ops: None,
            _not_thread_safe: PhantomData,
        }
    }

    /// The storage backend.
    #[inline]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Returns `true` if a value is held.
    #[inline]
    pub fn has_value(&self) -> bool {
        debug_assert_eq!(self.ops.is_some(), !self.storage.is_empty());
        self.ops.is_some()
    }

    /// Operations table of the held value.
    #[inline]
    pub fn type_ops(&self) -> Option<&'static TypeOps> {
        self.ops
    }

    /// Descriptor of the held value's type.
    #[inline]
    pub fn type_descriptor(&self) -> Option<TypeDescriptor> {
        self.ops.map(TypeOps::descriptor)
    }

    /// Returns `true` if a value of type `T` is held.
    #[inline]
    #[track_caller]
    pub fn has_type<T: ?Sized + 'static>(&self) -> bool {
        self.ops.is_some_and(TypeOps::describes::<T>)
    }

    /// Table and read address of the held value.
    #[inline]
    fn value_ptr(&self) -> Option<(&'static TypeOps, NonNull<u8>)> {
        Some((self.ops?, self.storage.get_storage()?))
    }

    /// Table and write address of the held value.
    #[inline]
    fn value_ptr_mut(&mut self) -> Option<(&'static TypeOps, NonNull<u8>)> {
        Some((self.ops?, self.storage.get_storage_mut()?))
    }

    /// Returns a reference to the held value if it is of type `T`.
    #[inline]
    #[track_caller]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        let (ops, ptr) = self.value_ptr()?;
        if !ops.describes::<T>() {
            return None;
        }
        // SAFETY: The block holds a live value of the type described by `ops`
        // (type invariant), which was just checked to be `T`. The shared borrow of
        // `self` keeps it alive and unaliased by mutable references.
        Some(unsafe { ptr.cast::<T>().as_ref() })
    }

    /// Returns a mutable reference to the held value if it is of type `T`.
    #[inline]
    #[track_caller]
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        let (ops, ptr) = self.value_ptr_mut()?;
        if !ops.describes::<T>() {
            return None;
        }
        // SAFETY: As in `downcast_ref`; the mutable borrow of `self` makes the
        // reference unique.
        Some(unsafe { ptr.cast::<T>().as_mut() })
    }

    /// Destroys the held value, if any, and releases its storage.
    ///
    /// Idempotent. The storage is released even if the destructor panics.
    pub fn reset(&mut self) {
        let Some(ops) = self.ops.take() else {
            return;
        };
        let mut block = Block::reserved(&mut self.storage, ops.layout());
        if let Some(ptr) = block.ptr() {
            // SAFETY: The block holds a live value described by `ops` (type
            // invariant). `ops` has been cleared and the block is released when
            // `block` drops, so the value is never touched again.
            unsafe {
                ops.destruct(ptr);
            }
        }
    }

    /// Releases the storage without destroying the held value.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the held value, if any, has been moved out
    /// and is owned elsewhere.
    #[inline]
    unsafe fn release(&mut self) {
        if let Some(ops) = self.ops.take() {
            // SAFETY: The storage is non-empty with this layout (type invariant) and
            // the caller guarantees the value has been moved out.
            unsafe {
                self.storage.free(ops.layout());
            }
        }
    }

    /// Replaces the held value with `value` and returns a reference to it.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ops` describes `T`.
    #[track_caller]
    pub unsafe fn emplace<T: 'static>(&mut self, value: T, ops: &'static TypeOps) -> &mut T {
        debug_assert!(ops.describes::<T>());
        self.reset();

        let (block, ptr) = Block::allocate(&mut self.storage, ops.layout());
        // SAFETY: `ptr` was just reserved for `ops.layout()`, which equals
        // `Layout::new::<T>()` because `ops` describes `T`.
        unsafe {
            ptr.cast::<T>().write(value);
        }
        block.keep();
        self.ops = Some(ops);

        // SAFETY: The block now holds a live `T` and is borrowed through `self`.
        unsafe { ptr.cast::<T>().as_mut() }
    }

    /// Replaces the held value with a default-constructed value of the type
    /// described by `ops`.
    ///
    /// If the constructor panics, the container is left empty and the
    /// reserved storage is released.
    ///
    /// # Panics
    ///
    /// Panics if `ops` has no default-construct slot. The held value is left
    /// untouched in that case.
    #[track_caller]
    pub fn emplace_default(&mut self, ops: &'static TypeOps) {
        assert!(
            ops.supports_default(),
            "`{}` was not registered with default construction",
            ops.descriptor()
        );
        self.reset();

        let (block, ptr) = Block::allocate(&mut self.storage, ops.layout());
        // SAFETY: `ptr` is freshly reserved for `ops.layout()` and holds no value.
        // If the constructor unwinds, `block` releases the reservation.
        unsafe {
            ops.default_construct(ptr);
        }
        block.keep();
        self.ops = Some(ops);
    }

    /// Assigns `value`, move-assigning in place when a `T` is already held
    /// and otherwise replacing the held value.
    ///
    /// If the destructor of the replaced value panics, `self` holds `value`
    /// after an in-place assignment and is empty otherwise.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ops` describes `T`.
    #[track_caller]
    pub unsafe fn assign<T: 'static>(&mut self, value: T, ops: &'static TypeOps) -> &mut T {
        if let Some((current, dest)) = self.value_ptr_mut()
            && current.same_type(ops)
        {
            let mut value = ManuallyDrop::new(value);
            let src = NonNull::from(&mut *value).cast::<u8>();
            // SAFETY: `dest` holds a live value of the same type as `value`, which is
            // a distinct local. `value` is wrapped in `ManuallyDrop`, so it is not
            // used or dropped after being moved out.
            unsafe {
                current.move_assign(dest, src);
            }
            // SAFETY: The block still holds a live `T`, borrowed through `self`.
            return unsafe { dest.cast::<T>().as_mut() };
        }

        // SAFETY: Forwarded from the caller.
        unsafe { self.emplace(value, ops) }
    }

    /// Assigns a copy of `value`, copy-assigning in place when a `T` is
    /// already held and otherwise replacing the held value with a clone.
    ///
    /// If cloning panics while replacing, the previously held value is kept.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ops` describes `T` and has the copy slots.
    #[track_caller]
    pub unsafe fn assign_cloned<T: Clone + 'static>(
        &mut self,
        value: &T,
        ops: &'static TypeOps,
    ) -> &mut T {
        if let Some((current, dest)) = self.value_ptr_mut()
            && current.same_type(ops)
        {
            let src = NonNull::from(value).cast::<u8>();
            // SAFETY: `dest` holds a live `T` and `value` is a distinct live `T`,
            // since it cannot be borrowed from `self` while `self` is borrowed
            // mutably. `ops` has the copy slots as guaranteed by the caller.
            unsafe {
                ops.copy_assign(dest, src);
            }
            // SAFETY: The block still holds a live `T`, borrowed through `self`.
            return unsafe { dest.cast::<T>().as_mut() };
        }

        let value = value.clone();
        // SAFETY: Forwarded from the caller.
        unsafe { self.emplace(value, ops) }
    }

    /// Makes `self` hold a copy of the value held by `other`.
    ///
    /// When both hold the same type, the value is copy-assigned in place.
    /// Otherwise the held value is destroyed and a copy is constructed into
    /// freshly reserved storage. If `other` is empty, `self` is reset.
    ///
    /// If the copy constructor panics, `self` is left empty.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. If `other` holds a value, its operations table has the copy slots.
    #[track_caller]
    pub unsafe fn copy_from<S2: Storage>(&mut self, other: &RawAny<S2>) {
        let Some((source_ops, src)) = other.value_ptr() else {
            self.reset();
            return;
        };

        if let Some((current, dest)) = self.value_ptr_mut()
            && current.same_type(source_ops)
        {
            // SAFETY: Both blocks hold live values of the same type and belong to
            // distinct containers. `source_ops` has the copy slots as guaranteed by
            // the caller.
            unsafe {
                source_ops.copy_assign(dest, src);
            }
            return;
        }

        self.reset();
        trace_event!(
            type_name = source_ops.descriptor().name(),
            "copy-constructing into a fresh block"
        );
        let (block, dest) = Block::allocate(&mut self.storage, source_ops.layout());
        // SAFETY: `dest` is freshly reserved for the source layout and does not
        // overlap `src`. `source_ops` has the copy slots as guaranteed by the
        // caller. If the copy unwinds, `block` releases the reservation.
        unsafe {
            source_ops.copy_construct(dest, src);
        }
        block.keep();
        self.ops = Some(source_ops);
    }

    /// Moves the value held by `other` into `self`, leaving `other` empty.
    ///
    /// When both hold the same type, the value is move-assigned in place.
    /// Otherwise the held value is destroyed and the source value is
    /// relocated into freshly reserved storage. If `other` is empty, `self`
    /// is reset.
    ///
    /// If the destructor of the replaced value panics, the moved value still
    /// has exactly one owner: after an in-place assignment it is held by
    /// `self` and `other` is empty, otherwise `self` is empty and `other`
    /// keeps it.
    #[track_caller]
    pub fn move_from<S2: Storage>(&mut self, other: &mut RawAny<S2>) {
        let Some(source_ops) = other.ops else {
            self.reset();
            return;
        };
        if !self.ops.is_some_and(|current| current.same_type(source_ops)) {
            self.reset();
            self.relocate_from(other);
            return;
        }

        // From here on the source value belongs to `self`, even if the destructor
        // of the value it replaces unwinds.
        let mut source = MovedOut { raw: other };
        if let (Some((current, dest)), Some((_, src))) =
            (self.value_ptr_mut(), source.raw.value_ptr_mut())
        {
            // SAFETY: Both blocks hold live values of the same type and belong to
            // distinct containers. `source` releases the source storage without
            // running the destructor, also on unwind.
            unsafe {
                current.move_assign(dest, src);
            }
        }
    }

    /// Relocates the value of `other` into `self`, which must be empty.
    #[track_caller]
    fn relocate_from<S2: Storage>(&mut self, other: &mut RawAny<S2>) {
        debug_assert!(!self.has_value());
        let Some((source_ops, src)) = other.value_ptr_mut() else {
            return;
        };

        let (block, dest) = Block::allocate(&mut self.storage, source_ops.layout());
        // SAFETY: `dest` is freshly reserved for the source layout and belongs to a
        // distinct container. The source value is moved out and its storage is
        // released below without running its destructor.
        unsafe {
            source_ops.move_construct(dest, src);
        }
        block.keep();
        self.ops = Some(source_ops);

        // SAFETY: The value of `other` was moved out above.
        unsafe {
            other.release();
        }
    }

    /// Exchanges the held values of `self` and `other`.
    ///
    /// Tries, in order: an O(1) exchange of storage ownership; nothing, if
    /// both are empty; a single relocation, if exactly one side holds a
    /// value; and finally three relocations through a temporary container.
    #[track_caller]
    pub fn swap(&mut self, other: &mut Self) {
        if self.try_swap_storage(other) {
            return;
        }

        match (self.has_value(), other.has_value()) {
            (false, false) => {}
            (false, true) => self.relocate_from(other),
            (true, false) => other.relocate_from(self),
            (true, true) => {
                trace_event!(
                    left = self.type_descriptor().map(|d| d.name()),
                    right = other.type_descriptor().map(|d| d.name()),
                    "swapping through a temporary"
                );
                let mut temp = Self::new();
                temp.relocate_from(self);
                self.relocate_from(other);
                other.relocate_from(&mut temp);
            }
        }
    }

    /// Attempts the O(1) ownership exchange of [`swap`](Self::swap) alone.
    ///
    /// Returns whether it happened; on failure neither side is modified.
    #[inline]
    pub fn try_swap_storage(&mut self, other: &mut Self) -> bool {
        if self.storage.try_swap(&mut other.storage) {
            core::mem::swap(&mut self.ops, &mut other.ops);
            true
        } else {
            false
        }
    }

    /// Moves the held value out if it is of type `T`, leaving `self` empty.
    ///
    /// Returns `None`, and leaves `self` untouched, otherwise.
    #[track_caller]
    pub fn take<T: 'static>(&mut self) -> Option<T> {
        let (ops, ptr) = self.value_ptr_mut()?;
        if !ops.describes::<T>() {
            return None;
        }
        // SAFETY: The block holds a live `T`. Its storage is released below
        // without running the destructor, so ownership passes to the caller.
        let value = unsafe { ptr.cast::<T>().read() };
        // SAFETY: The value was moved out above.
        unsafe {
            self.release();
        }
        Some(value)
    }
}

impl<S: Storage> Default for RawAny<S> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Storage> Drop for RawAny<S> {
    #[inline]
    fn drop(&mut self) {
        self.reset();
    }
}

impl<S: Storage> core::fmt::Debug for RawAny<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RawAny")
            .field("type", &self.type_descriptor().map(|d| d.name()))
            .finish()
    }
}

/// A reserved storage block that is released when dropped unless kept.
///
/// Used so that a constructor or destructor unwinding out of a container
/// operation never leaves the storage reserved without an operations table.
///
/// The storage is held as a raw pointer: the address handed out by
/// [`Block::allocate`] may point into the storage itself, and writes through
/// it must not be invalidated by a live mutable borrow of that storage.
struct Block<'a, S: Storage> {
    /// The storage owning the block.
    ///
    /// # Safety
    ///
    /// Derived from a `&'a mut S`, so it is valid and unaliased by other
    /// borrows for `'a`.
    storage: NonNull<S>,
    /// Layout the block was reserved with.
    layout: Layout,
    /// Ties the guard to the exclusive borrow of the storage.
    _borrow: PhantomData<&'a mut S>,
}

impl<'a, S: Storage> Block<'a, S> {
    /// Guards the block already reserved with `layout` in `storage`.
    #[inline]
    fn reserved(storage: &'a mut S, layout: Layout) -> Self {
        Self {
            storage: NonNull::from(storage),
            layout,
            _borrow: PhantomData,
        }
    }

    /// Reserves a block for `layout` in `storage`, which must be empty.
    #[inline]
    #[track_caller]
    fn allocate(storage: &'a mut S, layout: Layout) -> (Self, NonNull<u8>) {
        let mut block = Self::reserved(storage, layout);
        // SAFETY: The pointer comes from a `&'a mut S` that the guard owns.
        let storage = unsafe { block.storage.as_mut() };
        let ptr = storage.allocate(layout);
        (block, ptr)
    }

    /// Write address of the block, if the storage holds one.
    #[inline]
    fn ptr(&mut self) -> Option<NonNull<u8>> {
        // SAFETY: The pointer comes from a `&'a mut S` that the guard owns.
        let storage = unsafe { self.storage.as_mut() };
        storage.get_storage_mut()
    }

    /// Keeps the block reserved.
    #[inline]
    fn keep(self) {
        core::mem::forget(self);
    }
}

impl<S: Storage> Drop for Block<'_, S> {
    fn drop(&mut self) {
        // SAFETY: The pointer comes from a `&'a mut S` that the guard owns. Any
        // address derived from it is no longer used once the guard drops.
        let storage = unsafe { self.storage.as_mut() };
        if !storage.is_empty() {
            // SAFETY: The block was reserved with `self.layout` and any value in it
            // has either been destroyed or was never completed.
            unsafe {
                storage.free(self.layout);
            }
        }
    }
}

/// A container whose value is being moved out; its storage is released when
/// the guard drops, without running the destructor.
///
/// Used so that a destructor unwinding after the value has been relocated
/// cannot leave the source still claiming ownership of it.
struct MovedOut<'a, S: Storage> {
    /// The container whose value is moved out.
    raw: &'a mut RawAny<S>,
}

impl<S: Storage> Drop for MovedOut<'_, S> {
    fn drop(&mut self) {
        // SAFETY: The guard is only created once the caller commits to relocating
        // the held value elsewhere.
        unsafe {
            self.raw.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::{rc::Rc, string::String, vec, vec::Vec};
    use core::cell::Cell;

    use super::*;
    use crate::storage::{HeapStorage, InlineStorage, SmallBufferStorage};

    struct DropCounter(Rc<Cell<usize>>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    fn emplace<S: Storage, T: 'static>(raw: &mut RawAny<S>, value: T) -> &mut T {
        // SAFETY: The table describes `T`.
        unsafe { raw.emplace(value, TypeOps::of::<T>()) }
    }

    #[test]
    fn test_raw_any_size() {
        assert_eq!(
            core::mem::size_of::<RawAny<SmallBufferStorage>>(),
            3 * core::mem::size_of::<usize>()
        );
        assert_eq!(
            core::mem::size_of::<RawAny<HeapStorage>>(),
            2 * core::mem::size_of::<usize>()
        );
    }

    #[test]
    fn test_raw_any_emplace_and_reset() {
        let drops = Rc::new(Cell::new(0));
        let mut raw = RawAny::<InlineStorage<16>>::new();
        assert!(!raw.has_value());

        emplace(&mut raw, DropCounter(drops.clone()));
        assert!(raw.has_value());
        assert!(raw.has_type::<DropCounter>());
        assert!(!raw.has_type::<u32>());

        raw.reset();
        assert!(!raw.has_value());
        assert_eq!(drops.get(), 1);

        raw.reset();
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_raw_any_emplace_inline_reference_is_live() {
        let mut raw = RawAny::<InlineStorage<8>>::new();
        let value = emplace(&mut raw, 7u32);
        *value += 1;
        assert_eq!(raw.downcast_ref::<u32>(), Some(&8));

        let mut small = RawAny::<SmallBufferStorage>::new();
        emplace(&mut small, Cell::new(1u16)).set(2);
        if let Some(cell) = small.downcast_ref::<Cell<u16>>() {
            cell.set(cell.get() + 1);
        }
        assert_eq!(small.take::<Cell<u16>>().map(Cell::into_inner), Some(3));
    }

    #[test]
    fn test_raw_any_drop_runs_destructor() {
        let drops = Rc::new(Cell::new(0));
        {
            let mut raw = RawAny::<HeapStorage>::new();
            emplace(&mut raw, DropCounter(drops.clone()));
        }
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_raw_any_downcast() {
        let mut raw = RawAny::<SmallBufferStorage>::new();
        emplace(&mut raw, String::from("hello"));

        assert_eq!(raw.downcast_ref::<String>().map(String::as_str), Some("hello"));
        assert!(raw.downcast_ref::<&str>().is_none());

        if let Some(value) = raw.downcast_mut::<String>() {
            value.push_str(", world");
        }
        assert_eq!(raw.take::<String>().as_deref(), Some("hello, world"));
        assert!(!raw.has_value());
    }

    #[test]
    fn test_raw_any_assign_same_type_in_place() {
        let mut raw = RawAny::<HeapStorage>::new();
        emplace(&mut raw, vec![1u8, 2, 3]);
        let before = raw.storage().get_storage();

        // SAFETY: The table describes `Vec<u8>`.
        unsafe {
            raw.assign(vec![4u8], TypeOps::of::<Vec<u8>>());
        }
        assert_eq!(raw.storage().get_storage(), before);
        assert_eq!(raw.downcast_ref::<Vec<u8>>(), Some(&vec![4u8]));

        // SAFETY: The table describes `u16`.
        unsafe {
            raw.assign(7u16, TypeOps::of::<u16>());
        }
        assert_eq!(raw.downcast_ref::<u16>(), Some(&7));
    }

    #[test]
    fn test_raw_any_move_from_releases_source_without_drop() {
        let drops = Rc::new(Cell::new(0));
        let mut source = RawAny::<SmallBufferStorage>::new();
        let mut target = RawAny::<InlineStorage<32>>::new();
        emplace(&mut source, DropCounter(drops.clone()));

        target.move_from(&mut source);
        assert!(!source.has_value());
        assert!(target.has_type::<DropCounter>());
        assert_eq!(drops.get(), 0);

        drop(target);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_raw_any_move_from_same_type_reuses_block() {
        let drops = Rc::new(Cell::new(0));
        let mut source = RawAny::<InlineStorage<16>>::new();
        let mut target = RawAny::<InlineStorage<16>>::new();
        emplace(&mut source, DropCounter(drops.clone()));
        emplace(&mut target, DropCounter(drops.clone()));
        let before = target.storage().get_storage();

        target.move_from(&mut source);
        assert!(!source.has_value());
        assert_eq!(target.storage().get_storage(), before);
        assert_eq!(drops.get(), 1);

        drop(target);
        assert_eq!(drops.get(), 2);
    }

    #[test]
    fn test_raw_any_move_from_empty_resets_target() {
        let mut source = RawAny::<HeapStorage>::new();
        let mut target = RawAny::<HeapStorage>::new();
        emplace(&mut target, 5u8);

        target.move_from(&mut source);
        assert!(!target.has_value());
    }

    #[test]
    fn test_raw_any_copy_from() {
        let mut source = RawAny::<HeapStorage>::new();
        // SAFETY: The table describes `String`.
        unsafe {
            source.emplace(String::from("copied"), TypeOps::of_cloneable::<String>());
        }

        let mut target = RawAny::<SmallBufferStorage>::new();
        emplace(&mut target, 1u64);
        // SAFETY: The source table has the copy slots.
        unsafe {
            target.copy_from(&source);
        }
        assert_eq!(target.downcast_ref::<String>().map(String::as_str), Some("copied"));
        assert_eq!(source.downcast_ref::<String>().map(String::as_str), Some("copied"));
    }

    #[test]
    fn test_raw_any_swap_paths() {
        let mut a = RawAny::<HeapStorage>::new();
        let mut b = RawAny::<HeapStorage>::new();
        emplace(&mut a, 1u32);
        emplace(&mut b, String::from("two"));
        let a_ptr = a.storage().get_storage();
        a.swap(&mut b);
        assert_eq!(b.storage().get_storage(), a_ptr);
        assert_eq!(a.downcast_ref::<String>().map(String::as_str), Some("two"));
        assert_eq!(b.downcast_ref::<u32>(), Some(&1));

        let mut c = RawAny::<InlineStorage<24>>::new();
        let mut d = RawAny::<InlineStorage<24>>::new();
        emplace(&mut c, 3u8);
        c.swap(&mut d);
        assert!(!c.has_value());
        assert_eq!(d.downcast_ref::<u8>(), Some(&3));

        emplace(&mut c, String::from("four"));
        c.swap(&mut d);
        assert_eq!(c.downcast_ref::<u8>(), Some(&3));
        assert_eq!(d.downcast_ref::<String>().map(String::as_str), Some("four"));
    }

    #[test]
    fn test_raw_any_emplace_default() {
        let mut raw = RawAny::<SmallBufferStorage>::new();
        raw.emplace_default(TypeOps::of_default::<Vec<u8>>());
        assert_eq!(raw.downcast_ref::<Vec<u8>>(), Some(&Vec::new()));
    }

    #[test]
    #[should_panic(expected = "was not registered with default construction")]
    fn test_raw_any_emplace_default_without_slot() {
        let mut raw = RawAny::<SmallBufferStorage>::new();
        raw.emplace_default(TypeOps::of::<Vec<u8>>());
    }

    #[test]
    fn test_send_sync() {
        static_assertions::assert_not_impl_any!(RawAny<HeapStorage>: Send, Sync);
        static_assertions::assert_not_impl_any!(RawAny<InlineStorage<8>>: Send, Sync);
        static_assertions::assert_not_impl_any!(RawAny<SmallBufferStorage>: Send, Sync);
    }
}
