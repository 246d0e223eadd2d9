//! Per-type operations table.
//!
//! This module contains [`TypeOps`], a record of function pointers that
//! construct, destroy, copy and move a value of some concrete type `T` living
//! at a raw address. Tables are built at compile time through
//! [`TypeOpsBuilder`] and referenced as `&'static TypeOps`; they are never
//! mutated afterwards.
//!
//! The fields of [`TypeOps`] are private to this module. This guarantees the
//! safety invariant: **every function pointer stored in a table was
//! instantiated with the same type `T` whose layout and name the table
//! reports**.
//!
//! # Slot presence
//!
//! Destruction and both move operations are present for every type, since
//! every Rust value can be relocated by copying its bytes. The copy slots are
//! present only for tables built with [`TypeOpsBuilder::with_clone`] and the
//! default-construct slot only for tables built with
//! [`TypeOpsBuilder::with_default`]. Callers are expected to consult
//! [`TypeOps::supports_copy`] and [`TypeOps::supports_default`], or to know
//! statically that the slot is present; invoking an absent slot panics.
//!
//! # Identity
//!
//! Tables compare their types by [`TypeDescriptor`]. Each table also records
//! the [`TypeId`] of its type; when two descriptors compare equal but the
//! `TypeId`s differ, the descriptors collide and the comparison panics
//! instead of letting one type be reinterpreted as another.

use core::{alloc::Layout, any::TypeId, marker::PhantomData, ptr::NonNull};

use crate::descriptor::TypeDescriptor;

/// Signature of a slot that acts on a single address.
type UnaryOp = unsafe fn(NonNull<u8>);
/// Signature of a slot that acts on a destination and a source address.
type BinaryOp = unsafe fn(NonNull<u8>, NonNull<u8>);

/// Operations table for a single concrete type.
///
/// A type is not limited to one table. Depending on the entry point used,
/// [`TypeOps::of`], [`TypeOps::of_cloneable`], [`TypeOps::of_default`] and
/// [`TypeOps::of_cloneable_default`] each yield their own `'static` table for
/// the same `T`, so up to four tables may describe it. They differ only in
/// which optional slots are present. Compare tables with
/// [`TypeOps::same_type`] rather than by address.
///
/// # Safety Invariant
///
/// All function pointers were instantiated with the type `T` that was used to
/// create the [`TypeOpsBuilder`] this table came from, and `layout` equals
/// `Layout::new::<T>()`.
pub struct TypeOps {
    /// Layout of the described type.
    layout: Layout,
    /// Returns the [`TypeId`] of the described type.
    type_id: fn() -> TypeId,
    /// Returns the name of the described type.
    type_name: fn() -> &'static str,
    /// Writes `T::default()` to the address.
    default_construct: Option<UnaryOp>,
    /// Runs the destructor of the `T` at the address.
    destruct: UnaryOp,
    /// Writes a clone of the source `T` to the destination.
    copy_construct: Option<BinaryOp>,
    /// Calls `clone_from` on the destination `T` with the source `T`.
    copy_assign: Option<BinaryOp>,
    /// Relocates the source `T` into uninitialized destination memory.
    move_construct: BinaryOp,
    /// Drops the destination `T` and relocates the source `T` into it.
    move_assign: BinaryOp,
}

impl TypeOps {
    /// Returns the table for `T` without copy or default support.
    #[inline]
    #[must_use]
    pub const fn of<T: 'static>() -> &'static Self {
        const { &TypeOpsBuilder::<T>::new().build() }
    }

    /// Returns the table for `T` with copy support.
    #[inline]
    #[must_use]
    pub const fn of_cloneable<T: Clone + 'static>() -> &'static Self {
        const { &TypeOpsBuilder::<T>::new().with_clone().build() }
    }

    /// Returns the table for `T` with default-construct support.
    #[inline]
    #[must_use]
    pub const fn of_default<T: Default + 'static>() -> &'static Self {
        const { &TypeOpsBuilder::<T>::new().with_default().build() }
    }

    /// Returns the table for `T` with both copy and default-construct
    /// support.
    #[inline]
    #[must_use]
    pub const fn of_cloneable_default<T: Clone + Default + 'static>() -> &'static Self {
        const {
            &TypeOpsBuilder::<T>::new()
                .with_clone()
                .with_default()
                .build()
        }
    }

    /// Layout of the described type.
    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Size in bytes of the described type.
    #[inline]
    pub fn size(&self) -> usize {
        self.layout.size()
    }

    /// Descriptor of the described type.
    #[inline]
    pub fn descriptor(&self) -> TypeDescriptor {
        TypeDescriptor::from_name((self.type_name)())
    }

    /// [`TypeId`] of the described type.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    /// Returns `true` if this table describes `T`.
    ///
    /// # Panics
    ///
    /// Panics if the descriptor of `T` collides with the descriptor of a
    /// different type described by this table.
    #[inline]
    #[track_caller]
    pub fn describes<T: ?Sized + 'static>(&self) -> bool {
        let descriptor = self.descriptor();
        if descriptor != TypeDescriptor::of::<T>() {
            return false;
        }
        if self.type_id() != TypeId::of::<T>() {
            descriptor_collision(descriptor);
        }
        true
    }

    /// Returns `true` if both tables describe the same type.
    ///
    /// Tables for the same type built with different slot sets are distinct
    /// objects, so this compares descriptors rather than addresses.
    ///
    /// # Panics
    ///
    /// Panics if the two tables describe different types whose descriptors
    /// collide.
    #[inline]
    #[track_caller]
    pub fn same_type(&self, other: &TypeOps) -> bool {
        if core::ptr::eq(self, other) {
            return true;
        }
        let descriptor = self.descriptor();
        if descriptor != other.descriptor() {
            return false;
        }
        if self.type_id() != other.type_id() {
            descriptor_collision(descriptor);
        }
        true
    }

    /// Returns `true` if the default-construct slot is present.
    #[inline]
    pub fn supports_default(&self) -> bool {
        self.default_construct.is_some()
    }

    /// Returns `true` if both copy slots are present.
    #[inline]
    pub fn supports_copy(&self) -> bool {
        self.copy_construct.is_some() && self.copy_assign.is_some()
    }

    /// Default-constructs a value at `dest`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `dest` is valid for writes of [`Self::layout`] and properly aligned.
    /// 2. `dest` does not currently hold a live value.
    ///
    /// # Panics
    ///
    /// Panics if the default-construct slot is absent.
    #[inline]
    #[track_caller]
    pub unsafe fn default_construct(&self, dest: NonNull<u8>) {
        let Some(default_construct) = self.default_construct else {
            missing_slot(self, "default-construct")
        };
        // SAFETY: The slot was instantiated with the type described by this table
        // (type invariant) and the caller upholds the address requirements.
        unsafe {
            default_construct(dest);
        }
    }

    /// Runs the destructor of the value at `ptr`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` points to a live value of the described type.
    /// 2. The value is not used afterwards; its memory is left uninitialized.
    #[inline]
    pub unsafe fn destruct(&self, ptr: NonNull<u8>) {
        // SAFETY: Guaranteed by the caller together with the type invariant.
        unsafe {
            (self.destruct)(ptr);
        }
    }

    /// Writes a copy of the value at `src` to `dest`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `src` points to a live value of the described type.
    /// 2. `dest` is valid for writes of [`Self::layout`], properly aligned,
    ///    does not hold a live value and does not overlap `src`.
    ///
    /// # Panics
    ///
    /// Panics if the copy slots are absent. Panics raised by the type's
    /// `Clone` implementation propagate with `dest` left uninitialized.
    #[inline]
    #[track_caller]
    pub unsafe fn copy_construct(&self, dest: NonNull<u8>, src: NonNull<u8>) {
        let Some(copy_construct) = self.copy_construct else {
            missing_slot(self, "copy-construct")
        };
        // SAFETY: Guaranteed by the caller together with the type invariant.
        unsafe {
            copy_construct(dest, src);
        }
    }

    /// Copy-assigns the value at `src` onto the value at `dest`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `src` and `dest` both point to live, distinct values of the
    ///    described type.
    ///
    /// # Panics
    ///
    /// Panics if the copy slots are absent.
    #[inline]
    #[track_caller]
    pub unsafe fn copy_assign(&self, dest: NonNull<u8>, src: NonNull<u8>) {
        let Some(copy_assign) = self.copy_assign else {
            missing_slot(self, "copy-assign")
        };
        // SAFETY: Guaranteed by the caller together with the type invariant.
        unsafe {
            copy_assign(dest, src);
        }
    }

    /// Relocates the value at `src` into `dest`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `src` points to a live value of the described type.
    /// 2. `dest` is valid for writes of [`Self::layout`], properly aligned,
    ///    does not hold a live value and does not overlap `src`.
    /// 3. The value at `src` is treated as moved-out afterwards: it must be
    ///    neither used nor destroyed.
    #[inline]
    pub unsafe fn move_construct(&self, dest: NonNull<u8>, src: NonNull<u8>) {
        // SAFETY: Guaranteed by the caller together with the type invariant.
        unsafe {
            (self.move_construct)(dest, src);
        }
    }

    /// Replaces the value at `dest` with the value relocated from `src`,
    /// dropping the previous value at `dest`.
    ///
    /// The relocated value is in place before the previous value is dropped.
    /// If that destructor unwinds, `dest` still holds the relocated value and
    /// the value at `src` is moved-out all the same.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `src` and `dest` both point to live, distinct values of the
    ///    described type.
    /// 2. The value at `src` is treated as moved-out afterwards, also when
    ///    this call unwinds: it must be neither used nor destroyed.
    #[inline]
    pub unsafe fn move_assign(&self, dest: NonNull<u8>, src: NonNull<u8>) {
        // SAFETY: Guaranteed by the caller together with the type invariant.
        unsafe {
            (self.move_assign)(dest, src);
        }
    }
}

impl core::fmt::Debug for TypeOps {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TypeOps")
            .field("type_name", &(self.type_name)())
            .field("size", &self.layout.size())
            .field("align", &self.layout.align())
            .field("supports_default", &self.supports_default())
            .field("supports_copy", &self.supports_copy())
            .finish()
    }
}

#[cold]
#[inline(never)]
#[track_caller]
fn missing_slot(ops: &TypeOps, slot: &str) -> ! {
    panic!(
        "the {slot} operation is not available for `{}`",
        (ops.type_name)()
    )
}

#[cold]
#[inline(never)]
#[track_caller]
fn descriptor_collision(descriptor: TypeDescriptor) -> ! {
    panic!("distinct types share the type descriptor `{descriptor}`")
}

/// Compile-time builder for [`TypeOps`].
///
/// Each optional slot is enabled by a method whose bound requires the
/// corresponding trait, so a slot can only ever be filled for types that
/// support the operation.
pub struct TypeOpsBuilder<T: 'static> {
    /// Table under construction.
    ops: TypeOps,
    /// Ties the builder to `T` without owning one.
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> TypeOpsBuilder<T> {
    /// Starts a table for `T` holding only the always-present slots.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ops: TypeOps {
                layout: Layout::new::<T>(),
                type_id: TypeId::of::<T>,
                type_name: core::any::type_name::<T>,
                default_construct: None,
                destruct: destruct::<T>,
                copy_construct: None,
                copy_assign: None,
                move_construct: move_construct::<T>,
                move_assign: move_assign::<T>,
            },
            _marker: PhantomData,
        }
    }

    /// Fills the copy-construct and copy-assign slots.
    #[must_use]
    pub const fn with_clone(mut self) -> Self
    where
        T: Clone,
    {
        self.ops.copy_construct = Some(copy_construct::<T>);
        self.ops.copy_assign = Some(copy_assign::<T>);
        self
    }

    /// Fills the default-construct slot.
    #[must_use]
    pub const fn with_default(mut self) -> Self
    where
        T: Default,
    {
        self.ops.default_construct = Some(default_construct::<T>);
        self
    }

    /// Finishes the table.
    #[must_use]
    pub const fn build(self) -> TypeOps {
        self.ops
    }
}

/// Writes `T::default()` to `dest`.
///
/// # Safety
///
/// `dest` must be valid for writes of `T` and properly aligned.
unsafe fn default_construct<T: Default>(dest: NonNull<u8>) {
    let value = T::default();
    // SAFETY: Guaranteed by the caller.
    unsafe {
        dest.cast::<T>().write(value);
    }
}

/// Drops the `T` at `ptr` in place.
///
/// # Safety
///
/// `ptr` must point to a live `T` that is not used afterwards.
unsafe fn destruct<T>(ptr: NonNull<u8>) {
    // SAFETY: Guaranteed by the caller.
    unsafe {
        ptr.cast::<T>().drop_in_place();
    }
}

/// Writes a clone of the `T` at `src` to `dest`.
///
/// # Safety
///
/// `src` must point to a live `T`; `dest` must be valid for writes of `T`,
/// properly aligned and not overlap `src`.
unsafe fn copy_construct<T: Clone>(dest: NonNull<u8>, src: NonNull<u8>) {
    // SAFETY: `src` points to a live `T` as guaranteed by the caller.
    let source: &T = unsafe { src.cast::<T>().as_ref() };
    let value = source.clone();
    // SAFETY: Guaranteed by the caller.
    unsafe {
        dest.cast::<T>().write(value);
    }
}

/// Calls `clone_from` on the `T` at `dest` with the `T` at `src`.
///
/// # Safety
///
/// `src` and `dest` must point to live, distinct values of type `T`.
unsafe fn copy_assign<T: Clone>(dest: NonNull<u8>, src: NonNull<u8>) {
    // SAFETY: `src` points to a live `T` as guaranteed by the caller.
    let source: &T = unsafe { src.cast::<T>().as_ref() };
    // SAFETY: `dest` points to a live `T` distinct from `src` as guaranteed by the
    // caller, so no other reference aliases it.
    let target: &mut T = unsafe { dest.cast::<T>().as_mut() };
    target.clone_from(source);
}

/// Relocates the `T` at `src` into `dest`.
///
/// # Safety
///
/// `src` must point to a live `T` that is treated as moved-out afterwards;
/// `dest` must be valid for writes of `T`, properly aligned and not overlap
/// `src`.
unsafe fn move_construct<T>(dest: NonNull<u8>, src: NonNull<u8>) {
    // SAFETY: Guaranteed by the caller.
    unsafe {
        dest.cast::<T>()
            .copy_from_nonoverlapping(src.cast::<T>(), 1);
    }
}

/// Drops the `T` at `dest` and relocates the `T` at `src` into it.
///
/// # Safety
///
/// `src` and `dest` must point to live, distinct values of type `T`; the
/// value at `src` is treated as moved-out afterwards.
unsafe fn move_assign<T>(dest: NonNull<u8>, src: NonNull<u8>) {
    // SAFETY: `src` points to a live `T` whose ownership the caller hands over.
    let value: T = unsafe { src.cast::<T>().read() };
    // SAFETY: `dest` points to a live `T` distinct from `src` as guaranteed by the
    // caller.
    let target: &mut T = unsafe { dest.cast::<T>().as_mut() };
    let previous = core::mem::replace(target, value);
    drop(previous);
}

#[cfg(test)]
mod tests {
    use alloc::{string::String, vec::Vec};
    use core::mem::MaybeUninit;

    use super::*;

    #[derive(Clone, Default, PartialEq, Debug)]
    struct Sample {
        text: String,
        numbers: Vec<u32>,
    }

    #[test]
    fn test_type_ops_are_static() {
        let a = TypeOps::of::<u32>();
        let b = TypeOps::of::<u32>();
        assert!(core::ptr::eq(a, b));
    }

    #[test]
    fn test_type_ops_slots() {
        let plain = TypeOps::of::<Sample>();
        assert!(!plain.supports_copy());
        assert!(!plain.supports_default());

        let cloneable = TypeOps::of_cloneable::<Sample>();
        assert!(cloneable.supports_copy());
        assert!(!cloneable.supports_default());

        let both = TypeOps::of_cloneable_default::<Sample>();
        assert!(both.supports_copy());
        assert!(both.supports_default());

        assert!(plain.same_type(cloneable));
        assert!(plain.same_type(both));
        assert!(!plain.same_type(TypeOps::of::<u32>()));
    }

    #[test]
    fn test_type_ops_layout() {
        let ops = TypeOps::of::<[u64; 3]>();
        assert_eq!(ops.size(), 24);
        assert_eq!(ops.layout(), Layout::new::<[u64; 3]>());
        assert!(ops.describes::<[u64; 3]>());
        assert!(!ops.describes::<[u64; 2]>());
    }

    #[test]
    fn test_type_ops_copy_and_move() {
        let ops = TypeOps::of_cloneable_default::<Sample>();
        let mut first = MaybeUninit::<Sample>::uninit();
        let mut second = MaybeUninit::<Sample>::uninit();
        let first_ptr = NonNull::from(&mut first).cast::<u8>();
        let second_ptr = NonNull::from(&mut second).cast::<u8>();

        // SAFETY: `first` is valid uninitialized memory for a `Sample`.
        unsafe {
            ops.default_construct(first_ptr);
        }
        // SAFETY: `first` was initialized above and is only reached through
        // `first_ptr`.
        let first_ref = unsafe { first_ptr.cast::<Sample>().as_mut() };
        assert_eq!(*first_ref, Sample::default());
        first_ref.text.push_str("hello");

        // SAFETY: `first` is live and `second` is uninitialized and distinct.
        unsafe {
            ops.copy_construct(second_ptr, first_ptr);
        }
        // SAFETY: `second` was initialized by the copy.
        let second_ref = unsafe { second_ptr.cast::<Sample>().as_ref() };
        assert_eq!(second_ref.text, "hello");

        // SAFETY: both are live and distinct; `second` is not used afterwards.
        unsafe {
            ops.move_assign(first_ptr, second_ptr);
        }
        // SAFETY: `first` is still live after the move-assign.
        let first_ref = unsafe { first_ptr.cast::<Sample>().as_ref() };
        assert_eq!(first_ref.text, "hello");

        // SAFETY: `first` is live and is not used afterwards.
        unsafe {
            ops.destruct(first_ptr);
        }
    }

    #[test]
    #[should_panic(expected = "distinct types share the type descriptor `u32`")]
    fn test_descriptor_collision_panics() {
        fn pretend_u32() -> &'static str {
            "u32"
        }

        let mut impostor = TypeOpsBuilder::<i32>::new().build();
        impostor.type_name = pretend_u32;
        assert_eq!(impostor.descriptor(), TypeDescriptor::of::<u32>());

        let _ = TypeOps::of::<u32>().same_type(&impostor);
    }

    #[test]
    #[should_panic(expected = "copy-construct")]
    fn test_missing_slot_panics() {
        let ops = TypeOps::of::<u8>();
        let mut src = 1u8;
        let mut dest = MaybeUninit::<u8>::uninit();
        // SAFETY: both addresses are valid; the call panics before touching them.
        unsafe {
            ops.copy_construct(
                NonNull::from(&mut dest).cast(),
                NonNull::from(&mut src),
            );
        }
    }
}
