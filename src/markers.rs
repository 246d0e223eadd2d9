//! Capability markers controlling which value-level operations a container
//! exposes.
//!
//! Every container type [`AnyBase<S, L>`](crate::AnyBase) carries a
//! capability level `L` as its second type parameter. The level decides at
//! compile time whether the *held value* may be copied or moved by the
//! container:
//!
//! - [`NoCopyOrMove`]: The value stays where it was constructed. It can be
//!   emplaced, accessed and reset, and heap-backed containers can still
//!   exchange ownership of their blocks.
//! - [`MoveOnly`]: The value can additionally be moved out, assigned from a
//!   bare value, and moved between containers.
//! - [`CopyAndMove`]: The value can additionally be cloned, so the container
//!   itself implements [`Clone`]. Only [`Clone`] types can be stored.
//!
//! Moving a container object itself is always allowed in Rust; it transfers
//! ownership of the whole container and never runs any operation on the held
//! value.
//!
//! # Examples
//!
//! ```
//! use holdall::{CopyableAny, MovableAny, NonMovableAny};
//!
//! let mut copyable = CopyableAny::from_value(String::from("shared"));
//! let copy = copyable.clone();
//! assert_eq!(copy.value::<String>(), "shared");
//!
//! let mut movable = MovableAny::new();
//! movable.move_from(&mut copyable);
//! assert!(!copyable.has_value());
//!
//! let mut pinned = NonMovableAny::new();
//! pinned.emplace(5u8);
//! assert_eq!(*pinned.value::<u8>(), 5);
//! ```
//!
//! A container whose level forbids copying does not implement [`Clone`]:
//!
//! ```compile_fail
//! use holdall::MovableAny;
//!
//! let movable = MovableAny::from_value(1u32);
//! let copy = movable.clone();
//! ```

use holdall_internals::{
    TypeOps,
    storage::{HeapStorage, Storage},
};

/// Capability level of a container, as a runtime value.
///
/// Levels are totally ordered: each level permits everything the lower levels
/// permit.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub enum CapabilityLevel {
    /// The held value is never copied or moved by the container.
    NoCopyOrMove,
    /// The held value may be moved but not copied.
    MoveOnly,
    /// The held value may be copied and moved.
    CopyAndMove,
}

/// Marker for containers whose held value is never copied or moved.
///
/// See the [module documentation](self) for an overview of the levels.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct NoCopyOrMove;

/// Marker for containers whose held value may be moved but not copied.
///
/// Any `'static` type can be stored at this level.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct MoveOnly;

/// Marker for containers whose held value may be copied and moved.
///
/// Only types implementing [`Clone`] can be stored at this level. This is the
/// default level of [`AnyBase`](crate::AnyBase).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct CopyAndMove;

mod sealed_capability {
    use super::*;

    pub trait Sealed: 'static {}

    impl Sealed for NoCopyOrMove {}
    impl Sealed for MoveOnly {}
    impl Sealed for CopyAndMove {}
}

mod sealed_storable {
    use super::*;

    pub trait Sealed<L> {}

    impl<T: 'static> Sealed<NoCopyOrMove> for T {}
    impl<T: 'static> Sealed<MoveOnly> for T {}
    impl<T: Clone + 'static> Sealed<CopyAndMove> for T {}
}

/// A capability level usable as the `L` parameter of
/// [`AnyBase`](crate::AnyBase).
///
/// This trait is sealed and implemented only for [`NoCopyOrMove`],
/// [`MoveOnly`] and [`CopyAndMove`].
pub trait Capability: sealed_capability::Sealed + Copy + Default + core::fmt::Debug {
    /// The runtime value of this level.
    const LEVEL: CapabilityLevel;
}

impl Capability for NoCopyOrMove {
    const LEVEL: CapabilityLevel = CapabilityLevel::NoCopyOrMove;
}
impl Capability for MoveOnly {
    const LEVEL: CapabilityLevel = CapabilityLevel::MoveOnly;
}
impl Capability for CopyAndMove {
    const LEVEL: CapabilityLevel = CapabilityLevel::CopyAndMove;
}

/// Levels at which the held value may be moved: [`MoveOnly`] and
/// [`CopyAndMove`].
pub trait Movable: Capability {}

impl Movable for MoveOnly {}
impl Movable for CopyAndMove {}

/// Levels at which the held value may be copied: [`CopyAndMove`].
pub trait Copyable: Movable {}

impl Copyable for CopyAndMove {}

/// Levels whose containers accept a value moved out of a container of level
/// `M`.
///
/// A value may move between containers of the same movable level, and from a
/// [`CopyAndMove`] container into a [`MoveOnly`] one. Moving into a
/// [`CopyAndMove`] container from a [`MoveOnly`] one is rejected, since the
/// value may not be [`Clone`]:
///
/// ```compile_fail
/// use holdall::{CopyableAny, MovableAny};
///
/// let mut source = MovableAny::from_value(1u32);
/// let mut target = CopyableAny::new();
/// target.move_from(&mut source);
/// ```
pub trait AcceptsMoveFrom<M: Capability>: Movable {}

impl AcceptsMoveFrom<MoveOnly> for MoveOnly {}
impl AcceptsMoveFrom<CopyAndMove> for MoveOnly {}
impl AcceptsMoveFrom<CopyAndMove> for CopyAndMove {}

/// Levels whose containers with storage `S` support
/// [`swap`](crate::AnyBase::swap).
///
/// Movable levels can always swap, falling back to moving values when the
/// storage cannot exchange ownership directly. [`NoCopyOrMove`] containers can
/// only swap when the storage always exchanges ownership without touching the
/// values, which is the case for [`HeapStorage`].
///
/// ```compile_fail
/// use holdall::{SmallAny, markers::NoCopyOrMove};
///
/// let mut a = SmallAny::<NoCopyOrMove>::new();
/// let mut b = SmallAny::<NoCopyOrMove>::new();
/// a.swap(&mut b);
/// ```
pub trait SwapSupport<S: Storage>: Capability {}

impl<S: Storage> SwapSupport<S> for MoveOnly {}
impl<S: Storage> SwapSupport<S> for CopyAndMove {}
impl SwapSupport<HeapStorage> for NoCopyOrMove {}

/// Types that can be stored in a container of level `L`.
///
/// # Implementations
///
/// - For `L = NoCopyOrMove` and `L = MoveOnly`: Implemented for all `Sized +
///   'static` types.
/// - For `L = CopyAndMove`: Implemented for all `Sized + 'static` types that
///   are also [`Clone`].
///
/// This trait is sealed; the blanket implementations above are the only ones.
///
/// The table a value is stored with depends on the level and on whether it
/// was default-constructed, so one type can be held under up to four
/// distinct tables. Containers compare held types by descriptor, which makes
/// a value moved or copied between levels keep the same identity.
///
/// ```compile_fail
/// use holdall::CopyableAny;
///
/// struct NotClone;
///
/// let mut any = CopyableAny::new();
/// any.emplace(NotClone);
/// ```
pub trait StorableFor<L: Capability>: sealed_storable::Sealed<L> + Sized + 'static {
    /// The operations table used for values stored at level `L`.
    #[doc(hidden)]
    fn type_ops() -> &'static TypeOps;

    /// The operations table used for values default-constructed at level
    /// `L`.
    #[doc(hidden)]
    fn default_type_ops() -> &'static TypeOps
    where
        Self: Default;
}

impl<T: 'static> StorableFor<NoCopyOrMove> for T {
    #[inline(always)]
    fn type_ops() -> &'static TypeOps {
        TypeOps::of::<T>()
    }

    #[inline(always)]
    fn default_type_ops() -> &'static TypeOps
    where
        T: Default,
    {
        TypeOps::of_default::<T>()
    }
}

impl<T: 'static> StorableFor<MoveOnly> for T {
    #[inline(always)]
    fn type_ops() -> &'static TypeOps {
        TypeOps::of::<T>()
    }

    #[inline(always)]
    fn default_type_ops() -> &'static TypeOps
    where
        T: Default,
    {
        TypeOps::of_default::<T>()
    }
}

impl<T: Clone + 'static> StorableFor<CopyAndMove> for T {
    #[inline(always)]
    fn type_ops() -> &'static TypeOps {
        TypeOps::of_cloneable::<T>()
    }

    #[inline(always)]
    fn default_type_ops() -> &'static TypeOps
    where
        T: Default,
    {
        TypeOps::of_cloneable_default::<T>()
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::*;

    #[test]
    fn test_levels_are_ordered() {
        assert!(NoCopyOrMove::LEVEL < MoveOnly::LEVEL);
        assert!(MoveOnly::LEVEL < CopyAndMove::LEVEL);
    }

    #[test]
    fn test_copy_tables_only_at_copy_level() {
        assert!(!<String as StorableFor<NoCopyOrMove>>::type_ops().supports_copy());
        assert!(!<String as StorableFor<MoveOnly>>::type_ops().supports_copy());
        assert!(<String as StorableFor<CopyAndMove>>::type_ops().supports_copy());
        assert!(<String as StorableFor<CopyAndMove>>::default_type_ops().supports_default());
    }

    #[test]
    fn test_tables_of_one_type_agree_on_identity() {
        let plain = <String as StorableFor<MoveOnly>>::type_ops();
        let defaulted = <String as StorableFor<MoveOnly>>::default_type_ops();
        let cloneable = <String as StorableFor<CopyAndMove>>::type_ops();
        let both = <String as StorableFor<CopyAndMove>>::default_type_ops();

        assert!(!plain.supports_copy() && !plain.supports_default());
        assert!(defaulted.supports_default() && !defaulted.supports_copy());
        for ops in [defaulted, cloneable, both] {
            assert!(plain.same_type(ops));
            assert_eq!(plain.descriptor(), ops.descriptor());
        }
    }
}
