//! Recognizing containers in generic code, and downcasting through them.

use holdall_internals::{RawAny, storage::Storage};

use crate::{AnyBase, markers::Capability};

mod sealed_container {
    use super::*;

    pub trait Sealed {}

    impl<S: Storage, L: Capability> Sealed for AnyBase<S, L> {}
}

/// Implemented by every instantiation of [`AnyBase`], and nothing else.
///
/// Generic code can use this trait to tell a container apart from a value to
/// be stored: a function bounded by `C: AnyContainer` accepts any storage
/// backend and level, while a function bounded by
/// [`StorableFor<L>`](crate::markers::StorableFor) accepts the bare value.
///
/// This trait is sealed and cannot be implemented outside of this crate.
///
/// # Examples
///
/// ```
/// use holdall::{AnyContainer, CopyableAny, HeapAny, markers::MoveOnly};
///
/// fn describe<C: AnyContainer>(container: &C) -> &'static str {
///     container.type_name().unwrap_or("nothing")
/// }
///
/// assert_eq!(describe(&CopyableAny::from_value(1u8)), "u8");
/// assert_eq!(describe(&HeapAny::<MoveOnly>::new()), "nothing");
/// ```
pub trait AnyContainer: sealed_container::Sealed + Sized {
    /// The storage backend of the container.
    type Storage: Storage;
    /// The capability level of the container.
    type Level: Capability;

    /// Returns `true` if the container holds a value.
    fn has_value(&self) -> bool {
        self.raw().has_value()
    }

    /// Returns `true` if the container holds a value of type `T`.
    ///
    /// # Panics
    ///
    /// Panics if the held value's type and `T` are distinct types sharing one
    /// [`TypeDescriptor`](crate::TypeDescriptor).
    #[track_caller]
    fn has_type<T: ?Sized + 'static>(&self) -> bool {
        self.raw().has_type::<T>()
    }

    /// Returns the name of the held value's type, or `None` if empty.
    fn type_name(&self) -> Option<&'static str> {
        self.raw().type_descriptor().map(|descriptor| descriptor.name())
    }

    /// Returns the underlying [`RawAny`].
    #[doc(hidden)]
    fn raw(&self) -> &RawAny<Self::Storage>;

    /// Returns the underlying [`RawAny`] mutably.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. When the mutable borrow ends, the container is either empty or holds
    ///    a value whose table is valid at [`Self::Level`].
    #[doc(hidden)]
    unsafe fn raw_mut(&mut self) -> &mut RawAny<Self::Storage>;
}

impl<S: Storage, L: Capability> AnyContainer for AnyBase<S, L> {
    type Storage = S;
    type Level = L;

    #[inline(always)]
    fn raw(&self) -> &RawAny<S> {
        self.as_raw()
    }

    #[inline(always)]
    unsafe fn raw_mut(&mut self) -> &mut RawAny<S> {
        // SAFETY: Forwarded from the caller.
        unsafe { self.as_raw_mut() }
    }
}

/// Returns a reference to the value held by `container` if it is of type
/// `T`.
///
/// Equivalent to [`AnyBase::try_get_value`], for any container type.
///
/// # Examples
///
/// ```
/// use holdall::{MovableAny, any_cast};
///
/// let any = MovableAny::from_value(7u32);
/// assert_eq!(any_cast::<u32, _>(&any), Some(&7));
/// assert_eq!(any_cast::<i32, _>(&any), None);
/// ```
///
/// # Panics
///
/// Panics if the held value's type and `T` are distinct types sharing one
/// [`TypeDescriptor`](crate::TypeDescriptor).
#[inline]
#[track_caller]
pub fn any_cast<T: 'static, C: AnyContainer>(container: &C) -> Option<&T> {
    container.raw().downcast_ref::<T>()
}

/// Returns a mutable reference to the value held by `container` if it is of
/// type `T`.
///
/// Equivalent to [`AnyBase::try_get_value_mut`], for any container type.
///
/// # Panics
///
/// Panics on a descriptor collision, as [`any_cast`] does.
#[inline]
#[track_caller]
pub fn any_cast_mut<T: 'static, C: AnyContainer>(container: &mut C) -> Option<&mut T> {
    // SAFETY: Mutating the held value in place does not change its type or its
    // table.
    let raw = unsafe { container.raw_mut() };
    raw.downcast_mut::<T>()
}
