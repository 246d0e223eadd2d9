use holdall_internals::{TypeDescriptor, storage::Storage};

use crate::{
    cast::AnyContainer,
    error::AccessError,
    markers::{
        AcceptsMoveFrom, Capability, CapabilityLevel, CopyAndMove, Copyable, Movable,
        StorableFor, SwapSupport,
    },
};

/// FIXME: Once rust-lang/rust#132922 gets resolved, we can make the `raw` field
/// an unsafe field and remove this module.
mod limit_field_access {
    use core::marker::PhantomData;

    use holdall_internals::{RawAny, storage::Storage};

    use crate::markers::{Capability, CopyAndMove};

    /// A container holding at most one value of any `'static` type.
    ///
    /// [`AnyBase`] is the generic core behind every container in this crate.
    /// The held value's type is decided at runtime and can be queried with
    /// [`has_type`](Self::has_type) and [`type_descriptor`](Self::type_descriptor).
    ///
    /// # Type Parameters
    ///
    /// - **Storage (`S`)**: Where the value's bytes live
    ///   - [`HeapStorage`]: Always in a separate heap block
    ///   - [`InlineStorage<N>`]: Always inside the container; values that do
    ///     not fit in `N` bytes are rejected with a panic
    ///   - [`SmallBufferStorage<N>`]: Inside the container when they fit,
    ///     otherwise in a heap block
    /// - **Level (`L`)**: Which operations may be applied to the held value
    ///   - [`NoCopyOrMove`]: The value is never copied or moved
    ///   - [`MoveOnly`]: The value may be moved
    ///   - [`CopyAndMove`]: The value may be copied and moved (default)
    ///
    /// Most code uses one of the aliases in [`facades`](crate::facades), such
    /// as [`SmallAny`](crate::SmallAny) or [`CopyableAny`](crate::CopyableAny).
    ///
    /// # Examples
    ///
    /// ```
    /// use holdall::CopyableAny;
    ///
    /// let mut any = CopyableAny::new();
    /// assert!(!any.has_value());
    ///
    /// any.emplace(5i32);
    /// assert!(any.has_type::<i32>());
    /// assert_eq!(any.try_get_value::<char>(), None);
    /// assert_eq!(*any.value::<i32>(), 5);
    ///
    /// any.reset();
    /// assert!(!any.has_value());
    /// ```
    ///
    /// [`HeapStorage`]: holdall_internals::storage::HeapStorage
    /// [`InlineStorage<N>`]: holdall_internals::storage::InlineStorage
    /// [`SmallBufferStorage<N>`]: holdall_internals::storage::SmallBufferStorage
    /// [`NoCopyOrMove`]: crate::markers::NoCopyOrMove
    /// [`MoveOnly`]: crate::markers::MoveOnly
    /// [`CopyAndMove`]: crate::markers::CopyAndMove
    pub struct AnyBase<S: Storage, L: Capability = CopyAndMove> {
        /// # Safety
        ///
        /// The following safety invariants are guaranteed to be upheld as long
        /// as this struct exists:
        ///
        /// 1. If a value is held, its operations table is the table
        ///    `<T as StorableFor<M>>::type_ops()` or
        ///    `<T as StorableFor<M>>::default_type_ops()` for its type `T` and
        ///    some level `M` with `M = L` or `L: AcceptsMoveFrom<M>`.
        /// 2. In particular, if `L = CopyAndMove`, the table of the held
        ///    value has the copy slots.
        raw: RawAny<S>,
        _level: PhantomData<L>,
    }

    impl<S: Storage, L: Capability> AnyBase<S, L> {
        /// Creates an empty container.
        #[inline]
        #[must_use]
        pub fn new() -> Self {
            Self {
                raw: RawAny::new(),
                _level: PhantomData,
            }
        }

        /// Returns a reference to the underlying [`RawAny`].
        #[inline(always)]
        pub(crate) fn as_raw(&self) -> &RawAny<S> {
            &self.raw
        }

        /// Returns a mutable reference to the underlying [`RawAny`].
        ///
        /// # Safety
        ///
        /// The caller must ensure:
        ///
        /// 1. Any value held after the mutable borrow ends satisfies the
        ///    invariants documented on the `raw` field.
        #[inline(always)]
        pub(crate) unsafe fn as_raw_mut(&mut self) -> &mut RawAny<S> {
            &mut self.raw
        }
    }
}
pub use limit_field_access::AnyBase;

impl<S: Storage, L: Capability> AnyBase<S, L> {
    /// The capability level of this container type.
    ///
    /// ```
    /// use holdall::{CopyableAny, MovableAny, markers::CapabilityLevel};
    ///
    /// assert_eq!(CopyableAny::COPY_SUPPORT, CapabilityLevel::CopyAndMove);
    /// assert!(MovableAny::COPY_SUPPORT < CopyableAny::COPY_SUPPORT);
    /// ```
    pub const COPY_SUPPORT: CapabilityLevel = L::LEVEL;

    /// Returns `true` if the container holds a value.
    #[inline]
    pub fn has_value(&self) -> bool {
        self.as_raw().has_value()
    }

    /// Returns `true` if the container holds a value of type `T`.
    ///
    /// ```
    /// use holdall::CopyableAny;
    ///
    /// let mut any = CopyableAny::new();
    /// assert!(!any.has_type::<u8>());
    /// any.emplace(1u8);
    /// assert!(any.has_type::<u8>());
    /// assert!(!any.has_type::<i8>());
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the held value's type and `T` are distinct types sharing one
    /// [`TypeDescriptor`]. Types are never reinterpreted as one another.
    #[inline]
    #[track_caller]
    pub fn has_type<T: ?Sized + 'static>(&self) -> bool {
        self.as_raw().has_type::<T>()
    }

    /// Returns the descriptor of the held value's type, or `None` if empty.
    #[inline]
    pub fn type_descriptor(&self) -> Option<TypeDescriptor> {
        self.as_raw().type_descriptor()
    }

    /// Returns the name of the held value's type, or `None` if empty.
    #[inline]
    pub fn type_name(&self) -> Option<&'static str> {
        self.type_descriptor().map(|descriptor| descriptor.name())
    }

    /// Returns the storage backend.
    #[inline]
    pub fn storage(&self) -> &S {
        self.as_raw().storage()
    }

    /// Destroys the held value, if any. Calling this on an empty container
    /// does nothing.
    #[inline]
    pub fn reset(&mut self) {
        // SAFETY: An empty container trivially upholds the invariants.
        let raw = unsafe { self.as_raw_mut() };
        raw.reset();
    }

    /// Replaces the held value with `value` and returns a mutable reference
    /// to it.
    ///
    /// ```
    /// use holdall::{SmallAny, markers::MoveOnly};
    ///
    /// let mut any = SmallAny::<MoveOnly>::new();
    /// any.emplace(String::from("one")).push_str(" two");
    /// assert_eq!(any.value::<String>(), "one two");
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the storage cannot hold a `T`. This only happens with
    /// [`InlineStorage`](holdall_internals::storage::InlineStorage).
    #[inline]
    #[track_caller]
    pub fn emplace<T: StorableFor<L>>(&mut self, value: T) -> &mut T {
        // SAFETY: The table below is `<T as StorableFor<L>>::type_ops()`, which
        // satisfies the container invariants.
        let raw = unsafe { self.as_raw_mut() };
        // SAFETY: The table was built for `T`.
        unsafe { raw.emplace(value, T::type_ops()) }
    }

    /// Replaces the held value with the result of `make` and returns a
    /// mutable reference to it.
    ///
    /// The held value is destroyed only after `make` returns. If `make`
    /// panics, the container is unchanged.
    #[inline]
    #[track_caller]
    pub fn emplace_with<T: StorableFor<L>, F: FnOnce() -> T>(&mut self, make: F) -> &mut T {
        let value = make();
        self.emplace(value)
    }

    /// Replaces the held value with `T::default()` constructed directly in
    /// the container's storage.
    ///
    /// If `T::default()` panics, the container is left empty.
    #[inline]
    #[track_caller]
    pub fn emplace_default<T: StorableFor<L> + Default>(&mut self) -> &mut T {
        // SAFETY: The table below is `<T as StorableFor<L>>::default_type_ops()`,
        // which satisfies the container invariants.
        let raw = unsafe { self.as_raw_mut() };
        raw.emplace_default(T::default_type_ops());
        match raw.downcast_mut::<T>() {
            Some(value) => value,
            None => unreachable!("a default-constructed `T` is held"),
        }
    }

    /// Returns a reference to the held value if it is of type `T`.
    ///
    /// # Panics
    ///
    /// Panics if the held value's type and `T` are distinct types sharing one
    /// [`TypeDescriptor`]. Types are never reinterpreted as one another.
    #[inline]
    #[track_caller]
    pub fn try_get_value<T: 'static>(&self) -> Option<&T> {
        self.as_raw().downcast_ref::<T>()
    }

    /// Returns a mutable reference to the held value if it is of type `T`.
    ///
    /// # Panics
    ///
    /// Panics if the held value's type and `T` are distinct types sharing one
    /// [`TypeDescriptor`]. Types are never reinterpreted as one another.
    #[inline]
    #[track_caller]
    pub fn try_get_value_mut<T: 'static>(&mut self) -> Option<&mut T> {
        // SAFETY: Mutating the held value in place does not change its type or
        // its table.
        let raw = unsafe { self.as_raw_mut() };
        raw.downcast_mut::<T>()
    }

    /// Returns a reference to the held value.
    ///
    /// # Panics
    ///
    /// Panics if the container is empty or holds a value of another type.
    /// Use [`try_get_value`](Self::try_get_value) for a version that only
    /// panics on a descriptor collision.
    #[inline]
    #[track_caller]
    pub fn value<T: 'static>(&self) -> &T {
        match self.try_get_value::<T>() {
            Some(value) => value,
            None => access_failed::<T>(self.type_descriptor()),
        }
    }

    /// Returns a mutable reference to the held value.
    ///
    /// # Panics
    ///
    /// Panics if the container is empty or holds a value of another type.
    #[inline]
    #[track_caller]
    pub fn value_mut<T: 'static>(&mut self) -> &mut T {
        let found = self.type_descriptor();
        match self.try_get_value_mut::<T>() {
            Some(value) => value,
            None => access_failed::<T>(found),
        }
    }

    /// Exchanges ownership of the two storage blocks if the storage backend
    /// can do so without touching the values, and returns whether it did.
    ///
    /// This is available at every level, including
    /// [`NoCopyOrMove`](crate::markers::NoCopyOrMove), since no value is
    /// moved. With [`SmallBufferStorage`] it succeeds when both values live
    /// on the heap.
    ///
    /// [`SmallBufferStorage`]: holdall_internals::storage::SmallBufferStorage
    #[inline]
    pub fn try_swap_storage(&mut self, other: &mut Self) -> bool {
        // SAFETY: Both containers have the same level, so exchanging their values
        // preserves the invariants on both sides.
        let raw = unsafe { self.as_raw_mut() };
        // SAFETY: As above.
        let other = unsafe { other.as_raw_mut() };
        raw.try_swap_storage(other)
    }

    /// Exchanges the values held by `self` and `other`.
    ///
    /// Ownership of the storage blocks is exchanged directly when the storage
    /// allows it. Otherwise the values are moved: once if only one side holds
    /// a value, and three times through a temporary if both do.
    ///
    /// ```
    /// use holdall::CopyableAny;
    ///
    /// let mut a = CopyableAny::from_value(1u8);
    /// let mut b = CopyableAny::from_value(String::from("b"));
    /// a.swap(&mut b);
    /// assert_eq!(a.value::<String>(), "b");
    /// assert_eq!(*b.value::<u8>(), 1);
    /// ```
    #[inline]
    #[track_caller]
    pub fn swap(&mut self, other: &mut Self)
    where
        L: SwapSupport<S>,
    {
        // SAFETY: Both containers have the same level, so exchanging their values
        // preserves the invariants on both sides.
        let raw = unsafe { self.as_raw_mut() };
        // SAFETY: As above.
        let other = unsafe { other.as_raw_mut() };
        raw.swap(other);
    }
}

impl<S: Storage, L: Movable> AnyBase<S, L> {
    /// Creates a container holding `value`.
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn from_value<T: StorableFor<L>>(value: T) -> Self {
        let mut any = Self::new();
        any.emplace(value);
        any
    }

    /// Assigns `value` to the container.
    ///
    /// If a `T` is already held, it is overwritten in place and no storage is
    /// reserved. Otherwise the held value is replaced as with
    /// [`emplace`](Self::emplace).
    ///
    /// `value` is installed before the previous `T` is dropped, so if that
    /// destructor panics the container still holds `value`.
    #[inline]
    #[track_caller]
    pub fn set<T: StorableFor<L>>(&mut self, value: T) -> &mut T {
        // SAFETY: A held value of type `T` keeps its table, which satisfies the
        // invariants; a newly emplaced one gets `<T as StorableFor<L>>::type_ops()`.
        let raw = unsafe { self.as_raw_mut() };
        // SAFETY: The table was built for `T`.
        unsafe { raw.assign(value, T::type_ops()) }
    }

    /// Moves the held value out of the container, leaving it empty.
    ///
    /// # Errors
    ///
    /// Returns an [`AccessError`] and leaves the container untouched if it is
    /// empty or holds a value of another type.
    #[inline]
    #[track_caller]
    pub fn take<T: 'static>(&mut self) -> Result<T, AccessError> {
        let found = self.type_descriptor();
        // SAFETY: The container is either left untouched or emptied.
        let raw = unsafe { self.as_raw_mut() };
        raw.take::<T>().ok_or_else(|| AccessError::for_request::<T>(found))
    }

    /// Moves the value held by `other` into `self`, leaving `other` empty.
    ///
    /// `other` may use a different storage backend and a different level, as
    /// long as the value may move from its level to `L`. If both hold a value
    /// of the same type, it is overwritten in place. If `other` is empty,
    /// `self` is reset.
    ///
    /// If the destructor of the replaced value panics, the moved value keeps
    /// exactly one owner. After an in-place overwrite `self` holds it and
    /// `other` is empty; otherwise `self` is empty and `other` still holds it.
    ///
    /// ```
    /// use holdall::{HeapAny, InlineAny, markers::MoveOnly};
    ///
    /// let mut heap = HeapAny::<MoveOnly>::from_value(vec![1, 2, 3]);
    /// let mut inline = InlineAny::<32, MoveOnly>::new();
    /// inline.move_from(&mut heap);
    /// assert!(!heap.has_value());
    /// assert_eq!(inline.value::<Vec<i32>>(), &[1, 2, 3]);
    /// ```
    #[inline]
    #[track_caller]
    pub fn move_from<O>(&mut self, other: &mut O)
    where
        O: AnyContainer,
        L: AcceptsMoveFrom<O::Level>,
    {
        // SAFETY: The value moved in carries a table valid at `O::Level`, which
        // `L` accepts.
        let raw = unsafe { self.as_raw_mut() };
        // SAFETY: `other` is left empty.
        let other = unsafe { other.raw_mut() };
        raw.move_from(other);
    }

    /// Creates a container holding the value moved out of `other`, leaving
    /// `other` empty.
    ///
    /// See [`move_from`](Self::move_from).
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn from_container<O>(other: &mut O) -> Self
    where
        O: AnyContainer,
        L: AcceptsMoveFrom<O::Level>,
    {
        let mut any = Self::new();
        any.move_from(other);
        any
    }
}

impl<S: Storage, L: Copyable> AnyBase<S, L> {
    /// Creates a container holding a clone of `value`.
    ///
    /// ```
    /// use holdall::CopyableAny;
    ///
    /// let name = String::from("config");
    /// let any = CopyableAny::from_cloned(&name);
    /// assert_eq!(any.value::<String>(), "config");
    /// assert_eq!(name, "config");
    /// ```
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn from_cloned<T: StorableFor<L> + Clone>(value: &T) -> Self {
        let mut any = Self::new();
        any.set_cloned(value);
        any
    }

    /// Assigns a clone of `value` to the container.
    ///
    /// If a `T` is already held, it is updated in place with
    /// [`Clone::clone_from`]. Otherwise the held value is replaced by
    /// `value.clone()`. If cloning panics, the previously held value is kept.
    #[inline]
    #[track_caller]
    pub fn set_cloned<T: StorableFor<L> + Clone>(&mut self, value: &T) -> &mut T {
        // SAFETY: A held value of type `T` keeps its table, which satisfies the
        // invariants; a newly emplaced one gets `<T as StorableFor<L>>::type_ops()`.
        let raw = unsafe { self.as_raw_mut() };
        // SAFETY: The table was built for `T` at a copyable level and so has the
        // copy slots.
        unsafe { raw.assign_cloned(value, T::type_ops()) }
    }

    /// Makes `self` hold a clone of the value held by `other`.
    ///
    /// `other` may use a different storage backend. If both hold a value of
    /// the same type, it is updated in place with [`Clone::clone_from`]. If
    /// `other` is empty, `self` is reset. If cloning panics, `self` is left
    /// empty.
    #[inline]
    #[track_caller]
    pub fn copy_from<O>(&mut self, other: &O)
    where
        O: AnyContainer,
        O::Level: Copyable,
    {
        // SAFETY: The copied value carries the table of `other`, which is valid at
        // a copyable level.
        let raw = unsafe { self.as_raw_mut() };
        // SAFETY: `O::Level` is copyable, so any value held by `other` has a table
        // with the copy slots.
        unsafe { raw.copy_from(other.raw()) }
    }

    /// Creates a container holding a clone of the value held by `other`.
    ///
    /// See [`copy_from`](Self::copy_from).
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn cloned_from<O>(other: &O) -> Self
    where
        O: AnyContainer,
        O::Level: Copyable,
    {
        let mut any = Self::new();
        any.copy_from(other);
        any
    }
}

impl<S: Storage, L: Capability> Default for AnyBase<S, L> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Storage> Clone for AnyBase<S, CopyAndMove> {
    #[inline]
    #[track_caller]
    fn clone(&self) -> Self {
        Self::cloned_from(self)
    }

    #[inline]
    #[track_caller]
    fn clone_from(&mut self, source: &Self) {
        self.copy_from(source);
    }
}

impl<S: Storage, L: Capability> core::fmt::Debug for AnyBase<S, L> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AnyBase")
            .field("level", &L::LEVEL)
            .field("type", &self.type_name())
            .finish()
    }
}

/// Exchanges the values held by `a` and `b`.
///
/// See [`AnyBase::swap`].
#[inline]
#[track_caller]
pub fn swap<S: Storage, L: SwapSupport<S>>(a: &mut AnyBase<S, L>, b: &mut AnyBase<S, L>) {
    a.swap(b);
}

#[cold]
#[inline(never)]
#[track_caller]
fn access_failed<T: 'static>(found: Option<TypeDescriptor>) -> ! {
    panic!("{}", AccessError::for_request::<T>(found))
}
