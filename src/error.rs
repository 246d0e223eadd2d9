//! Errors reported by typed access to a container.

use holdall_internals::TypeDescriptor;

/// The reason a typed access to a container failed.
///
/// Returned by [`AnyBase::take`](crate::AnyBase::take) and used as the panic
/// message of [`AnyBase::value`](crate::AnyBase::value).
///
/// # Examples
///
/// ```
/// use holdall::{AccessError, MovableAny, TypeDescriptor};
///
/// let mut any = MovableAny::from_value(3u16);
/// assert_eq!(
///     any.take::<u32>(),
///     Err(AccessError::TypeMismatch {
///         expected: TypeDescriptor::of::<u32>(),
///         found: TypeDescriptor::of::<u16>(),
///     })
/// );
/// assert_eq!(any.take::<u16>(), Ok(3));
/// assert_eq!(any.take::<u16>(), Err(AccessError::Empty));
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum AccessError {
    /// The container holds no value.
    Empty,
    /// The container holds a value of a different type.
    TypeMismatch {
        /// The type that was requested.
        expected: TypeDescriptor,
        /// The type of the held value.
        found: TypeDescriptor,
    },
}

impl AccessError {
    /// Describes why a request for `T` failed on a container whose held type
    /// is `found`.
    pub(crate) fn for_request<T: ?Sized>(found: Option<TypeDescriptor>) -> Self {
        match found {
            None => Self::Empty,
            Some(found) => Self::TypeMismatch {
                expected: TypeDescriptor::of::<T>(),
                found,
            },
        }
    }
}

impl core::fmt::Display for AccessError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Empty => write!(f, "the container holds no value"),
            Self::TypeMismatch { expected, found } => write!(
                f,
                "the container holds a value of type `{found}`, not `{expected}`"
            ),
        }
    }
}

impl core::error::Error for AccessError {}
