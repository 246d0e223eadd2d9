//! Ready-made container types binding [`AnyBase`] to a storage backend.
//!
//! | Alias                | Storage                         | Level            |
//! |----------------------|---------------------------------|------------------|
//! | [`HeapAny<L>`]       | [`HeapStorage`]                 | `L`              |
//! | [`InlineAny<N, L>`]  | [`InlineStorage<N>`]            | `L`              |
//! | [`SmallAny<L>`]      | [`SmallBufferStorage`]          | `L`              |
//! | [`CopyableAny`]      | [`SmallBufferStorage`]          | [`CopyAndMove`]  |
//! | [`MovableAny`]       | [`SmallBufferStorage`]          | [`MoveOnly`]     |
//! | [`NonMovableAny`]    | [`SmallBufferStorage`]          | [`NoCopyOrMove`] |
//!
//! Every alias exposes the full [`AnyBase`] API. The level defaults to
//! [`CopyAndMove`].
//!
//! [`SmallAny`] occupies exactly three pointers: its inline buffer holds
//! values of up to `2 * size_of::<usize>() - 1` bytes, and the last pointer
//! refers to the held value's operations.
//!
//! ```
//! use holdall::SmallAny;
//!
//! assert_eq!(size_of::<SmallAny>(), 3 * size_of::<usize>());
//! ```
//!
//! [`InlineStorage<N>`]: InlineStorage

use holdall_internals::storage::{HeapStorage, InlineStorage, SmallBufferStorage};

use crate::{
    AnyBase,
    markers::{CopyAndMove, MoveOnly, NoCopyOrMove},
};

/// A container that always stores its value in a separate heap block.
///
/// Swapping two of these never moves the values, so it is available even at
/// the [`NoCopyOrMove`] level.
pub type HeapAny<L = CopyAndMove> = AnyBase<HeapStorage, L>;

/// A container that always stores its value inside itself, in a buffer of `N`
/// bytes.
///
/// Storing a value larger than `N` bytes, or aligned more strictly than a
/// pointer, panics.
pub type InlineAny<const N: usize, L = CopyAndMove> = AnyBase<InlineStorage<N>, L>;

/// A container that stores small values inside itself and larger values on
/// the heap.
pub type SmallAny<L = CopyAndMove> = AnyBase<SmallBufferStorage, L>;

/// A [`SmallAny`] whose value can be copied and moved.
pub type CopyableAny = SmallAny<CopyAndMove>;

/// A [`SmallAny`] whose value can be moved but not copied.
pub type MovableAny = SmallAny<MoveOnly>;

/// A [`SmallAny`] whose value is never copied or moved.
pub type NonMovableAny = SmallAny<NoCopyOrMove>;
