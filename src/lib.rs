#![cfg_attr(not(doc), no_std)]
#![deny(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    clippy::as_ptr_cast_mut,
    clippy::ptr_as_ptr,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Type-erased value containers with selectable storage and capabilities.
//!
//! ## Overview
//!
//! A container in this crate holds at most one value whose type is decided
//! at runtime, like a `Box<dyn Any>`, but lets you choose where the value
//! lives and what may be done with it:
//!
//! ```
//! use holdall::prelude::*;
//!
//! let mut any = CopyableAny::new();
//! any.emplace(5i32);
//! assert!(any.has_type::<i32>());
//! assert_eq!(*any.value::<i32>(), 5);
//!
//! any.set(String::from("now a string"));
//! assert_eq!(any.try_get_value::<i32>(), None);
//!
//! let copy = any.clone();
//! assert_eq!(copy.value::<String>(), "now a string");
//! ```
//!
//! ## Storage
//!
//! The first type parameter of [`AnyBase`] picks the storage backend:
//!
//! - [`HeapStorage`](storage::HeapStorage) puts every value in its own heap
//!   block. Swapping two containers is always a pointer exchange.
//! - [`InlineStorage<N>`](storage::InlineStorage) embeds an `N`-byte buffer
//!   and never allocates. Values that do not fit are rejected with a panic.
//! - [`SmallBufferStorage<N>`](storage::SmallBufferStorage) embeds an
//!   `N`-byte buffer and falls back to the heap for values that do not fit.
//!   With the default capacity the whole container is three pointers wide.
//!
//! ## Capability levels
//!
//! The second type parameter of [`AnyBase`] is one of the [`markers`]:
//! [`NoCopyOrMove`](markers::NoCopyOrMove), [`MoveOnly`](markers::MoveOnly)
//! or [`CopyAndMove`](markers::CopyAndMove). It decides at compile time
//! whether the container may copy or move its held value, and therefore
//! which types it accepts and which methods it offers. Values can be copied
//! and moved between containers of different storage backends, as long as
//! both levels allow it.
//!
//! ## Type identity
//!
//! Held types are identified by a [`TypeDescriptor`], which compares by the
//! type's name rather than by address. Two distinct types that print the same
//! name cannot be told apart by a descriptor; containers detect this case
//! and panic instead of confusing the types.
//!
//! ## Logging
//!
//! With the `tracing` feature enabled, the slow paths (heap fallback of the
//! small buffer, swaps through a temporary, and reconstruction during
//! cross-container copies) emit `trace`-level events.
//!
//! For implementation details, see the [`holdall-internals`] crate.
//!
//! [`holdall-internals`]: holdall_internals

extern crate alloc;

mod any;
mod cast;
mod error;
pub mod facades;
pub mod markers;
pub mod prelude;

pub use holdall_internals::{TypeDescriptor, storage};

pub use self::{
    any::{AnyBase, swap},
    cast::{AnyContainer, any_cast, any_cast_mut},
    error::AccessError,
    facades::{CopyableAny, HeapAny, InlineAny, MovableAny, NonMovableAny, SmallAny},
};
