#![no_std]
#![forbid(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::missing_docs_in_private_items,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    unused_doc_comments
)]
#![allow(rustdoc::private_intra_doc_links)]
//! Internal implementation crate for [`holdall`].
//!
//! # Overview
//!
//! This crate contains the type-erased data structures and unsafe operations
//! that power the [`holdall`] value containers. Users should depend on the
//! [`holdall`] crate, not this one. **This crate is an implementation
//! detail** and no semantic versioning guarantees are provided.
//!
//! # Architecture
//!
//! - **[`TypeDescriptor`]**: Value-comparable identity of a type, derived from
//!   its name
//! - **[`TypeOps`]**: A `'static` table of function pointers that construct,
//!   destroy, copy and move a value of one concrete type at a raw address
//! - **[`storage`]**: The [`Storage`] trait and its three backends
//!   - [`HeapStorage`]: Every value lives in its own heap block
//!   - [`InlineStorage`]: A fixed buffer inside the container; oversized
//!     values are rejected
//!   - [`SmallBufferStorage`]: A small inline buffer with heap fallback
//! - **[`RawAny`]**: The container algorithms, generic over the backend
//!
//! # Safety Strategy
//!
//! The container never knows the type it holds. Correctness rests on pairing
//! each storage block with the operations table of the value inside it:
//!
//! - **Module-based encapsulation**: [`RawAny`] and [`TypeOps`] keep their
//!   fields module-private, so the pairing invariant can be verified within a
//!   single file
//! - **Compile-time tables**: Tables are built in `const` context from a
//!   single generic parameter, so a table's slots can never disagree about
//!   their type
//! - **Unwind guards**: Storage reserved for a value under construction is
//!   released if the constructor panics
//!
//! [`holdall`]: https://docs.rs/holdall/latest/holdall/
//! [`Storage`]: storage::Storage
//! [`HeapStorage`]: storage::HeapStorage
//! [`InlineStorage`]: storage::InlineStorage
//! [`SmallBufferStorage`]: storage::SmallBufferStorage

extern crate alloc;

mod descriptor;
mod raw;
pub mod storage;
mod type_ops;
mod util;

pub use self::{
    descriptor::TypeDescriptor,
    raw::RawAny,
    type_ops::{TypeOps, TypeOpsBuilder},
};
