//! Commonly used items for convenient importing.
//!
//! ```rust
//! use holdall::prelude::*;
//!
//! let mut any = CopyableAny::new();
//! any.emplace(1.5f64);
//! assert_eq!(any_cast::<f64, _>(&any), Some(&1.5));
//! ```

pub use crate::{
    AccessError, AnyBase, AnyContainer, CopyableAny, HeapAny, InlineAny, MovableAny,
    NonMovableAny, SmallAny, any_cast, any_cast_mut, markers,
};
