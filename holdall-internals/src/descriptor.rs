//! Structural type identity.
//!
//! A [`TypeDescriptor`] names a type by the text produced by
//! [`core::any::type_name`]. Equality, ordering and hashing are all computed
//! from that text rather than from an address or a compiler-assigned id, so
//! two independently compiled components that store the same type agree on
//! its identity.
//!
//! # Limitation
//!
//! Two distinct types whose names render identically (for example, types that
//! differ only in lifetimes, or equally named types from crates that the
//! compiler happens to print the same way) are indistinguishable. This is
//! inherent to textual identity and is not corrected here.

use core::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};

use rustc_hash::FxHasher;

/// Opaque, comparable and hashable identity for a type.
#[derive(Clone, Copy)]
pub struct TypeDescriptor {
    /// Name of the described type as printed by [`core::any::type_name`].
    name: &'static str,
}

impl TypeDescriptor {
    /// Returns the descriptor for `T`.
    ///
    /// Every call for the same `T` returns a descriptor that compares equal,
    /// regardless of which crate performs the call.
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized>() -> Self {
        Self {
            name: core::any::type_name::<T>(),
        }
    }

    /// Builds a descriptor from an already computed type name.
    #[inline]
    pub(crate) fn from_name(name: &'static str) -> Self {
        Self { name }
    }

    /// The textual name backing this descriptor.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// A deterministic 64-bit hash of the descriptor.
    ///
    /// Unlike hashing with a randomly seeded hasher, this value is the same in
    /// every process and every module for the same type name.
    #[must_use]
    pub fn hash_code(&self) -> u64 {
        let mut hasher = FxHasher::default();
        hasher.write(self.name.as_bytes());
        hasher.finish()
    }

    /// Returns `true` if `self` orders strictly before `other`.
    #[inline]
    #[must_use]
    pub fn before(&self, other: &Self) -> bool {
        self.name < other.name
    }
}

impl PartialEq for TypeDescriptor {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        // Identical pointers are the common case inside one module.
        core::ptr::eq(self.name, other.name) || self.name == other.name
    }
}

impl Eq for TypeDescriptor {}

impl PartialOrd for TypeDescriptor {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeDescriptor {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(other.name)
    }
}

impl Hash for TypeDescriptor {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeDescriptor").field(&self.name).finish()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
