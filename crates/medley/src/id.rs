#![forbid(unsafe_code)]

//! Identity types for binders and converter slots.
//!
//! A [`BinderId`] names one list entry for its whole lifetime; a
//! [`TypeIndex`] names one registered converter type. Binder ids come from a
//! per-adapter monotonic counter, so they are unique within an adapter and
//! never reused, including across [`clear`](crate::Medley::clear).

/// Stable identity of a single list entry.
///
/// Allocated when the entry is appended or inserted and retired with it.
/// Ids are meaningful only within the adapter that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BinderId(u64);

impl BinderId {
    /// The raw counter value, for logging and diagnostics.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for BinderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "binder#{}", self.0)
    }
}

/// Position of a converter type in registration order.
///
/// The first type registered on an adapter gets index 0, the next distinct
/// type 1, and so on. Indices are dense and never reassigned, which lets a
/// host key its recycled-view caches by them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeIndex(usize);

impl TypeIndex {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    /// The zero-based slot, suitable for indexing host-side caches.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for TypeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

/// Monotonic source of [`BinderId`]s, one per adapter.
#[derive(Debug)]
pub(crate) struct IdentityAllocator {
    next: u64,
}

impl IdentityAllocator {
    pub(crate) const fn new() -> Self {
        // Start at 1 so that 0 is never a live id.
        Self { next: 1 }
    }

    pub(crate) fn allocate(&mut self) -> BinderId {
        let id = BinderId(self.next);
        self.next += 1;
        id
    }
}
