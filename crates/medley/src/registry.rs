#![forbid(unsafe_code)]

//! Registry of converter types with stable, registration-ordered indices.
//!
//! The first converter type an adapter sees gets [`TypeIndex`] 0, the next
//! distinct type 1, and so on. Indices are dense and never renumbered while
//! the registry lives, so a host can size and key its recycled-view caches
//! by them. Re-registering a known type returns the existing index.

use std::any::TypeId;

use ahash::AHashMap;

use crate::id::TypeIndex;

#[derive(Debug, Default)]
pub(crate) struct ConverterRegistry {
    slots: AHashMap<TypeId, TypeIndex>,
    /// Converter type names in slot order. Doubles as the slot count.
    names: Vec<&'static str>,
}

impl ConverterRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn lookup(&self, descriptor: TypeId) -> Option<TypeIndex> {
        self.slots.get(&descriptor).copied()
    }

    pub(crate) fn contains(&self, descriptor: TypeId) -> bool {
        self.slots.contains_key(&descriptor)
    }

    /// Return the index for `descriptor`, registering it at the next slot if
    /// unseen. Callers gate new registrations through the connection guard
    /// before getting here.
    pub(crate) fn ensure(&mut self, descriptor: TypeId, name: &'static str) -> TypeIndex {
        if let Some(index) = self.lookup(descriptor) {
            return index;
        }
        let index = TypeIndex::new(self.names.len());
        self.slots.insert(descriptor, index);
        self.names.push(name);
        index
    }

    pub(crate) fn count(&self) -> usize {
        self.names.len()
    }

    pub(crate) fn name_of(&self, index: TypeIndex) -> Option<&'static str> {
        self.names.get(index.get()).copied()
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.names.clear();
    }
}
