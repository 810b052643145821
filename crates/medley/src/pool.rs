#![forbid(unsafe_code)]

//! Per-adapter cache of shared converter instances.
//!
//! Add-by-type call sites ([`append_of`](crate::Medley::append_of) and
//! friends) need an instance to dispatch through without the caller handing
//! one over. The pool maps a converter's type descriptor to the single
//! instance the adapter resolved for it: the first instance the adapter ever
//! saw for that type, or a `Default`-constructed one if a by-type call got
//! there first. Later instances of an already-pooled type never replace the
//! pooled one.

use std::any::TypeId;
use std::sync::Arc;

use ahash::AHashMap;

use crate::converter::{Converter, ErasedConverter, erase};

pub(crate) struct ConverterPool<V: 'static, E: 'static> {
    instances: AHashMap<TypeId, Arc<dyn ErasedConverter<V, E>>>,
}

impl<V: 'static, E: 'static> ConverterPool<V, E> {
    pub(crate) fn new() -> Self {
        Self {
            instances: AHashMap::new(),
        }
    }

    /// Offer `instance` as the pooled one for its type. First instance wins;
    /// for an already-pooled type this is a no-op.
    pub(crate) fn adopt(&mut self, descriptor: TypeId, instance: &Arc<dyn ErasedConverter<V, E>>) {
        self.instances
            .entry(descriptor)
            .or_insert_with(|| Arc::clone(instance));
    }

    /// The pooled instance for `C`, constructing one lazily through
    /// `Default` on first use.
    pub(crate) fn instance_of<C>(&mut self) -> Arc<dyn ErasedConverter<V, E>>
    where
        C: Converter<V, E> + Default,
    {
        Arc::clone(
            self.instances
                .entry(TypeId::of::<C>())
                .or_insert_with(|| erase(C::default())),
        )
    }

    pub(crate) fn clear(&mut self) {
        self.instances.clear();
    }
}

impl<V: 'static, E: 'static> Default for ConverterPool<V, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: 'static, E: 'static> std::fmt::Debug for ConverterPool<V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConverterPool")
            .field("instances", &self.instances.len())
            .finish()
    }
}
