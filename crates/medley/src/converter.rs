#![forbid(unsafe_code)]

//! The converter capability and its type-erased form.
//!
//! A [`Converter`] knows how to build one kind of host view and fill it from
//! one kind of data. An adapter holds many converters of different concrete
//! types behind [`ErasedConverter`] objects, and holds their payloads behind
//! [`ErasedItem`], so a single list can mix row kinds freely while the host
//! only ever sees its own view type `V`.
//!
//! # Invariants
//!
//! 1. A payload is erased together with its converter, so the payload of a
//!    binder always downcasts to that converter's `Data` type.
//! 2. Erased equality is value equality within one data type. Values of
//!    different data types never compare equal, they are just unequal, not
//!    an error.
//! 3. Converters are shared and immutable once handed to an adapter. Per-row
//!    state belongs in the data, per-render state in the environment.

use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::dispatch::AdapterContext;

/// Builds and fills one kind of host view from one kind of data.
///
/// `V` is the host's view handle and `E` the per-render environment the host
/// threads through [`create_or_rebind`](crate::ViewDispatch::create_or_rebind).
/// Hosts that need no environment use the `()` default.
///
/// One converter instance serves every row of its type, so implementations
/// hold configuration, not row state.
pub trait Converter<V, E = ()>: Send + Sync + 'static {
    /// The payload this converter renders. Compared by value for
    /// [`index_of`](crate::Medley::index_of) and
    /// [`remove_first_value`](crate::Medley::remove_first_value).
    type Data: PartialEq + Send + 'static;

    /// Build a fresh, unbound view.
    fn create(&self, env: &mut E) -> V;

    /// Fill `view` with `data`. Called on both fresh and recycled views;
    /// implementations must overwrite every field they ever set.
    fn bind(
        &self,
        view: &mut V,
        data: &Self::Data,
        position: usize,
        env: &mut E,
        ctx: &AdapterContext<'_>,
    );

    /// Whether the row at `position` is selectable. Defaults to `true`.
    fn enabled(&self, _data: &Self::Data, _position: usize, _ctx: &AdapterContext<'_>) -> bool {
        true
    }

    /// Whether a previously created view can be rebound under the current
    /// environment. Returning `false` makes the dispatcher discard the
    /// recycled view and create a fresh one. Defaults to `true`.
    fn recyclable(&self, _view: &V, _env: &E) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Erased payloads
// ---------------------------------------------------------------------------

/// Object-safe pairing of `Any` with value equality.
///
/// The blanket impl covers every `PartialEq + 'static` type, which lets a
/// plain `&D` probe coerce to `&dyn ErasedValue` at comparison sites.
pub(crate) trait ErasedValue: Any {
    fn as_any(&self) -> &dyn Any;
    fn value_eq(&self, other: &dyn ErasedValue) -> bool;
}

impl<T: PartialEq + 'static> ErasedValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn value_eq(&self, other: &dyn ErasedValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

/// A type-erased payload stored on a binder.
pub(crate) struct ErasedItem {
    type_name: &'static str,
    value: Box<dyn ErasedValue + Send>,
}

impl ErasedItem {
    pub(crate) fn new<T: PartialEq + Send + 'static>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            value: Box::new(value),
        }
    }

    pub(crate) fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.as_any().downcast_ref::<T>()
    }

    /// Value equality against a probe of any type. A type mismatch compares
    /// unequal.
    pub(crate) fn matches(&self, probe: &dyn ErasedValue) -> bool {
        self.value.value_eq(probe)
    }

    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl std::fmt::Debug for ErasedItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ErasedItem").field(&self.type_name).finish()
    }
}

// ---------------------------------------------------------------------------
// Erased converters
// ---------------------------------------------------------------------------

/// Object-safe face of [`Converter`], dispatching on erased payloads.
pub(crate) trait ErasedConverter<V, E>: Send + Sync {
    /// The type descriptor the registry keys on.
    fn descriptor(&self) -> TypeId;

    fn type_name(&self) -> &'static str;

    fn create(&self, env: &mut E) -> V;

    fn bind(
        &self,
        view: &mut V,
        item: &ErasedItem,
        position: usize,
        env: &mut E,
        ctx: &AdapterContext<'_>,
    );

    fn enabled(&self, item: &ErasedItem, position: usize, ctx: &AdapterContext<'_>) -> bool;

    fn recyclable(&self, view: &V, env: &E) -> bool;
}

struct Erased<C> {
    inner: C,
}

impl<V, E, C> ErasedConverter<V, E> for Erased<C>
where
    C: Converter<V, E>,
{
    fn descriptor(&self) -> TypeId {
        TypeId::of::<C>()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<C>()
    }

    fn create(&self, env: &mut E) -> V {
        self.inner.create(env)
    }

    fn bind(
        &self,
        view: &mut V,
        item: &ErasedItem,
        position: usize,
        env: &mut E,
        ctx: &AdapterContext<'_>,
    ) {
        // Payloads are erased together with their converter; a mismatch here
        // means a binder was assembled from mismatched parts.
        let Some(data) = item.downcast_ref::<C::Data>() else {
            debug_assert!(
                false,
                "payload {} does not belong to converter {}",
                item.type_name(),
                self.type_name()
            );
            return;
        };
        self.inner.bind(view, data, position, env, ctx);
    }

    fn enabled(&self, item: &ErasedItem, position: usize, ctx: &AdapterContext<'_>) -> bool {
        item.downcast_ref::<C::Data>()
            .is_none_or(|data| self.inner.enabled(data, position, ctx))
    }

    fn recyclable(&self, view: &V, env: &E) -> bool {
        self.inner.recyclable(view, env)
    }
}

/// Erase a concrete converter into a shareable trait object.
pub(crate) fn erase<V, E, C>(converter: C) -> Arc<dyn ErasedConverter<V, E>>
where
    V: 'static,
    E: 'static,
    C: Converter<V, E>,
{
    Arc::new(Erased { inner: converter })
}
