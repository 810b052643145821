#![forbid(unsafe_code)]

//! The adapter core: an ordered list of binders over a frozen-while-connected
//! type registry.
//!
//! A [`Medley`] owns three pieces of state and nothing else:
//!
//! - the binder list, each entry pairing a converter with one erased payload
//!   and a [`BinderId`],
//! - the converter type registry, handing out dense registration-ordered
//!   [`TypeIndex`] slots,
//! - the connection guard, tracking attached listeners and authorizing
//!   mutations.
//!
//! Views never enter this module. The host keeps view ownership and meets
//! the adapter only through [`ViewDispatch`](crate::ViewDispatch).
//!
//! # Invariants
//!
//! 1. Every successful mutating call emits exactly one [`ListChange`];
//!    rejected calls and silent no-ops emit none.
//! 2. A failed call leaves the list, the registry, and the pool untouched.
//!    Bounds are validated before any registration side effect.
//! 3. Binder order is insertion order. Removing a binder shifts later
//!    binders down by one; ids are unaffected.
//! 4. `BinderId`s are unique across the adapter's whole history.
//! 5. While connected, mutations are accepted only from the owner context
//!    and the converter type set cannot grow.
//!
//! # Failure Modes
//!
//! - Lookups for absent values, ids, or positions return `None`, never an
//!   error.
//! - `remove_by_id` and `remove_first_value` of an absent target succeed
//!   silently without notifying.
//!
//! # Example
//!
//! ```ignore
//! let mut feed = Medley::new();
//! feed.prepare_of::<HeaderConverter>()?;
//! feed.prepare_of::<ArticleConverter>()?;
//!
//! let _conn = feed.connect(|change| eprintln!("{change:?}"));
//!
//! feed.append_of::<HeaderConverter>(Header::today())?;
//! feed.append_all_of::<ArticleConverter>(articles)?;
//! ```

use std::any::TypeId;
use std::sync::Arc;

use crate::connection::{Connection, ConnectionGuard, ListChange, OwnerContext};
use crate::converter::{Converter, ErasedConverter, ErasedItem, ErasedValue, erase};
use crate::error::MedleyError;
use crate::id::{BinderId, IdentityAllocator, TypeIndex};
use crate::pool::ConverterPool;
use crate::registry::ConverterRegistry;

/// One list entry: a converter, its erased payload, and a stable identity.
pub(crate) struct Binder<V: 'static, E: 'static> {
    pub(crate) id: BinderId,
    pub(crate) type_index: TypeIndex,
    pub(crate) converter: Arc<dyn ErasedConverter<V, E>>,
    pub(crate) data: ErasedItem,
}

impl<V: 'static, E: 'static> std::fmt::Debug for Binder<V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binder")
            .field("id", &self.id)
            .field("type_index", &self.type_index)
            .field("converter", &self.converter.type_name())
            .field("data", &self.data)
            .finish()
    }
}

/// Heterogeneous list adapter: typed rows dispatched to recycled host views
/// through per-type converters.
///
/// `V` is the host's view handle type and `E` the per-render environment;
/// hosts without an environment use the `()` default. Converters within one
/// adapter share `V` and `E`, while their payload types are free.
///
/// Lookups by value or id scan linearly; the adapter keeps no secondary
/// index.
pub struct Medley<V: 'static, E: 'static = ()> {
    binders: Vec<Binder<V, E>>,
    registry: ConverterRegistry,
    pool: ConverterPool<V, E>,
    guard: ConnectionGuard,
    ids: IdentityAllocator,
}

impl<V: 'static, E: 'static> Medley<V, E> {
    /// Create an empty adapter owned by the calling context.
    #[must_use]
    pub fn new() -> Self {
        Self::with_owner(OwnerContext::current())
    }

    /// Create an empty adapter owned by an explicit context, for when the
    /// constructing thread is not the one that will mutate while connected.
    #[must_use]
    pub fn with_owner(owner: OwnerContext) -> Self {
        Self {
            binders: Vec::new(),
            registry: ConverterRegistry::new(),
            pool: ConverterPool::new(),
            guard: ConnectionGuard::new(owner),
            ids: IdentityAllocator::new(),
        }
    }

    /// The context this adapter accepts mutations from while connected.
    #[must_use]
    pub fn owner(&self) -> OwnerContext {
        self.guard.owner()
    }

    // --- List reads ---

    /// Number of binders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.binders.len()
    }

    /// Whether the list holds no binders.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.binders.is_empty()
    }

    /// The payload at `index`, if in range and of type `D`.
    #[must_use]
    pub fn data_at<D: 'static>(&self, index: usize) -> Option<&D> {
        self.binders
            .get(index)
            .and_then(|binder| binder.data.downcast_ref::<D>())
    }

    /// Position of the first binder whose payload equals `probe`. Binders
    /// holding other payload types never match.
    #[must_use]
    pub fn index_of<D: PartialEq + 'static>(&self, probe: &D) -> Option<usize> {
        self.position_of_value(probe)
    }

    /// Current position of the binder with `id`.
    #[must_use]
    pub fn index_of_id(&self, id: BinderId) -> Option<usize> {
        self.binders.iter().position(|binder| binder.id == id)
    }

    /// Identity of the binder at `index`.
    #[must_use]
    pub fn id_at(&self, index: usize) -> Option<BinderId> {
        self.binders.get(index).map(|binder| binder.id)
    }

    /// Binder identities in list order.
    pub fn ids(&self) -> impl Iterator<Item = BinderId> + '_ {
        self.binders.iter().map(|binder| binder.id)
    }

    // --- Registry reads ---

    /// Number of registered converter types.
    #[must_use]
    pub fn view_type_count(&self) -> usize {
        self.registry.count()
    }

    /// The type index registered for converter type `C`.
    #[must_use]
    pub fn type_index_of<C: Converter<V, E>>(&self) -> Option<TypeIndex> {
        self.registry.lookup(TypeId::of::<C>())
    }

    /// The converter type name behind `index`, for diagnostics.
    #[must_use]
    pub fn type_name_of(&self, index: TypeIndex) -> Option<&'static str> {
        self.registry.name_of(index)
    }

    // --- Connections ---

    /// Attach a listener and flip the adapter into the connected state.
    ///
    /// The listener observes every subsequent [`ListChange`] until the
    /// returned [`Connection`] is dropped. Attaching is not a list mutation:
    /// it needs no authorization and emits nothing.
    pub fn connect(&mut self, listener: impl Fn(&ListChange) + Send + 'static) -> Connection {
        self.guard.connect(listener)
    }

    /// Whether at least one listener is attached.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.guard.is_connected()
    }

    /// Number of attached listeners.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.guard.connection_count()
    }

    // --- Pre-declaration ---

    /// Register `converter`'s type and pool this instance ahead of any data,
    /// so rows of its type can be added while connected.
    ///
    /// Idempotent: preparing an already-registered type returns the existing
    /// index and keeps the originally pooled instance. Introducing a new
    /// type while connected fails with
    /// [`MedleyError::DuplicateTypeRegistration`].
    pub fn prepare<C: Converter<V, E>>(&mut self, converter: C) -> Result<TypeIndex, MedleyError> {
        self.admit_instance(converter)
            .map(|(type_index, _)| type_index)
    }

    /// [`prepare`](Self::prepare) with a `Default`-constructed instance.
    pub fn prepare_of<C>(&mut self) -> Result<TypeIndex, MedleyError>
    where
        C: Converter<V, E> + Default,
    {
        self.admit_default::<C>().map(|(type_index, _)| type_index)
    }

    // --- Mutations ---

    /// Append one binder holding `data`, dispatched through `converter`.
    ///
    /// The binder keeps this exact instance; the pool adopts it only if the
    /// type had no pooled instance yet. Emits one `Inserted` event.
    pub fn append<C: Converter<V, E>>(
        &mut self,
        converter: C,
        data: C::Data,
    ) -> Result<BinderId, MedleyError> {
        self.guard.authorize_mutation()?;
        let (type_index, converter) = self.admit_instance(converter)?;
        let index = self.binders.len();
        let id = self.splice(index, type_index, converter, ErasedItem::new(data));
        self.emit(ListChange::Inserted { index, count: 1 });
        Ok(id)
    }

    /// Insert one binder at `index`, shifting later binders up.
    ///
    /// `index` may equal [`len`](Self::len). An out-of-range index fails
    /// before any type registration happens.
    pub fn insert<C: Converter<V, E>>(
        &mut self,
        index: usize,
        converter: C,
        data: C::Data,
    ) -> Result<BinderId, MedleyError> {
        self.guard.authorize_mutation()?;
        self.check_insert_bounds(index)?;
        let (type_index, converter) = self.admit_instance(converter)?;
        let id = self.splice(index, type_index, converter, ErasedItem::new(data));
        self.emit(ListChange::Inserted { index, count: 1 });
        Ok(id)
    }

    /// Append one binder per item, all dispatched through `converter`.
    ///
    /// Emits a single batched `Inserted` event covering the whole batch. An
    /// empty batch still registers the converter type and still emits, with
    /// `count` 0.
    pub fn append_all<C: Converter<V, E>>(
        &mut self,
        converter: C,
        items: impl IntoIterator<Item = C::Data>,
    ) -> Result<(), MedleyError> {
        self.guard.authorize_mutation()?;
        let (type_index, converter) = self.admit_instance(converter)?;
        let index = self.binders.len();
        let count = self.extend(
            type_index,
            &converter,
            items.into_iter().map(ErasedItem::new),
        );
        self.emit(ListChange::Inserted { index, count });
        Ok(())
    }

    /// Append one binder of converter type `C`, resolving the shared
    /// instance through the pool.
    pub fn append_of<C>(&mut self, data: C::Data) -> Result<BinderId, MedleyError>
    where
        C: Converter<V, E> + Default,
    {
        self.guard.authorize_mutation()?;
        let (type_index, converter) = self.admit_default::<C>()?;
        let index = self.binders.len();
        let id = self.splice(index, type_index, converter, ErasedItem::new(data));
        self.emit(ListChange::Inserted { index, count: 1 });
        Ok(id)
    }

    /// Insert one binder of converter type `C` at `index`.
    pub fn insert_of<C>(&mut self, index: usize, data: C::Data) -> Result<BinderId, MedleyError>
    where
        C: Converter<V, E> + Default,
    {
        self.guard.authorize_mutation()?;
        self.check_insert_bounds(index)?;
        let (type_index, converter) = self.admit_default::<C>()?;
        let id = self.splice(index, type_index, converter, ErasedItem::new(data));
        self.emit(ListChange::Inserted { index, count: 1 });
        Ok(id)
    }

    /// Append one binder per item, dispatched through the pooled instance of
    /// `C`. Batch semantics match [`append_all`](Self::append_all).
    pub fn append_all_of<C>(
        &mut self,
        items: impl IntoIterator<Item = C::Data>,
    ) -> Result<(), MedleyError>
    where
        C: Converter<V, E> + Default,
    {
        self.guard.authorize_mutation()?;
        let (type_index, converter) = self.admit_default::<C>()?;
        let index = self.binders.len();
        let count = self.extend(
            type_index,
            &converter,
            items.into_iter().map(ErasedItem::new),
        );
        self.emit(ListChange::Inserted { index, count });
        Ok(())
    }

    /// Remove the binder at `index`, shifting later binders down. Emits one
    /// `Removed` event.
    pub fn remove_at(&mut self, index: usize) -> Result<(), MedleyError> {
        self.guard.authorize_mutation()?;
        if index >= self.binders.len() {
            return Err(MedleyError::IndexOutOfRange {
                index,
                len: self.binders.len(),
            });
        }
        self.binders.remove(index);
        self.emit(ListChange::Removed { index });
        Ok(())
    }

    /// Remove the binder with `id` if it is present. Removing an absent id
    /// is a silent no-op: no event, no error.
    pub fn remove_by_id(&mut self, id: BinderId) -> Result<(), MedleyError> {
        self.guard.authorize_mutation()?;
        if let Some(index) = self.index_of_id(id) {
            self.binders.remove(index);
            self.emit(ListChange::Removed { index });
        }
        Ok(())
    }

    /// Remove the first binder whose payload equals `probe`. An absent value
    /// is a silent no-op: no event, no error.
    pub fn remove_first_value<D: PartialEq + 'static>(
        &mut self,
        probe: &D,
    ) -> Result<(), MedleyError> {
        self.guard.authorize_mutation()?;
        if let Some(index) = self.position_of_value(probe) {
            self.binders.remove(index);
            self.emit(ListChange::Removed { index });
        }
        Ok(())
    }

    /// Remove every binder. The registry keeps its types and indices. Always
    /// emits one `Cleared` event, even on an already-empty list.
    pub fn clear(&mut self) -> Result<(), MedleyError> {
        self.guard.authorize_mutation()?;
        self.binders.clear();
        self.emit(ListChange::Cleared);
        Ok(())
    }

    /// Drop every registered type and pooled instance, so the next
    /// registration starts over at [`TypeIndex`] 0.
    ///
    /// Legal only while unconnected and with an empty list; otherwise fails
    /// with [`MedleyError::RegistryInUse`] and changes nothing. Existing
    /// binders always keep a registered type this way.
    pub fn clear_registry(&mut self) -> Result<(), MedleyError> {
        if !self.binders.is_empty() {
            return Err(MedleyError::RegistryInUse {
                binders: self.binders.len(),
            });
        }
        if self.guard.is_connected() {
            return Err(MedleyError::RegistryInUse { binders: 0 });
        }
        self.registry.clear();
        self.pool.clear();
        Ok(())
    }

    /// Clear the list and the registry in one step. Legal only while
    /// unconnected; emits one `Cleared` event.
    pub fn reset(&mut self) -> Result<(), MedleyError> {
        if self.guard.is_connected() {
            return Err(MedleyError::RegistryInUse { binders: 0 });
        }
        self.binders.clear();
        self.registry.clear();
        self.pool.clear();
        self.emit(ListChange::Cleared);
        Ok(())
    }

    // --- Internals ---

    pub(crate) fn binder(&self, position: usize) -> Option<&Binder<V, E>> {
        self.binders.get(position)
    }

    fn position_of_value(&self, probe: &dyn ErasedValue) -> Option<usize> {
        self.binders.iter().position(|binder| binder.data.matches(probe))
    }

    fn check_insert_bounds(&self, index: usize) -> Result<(), MedleyError> {
        if index > self.binders.len() {
            return Err(MedleyError::IndexOutOfRange {
                index,
                len: self.binders.len(),
            });
        }
        Ok(())
    }

    /// Admit a caller-supplied instance: authorize a new type, pool the
    /// instance first-wins, and resolve the type index.
    fn admit_instance<C: Converter<V, E>>(
        &mut self,
        converter: C,
    ) -> Result<(TypeIndex, Arc<dyn ErasedConverter<V, E>>), MedleyError> {
        let descriptor = TypeId::of::<C>();
        if !self.registry.contains(descriptor) {
            self.guard.authorize_type_registration()?;
        }
        let converter = erase(converter);
        self.pool.adopt(descriptor, &converter);
        let type_index = self.registry.ensure(descriptor, std::any::type_name::<C>());
        Ok((type_index, converter))
    }

    /// Admit by type: authorize a new type and resolve the pooled instance,
    /// `Default`-constructing one on first use.
    fn admit_default<C>(&mut self) -> Result<(TypeIndex, Arc<dyn ErasedConverter<V, E>>), MedleyError>
    where
        C: Converter<V, E> + Default,
    {
        let descriptor = TypeId::of::<C>();
        if !self.registry.contains(descriptor) {
            self.guard.authorize_type_registration()?;
        }
        let converter = self.pool.instance_of::<C>();
        let type_index = self.registry.ensure(descriptor, std::any::type_name::<C>());
        Ok((type_index, converter))
    }

    fn splice(
        &mut self,
        index: usize,
        type_index: TypeIndex,
        converter: Arc<dyn ErasedConverter<V, E>>,
        data: ErasedItem,
    ) -> BinderId {
        let id = self.ids.allocate();
        self.binders.insert(
            index,
            Binder {
                id,
                type_index,
                converter,
                data,
            },
        );
        id
    }

    fn extend(
        &mut self,
        type_index: TypeIndex,
        converter: &Arc<dyn ErasedConverter<V, E>>,
        items: impl IntoIterator<Item = ErasedItem>,
    ) -> usize {
        let before = self.binders.len();
        for data in items {
            let id = self.ids.allocate();
            self.binders.push(Binder {
                id,
                type_index,
                converter: Arc::clone(converter),
                data,
            });
        }
        self.binders.len() - before
    }

    fn emit(&mut self, change: ListChange) {
        #[cfg(feature = "tracing")]
        tracing::trace!(change = ?change, len = self.binders.len(), "list changed");
        self.guard.notify(&change);
    }
}

impl<V: 'static, E: 'static> Default for Medley<V, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: 'static, E: 'static> std::fmt::Debug for Medley<V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Medley")
            .field("len", &self.binders.len())
            .field("view_types", &self.registry.count())
            .field("connections", &self.guard.connection_count())
            .finish_non_exhaustive()
    }
}
