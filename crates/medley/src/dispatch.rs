#![forbid(unsafe_code)]

//! Host-facing dispatch surface.
//!
//! A host rendering widget drives an adapter exclusively through
//! [`ViewDispatch`]: it asks how many rows exist, which view type each
//! position uses, and hands recycled views back in through
//! [`create_or_rebind`](ViewDispatch::create_or_rebind). The adapter never
//! stores a view; view ownership stays with the host on both sides of every
//! call.
//!
//! # Invariants
//!
//! 1. `view_type_of` for a given position is stable as long as the list is
//!    not mutated, and always below `view_type_count`.
//! 2. `item_id` is derived from position, not from binder identity, and
//!    `has_stable_ids` is accordingly `false`.
//! 3. `create_or_rebind` binds exactly once per call, on a fresh view or on
//!    the recycled one.

use crate::adapter::Medley;
use crate::error::MedleyError;
use crate::id::{BinderId, TypeIndex};

/// Read-only adapter facts, object-safe so [`AdapterContext`] stays free of
/// the host's type parameters.
pub(crate) trait AdapterFacts {
    fn len(&self) -> usize;
    fn view_type_count(&self) -> usize;
    fn type_index_at(&self, position: usize) -> Option<TypeIndex>;
    fn id_at(&self, position: usize) -> Option<BinderId>;
    fn position_of(&self, id: BinderId) -> Option<usize>;
    fn connected(&self) -> bool;
}

/// Read-only view of the adapter, passed to [`Converter::bind`] and
/// [`Converter::enabled`].
///
/// Lets a converter consult list-level facts (its own position's
/// surroundings, the type table, connection state) without being handed the
/// adapter itself, which would invite re-entrant mutation from inside a bind.
///
/// [`Converter::bind`]: crate::Converter::bind
/// [`Converter::enabled`]: crate::Converter::enabled
pub struct AdapterContext<'a> {
    facts: &'a dyn AdapterFacts,
}

impl<'a> AdapterContext<'a> {
    pub(crate) fn new(facts: &'a dyn AdapterFacts) -> Self {
        Self { facts }
    }

    /// Number of binders in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facts.len() == 0
    }

    /// Number of registered converter types.
    #[must_use]
    pub fn view_type_count(&self) -> usize {
        self.facts.view_type_count()
    }

    /// Type index of the binder at `position`, if in range.
    #[must_use]
    pub fn view_type_of(&self, position: usize) -> Option<TypeIndex> {
        self.facts.type_index_at(position)
    }

    /// Identity of the binder at `position`, if in range.
    #[must_use]
    pub fn id_at(&self, position: usize) -> Option<BinderId> {
        self.facts.id_at(position)
    }

    /// Current position of the binder with `id`, if present.
    #[must_use]
    pub fn index_of_id(&self, id: BinderId) -> Option<usize> {
        self.facts.position_of(id)
    }

    /// Whether at least one listener is attached.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.facts.connected()
    }
}

impl std::fmt::Debug for AdapterContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterContext")
            .field("len", &self.len())
            .field("view_type_count", &self.view_type_count())
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// The contract a host rendering widget consumes.
///
/// Position arguments are validated; a position outside `0..count()` returns
/// [`MedleyError::IndexOutOfRange`] rather than panicking.
pub trait ViewDispatch<V, E = ()> {
    /// Number of rows.
    fn count(&self) -> usize;

    /// Number of distinct view types, the size the host should give its
    /// recycled-view cache.
    fn view_type_count(&self) -> usize;

    /// The view type slot for `position`.
    fn view_type_of(&self, position: usize) -> Result<TypeIndex, MedleyError>;

    /// Row id for `position`. Derived from the position itself, so it is
    /// only meaningful for the current list state.
    fn item_id(&self, position: usize) -> Result<u64, MedleyError>;

    /// Whether row ids survive mutations. Always `false` here, matching
    /// [`item_id`](Self::item_id) being position-derived.
    fn has_stable_ids(&self) -> bool {
        false
    }

    /// Whether every row is selectable without asking per position. Always
    /// `false`; hosts must consult [`is_enabled`](Self::is_enabled).
    fn all_enabled(&self) -> bool {
        false
    }

    /// Whether the row at `position` is selectable.
    fn is_enabled(&self, position: usize) -> Result<bool, MedleyError>;

    /// Produce a bound view for `position`.
    ///
    /// When `recycled` is `Some` and the position's converter accepts it
    /// ([`Converter::recyclable`](crate::Converter::recyclable)), the view is
    /// rebound in place. Otherwise a fresh view is created. Either way the
    /// converter's `bind` runs exactly once before the view is returned.
    fn create_or_rebind(
        &self,
        position: usize,
        recycled: Option<V>,
        env: &mut E,
    ) -> Result<V, MedleyError>;
}

impl<V: 'static, E: 'static> AdapterFacts for Medley<V, E> {
    fn len(&self) -> usize {
        Medley::len(self)
    }

    fn view_type_count(&self) -> usize {
        Medley::view_type_count(self)
    }

    fn type_index_at(&self, position: usize) -> Option<TypeIndex> {
        self.binder(position).map(|binder| binder.type_index)
    }

    fn id_at(&self, position: usize) -> Option<BinderId> {
        Medley::id_at(self, position)
    }

    fn position_of(&self, id: BinderId) -> Option<usize> {
        self.index_of_id(id)
    }

    fn connected(&self) -> bool {
        self.is_connected()
    }
}

impl<V: 'static, E: 'static> ViewDispatch<V, E> for Medley<V, E> {
    fn count(&self) -> usize {
        self.len()
    }

    fn view_type_count(&self) -> usize {
        Medley::view_type_count(self)
    }

    fn view_type_of(&self, position: usize) -> Result<TypeIndex, MedleyError> {
        self.binder(position)
            .map(|binder| binder.type_index)
            .ok_or(MedleyError::IndexOutOfRange {
                index: position,
                len: self.len(),
            })
    }

    fn item_id(&self, position: usize) -> Result<u64, MedleyError> {
        if position >= self.len() {
            return Err(MedleyError::IndexOutOfRange {
                index: position,
                len: self.len(),
            });
        }
        Ok(position as u64)
    }

    fn is_enabled(&self, position: usize) -> Result<bool, MedleyError> {
        let binder = self
            .binder(position)
            .ok_or(MedleyError::IndexOutOfRange {
                index: position,
                len: self.len(),
            })?;
        let ctx = AdapterContext::new(self);
        Ok(binder.converter.enabled(&binder.data, position, &ctx))
    }

    fn create_or_rebind(
        &self,
        position: usize,
        recycled: Option<V>,
        env: &mut E,
    ) -> Result<V, MedleyError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "create_or_rebind",
            position,
            recycled = recycled.is_some()
        )
        .entered();

        let binder = self
            .binder(position)
            .ok_or(MedleyError::IndexOutOfRange {
                index: position,
                len: self.len(),
            })?;
        let ctx = AdapterContext::new(self);
        let mut view = match recycled {
            Some(view) if binder.converter.recyclable(&view, env) => view,
            _ => binder.converter.create(env),
        };
        binder
            .converter
            .bind(&mut view, &binder.data, position, env, &ctx);
        Ok(view)
    }
}
