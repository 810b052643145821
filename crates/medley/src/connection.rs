#![forbid(unsafe_code)]

//! Listener connections and mutation authorization.
//!
//! While at least one listener is attached the adapter is "connected": a
//! host is mirroring list state into views, so mutations are restricted to
//! the owner context fixed at construction and the converter type set is
//! frozen. Unconnected, the adapter is plain data and none of that applies.
//!
//! Detaching is RAII: dropping a [`Connection`] detaches its listener, from
//! any thread. The drop only flips atomics; the slot itself is pruned on the
//! owner side during the next notification.
//!
//! # Invariants
//!
//! 1. `connected` equals "at least one `Connection` is alive".
//! 2. Listeners are notified in attach order, exactly once per successful
//!    mutating call.
//! 3. A dropped connection receives no events after the notification cycle
//!    in which its slot is pruned, and the connected count reflects the drop
//!    immediately.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, ThreadId};

use crate::error::MedleyError;

/// The execution context an adapter accepts mutations from while connected.
///
/// Wraps a thread identity. Captured with [`current`](Self::current) at
/// adapter construction, or supplied explicitly through
/// [`Medley::with_owner`](crate::Medley::with_owner) when the constructing
/// thread is not the mutating one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerContext(ThreadId);

impl OwnerContext {
    /// The calling thread's context.
    #[must_use]
    pub fn current() -> Self {
        Self(thread::current().id())
    }
}

impl std::fmt::Display for OwnerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// One change to the binder list, delivered to listeners after the mutation
/// has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListChange {
    /// `count` binders appended or inserted starting at `index`. A batched
    /// append reports the whole batch as one event; an empty batch reports
    /// `count` 0.
    Inserted { index: usize, count: usize },
    /// The binder previously at `index` was removed.
    Removed { index: usize },
    /// All binders were removed.
    Cleared,
}

struct ListenerSlot {
    alive: Arc<AtomicBool>,
    callback: Box<dyn Fn(&ListChange) + Send>,
}

/// Handle to an attached listener. Dropping it detaches the listener.
#[must_use = "dropping a Connection immediately detaches its listener"]
#[derive(Debug)]
pub struct Connection {
    alive: Arc<AtomicBool>,
    connected: Arc<AtomicUsize>,
}

impl Connection {
    /// Detach now. Equivalent to dropping the handle.
    pub fn disconnect(self) {}
}

impl Drop for Connection {
    fn drop(&mut self) {
        if self.alive.swap(false, Ordering::AcqRel) {
            self.connected.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

/// Connection state plus the listener table, owned by the adapter.
pub(crate) struct ConnectionGuard {
    owner: OwnerContext,
    connected: Arc<AtomicUsize>,
    listeners: Vec<ListenerSlot>,
}

impl ConnectionGuard {
    pub(crate) fn new(owner: OwnerContext) -> Self {
        Self {
            owner,
            connected: Arc::new(AtomicUsize::new(0)),
            listeners: Vec::new(),
        }
    }

    pub(crate) fn owner(&self) -> OwnerContext {
        self.owner
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire) > 0
    }

    /// Number of currently attached listeners.
    pub(crate) fn connection_count(&self) -> usize {
        self.connected.load(Ordering::Acquire)
    }

    /// Number of slots in the table, pruned or not. Test instrumentation.
    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.listeners.len()
    }

    pub(crate) fn connect(
        &mut self,
        listener: impl Fn(&ListChange) + Send + 'static,
    ) -> Connection {
        let alive = Arc::new(AtomicBool::new(true));
        self.listeners.push(ListenerSlot {
            alive: Arc::clone(&alive),
            callback: Box::new(listener),
        });
        self.connected.fetch_add(1, Ordering::AcqRel);
        Connection {
            alive,
            connected: Arc::clone(&self.connected),
        }
    }

    /// Deliver `change` to live listeners in attach order, dropping dead
    /// slots on the way.
    pub(crate) fn notify(&mut self, change: &ListChange) {
        self.listeners.retain(|slot| {
            if slot.alive.load(Ordering::Acquire) {
                (slot.callback)(change);
                true
            } else {
                false
            }
        });
    }

    /// While connected, mutations are accepted only from the owner context.
    pub(crate) fn authorize_mutation(&self) -> Result<(), MedleyError> {
        if !self.is_connected() {
            return Ok(());
        }
        let caller = OwnerContext::current();
        if caller == self.owner {
            Ok(())
        } else {
            Err(MedleyError::InvalidThreadAccess {
                owner: self.owner,
                caller,
            })
        }
    }

    /// While connected, the converter type set is frozen for every context,
    /// the owner included.
    pub(crate) fn authorize_type_registration(&self) -> Result<(), MedleyError> {
        if self.is_connected() {
            Err(MedleyError::DuplicateTypeRegistration)
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Debug for ConnectionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionGuard")
            .field("owner", &self.owner)
            .field("connections", &self.connection_count())
            .finish()
    }
}
