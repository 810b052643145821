#![forbid(unsafe_code)]

//! Error taxonomy for adapter operations.
//!
//! Every failure is surfaced synchronously to the caller of the operation
//! that triggered it. A rejected operation leaves the list and the registry
//! exactly as they were: bounds and authorization are checked before any
//! state is touched, so there is no partial mutation to roll back.
//!
//! Absence is not an error: existence checks (`index_of`, `index_of_id`,
//! `type_index_of`, `data_at`) return `Option` instead.

use crate::connection::OwnerContext;

/// Errors from adapter mutation and dispatch operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MedleyError {
    /// A mutation was attempted while connected, from a context other than
    /// the owner context fixed at construction.
    InvalidThreadAccess {
        /// The context the adapter accepts mutations from.
        owner: OwnerContext,
        /// The context the rejected call came from.
        caller: OwnerContext,
    },
    /// A converter type unseen before this call was introduced while
    /// connected. The host's recycled-view cache is keyed by the view-type
    /// count reported at connection time, so the type set is frozen until
    /// every listener detaches.
    DuplicateTypeRegistration,
    /// A position argument fell outside the valid bounds of the list.
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Length of the list at the time of the call.
        len: usize,
    },
    /// A registry clear was requested while binders still reference the
    /// registry, or while the adapter is connected. A clear is legal only
    /// with an empty list and no attached listeners; `binders` is 0 exactly
    /// when the connection was the blocker.
    RegistryInUse {
        /// Number of binders currently in the list.
        binders: usize,
    },
}

impl std::fmt::Display for MedleyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidThreadAccess { owner, caller } => write!(
                f,
                "connected adapter mutated from {caller}, but only {owner} may mutate it"
            ),
            Self::DuplicateTypeRegistration => {
                write!(f, "cannot register a new converter type while connected")
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for list of length {len}")
            }
            Self::RegistryInUse { binders: 0 } => write!(
                f,
                "cannot clear the converter registry while the adapter is connected"
            ),
            Self::RegistryInUse { binders } => write!(
                f,
                "cannot clear the converter registry while {binders} binder(s) reference it"
            ),
        }
    }
}

impl std::error::Error for MedleyError {}
