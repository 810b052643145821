#![forbid(unsafe_code)]

//! Heterogeneous list adapter with pluggable per-type view converters.
//!
//! A [`Medley`] owns an ordered, freely mixed sequence of typed rows and
//! binds each one to a recyclable host view on demand. Hosts that cache
//! views by type — a list widget, a table, any recycling renderer — drive it
//! through the read-only [`ViewDispatch`] contract, while applications
//! mutate it through [`Medley`]'s list operations.
//!
//! - [`Converter`]: builds and fills one kind of view from one kind of data.
//!   Each distinct converter type gets a stable [`TypeIndex`] on first use.
//! - [`Medley`]: the binder list plus the converter registry and the
//!   connection guard. Every successful mutation notifies attached
//!   listeners exactly once.
//! - [`ViewDispatch`]: what the host consumes — row count, view-type count,
//!   per-position type, and [`create_or_rebind`](ViewDispatch::create_or_rebind).
//! - [`Connection`]: RAII listener handle. While any listener is attached
//!   the adapter is *connected*: mutations are restricted to the owner
//!   context and the converter type set is frozen, because the host's
//!   recycled-view cache is keyed by the type count reported at connection
//!   time.
//!
//! # Example
//!
//! ```rust
//! use medley::{AdapterContext, Converter, Medley, ViewDispatch};
//!
//! // The host's view handle: one rendered line.
//! #[derive(Default)]
//! struct Line(String);
//!
//! struct NoteConverter;
//!
//! impl Converter<Line> for NoteConverter {
//!     type Data = String;
//!
//!     fn create(&self, _env: &mut ()) -> Line {
//!         Line::default()
//!     }
//!
//!     fn bind(
//!         &self,
//!         view: &mut Line,
//!         data: &String,
//!         position: usize,
//!         _env: &mut (),
//!         _ctx: &AdapterContext<'_>,
//!     ) {
//!         view.0 = format!("{position}: {data}");
//!     }
//! }
//!
//! let mut notes: Medley<Line> = Medley::new();
//! let id = notes.append(NoteConverter, String::from("hello")).unwrap();
//! assert_eq!(notes.len(), 1);
//! assert_eq!(notes.view_type_count(), 1);
//!
//! let line = notes.create_or_rebind(0, None, &mut ()).unwrap();
//! assert_eq!(line.0, "0: hello");
//!
//! notes.remove_by_id(id).unwrap();
//! assert!(notes.is_empty());
//! ```

pub mod adapter;
pub mod connection;
pub mod converter;
pub mod dispatch;
pub mod error;
pub mod id;
mod pool;
mod registry;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use adapter::Medley;
pub use connection::{Connection, ListChange, OwnerContext};
pub use converter::Converter;
pub use dispatch::{AdapterContext, ViewDispatch};
pub use error::MedleyError;
pub use id::{BinderId, TypeIndex};
