#![forbid(unsafe_code)]

//! Stub converters, views, and listeners for exercising adapters in tests.
//!
//! Everything here is deliberately transparent: stub views log every bind
//! applied to them, the stub environment counts create and bind calls, and
//! [`RecordingListener`] stores change events verbatim for later assertions.
//! Available to downstream crates through the `test-helpers` feature.

use std::sync::{Arc, Mutex};

use crate::connection::ListChange;
use crate::converter::Converter;
use crate::dispatch::AdapterContext;

/// A host view that remembers every bind applied to it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StubView {
    /// One entry per bind, in application order.
    pub log: Vec<String>,
    /// The environment generation this view was created under.
    pub generation: u64,
}

/// A render environment that counts converter activity.
///
/// Tests bump [`generation`](Self::generation) to simulate a rendering
/// context change; [`LabelConverter`] refuses to recycle views across
/// generations.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StubEnv {
    /// Number of views created through this environment.
    pub created: usize,
    /// Number of binds applied through this environment.
    pub bound: usize,
    /// Current rendering-context generation.
    pub generation: u64,
}

impl StubEnv {
    fn fresh_view(&mut self) -> StubView {
        self.created += 1;
        StubView {
            log: Vec::new(),
            generation: self.generation,
        }
    }
}

/// Renders string rows as `prefix[position] text`.
///
/// Views it created under an older environment generation are reported
/// non-recyclable, exercising the dispatcher's create-over-recycle branch.
#[derive(Debug, Clone)]
pub struct LabelConverter {
    prefix: &'static str,
}

impl LabelConverter {
    /// A label converter with a custom log prefix.
    #[must_use]
    pub fn with_prefix(prefix: &'static str) -> Self {
        Self { prefix }
    }
}

impl Default for LabelConverter {
    fn default() -> Self {
        Self::with_prefix("label")
    }
}

impl Converter<StubView, StubEnv> for LabelConverter {
    type Data = String;

    fn create(&self, env: &mut StubEnv) -> StubView {
        env.fresh_view()
    }

    fn bind(
        &self,
        view: &mut StubView,
        data: &String,
        position: usize,
        env: &mut StubEnv,
        _ctx: &AdapterContext<'_>,
    ) {
        env.bound += 1;
        view.log.push(format!("{}[{position}] {data}", self.prefix));
    }

    fn recyclable(&self, view: &StubView, env: &StubEnv) -> bool {
        view.generation == env.generation
    }
}

/// Renders numeric rows as `counter[position] value`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CounterConverter;

impl Converter<StubView, StubEnv> for CounterConverter {
    type Data = u32;

    fn create(&self, env: &mut StubEnv) -> StubView {
        env.fresh_view()
    }

    fn bind(
        &self,
        view: &mut StubView,
        data: &u32,
        position: usize,
        env: &mut StubEnv,
        _ctx: &AdapterContext<'_>,
    ) {
        env.bound += 1;
        view.log.push(format!("counter[{position}] {data}"));
    }
}

/// A dataless divider row. Never selectable.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeparatorConverter;

impl Converter<StubView, StubEnv> for SeparatorConverter {
    type Data = ();

    fn create(&self, env: &mut StubEnv) -> StubView {
        env.fresh_view()
    }

    fn bind(
        &self,
        view: &mut StubView,
        _data: &(),
        position: usize,
        env: &mut StubEnv,
        _ctx: &AdapterContext<'_>,
    ) {
        env.bound += 1;
        view.log.push(format!("separator[{position}]"));
    }

    fn enabled(&self, _data: &(), _position: usize, _ctx: &AdapterContext<'_>) -> bool {
        false
    }
}

/// Captures every [`ListChange`] a connected adapter emits.
///
/// Clones share the same buffer, so a clone can be moved into the listener
/// closure while the original stays with the test for assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingListener {
    events: Arc<Mutex<Vec<ListChange>>>,
}

impl RecordingListener {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The callback to hand to [`Medley::connect`](crate::Medley::connect).
    #[must_use]
    pub fn callback(&self) -> impl Fn(&ListChange) + Send + 'static {
        let events = Arc::clone(&self.events);
        move |change| events.lock().unwrap().push(*change)
    }

    /// Drain and return every event recorded so far.
    #[must_use]
    pub fn take(&self) -> Vec<ListChange> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    /// Number of events recorded and not yet drained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Whether no events are waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
